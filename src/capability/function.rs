//! The function capability contract (spec §3 table, row "Function"; §4.4.4).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Static metadata describing a function's calling convention, as returned by
/// `get_definition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// The function's globally-unique name (spec §3 invariant: unique across all
    /// providers).
    pub name: String,
    /// Human-readable description of each positional parameter, in order.
    pub parameters: Vec<String>,
    /// Whether the final parameter accepts a variable number of arguments.
    pub variadic: bool,
    /// Human-readable description of the return value.
    pub return_description: String,
}

/// A named reference to a function plus captured arguments (spec §4.4.4), the
/// representation a higher-order function result takes when it must be passed around by
/// reference rather than invoked immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionValueRef {
    /// The name of the function being referenced.
    pub function_name: String,
    /// Arguments already bound at the point the reference was created.
    pub partial_args: Vec<Value>,
    /// Position at which `partial_args` is spliced into the caller-supplied positional
    /// arguments. Defaults to 0 (prepended).
    #[serde(default)]
    pub args_offset: usize,
}

impl FunctionValueRef {
    /// Splices `partial_args` into `call_args` at `args_offset`, producing the full
    /// positional argument list to invoke the referenced function with.
    #[must_use]
    pub fn splice_args(&self, call_args: &[Value]) -> Vec<Value> {
        let offset = self.args_offset.min(call_args.len());
        let mut spliced = Vec::with_capacity(call_args.len() + self.partial_args.len());
        spliced.extend_from_slice(&call_args[..offset]);
        spliced.extend(self.partial_args.iter().cloned());
        spliced.extend_from_slice(&call_args[offset..]);
        spliced
    }
}

/// The capability set every function-kind plugin implements (spec §3, §4.4.4).
#[async_trait]
pub trait FunctionCapability: Send + Sync + 'static {
    /// This function's calling convention.
    fn get_definition(&self) -> FunctionDefinition;

    /// Invokes the function with positional arguments.
    async fn call(&self, args: Vec<Value>) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splice_args_prepends_at_default_offset() {
        let value_ref = FunctionValueRef {
            function_name: "add".to_string(),
            partial_args: vec![Value::from(1)],
            args_offset: 0,
        };
        let spliced = value_ref.splice_args(&[Value::from(2), Value::from(3)]);
        assert_eq!(spliced, vec![Value::from(1), Value::from(2), Value::from(3)]);
    }

    #[test]
    fn splice_args_inserts_at_given_offset() {
        let value_ref = FunctionValueRef {
            function_name: "concat".to_string(),
            partial_args: vec![Value::from("middle")],
            args_offset: 1,
        };
        let spliced = value_ref.splice_args(&[Value::from("first"), Value::from("last")]);
        assert_eq!(
            spliced,
            vec![Value::from("first"), Value::from("middle"), Value::from("last")]
        );
    }

    #[test]
    fn splice_args_clamps_offset_beyond_call_args_len() {
        let value_ref = FunctionValueRef {
            function_name: "append".to_string(),
            partial_args: vec![Value::from("tail")],
            args_offset: 99,
        };
        let spliced = value_ref.splice_args(&[Value::from("only")]);
        assert_eq!(spliced, vec![Value::from("only"), Value::from("tail")]);
    }
}
