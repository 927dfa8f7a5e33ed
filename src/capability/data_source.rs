//! The data-source capability contract (spec §3 table, row "Data source").

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::schema::SchemaNode;

/// The capability set every data-source-kind plugin implements (spec §3, §4.4.2).
///
/// Data-source schemas are restricted to primitives and arrays of primitives
/// ([`SchemaNode::is_data_source_compatible`]); the registry does not enforce this on the
/// plugin's behalf, it trusts `get_spec_definition`'s output.
#[async_trait]
pub trait DataSourceCapability: Send + Sync + 'static {
    /// The data source type this capability implements, e.g. `"aws/vpc"`.
    fn get_type(&self) -> &str;

    /// A human-readable description of the data source type.
    fn type_description(&self) -> &str;

    /// Plugin-specific validation beyond what the spec schema already enforces.
    async fn custom_validate(&self, spec: &Value) -> Result<Vec<String>>;

    /// The schema for this data source's queryable fields.
    async fn get_spec_definition(&self) -> Result<SchemaNode>;

    /// The names of fields that may be used in a filter against this data source.
    async fn get_filter_fields(&self) -> Result<Vec<String>>;

    /// Fetches matching data. May return `Error::Retryable`; exhaustion degrades to a
    /// soft `Ok(None)` at the registry layer rather than propagating the error (spec
    /// §4.4.2).
    async fn fetch(&self, filter: &Value) -> Result<Value>;

    /// The retry policy this capability prefers, or `None` to use the host default.
    fn retry_policy(&self) -> Option<RetryPolicy> {
        None
    }
}
