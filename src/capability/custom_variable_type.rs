//! The custom variable type capability contract (spec §3 table, row "Custom variable
//! type").

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::CustomVariableOption;

/// The capability set every custom-variable-type-kind plugin implements (spec §3,
/// §4.4.3). No retry semantics apply here — option enumeration has no deploy-time side
/// effects to retry.
#[async_trait]
pub trait CustomVariableTypeCapability: Send + Sync + 'static {
    /// The custom variable type this capability implements, e.g. `"aws/ec2_instance_type"`.
    fn get_type(&self) -> &str;

    /// A human-readable description of the type.
    fn description(&self) -> &str;

    /// The fixed set of options this type allows. All options must share the same
    /// scalar kind (spec §3 invariant); [`crate::registry::CustomVariableTypeRegistry`]
    /// enforces this at enumeration time rather than trusting the plugin.
    async fn enumerate_options(&self) -> Result<Vec<CustomVariableOption>>;
}
