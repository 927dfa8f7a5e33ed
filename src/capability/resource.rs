//! The resource capability contract (spec §3 table, row "Resource").

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::schema::{Changes, SchemaNode};

/// Input to `stage_changes`: the current resource spec (if any, for updates) and the
/// proposed new spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageChangesInput {
    /// The resource's current resolved spec, or `None` if this is a new resource.
    pub current_spec: Option<Value>,
    /// The proposed resolved spec.
    pub new_spec: Value,
}

/// Input to `deploy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployInput {
    /// The resolved spec to deploy, typically the `resolved_resource` snapshot carried
    /// by the [`Changes`] record `stage_changes` produced.
    pub deploy_input: Value,
    /// Whether the caller should block until `has_stabilised` reports `true` before
    /// returning. When `false`, the orchestrator polls stabilisation separately.
    pub wait_until_stable: bool,
}

/// The capability set every resource-kind plugin implements (spec §3, §4.4.1).
///
/// `deploy`, `destroy`, and `get_external_state` may return
/// [`crate::error::Error::Retryable`] to request another attempt under the provider's
/// (or host default) [`RetryPolicy`]; the resource registry is responsible for applying
/// it, not implementations of this trait.
#[async_trait]
pub trait ResourceCapability: Send + Sync + 'static {
    /// The resource type this capability implements, e.g. `"aws/lambda"`.
    fn get_type(&self) -> &str;

    /// A human-readable description of the resource type.
    fn type_description(&self) -> &str;

    /// Plugin-specific validation beyond what the spec schema already enforces.
    /// Returns validation diagnostics; an empty vec means the spec is valid.
    async fn custom_validate(&self, spec: &Value) -> Result<Vec<String>>;

    /// The schema for this resource's spec (user-supplied fields).
    async fn get_spec_definition(&self) -> Result<SchemaNode>;

    /// The schema for this resource's external state (provider-produced fields).
    async fn get_state_definition(&self) -> Result<SchemaNode>;

    /// Whether this resource type can participate in a link where it plays the "A" (or
    /// "B", the direction is link-specific) role alongside `other_type`.
    async fn can_link_to(&self, other_type: &str) -> Result<bool>;

    /// Whether this resource type is a "common terminal" — a resource other resources
    /// commonly link to but that itself rarely initiates links (e.g. a VPC).
    fn is_common_terminal(&self) -> bool;

    /// Computes the diff between the current and proposed spec.
    async fn stage_changes(&self, input: StageChangesInput) -> Result<Changes>;

    /// Deploys (creates or updates) the resource. May return `Error::Retryable`.
    async fn deploy(&self, input: DeployInput) -> Result<Value>;

    /// Fetches the resource's current external state directly from the provider, bypassing
    /// any cached state. May return `Error::Retryable`.
    async fn get_external_state(&self, external_id: &Value) -> Result<Value>;

    /// Whether a freshly deployed resource has reached a state where dependents may
    /// safely assume it exists (spec glossary, "Stabilisation").
    async fn has_stabilised(&self, external_state: &Value) -> Result<bool>;

    /// Destroys the resource. Returns `true` if destruction succeeded; `false` signals a
    /// non-error "not destroyed" outcome the registry translates to
    /// `Error::ResourceNotDestroyed`. May return `Error::Retryable`.
    async fn destroy(&self, external_state: &Value) -> Result<bool>;

    /// The retry policy this capability prefers, or `None` to use the host default.
    fn retry_policy(&self) -> Option<RetryPolicy> {
        None
    }
}
