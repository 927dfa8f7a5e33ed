//! The link capability contract (spec §3 table, row "Link"; §4.4.5 "Link update
//! protocol").
//!
//! The four mutation operations below are *exposed, not executed*, by this layer: a
//! higher orchestrator sequences them (stage, update A, update B, update intermediaries,
//! compensate on failure). This crate only defines the contract and the registry that
//! resolves it.

use async_trait::async_trait;
use serde_json::Value;

use crate::deploy_service::DeployService;
use crate::error::Result;
use crate::schema::LinkChanges;

/// Whether a link is required for its resources to deploy at all (`Hard`) or merely
/// optional wiring between two otherwise-independent resources (`Soft`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// The priority resource must exist before the other side is deployed.
    Hard,
    /// Neither side blocks the other's deployment.
    Soft,
}

/// Input to a link's `stage_changes`.
#[derive(Debug, Clone)]
pub struct LinkStageChangesInput {
    /// Resource A's own changes, as computed by its resource capability.
    pub resource_a_changes: crate::schema::Changes,
    /// Resource B's own changes, as computed by its resource capability.
    pub resource_b_changes: crate::schema::Changes,
    /// The link's last-persisted data, if this link has deployed before.
    pub current_link_state: Option<Value>,
}

/// Input to `update_resource_a` / `update_resource_b` / `handle_a_error` /
/// `handle_b_error`.
#[derive(Debug, Clone)]
pub struct LinkUpdateEndpointInput {
    /// The endpoint resource's current external state.
    pub resource_info: Value,
    /// The relevant slice of the link's staged changes.
    pub changes: LinkChanges,
}

/// Input to `update_intermediary_resources`.
#[derive(Debug, Clone)]
pub struct LinkUpdateIntermediaryInput {
    /// Resource A's current external state.
    pub resource_a_info: Value,
    /// Resource B's current external state.
    pub resource_b_info: Value,
    /// The link's staged changes, including per-intermediary deltas.
    pub changes: LinkChanges,
}

/// The capability set every link-kind plugin implements (spec §3, §4.4.5).
///
/// Link invocation is **not** wrapped in the retry engine at this layer (spec §4.4.5):
/// link updates are multi-stage and the orchestrator above chooses whether to retry each
/// stage independently.
#[async_trait]
pub trait LinkCapability: Send + Sync + 'static {
    /// The link type this capability implements: `"<typeA>::<typeB>"`.
    fn get_type(&self) -> &str;

    /// Whether this link is load-bearing for deployment ordering.
    fn get_kind(&self) -> LinkKind;

    /// In a hard link, the resource type that must exist before the other side is
    /// deployed (spec glossary, "Priority resource").
    fn get_priority_resource_type(&self) -> &str;

    /// Computes the link-level diff given both endpoints' own changes.
    async fn stage_changes(&self, input: LinkStageChangesInput) -> Result<LinkChanges>;

    /// Idempotently mutates resource A in light of the link. Returns a `link_data`
    /// fragment to be merged into the final persisted link data.
    async fn update_resource_a(&self, input: LinkUpdateEndpointInput) -> Result<Value>;

    /// Idempotently mutates resource B in light of the link. Returns a `link_data`
    /// fragment to be merged into the final persisted link data.
    async fn update_resource_b(&self, input: LinkUpdateEndpointInput) -> Result<Value>;

    /// Creates/destroys/updates any intermediary resources the link owns, via
    /// `deploy_service` since those resources are not owned by either endpoint's
    /// provider. Returns a `link_data` fragment.
    async fn update_intermediary_resources(
        &self,
        input: LinkUpdateIntermediaryInput,
        deploy_service: &DeployService,
    ) -> Result<Value>;

    /// Compensation hook invoked by the orchestrator if `update_resource_a` failed after
    /// partial mutation. Must be safe to call idempotently, including when no mutation
    /// actually happened.
    async fn handle_a_error(&self, input: LinkUpdateEndpointInput) -> Result<()>;

    /// Compensation hook invoked by the orchestrator if `update_resource_b` failed after
    /// partial mutation. Must be safe to call idempotently.
    async fn handle_b_error(&self, input: LinkUpdateEndpointInput) -> Result<()>;
}

/// Merges the `link_data` fragments returned by updates A, B, and intermediary into the
/// final structure persisted to state (spec §4.4.5 "Merging rule"): a structural union
/// with later steps overriding identical keys, in the order A, then B, then intermediary.
#[must_use]
pub fn merge_link_data(a: Value, b: Value, intermediary: Value) -> Value {
    let mut merged = serde_json::Map::new();
    for fragment in [a, b, intermediary] {
        if let Value::Object(map) = fragment {
            merged.extend(map);
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_link_data_later_steps_override_identical_keys() {
        let a = json!({"host": "a-host", "port": 1});
        let b = json!({"port": 2});
        let intermediary = json!({"port": 3, "queue_arn": "arn:aws:sqs:..."});

        let merged = merge_link_data(a, b, intermediary);

        assert_eq!(merged["host"], json!("a-host"));
        assert_eq!(merged["port"], json!(3));
        assert_eq!(merged["queue_arn"], json!("arn:aws:sqs:..."));
    }

    #[test]
    fn merge_link_data_ignores_non_object_fragments() {
        let merged = merge_link_data(Value::Null, json!({"k": "v"}), Value::Null);
        assert_eq!(merged, json!({"k": "v"}));
    }
}
