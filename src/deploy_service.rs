//! The deploy service façade (spec §3 "Deploy service").
//!
//! A narrow surface over the resource registry — `deploy`, `destroy`, `has_stabilised`
//! — handed to link implementations so they can mutate intermediary resources they do
//! not themselves own, without exposing the full registry (listing, validation,
//! provider registration) to plugin code.

use std::sync::Arc;

use serde_json::Value;

use crate::capability::resource::DeployInput;
use crate::error::Result;
use crate::registry::resource::ResourceRegistry;

/// Hands link capabilities just enough of the resource registry to create, destroy, and
/// poll intermediary resources (spec §4.4.5 `update_intermediary_resources`).
#[derive(Clone)]
pub struct DeployService {
    registry: Arc<ResourceRegistry>,
}

impl DeployService {
    /// Wraps a resource registry behind the narrow deploy/destroy/has-stabilised surface.
    #[must_use]
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }

    /// Deploys (creates or updates) a resource of `item_type`, optionally blocking until
    /// it reports stabilised.
    pub async fn deploy(
        &self,
        item_type: &str,
        deploy_input: Value,
        wait_until_stable: bool,
    ) -> Result<Value> {
        self.registry
            .deploy(
                item_type,
                DeployInput {
                    deploy_input,
                    wait_until_stable,
                },
            )
            .await
    }

    /// Destroys the resource of `item_type` identified by `external_state`.
    pub async fn destroy(&self, item_type: &str, external_state: &Value) -> Result<bool> {
        self.registry.destroy(item_type, external_state).await
    }

    /// Checks whether the resource of `item_type` identified by `external_state` has
    /// stabilised.
    pub async fn has_stabilised(&self, item_type: &str, external_state: &Value) -> Result<bool> {
        self.registry.has_stabilised(item_type, external_state).await
    }
}
