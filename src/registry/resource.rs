//! Resource registry (spec §3, §4.4.1).

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{find_provider_for_namespace, resolved_or_false};
use crate::capability::resource::{DeployInput, ResourceCapability, StageChangesInput};
use crate::error::{Error, ItemKind, Result};
use crate::provider::Provider;
use crate::retry::{with_retry, RetryPolicy};
use crate::schema::{Changes, SchemaNode};

/// Resolves, caches, and drives resource capabilities across all registered providers.
pub struct ResourceRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    cache: DashMap<String, Arc<dyn ResourceCapability>>,
    default_retry_policy: RetryPolicy,
    cancel: CancellationToken,
}

impl ResourceRegistry {
    /// Builds a registry over `providers`, falling back to `default_retry_policy` for any
    /// capability that does not supply its own.
    #[must_use]
    pub fn new(providers: HashMap<String, Arc<dyn Provider>>, default_retry_policy: RetryPolicy) -> Self {
        Self {
            providers,
            cache: DashMap::new(),
            default_retry_policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces this registry's cancellation token, used by the host to abort in-flight
    /// retries during shutdown.
    #[must_use]
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// All resource types advertised by every registered provider.
    pub async fn list_types(&self) -> Result<Vec<String>> {
        let mut types = Vec::new();
        for provider in self.providers.values() {
            types.extend(provider.list_resource_types().await?);
        }
        Ok(types)
    }

    async fn resolve(&self, item_type: &str) -> Result<Arc<dyn ResourceCapability>> {
        if let Some(cached) = self.cache.get(item_type) {
            return Ok(Arc::clone(&cached));
        }

        let provider = find_provider_for_namespace(&self.providers, item_type)?;
        let capability = provider
            .resolve_resource(item_type)
            .await?
            .ok_or_else(|| Error::ProviderItemTypeNotFound {
                provider: provider.namespace().to_string(),
                item_type: item_type.to_string(),
                kind: ItemKind::Resource,
            })?;

        debug!(namespace = provider.namespace(), item_type, "resolved resource capability");
        self.cache.insert(item_type.to_string(), Arc::clone(&capability));
        Ok(capability)
    }

    fn retry_policy_for(&self, capability: &Arc<dyn ResourceCapability>) -> RetryPolicy {
        capability.retry_policy().unwrap_or(self.default_retry_policy)
    }

    /// Whether any registered provider implements `item_type` (spec §4.4 "Has-kind
    /// predicate"); `false` for an unknown namespace or an unimplemented item, every
    /// other error still propagates.
    pub async fn has_resource_type(&self, item_type: &str) -> Result<bool> {
        resolved_or_false(self.resolve(item_type).await)
    }

    /// Plugin-specific validation beyond the spec schema.
    pub async fn custom_validate(&self, item_type: &str, spec: &Value) -> Result<Vec<String>> {
        self.resolve(item_type).await?.custom_validate(spec).await
    }

    /// The resource's spec schema.
    pub async fn get_spec_definition(&self, item_type: &str) -> Result<SchemaNode> {
        self.resolve(item_type).await?.get_spec_definition().await
    }

    /// The resource's external-state schema.
    pub async fn get_state_definition(&self, item_type: &str) -> Result<SchemaNode> {
        self.resolve(item_type).await?.get_state_definition().await
    }

    /// Whether `item_type` can link to `other_type`.
    pub async fn can_link_to(&self, item_type: &str, other_type: &str) -> Result<bool> {
        self.resolve(item_type).await?.can_link_to(other_type).await
    }

    /// Whether `item_type` is a common terminal resource.
    pub async fn is_common_terminal(&self, item_type: &str) -> Result<bool> {
        Ok(self.resolve(item_type).await?.is_common_terminal())
    }

    /// Computes the diff between `input.current_spec` and `input.new_spec`.
    pub async fn stage_changes(&self, item_type: &str, input: StageChangesInput) -> Result<Changes> {
        self.resolve(item_type).await?.stage_changes(input).await
    }

    /// Deploys `item_type`, retrying transient failures under its retry policy. If
    /// `input.wait_until_stable` is set, polls [`ResourceCapability::has_stabilised`]
    /// before returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceDeploy`] once retries are exhausted (wrapping the last
    /// underlying error as a single failure reason), or [`Error::Cancelled`] if the
    /// registry's cancellation token fires first.
    pub async fn deploy(&self, item_type: &str, input: DeployInput) -> Result<Value> {
        let capability = self.resolve(item_type).await?;
        let policy = self.retry_policy_for(&capability);
        let wait_until_stable = input.wait_until_stable;
        debug!(item_type, wait_until_stable, "deploying resource");

        let deployed = match with_retry(policy, "resource.deploy", &self.cancel, || {
            let capability = Arc::clone(&capability);
            let input = input.clone();
            async move { capability.deploy(input).await }
        })
        .await
        {
            Ok(value) => value,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(other) => {
                return Err(Error::ResourceDeploy {
                    failure_reasons: vec![other.to_string()],
                })
            }
        };

        if wait_until_stable {
            self.poll_until_stabilised(&capability, &deployed, policy).await?;
        }

        Ok(deployed)
    }

    async fn poll_until_stabilised(
        &self,
        capability: &Arc<dyn ResourceCapability>,
        external_state: &Value,
        policy: RetryPolicy,
    ) -> Result<()> {
        let mut attempt = 1;
        loop {
            if capability.has_stabilised(external_state).await? {
                return Ok(());
            }
            if attempt > policy.max_retries {
                return Err(Error::ResourceDeploy {
                    failure_reasons: vec!["resource did not stabilise within the retry budget".to_string()],
                });
            }
            let wait_ms = policy.wait_time_ms(attempt);
            tokio::select! {
                () = tokio::time::sleep(std::time::Duration::from_millis(wait_ms)) => {}
                () = self.cancel.cancelled() => return Err(Error::Cancelled),
            }
            attempt += 1;
        }
    }

    /// Fetches `item_type`'s external state directly from its provider, bypassing cache.
    pub async fn get_external_state(&self, item_type: &str, external_id: &Value) -> Result<Value> {
        let capability = self.resolve(item_type).await?;
        let policy = self.retry_policy_for(&capability);
        with_retry(policy, "resource.get_external_state", &self.cancel, || {
            let capability = Arc::clone(&capability);
            let external_id = external_id.clone();
            async move { capability.get_external_state(&external_id).await }
        })
        .await
    }

    /// Whether `item_type` identified by `external_state` has stabilised.
    pub async fn has_stabilised(&self, item_type: &str, external_state: &Value) -> Result<bool> {
        self.resolve(item_type).await?.has_stabilised(external_state).await
    }

    /// Destroys `item_type` identified by `external_state`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotDestroyed`] if the capability reports
    /// `destroyed = false`, or [`Error::ResourceDestroy`] once retries of a transient
    /// failure are exhausted.
    pub async fn destroy(&self, item_type: &str, external_state: &Value) -> Result<bool> {
        let capability = self.resolve(item_type).await?;
        let policy = self.retry_policy_for(&capability);

        let destroyed = match with_retry(policy, "resource.destroy", &self.cancel, || {
            let capability = Arc::clone(&capability);
            let external_state = external_state.clone();
            async move { capability.destroy(&external_state).await }
        })
        .await
        {
            Ok(destroyed) => destroyed,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(other) => {
                return Err(Error::ResourceDestroy {
                    failure_reasons: vec![other.to_string()],
                })
            }
        };

        if destroyed {
            Ok(true)
        } else {
            Err(Error::ResourceNotDestroyed(item_type.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::resource::ResourceCapability;
    use crate::schema::{PrimitiveType, SchemaMeta};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyResource {
        fail_until: AtomicU32,
    }

    #[async_trait]
    impl ResourceCapability for FlakyResource {
        fn get_type(&self) -> &str {
            "aws/lambda"
        }

        fn type_description(&self) -> &str {
            "a lambda function"
        }

        async fn custom_validate(&self, _spec: &Value) -> Result<Vec<String>> {
            Ok(vec![])
        }

        async fn get_spec_definition(&self) -> Result<SchemaNode> {
            Ok(SchemaNode::Scalar {
                primitive: PrimitiveType::String,
                meta: SchemaMeta::default(),
            })
        }

        async fn get_state_definition(&self) -> Result<SchemaNode> {
            Ok(SchemaNode::Scalar {
                primitive: PrimitiveType::String,
                meta: SchemaMeta::default(),
            })
        }

        async fn can_link_to(&self, other_type: &str) -> Result<bool> {
            Ok(other_type == "aws/sqs_queue")
        }

        fn is_common_terminal(&self) -> bool {
            false
        }

        async fn stage_changes(&self, _input: StageChangesInput) -> Result<Changes> {
            Ok(Changes::default())
        }

        async fn deploy(&self, input: DeployInput) -> Result<Value> {
            let attempt = self.fail_until.fetch_sub(1, Ordering::SeqCst);
            if attempt > 0 {
                Err(Error::internal("deploy", "throttled").retryable())
            } else {
                Ok(input.deploy_input)
            }
        }

        async fn get_external_state(&self, external_id: &Value) -> Result<Value> {
            Ok(external_id.clone())
        }

        async fn has_stabilised(&self, _external_state: &Value) -> Result<bool> {
            Ok(true)
        }

        async fn destroy(&self, _external_state: &Value) -> Result<bool> {
            Ok(false)
        }

        fn retry_policy(&self) -> Option<RetryPolicy> {
            Some(RetryPolicy {
                max_retries: 3,
                first_retry_delay: 0.0,
                max_delay: Some(0.0),
                backoff_factor: 1.0,
                jitter: false,
            })
        }
    }

    struct SingleResourceProvider;

    #[async_trait]
    impl Provider for SingleResourceProvider {
        fn namespace(&self) -> &str {
            "aws"
        }

        async fn list_resource_types(&self) -> Result<Vec<String>> {
            Ok(vec!["aws/lambda".to_string()])
        }

        async fn list_data_source_types(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }

        async fn list_custom_variable_types(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }

        async fn list_function_names(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }

        async fn resolve_resource(&self, item_type: &str) -> Result<Option<Arc<dyn ResourceCapability>>> {
            if item_type == "aws/lambda" {
                Ok(Some(Arc::new(FlakyResource {
                    fail_until: AtomicU32::new(2),
                })))
            } else {
                Ok(None)
            }
        }

        async fn resolve_data_source(
            &self,
            _item_type: &str,
        ) -> Result<Option<Arc<dyn crate::capability::DataSourceCapability>>> {
            Ok(None)
        }

        async fn resolve_custom_variable_type(
            &self,
            _item_type: &str,
        ) -> Result<Option<Arc<dyn crate::capability::CustomVariableTypeCapability>>> {
            Ok(None)
        }

        async fn resolve_function(
            &self,
            _name: &str,
        ) -> Result<Option<Arc<dyn crate::capability::FunctionCapability>>> {
            Ok(None)
        }

        async fn resolve_link(
            &self,
            _type_a: &str,
            _type_b: &str,
        ) -> Result<Option<Arc<dyn crate::capability::LinkCapability>>> {
            Ok(None)
        }
    }

    fn make_registry() -> ResourceRegistry {
        let mut providers: HashMap<String, Arc<dyn Provider>> = HashMap::new();
        providers.insert("aws".to_string(), Arc::new(SingleResourceProvider));
        ResourceRegistry::new(providers, RetryPolicy::default())
    }

    #[tokio::test]
    async fn deploy_retries_a_flaky_resource_until_success() {
        let registry = make_registry();
        let result = registry
            .deploy(
                "aws/lambda",
                DeployInput {
                    deploy_input: json!({"name": "fn"}),
                    wait_until_stable: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(result, json!({"name": "fn"}));
    }

    #[tokio::test]
    async fn resolve_unknown_namespace_reports_provider_not_found() {
        let registry = make_registry();
        let err = registry
            .get_spec_definition("gcp/bucket")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ItemTypeProviderNotFound { .. }));
    }

    #[tokio::test]
    async fn resolve_unknown_item_in_known_namespace_reports_provider_item_not_found() {
        let registry = make_registry();
        let err = registry
            .get_spec_definition("aws/unknown_thing")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProviderItemTypeNotFound { .. }));
    }

    #[tokio::test]
    async fn destroy_reporting_false_becomes_not_destroyed_error() {
        let registry = make_registry();
        let err = registry
            .destroy("aws/lambda", &json!({"id": "fn-1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ResourceNotDestroyed(_)));
    }

    #[tokio::test]
    async fn second_resolve_hits_the_cache() {
        let registry = make_registry();
        let first = registry.resolve("aws/lambda").await.unwrap();
        let second = registry.resolve("aws/lambda").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
