//! Link registry (spec §3, §4.4.5).
//!
//! Links are resolved by trial-and-error: every registered provider is offered the
//! ordered type pair `(type_a, type_b)` in turn, and the first to return a capability
//! wins (spec glossary "Trial-and-error resolution"). The winner is memoized under the
//! order-sensitive key `"typeA::typeB"` (spec §9 Open Questions — the cache key stays a
//! raw string, not a normalized tuple, to keep order-sensitivity visible).

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::capability::link::{
    LinkCapability, LinkKind, LinkStageChangesInput, LinkUpdateEndpointInput,
    LinkUpdateIntermediaryInput,
};
use crate::deploy_service::DeployService;
use crate::error::{Error, Result};
use crate::identifier::link_id;
use crate::provider::Provider;
use crate::schema::LinkChanges;

/// Resolves and caches link capabilities by probing every registered provider.
pub struct LinkRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    cache: DashMap<String, Arc<dyn LinkCapability>>,
}

impl LinkRegistry {
    /// Builds a registry over `providers`.
    #[must_use]
    pub fn new(providers: HashMap<String, Arc<dyn Provider>>) -> Self {
        Self {
            providers,
            cache: DashMap::new(),
        }
    }

    async fn resolve(&self, type_a: &str, type_b: &str) -> Result<Arc<dyn LinkCapability>> {
        let key = link_id(type_a, type_b);

        if let Some(cached) = self.cache.get(&key) {
            return Ok(Arc::clone(&cached));
        }

        for provider in self.providers.values() {
            if let Some(capability) = provider.resolve_link(type_a, type_b).await? {
                debug!(namespace = provider.namespace(), type_a, type_b, "resolved link capability");
                self.cache.insert(key, Arc::clone(&capability));
                return Ok(capability);
            }
        }

        Err(Error::LinkImplementationNotFound {
            type_a: type_a.to_string(),
            type_b: type_b.to_string(),
        })
    }

    /// The link's kind (hard/soft).
    pub async fn get_kind(&self, type_a: &str, type_b: &str) -> Result<LinkKind> {
        Ok(self.resolve(type_a, type_b).await?.get_kind())
    }

    /// The resource type that must deploy first, for a hard link.
    pub async fn get_priority_resource_type(&self, type_a: &str, type_b: &str) -> Result<String> {
        Ok(self
            .resolve(type_a, type_b)
            .await?
            .get_priority_resource_type()
            .to_string())
    }

    /// Computes the link-level diff given both endpoints' own changes.
    pub async fn stage_changes(
        &self,
        type_a: &str,
        type_b: &str,
        input: LinkStageChangesInput,
    ) -> Result<LinkChanges> {
        self.resolve(type_a, type_b).await?.stage_changes(input).await
    }

    /// Mutates resource A, returning its `link_data` fragment.
    pub async fn update_resource_a(
        &self,
        type_a: &str,
        type_b: &str,
        input: LinkUpdateEndpointInput,
    ) -> Result<Value> {
        self.resolve(type_a, type_b).await?.update_resource_a(input).await
    }

    /// Mutates resource B, returning its `link_data` fragment.
    pub async fn update_resource_b(
        &self,
        type_a: &str,
        type_b: &str,
        input: LinkUpdateEndpointInput,
    ) -> Result<Value> {
        self.resolve(type_a, type_b).await?.update_resource_b(input).await
    }

    /// Creates/destroys/updates any intermediary resources the link owns.
    pub async fn update_intermediary_resources(
        &self,
        type_a: &str,
        type_b: &str,
        input: LinkUpdateIntermediaryInput,
        deploy_service: &DeployService,
    ) -> Result<Value> {
        self.resolve(type_a, type_b)
            .await?
            .update_intermediary_resources(input, deploy_service)
            .await
    }

    /// Compensation hook for a failed `update_resource_a`.
    pub async fn handle_a_error(
        &self,
        type_a: &str,
        type_b: &str,
        input: LinkUpdateEndpointInput,
    ) -> Result<()> {
        self.resolve(type_a, type_b).await?.handle_a_error(input).await
    }

    /// Compensation hook for a failed `update_resource_b`.
    pub async fn handle_b_error(
        &self,
        type_a: &str,
        type_b: &str,
        input: LinkUpdateEndpointInput,
    ) -> Result<()> {
        self.resolve(type_a, type_b).await?.handle_b_error(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct LambdaToSqsLink;

    #[async_trait]
    impl LinkCapability for LambdaToSqsLink {
        fn get_type(&self) -> &str {
            "aws/lambda::aws/sqs_queue"
        }

        fn get_kind(&self) -> LinkKind {
            LinkKind::Hard
        }

        fn get_priority_resource_type(&self) -> &str {
            "aws/sqs_queue"
        }

        async fn stage_changes(&self, _input: LinkStageChangesInput) -> Result<LinkChanges> {
            Ok(LinkChanges::default())
        }

        async fn update_resource_a(&self, _input: LinkUpdateEndpointInput) -> Result<Value> {
            Ok(json!({"event_source_mapping": "attached"}))
        }

        async fn update_resource_b(&self, _input: LinkUpdateEndpointInput) -> Result<Value> {
            Ok(json!({}))
        }

        async fn update_intermediary_resources(
            &self,
            _input: LinkUpdateIntermediaryInput,
            _deploy_service: &DeployService,
        ) -> Result<Value> {
            Ok(json!({}))
        }

        async fn handle_a_error(&self, _input: LinkUpdateEndpointInput) -> Result<()> {
            Ok(())
        }

        async fn handle_b_error(&self, _input: LinkUpdateEndpointInput) -> Result<()> {
            Ok(())
        }
    }

    struct LambdaProvider;

    #[async_trait]
    impl Provider for LambdaProvider {
        fn namespace(&self) -> &str {
            "aws"
        }

        async fn list_resource_types(&self) -> Result<Vec<String>> {
            Ok(vec![])
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

        async fn resolve_resource(
            &self,
            _item_type: &str,
        ) -> Result<Option<Arc<dyn crate::capability::ResourceCapability>>> {
            Ok(None)
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
            type_a: &str,
            type_b: &str,
        ) -> Result<Option<Arc<dyn LinkCapability>>> {
            if type_a == "aws/lambda" && type_b == "aws/sqs_queue" {
                Ok(Some(Arc::new(LambdaToSqsLink)))
            } else {
                Ok(None)
            }
        }
    }

    fn make_registry() -> LinkRegistry {
        let mut providers: HashMap<String, Arc<dyn Provider>> = HashMap::new();
        providers.insert("aws".to_string(), Arc::new(LambdaProvider));
        LinkRegistry::new(providers)
    }

    #[tokio::test]
    async fn resolves_a_known_ordered_pair() {
        let registry = make_registry();
        let kind = registry.get_kind("aws/lambda", "aws/sqs_queue").await.unwrap();
        assert_eq!(kind, LinkKind::Hard);
    }

    #[tokio::test]
    async fn reversed_pair_is_not_found() {
        let registry = make_registry();
        let err = registry.get_kind("aws/sqs_queue", "aws/lambda").await.unwrap_err();
        assert!(matches!(err, Error::LinkImplementationNotFound { .. }));
    }

    #[tokio::test]
    async fn second_resolve_hits_the_cache() {
        let registry = make_registry();
        let first = registry.resolve("aws/lambda", "aws/sqs_queue").await.unwrap();
        let second = registry.resolve("aws/lambda", "aws/sqs_queue").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
