//! Data source registry (spec §3, §4.4.2).

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{find_provider_for_namespace, resolved_or_false};
use crate::capability::data_source::DataSourceCapability;
use crate::error::{Error, ItemKind, Result};
use crate::provider::Provider;
use crate::retry::{with_retry_or_none, RetryPolicy};
use crate::schema::SchemaNode;

/// Resolves, caches, and drives data-source capabilities across all registered
/// providers.
pub struct DataSourceRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    cache: DashMap<String, Arc<dyn DataSourceCapability>>,
    default_retry_policy: RetryPolicy,
    cancel: CancellationToken,
}

impl DataSourceRegistry {
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

    /// Replaces this registry's cancellation token.
    #[must_use]
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// All data source types advertised by every registered provider.
    pub async fn list_types(&self) -> Result<Vec<String>> {
        let mut types = Vec::new();
        for provider in self.providers.values() {
            types.extend(provider.list_data_source_types().await?);
        }
        Ok(types)
    }

    async fn resolve(&self, item_type: &str) -> Result<Arc<dyn DataSourceCapability>> {
        if let Some(cached) = self.cache.get(item_type) {
            return Ok(Arc::clone(&cached));
        }

        let provider = find_provider_for_namespace(&self.providers, item_type)?;
        let capability = provider
            .resolve_data_source(item_type)
            .await?
            .ok_or_else(|| Error::ProviderItemTypeNotFound {
                provider: provider.namespace().to_string(),
                item_type: item_type.to_string(),
                kind: ItemKind::DataSource,
            })?;

        debug!(item_type, "resolved data source capability");
        self.cache.insert(item_type.to_string(), Arc::clone(&capability));
        Ok(capability)
    }

    /// Whether any registered provider implements `item_type` (spec §4.4 "Has-kind
    /// predicate"); `false` for an unknown namespace or an unimplemented item, every
    /// other error still propagates.
    pub async fn has_data_source_type(&self, item_type: &str) -> Result<bool> {
        resolved_or_false(self.resolve(item_type).await)
    }

    /// Plugin-specific validation beyond the spec schema.
    pub async fn custom_validate(&self, item_type: &str, spec: &Value) -> Result<Vec<String>> {
        self.resolve(item_type).await?.custom_validate(spec).await
    }

    /// The data source's queryable-field schema.
    pub async fn get_spec_definition(&self, item_type: &str) -> Result<SchemaNode> {
        self.resolve(item_type).await?.get_spec_definition().await
    }

    /// The fields `item_type` allows filtering on.
    pub async fn get_filter_fields(&self, item_type: &str) -> Result<Vec<String>> {
        self.resolve(item_type).await?.get_filter_fields().await
    }

    /// Fetches matching data, retrying transient failures under the capability's retry
    /// policy. Exhaustion degrades to `Ok(None)` rather than propagating the last error
    /// (spec §4.4.2, §9 Open Questions).
    pub async fn fetch(&self, item_type: &str, filter: &Value) -> Result<Option<Value>> {
        let capability = self.resolve(item_type).await?;
        let policy = capability.retry_policy().unwrap_or(self.default_retry_policy);
        with_retry_or_none(policy, "data_source.fetch", &self.cancel, || {
            let capability = Arc::clone(&capability);
            let filter = filter.clone();
            async move { capability.fetch(&filter).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PrimitiveType, SchemaMeta};
    use async_trait::async_trait;
    use serde_json::json;

    struct AlwaysUnavailableDataSource;

    #[async_trait]
    impl DataSourceCapability for AlwaysUnavailableDataSource {
        fn get_type(&self) -> &str {
            "aws/vpc"
        }

        fn type_description(&self) -> &str {
            "a vpc lookup"
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

        async fn get_filter_fields(&self) -> Result<Vec<String>> {
            Ok(vec!["cidr".to_string()])
        }

        async fn fetch(&self, _filter: &Value) -> Result<Value> {
            Err(Error::internal("fetch", "unavailable").retryable())
        }

        fn retry_policy(&self) -> Option<RetryPolicy> {
            Some(RetryPolicy {
                max_retries: 1,
                first_retry_delay: 0.0,
                max_delay: Some(0.0),
                backoff_factor: 1.0,
                jitter: false,
            })
        }
    }

    struct VpcProvider;

    #[async_trait]
    impl Provider for VpcProvider {
        fn namespace(&self) -> &str {
            "aws"
        }

        async fn list_resource_types(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }

        async fn list_data_source_types(&self) -> Result<Vec<String>> {
            Ok(vec!["aws/vpc".to_string()])
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
            item_type: &str,
        ) -> Result<Option<Arc<dyn DataSourceCapability>>> {
            if item_type == "aws/vpc" {
                Ok(Some(Arc::new(AlwaysUnavailableDataSource)))
            } else {
                Ok(None)
            }
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

    #[tokio::test]
    async fn fetch_exhaustion_degrades_to_none_instead_of_an_error() {
        let mut providers: HashMap<String, Arc<dyn Provider>> = HashMap::new();
        providers.insert("aws".to_string(), Arc::new(VpcProvider));
        let registry = DataSourceRegistry::new(providers, RetryPolicy::default());

        let result = registry.fetch("aws/vpc", &json!({"cidr": "10.0.0.0/16"})).await.unwrap();
        assert_eq!(result, None);
    }
}
