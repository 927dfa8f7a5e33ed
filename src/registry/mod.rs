//! Item registries (spec §3 "Registries", §4.4).
//!
//! Five uniform per-kind registries — resource, data source, custom variable type,
//! function, link — each following the same resolution template: namespace lookup,
//! provider capability resolution, [`dashmap::DashMap`] caching, and error translation
//! into the stable [`crate::error::Error`] taxonomy. Retry-eligible operations are
//! wrapped by [`crate::retry::with_retry`] / [`crate::retry::with_retry_or_none`] using
//! the capability's own [`crate::retry::RetryPolicy`] if it supplies one, falling back to
//! a host default (spec §6).

pub mod custom_variable_type;
pub mod data_source;
pub mod function;
pub mod link;
pub mod resource;

pub use custom_variable_type::CustomVariableTypeRegistry;
pub use data_source::DataSourceRegistry;
pub use function::FunctionRegistry;
pub use link::LinkRegistry;
pub use resource::ResourceRegistry;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::identifier::extract_namespace;
use crate::provider::Provider;

/// Looks up the provider that owns `item_type`'s namespace, shared by the
/// resource/data-source/custom-variable-type registries (spec §4.4 "Namespace lookup").
pub(crate) fn find_provider_for_namespace<'a>(
    providers: &'a HashMap<String, Arc<dyn Provider>>,
    item_type: &str,
) -> Result<&'a Arc<dyn Provider>> {
    let namespace = extract_namespace(item_type);
    providers.get(namespace).ok_or_else(|| Error::ItemTypeProviderNotFound {
        namespace: namespace.to_string(),
        item_type: item_type.to_string(),
    })
}

/// Turns a resolution result into the "has-kind" predicate (spec §4.4 "Has-kind
/// predicate"): a provider-not-found or item-not-found error becomes `false`; every other
/// error still propagates.
pub(crate) fn resolved_or_false<T>(result: Result<T>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(Error::ItemTypeProviderNotFound { .. } | Error::ProviderItemTypeNotFound { .. }) => Ok(false),
        Err(other) => Err(other),
    }
}

/// Builds the `namespace -> provider` map every registry is constructed from, rejecting
/// two providers that claim the same namespace (spec §3 invariant "namespace uniqueness").
///
/// # Errors
///
/// Returns [`Error::Registration`] on the first duplicate namespace encountered.
pub fn build_provider_map(providers: Vec<Arc<dyn Provider>>) -> Result<HashMap<String, Arc<dyn Provider>>> {
    let mut map = HashMap::with_capacity(providers.len());
    for provider in providers {
        let namespace = provider.namespace().to_string();
        if map.insert(namespace.clone(), provider).is_some() {
            return Err(Error::Registration(format!(
                "namespace {namespace:?} is claimed by more than one provider"
            )));
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::capability::{
        CustomVariableTypeCapability, DataSourceCapability, FunctionCapability, LinkCapability,
        ResourceCapability,
    };

    struct StubProvider(&'static str);

    #[async_trait]
    impl Provider for StubProvider {
        fn namespace(&self) -> &str {
            self.0
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
        ) -> Result<Option<Arc<dyn ResourceCapability>>> {
            Ok(None)
        }

        async fn resolve_data_source(
            &self,
            _item_type: &str,
        ) -> Result<Option<Arc<dyn DataSourceCapability>>> {
            Ok(None)
        }

        async fn resolve_custom_variable_type(
            &self,
            _item_type: &str,
        ) -> Result<Option<Arc<dyn CustomVariableTypeCapability>>> {
            Ok(None)
        }

        async fn resolve_function(&self, _name: &str) -> Result<Option<Arc<dyn FunctionCapability>>> {
            Ok(None)
        }

        async fn resolve_link(
            &self,
            _type_a: &str,
            _type_b: &str,
        ) -> Result<Option<Arc<dyn LinkCapability>>> {
            Ok(None)
        }
    }

    #[test]
    fn build_provider_map_accepts_distinct_namespaces() {
        let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(StubProvider("aws")), Arc::new(StubProvider("gcp"))];
        let map = build_provider_map(providers).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn build_provider_map_rejects_a_duplicate_namespace() {
        let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(StubProvider("aws")), Arc::new(StubProvider("aws"))];
        let err = build_provider_map(providers).unwrap_err();
        assert!(matches!(err, Error::Registration(_)));
    }
}
