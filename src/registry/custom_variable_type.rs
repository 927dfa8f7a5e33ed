//! Custom variable type registry (spec §3, §4.4.3).

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use super::{find_provider_for_namespace, resolved_or_false};
use crate::capability::custom_variable_type::CustomVariableTypeCapability;
use crate::error::{Error, ItemKind, Result};
use crate::provider::Provider;
use crate::schema::CustomVariableOption;

/// Resolves and caches custom-variable-type capabilities across all registered
/// providers.
pub struct CustomVariableTypeRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    cache: DashMap<String, Arc<dyn CustomVariableTypeCapability>>,
}

impl CustomVariableTypeRegistry {
    /// Builds a registry over `providers`.
    #[must_use]
    pub fn new(providers: HashMap<String, Arc<dyn Provider>>) -> Self {
        Self {
            providers,
            cache: DashMap::new(),
        }
    }

    /// All custom variable types advertised by every registered provider.
    pub async fn list_types(&self) -> Result<Vec<String>> {
        let mut types = Vec::new();
        for provider in self.providers.values() {
            types.extend(provider.list_custom_variable_types().await?);
        }
        Ok(types)
    }

    async fn resolve(&self, item_type: &str) -> Result<Arc<dyn CustomVariableTypeCapability>> {
        if let Some(cached) = self.cache.get(item_type) {
            return Ok(Arc::clone(&cached));
        }

        let provider = find_provider_for_namespace(&self.providers, item_type)?;
        let capability = provider
            .resolve_custom_variable_type(item_type)
            .await?
            .ok_or_else(|| Error::ProviderItemTypeNotFound {
                provider: provider.namespace().to_string(),
                item_type: item_type.to_string(),
                kind: ItemKind::CustomVariableType,
            })?;

        debug!(item_type, "resolved custom variable type capability");
        self.cache.insert(item_type.to_string(), Arc::clone(&capability));
        Ok(capability)
    }

    /// Whether any registered provider implements `item_type` (spec §4.4.3 "has-kind
    /// predicate"); `false` for an unknown namespace or an unimplemented item, every
    /// other error still propagates.
    pub async fn has_custom_variable_type(&self, item_type: &str) -> Result<bool> {
        resolved_or_false(self.resolve(item_type).await)
    }

    /// A human-readable description of `item_type`.
    pub async fn description(&self, item_type: &str) -> Result<String> {
        Ok(self.resolve(item_type).await?.description().to_string())
    }

    /// Enumerates `item_type`'s fixed option set, rejecting a plugin that mixes scalar
    /// kinds across its own options (spec §3 invariant: "all options share the same
    /// primitive type").
    pub async fn enumerate_options(&self, item_type: &str) -> Result<Vec<CustomVariableOption>> {
        let options = self.resolve(item_type).await?.enumerate_options().await?;

        let mut expected_kind = None;
        for option in &options {
            let kind = scalar_kind(&option.value).ok_or_else(|| Error::BadInput {
                failure_reasons: vec![format!(
                    "custom variable type {item_type:?} option {:?} is not a scalar value",
                    option.label
                )],
            })?;
            match expected_kind {
                None => expected_kind = Some(kind),
                Some(expected) if expected != kind => {
                    return Err(Error::BadInput {
                        failure_reasons: vec![format!(
                            "custom variable type {item_type:?} mixes option kinds: found both {expected} and {kind}"
                        )],
                    })
                }
                Some(_) => {}
            }
        }

        Ok(options)
    }
}

fn scalar_kind(value: &Value) -> Option<&'static str> {
    match value {
        Value::String(_) => Some("string"),
        Value::Bool(_) => Some("boolean"),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some("integer"),
        Value::Number(_) => Some("float"),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
