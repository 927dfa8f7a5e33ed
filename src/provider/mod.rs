//! The provider record (spec §3 "Provider record").
//!
//! For a namespace, a provider exposes its namespace string, list-by-kind enumerations,
//! an on-demand resolver per item kind returning the capability object, and an optional
//! retry policy. Host adapters (spec §2 component 9, out of core scope beyond this
//! contract) implement this trait to plug a real plugin bundle into the registries.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::{
    CustomVariableTypeCapability, DataSourceCapability, FunctionCapability, LinkCapability,
    ResourceCapability,
};
use crate::error::Result;
use crate::retry::RetryPolicy;

/// A namespace-owning plugin bundle, fronting zero-or-more resources, data sources,
/// links, functions, and custom variable types.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so they can be stored in
/// `Arc<dyn Provider>` and shared across concurrent registry lookups, mirroring the
/// teacher's `Arc<dyn Provider>` / `Arc<dyn Transform>` convention.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// This provider's namespace, e.g. `"aws"`. Must be stable for the provider's
    /// lifetime; the host registers providers in a map keyed by this value.
    fn namespace(&self) -> &str;

    /// All resource type names this provider can resolve (full item types, namespace
    /// included).
    async fn list_resource_types(&self) -> Result<Vec<String>>;

    /// All data source type names this provider can resolve.
    async fn list_data_source_types(&self) -> Result<Vec<String>>;

    /// All custom variable type names this provider can resolve.
    async fn list_custom_variable_types(&self) -> Result<Vec<String>>;

    /// All function names this provider exposes.
    async fn list_function_names(&self) -> Result<Vec<String>>;

    /// Resolves a resource capability by full item type. Returns `Ok(None)` if this
    /// provider does not implement that specific resource (surfaced by the registry as
    /// `Error::ProviderItemTypeNotFound`), distinct from an `Err` (a genuine resolution
    /// failure).
    async fn resolve_resource(
        &self,
        item_type: &str,
    ) -> Result<Option<Arc<dyn ResourceCapability>>>;

    /// Resolves a data source capability by full item type.
    async fn resolve_data_source(
        &self,
        item_type: &str,
    ) -> Result<Option<Arc<dyn DataSourceCapability>>>;

    /// Resolves a custom variable type capability by full item type.
    async fn resolve_custom_variable_type(
        &self,
        item_type: &str,
    ) -> Result<Option<Arc<dyn CustomVariableTypeCapability>>>;

    /// Resolves a function capability by name.
    async fn resolve_function(&self, name: &str) -> Result<Option<Arc<dyn FunctionCapability>>>;

    /// Resolves a link capability for the ordered pair `(type_a, type_b)`. A provider
    /// that does not own this link pair returns `Ok(None)`; the link registry tries the
    /// next provider (spec §4.4.5 trial-and-error).
    async fn resolve_link(
        &self,
        type_a: &str,
        type_b: &str,
    ) -> Result<Option<Arc<dyn LinkCapability>>>;

    /// This provider's preferred retry policy, or `None` to use the host default.
    fn retry_policy(&self) -> Option<RetryPolicy> {
        None
    }
}
