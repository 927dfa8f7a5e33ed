//! Function registry (spec §3, §4.4.4, §4.7).
//!
//! Function names are globally unique across all providers (spec §3 invariant):
//! construction fails with [`Error::FunctionAlreadyProvided`] if two providers claim the
//! same name. Each call context gets its own [`CallStack`] via [`FunctionRegistry::for_call_context`]
//! so concurrent substitution evaluations never interleave frames, while still sharing
//! the resolved-capability cache and the provider/ownership index.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::call_context::{CallFrame, CallStack, CallStackGuard, DEFAULT_CALL_STACK_LIMIT};
use crate::capability::function::{FunctionCapability, FunctionDefinition, FunctionValueRef};
use crate::error::{Error, Result};
use crate::provider::Provider;

struct Shared {
    providers: HashMap<String, Arc<dyn Provider>>,
    owner_by_function: HashMap<String, String>,
    cache: DashMap<String, Arc<dyn FunctionCapability>>,
}

/// Resolves, caches, and invokes function capabilities, enforcing global name
/// uniqueness and tracking a bounded call stack for recursion/location diagnostics.
pub struct FunctionRegistry {
    shared: Arc<Shared>,
    call_stack: Mutex<CallStack>,
}

impl FunctionRegistry {
    /// Builds a registry over `providers`, bounding each call context's stack at
    /// `call_stack_limit` frames.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FunctionAlreadyProvided`] if two providers expose the same
    /// function name.
    pub async fn new(
        providers: HashMap<String, Arc<dyn Provider>>,
        call_stack_limit: usize,
    ) -> Result<Self> {
        let mut owner_by_function: HashMap<String, String> = HashMap::new();
        for (namespace, provider) in &providers {
            for name in provider.list_function_names().await? {
                if let Some(first_provider) = owner_by_function.get(&name) {
                    return Err(Error::FunctionAlreadyProvided {
                        name,
                        first_provider: first_provider.clone(),
                        second_provider: namespace.clone(),
                    });
                }
                owner_by_function.insert(name, namespace.clone());
            }
        }

        Ok(Self {
            shared: Arc::new(Shared {
                providers,
                owner_by_function,
                cache: DashMap::new(),
            }),
            call_stack: Mutex::new(CallStack::new(call_stack_limit)),
        })
    }

    /// Builds a registry with the default call stack limit (spec §4.7).
    ///
    /// # Errors
    ///
    /// Returns [`Error::FunctionAlreadyProvided`] if two providers expose the same
    /// function name.
    pub async fn with_default_limit(providers: HashMap<String, Arc<dyn Provider>>) -> Result<Self> {
        Self::new(providers, DEFAULT_CALL_STACK_LIMIT).await
    }

    /// Returns a sibling registry sharing this one's resolved-capability cache and
    /// ownership index but starting from a fresh, independent call stack — one per
    /// concurrent substitution-evaluation context (spec §4.7).
    #[must_use]
    pub fn for_call_context(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            call_stack: Mutex::new(CallStack::new(self.call_stack.lock().limit())),
        }
    }

    /// All function names across every registered provider.
    #[must_use]
    pub fn list_names(&self) -> Vec<String> {
        self.shared.owner_by_function.keys().cloned().collect()
    }

    /// This call context's current stack depth.
    #[must_use]
    pub fn call_depth(&self) -> usize {
        self.call_stack.lock().depth()
    }

    async fn resolve(&self, name: &str) -> Result<Arc<dyn FunctionCapability>> {
        if let Some(cached) = self.shared.cache.get(name) {
            return Ok(Arc::clone(&cached));
        }

        let provider_namespace = self
            .shared
            .owner_by_function
            .get(name)
            .ok_or_else(|| Error::FunctionNotFound(name.to_string()))?;
        let provider = self.shared.providers.get(provider_namespace).ok_or_else(|| {
            Error::FunctionNotFound(name.to_string())
        })?;

        let capability = provider
            .resolve_function(name)
            .await?
            .ok_or_else(|| Error::ProviderFunctionNotFound {
                provider: provider.namespace().to_string(),
                name: name.to_string(),
            })?;

        self.shared.cache.insert(name.to_string(), Arc::clone(&capability));
        Ok(capability)
    }

    /// This function's calling convention.
    pub async fn get_definition(&self, name: &str) -> Result<FunctionDefinition> {
        Ok(self.resolve(name).await?.get_definition())
    }

    /// Invokes `name` at `location` with positional `args`, pushing a call-stack frame
    /// for the duration of the call (spec §4.7). Overflow is reported via
    /// [`Error::CallStackOverflow`] and is never retried.
    pub async fn call(&self, name: &str, location: &str, args: Vec<Value>) -> Result<Value> {
        let capability = self.resolve(name).await?;

        let _guard = CallStackGuard::push(
            &self.call_stack,
            CallFrame {
                function_name: name.to_string(),
                location: location.to_string(),
            },
        )?;
        debug!(function_name = name, location, depth = self.call_stack.lock().depth(), "calling function");

        capability.call(args).await
    }

    /// Resolves `value_ref.function_name` and invokes it with `value_ref.partial_args`
    /// spliced into `call_args` (spec §4.4.4 higher-order function references).
    pub async fn call_value_ref(
        &self,
        value_ref: &FunctionValueRef,
        location: &str,
        call_args: &[Value],
    ) -> Result<Value> {
        let spliced = value_ref.splice_args(call_args);
        self.call(&value_ref.function_name, location, spliced).await
    }
}
