//! Plugin coordination layer for a blueprint-based deployment framework.
//!
//! A host constructs per-kind registries from a namespace → [`provider::Provider`]
//! mapping. Higher-level orchestration code asks a registry to perform an operation on
//! a typed item; the registry resolves the owning provider's capability object, invokes
//! it, applies retry policy to transient failures, and surfaces structured errors from
//! the stable [`error::Error`] taxonomy.
//!
//! # Modules
//!
//! - [`identifier`] — item type / link type string parsing.
//! - [`error`] — the error taxonomy and stable reason codes.
//! - [`retry`] — the retry/backoff engine.
//! - [`schema`] — resource spec schemas and change records.
//! - [`call_context`] — the bounded function call stack.
//! - [`capability`] — one capability trait per item kind.
//! - [`provider`] — the provider record.
//! - [`registry`] — the five per-kind item registries.
//! - [`deploy_service`] — the narrow façade link implementations use to touch
//!   intermediary resources.
//! - [`definition`] — callback-driven builders satisfying each capability trait.
//! - [`config`] — host-tunable retry defaults and call stack limit.
//! - [`host_adapter`] — the grammar host adapters agree on: plugin identifier →
//!   namespace, and protocol version negotiation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod call_context;
pub mod capability;
pub mod config;
pub mod definition;
pub mod deploy_service;
pub mod error;
pub mod host_adapter;
pub mod identifier;
pub mod provider;
pub mod registry;
pub mod retry;
pub mod schema;

pub use error::{Error, Result};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes structured logging for a host process embedding this crate.
///
/// `level` is used as the fallback filter when `RUST_LOG` is unset; `format` selects
/// `"json"` for machine-readable output or anything else (including `None`) for the
/// default human-readable format.
///
/// # Errors
///
/// This never fails in practice — [`tracing_subscriber`]'s global init only panics on a
/// double-initialization, which callers are responsible for avoiding — but returns
/// [`Result`] to leave room for a future fallible sink.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber.with(fmt::layer().json()).init(),
        _ => subscriber.with(fmt::layer()).init(),
    }

    Ok(())
}
