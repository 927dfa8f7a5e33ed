//! Host configuration (spec §4.6 ambient stack note, §4.7).
//!
//! A small configuration surface for the values the core itself needs: retry defaults
//! and the call stack depth limit. Built with [`figment`], the teacher's layering
//! approach (environment overriding defaults), trimmed to this crate's actual knobs —
//! the rest of the teacher's `Config` (server/auth/transport/backends) belongs to the
//! host process, not this library.

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::call_context::DEFAULT_CALL_STACK_LIMIT;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Host-tunable configuration for the plugin coordination layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// The retry policy applied when a capability does not supply its own (spec §6).
    pub default_retry_policy: RetryPolicy,
    /// Maximum function call stack depth before [`crate::error::Error::CallStackOverflow`]
    /// (spec §4.7).
    pub call_stack_limit: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_retry_policy: RetryPolicy::default(),
            call_stack_limit: DEFAULT_CALL_STACK_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Loads configuration layering, in increasing priority: compiled-in defaults, an
    /// optional YAML file at `path`, then `CORE_` prefixed environment variables — the
    /// same override order the teacher's host config uses.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML file exists but fails to parse, or if an
    /// environment variable's value cannot be coerced to its field's type.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::prefixed("CORE_"));

        figment
            .extract()
            .map_err(|err| Error::internal("config.load", err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_retry_engine_and_call_stack_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.call_stack_limit, DEFAULT_CALL_STACK_LIMIT);
        assert_eq!(config.default_retry_policy, RetryPolicy::default());
    }

    #[test]
    fn load_with_no_file_falls_back_to_defaults() {
        let config = CoreConfig::load(None).unwrap();
        assert_eq!(config.call_stack_limit, DEFAULT_CALL_STACK_LIMIT);
    }
}
