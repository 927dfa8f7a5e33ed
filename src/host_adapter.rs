//! Host adapter surface (spec §2 component 9, §6 "External interfaces").
//!
//! Host adapters convert a registered plugin handle into the [`crate::provider::Provider`]
//! contract this crate consumes; the adapter's own transport (gRPC, subprocess, in-process)
//! is out of core scope. What *is* in scope is the small, pure grammar this crate asks
//! every host adapter to agree on: how a plugin's dotted identifier maps to the namespace
//! used in item types, and how two semver-ish protocol strings are compared for
//! compatibility.

use std::fmt;

/// Extracts the namespace a plugin identifier contributes to item types (spec §6
/// "Plugin identifiers"): `{hostname "/"}? namespace "/" name`, where the trailing `name`
/// segment is always the namespace used downstream.
///
/// `"registry.example.com/acme/aws"` and `"acme/aws"` both yield `"aws"`; an identifier
/// with no `/` at all is itself the namespace.
#[must_use]
pub fn plugin_namespace(plugin_identifier: &str) -> &str {
    match plugin_identifier.rsplit_once('/') {
        Some((_rest, name)) => name,
        None => plugin_identifier,
    }
}

/// A plugin's advertised `MAJOR.MINOR` protocol version (spec §6 "Plugin protocol
/// versioning").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    /// The major version component.
    pub major: u32,
    /// The minor version component.
    pub minor: u32,
}

/// A version string could not be parsed as `MAJOR.MINOR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProtocolVersionError(String);

impl fmt::Display for ParseProtocolVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid protocol version {:?}, expected MAJOR.MINOR", self.0)
    }
}

impl std::error::Error for ParseProtocolVersionError {}

impl ProtocolVersion {
    /// Parses a `"MAJOR.MINOR"` string.
    ///
    /// # Errors
    ///
    /// Returns [`ParseProtocolVersionError`] if `s` is not exactly two dot-separated
    /// non-negative integers.
    pub fn parse(s: &str) -> Result<Self, ParseProtocolVersionError> {
        let (major_str, minor_str) = s
            .split_once('.')
            .ok_or_else(|| ParseProtocolVersionError(s.to_string()))?;
        let major = major_str
            .parse()
            .map_err(|_| ParseProtocolVersionError(s.to_string()))?;
        let minor = minor_str
            .parse()
            .map_err(|_| ParseProtocolVersionError(s.to_string()))?;
        Ok(Self { major, minor })
    }

    /// Whether a host running this version supports a plugin advertising `plugin_version`
    /// (spec §6): they must share `major`, and the plugin's `minor` must be at least the
    /// host's.
    #[must_use]
    pub fn supports(&self, plugin_version: ProtocolVersion) -> bool {
        self.major == plugin_version.major && plugin_version.minor >= self.minor
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
