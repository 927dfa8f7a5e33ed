//! Error taxonomy for the plugin coordination layer
//!
//! Every variant carries a stable [`ReasonCode`] used for programmatic dispatch by
//! callers (state persistence, rollback) that need to distinguish user error from
//! internal/plugin error without string-matching messages.

use std::fmt;

use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Which item kind an error was raised against, used to tag
/// [`Error::ProviderItemTypeNotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A deployable resource.
    Resource,
    /// A read-only data source.
    DataSource,
    /// A custom variable type.
    CustomVariableType,
    /// A substitution function.
    Function,
    /// A link between two resource types.
    Link,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Resource => "resource",
            Self::DataSource => "data source",
            Self::CustomVariableType => "custom variable type",
            Self::Function => "function",
            Self::Link => "link",
        };
        f.write_str(s)
    }
}

/// Stable, programmatically-dispatchable reason code for every [`Error`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    /// No provider claims the namespace of this item type.
    ItemTypeProviderNotFound,
    /// The namespaced provider exists but does not implement this specific item.
    ProviderItemTypeNotFound,
    /// No provider has this function.
    FunctionNotFound,
    /// The nominated provider has no such function.
    ProviderFunctionNotFound,
    /// Two providers list the same function name.
    FunctionAlreadyProvided,
    /// No provider returned a non-nil link capability for the ordered pair.
    LinkImplementationNotFound,
    /// A resource spec schema node uses an unknown composite type.
    InvalidResourceSpecDefinition,
    /// Wraps a child error; signals the retry engine that another attempt is warranted.
    Retryable,
    /// Terminal failure deploying a resource.
    ResourceDeploy,
    /// Terminal failure destroying a resource.
    ResourceDestroy,
    /// `destroy` returned `destroyed = false`.
    ResourceNotDestroyed,
    /// Terminal failure in a link's update-resource-A step.
    LinkUpdateA,
    /// Terminal failure in a link's update-resource-B step.
    LinkUpdateB,
    /// Terminal failure in a link's update-intermediary-resources step.
    LinkUpdateIntermediary,
    /// User-supplied input is unrecoverable.
    BadInput,
    /// A namespace or function collision detected at registry construction time.
    Registration,
    /// The function call stack exceeded its configured bound.
    CallStackOverflow,
    /// A plugin-definition callback required for this operation was never supplied.
    MissingDefinitionCallback,
    /// Transport/marshaling failure talking to a plugin.
    Internal,
}

/// Errors raised by the plugin coordination layer.
#[derive(Error, Debug)]
pub enum Error {
    /// No provider is registered for the namespace of this item type.
    #[error("no provider found for namespace {namespace:?} (item type {item_type:?})")]
    ItemTypeProviderNotFound {
        /// The namespace extracted from `item_type`.
        namespace: String,
        /// The full item type that was being resolved.
        item_type: String,
    },

    /// The namespaced provider exists but returned no capability for this item.
    #[error("provider {provider:?} has no {kind} {item_type:?}")]
    ProviderItemTypeNotFound {
        /// The provider's namespace.
        provider: String,
        /// The full item type that was being resolved.
        item_type: String,
        /// The kind of item that was requested.
        kind: ItemKind,
    },

    /// No provider exposes a function with this name.
    #[error("no provider found for function {0:?}")]
    FunctionNotFound(String),

    /// The nominated provider has no such function.
    #[error("provider {provider:?} has no function {name:?}")]
    ProviderFunctionNotFound {
        /// The provider's namespace.
        provider: String,
        /// The function name that was requested.
        name: String,
    },

    /// Two distinct providers expose a function with the same name.
    #[error("function {name:?} is provided by both {first_provider:?} and {second_provider:?}")]
    FunctionAlreadyProvided {
        /// The colliding function name.
        name: String,
        /// The first provider that claims this function.
        first_provider: String,
        /// The second provider that claims this function.
        second_provider: String,
    },

    /// No provider returned a non-nil link capability for the ordered pair.
    #[error("no link implementation found for {type_a:?}::{type_b:?}")]
    LinkImplementationNotFound {
        /// The A side of the link pair.
        type_a: String,
        /// The B side of the link pair.
        type_b: String,
    },

    /// A resource spec schema node uses an unknown composite type.
    #[error("invalid resource spec definition: {0}")]
    InvalidResourceSpecDefinition(String),

    /// Wraps a transient failure a plugin signalled as worth retrying.
    #[error("retryable error: {0}")]
    Retryable(Box<Error>),

    /// Terminal failure deploying a resource; reasons are persisted verbatim as state.
    #[error("resource deploy failed: {}", join_reasons(.failure_reasons))]
    ResourceDeploy {
        /// Structured failure reasons, persisted verbatim by the orchestrator.
        failure_reasons: Vec<String>,
    },

    /// Terminal failure destroying a resource.
    #[error("resource destroy failed: {}", join_reasons(.failure_reasons))]
    ResourceDestroy {
        /// Structured failure reasons, persisted verbatim by the orchestrator.
        failure_reasons: Vec<String>,
    },

    /// `destroy` returned `destroyed = false` without raising its own error.
    #[error("resource {0:?} reported destroyed = false")]
    ResourceNotDestroyed(String),

    /// Terminal failure in a link's update-resource-A step.
    #[error("link update (resource A) failed: {}", join_reasons(.failure_reasons))]
    LinkUpdateA {
        /// Structured failure reasons, persisted verbatim by the orchestrator.
        failure_reasons: Vec<String>,
    },

    /// Terminal failure in a link's update-resource-B step.
    #[error("link update (resource B) failed: {}", join_reasons(.failure_reasons))]
    LinkUpdateB {
        /// Structured failure reasons, persisted verbatim by the orchestrator.
        failure_reasons: Vec<String>,
    },

    /// Terminal failure in a link's update-intermediary-resources step.
    #[error("link update (intermediary resources) failed: {}", join_reasons(.failure_reasons))]
    LinkUpdateIntermediary {
        /// Structured failure reasons, persisted verbatim by the orchestrator.
        failure_reasons: Vec<String>,
    },

    /// User-supplied input is unrecoverable; distinct from internal/plugin error.
    #[error("bad input: {}", join_reasons(.failure_reasons))]
    BadInput {
        /// Structured failure reasons.
        failure_reasons: Vec<String>,
    },

    /// A namespace or function collision detected at registry construction time.
    #[error("registration error: {0}")]
    Registration(String),

    /// The function call stack exceeded its configured bound.
    #[error("call stack overflow: exceeded {limit} frames")]
    CallStackOverflow {
        /// The configured maximum depth.
        limit: usize,
    },

    /// A plugin-definition callback required for this operation was never supplied.
    #[error("plugin definition for {item_type:?} has no {operation} callback")]
    MissingDefinitionCallback {
        /// The item type the definition was registered under.
        item_type: String,
        /// The name of the missing operation.
        operation: &'static str,
    },

    /// Transport or marshaling failure talking to a plugin, tagged with the action that
    /// triggered it.
    #[error("internal error during {action}: {message}")]
    Internal {
        /// The registry action being performed (e.g. `"deploy"`, `"fetch"`).
        action: &'static str,
        /// The underlying error message.
        message: String,
    },

    /// The retry loop's cancellation signal fired before the operation completed.
    #[error("operation cancelled")]
    Cancelled,
}

fn join_reasons(reasons: &[String]) -> String {
    if reasons.is_empty() {
        "(no reasons given)".to_string()
    } else {
        reasons.join("; ")
    }
}

impl Error {
    /// The stable reason code for this error, used for programmatic dispatch.
    #[must_use]
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            Self::ItemTypeProviderNotFound { .. } => ReasonCode::ItemTypeProviderNotFound,
            Self::ProviderItemTypeNotFound { .. } => ReasonCode::ProviderItemTypeNotFound,
            Self::FunctionNotFound(_) => ReasonCode::FunctionNotFound,
            Self::ProviderFunctionNotFound { .. } => ReasonCode::ProviderFunctionNotFound,
            Self::FunctionAlreadyProvided { .. } => ReasonCode::FunctionAlreadyProvided,
            Self::LinkImplementationNotFound { .. } => ReasonCode::LinkImplementationNotFound,
            Self::InvalidResourceSpecDefinition(_) => ReasonCode::InvalidResourceSpecDefinition,
            Self::Retryable(_) => ReasonCode::Retryable,
            Self::ResourceDeploy { .. } => ReasonCode::ResourceDeploy,
            Self::ResourceDestroy { .. } => ReasonCode::ResourceDestroy,
            Self::ResourceNotDestroyed(_) => ReasonCode::ResourceNotDestroyed,
            Self::LinkUpdateA { .. } => ReasonCode::LinkUpdateA,
            Self::LinkUpdateB { .. } => ReasonCode::LinkUpdateB,
            Self::LinkUpdateIntermediary { .. } => ReasonCode::LinkUpdateIntermediary,
            Self::BadInput { .. } => ReasonCode::BadInput,
            Self::Registration(_) => ReasonCode::Registration,
            Self::CallStackOverflow { .. } => ReasonCode::CallStackOverflow,
            Self::MissingDefinitionCallback { .. } => ReasonCode::MissingDefinitionCallback,
            Self::Internal { .. } | Self::Cancelled => ReasonCode::Internal,
        }
    }

    /// Whether the retry engine should attempt this error again.
    ///
    /// Only [`Error::Retryable`] is retryable; every other variant is terminal by
    /// construction (see spec §7).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }

    /// Wraps `self` so the retry engine treats it as worth another attempt.
    #[must_use]
    pub fn retryable(self) -> Self {
        Self::Retryable(Box::new(self))
    }

    /// Unwraps one layer of [`Error::Retryable`], if present, returning the inner error.
    #[must_use]
    pub fn into_retryable_inner(self) -> Self {
        match self {
            Self::Retryable(inner) => *inner,
            other => other,
        }
    }

    /// Wraps a transport/marshaling error as [`Error::Internal`], tagged with the
    /// registry action that was being performed.
    #[must_use]
    pub fn internal(action: &'static str, message: impl Into<String>) -> Self {
        Self::Internal {
            action,
            message: message.into(),
        }
    }
}

/// Extracts the structured failure reasons carried by an error, where applicable.
///
/// Implemented for [`Error`] itself; higher layers (state persistence, rollback) use this
/// to assemble a failure report without matching on every variant.
pub trait FailureReasons {
    /// Returns the failure reasons carried by this error, or an empty slice if this
    /// error kind does not carry structured reasons.
    fn failure_reasons(&self) -> &[String];
}

impl FailureReasons for Error {
    fn failure_reasons(&self) -> &[String] {
        match self {
            Self::ResourceDeploy { failure_reasons }
            | Self::ResourceDestroy { failure_reasons }
            | Self::LinkUpdateA { failure_reasons }
            | Self::LinkUpdateB { failure_reasons }
            | Self::LinkUpdateIntermediary { failure_reasons }
            | Self::BadInput { failure_reasons } => failure_reasons,
            _ => &[],
        }
    }
}
