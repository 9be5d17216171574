//! Error types for the engine orchestrator and its bundled backends.

use crate::mode::EngineMode;
use std::fmt;

/// Which core slot an operation needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreRole {
    Query,
    Mutation,
}

impl fmt::Display for CoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreRole::Query => f.write_str("query"),
            CoreRole::Mutation => f.write_str("mutation"),
        }
    }
}

/// All errors the engine surface can return.
///
/// The orchestrator never swallows a backend failure; it only guarantees
/// that mode bookkeeping is consistent before the error is re-raised.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The requested operation is invalid for the current mode. Never
    /// retried; the caller must re-sequence its calls.
    #[error("engine is {actual}, operation requires {required}")]
    ModeConflict {
        required: EngineMode,
        actual: EngineMode,
    },

    /// A capability was used with no backend in the slot. Recoverable by
    /// calling `process` first.
    #[error("no {0} core configured; call process() first")]
    NotConfigured(CoreRole),

    /// A core instance was used before `initialize` completed or after
    /// `dispose`.
    #[error("core is not initialized; call initialize() first")]
    NotInitialized,

    /// A core was handed configuration it cannot act on.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The target identifier is not a valid URL.
    #[error("invalid target: {0}")]
    InvalidTarget(#[from] url::ParseError),

    /// The static fetch failed at the transport level.
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The static fetch completed with a non-success status.
    #[error("fetch of {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The selector string was rejected by the selector engine.
    #[error("invalid selector {0:?}")]
    Selector(String),

    /// No element matched a selector that an operation required.
    #[error("no element matched selector {0:?}")]
    NoMatch(String),

    /// Browser launch, navigation, or evaluation failed.
    #[error("browser failure: {0}")]
    Browser(String),

    /// Navigation did not complete within the configured timeout.
    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },
}

impl EngineError {
    /// Shorthand for the mode guard failure.
    pub fn mode_conflict(required: EngineMode, actual: EngineMode) -> Self {
        Self::ModeConflict { required, actual }
    }

    /// Whether this error came from an external backend rather than from
    /// the orchestrator's own sequencing rules.
    pub fn is_backend_failure(&self) -> bool {
        !matches!(
            self,
            Self::ModeConflict { .. } | Self::NotConfigured(_) | Self::NotInitialized
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
