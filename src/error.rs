//! Error types for the synchronization primitives.
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - Each primitive reports its own small `Copy` error enum from its blocking
//!   calls; those convert into the crate-level [`Error`] with `?`
//! - Construction and configuration failures are
//!   [`ErrorKind::InvalidConfiguration`]
//!
//! # Error Categories
//!
//! - **Cancellation**: a blocked wait observed a cancel request on its `Cx`
//! - **Configuration**: a primitive or `SyncConfig` was built with values
//!   that make it ill-defined (zero parties, zero poll interval, unparseable
//!   environment overrides)

use core::fmt;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::cx::CancelReason;
use crate::sync::{AcquireError, BarrierWaitError};

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation was cancelled while blocked.
    Cancelled,
    /// A barrier generation was aborted because another party was cancelled.
    BarrierBroken,
    /// A primitive or configuration was constructed with invalid values.
    InvalidConfiguration,
}

impl ErrorKind {
    /// Returns true if retrying the same call can succeed.
    ///
    /// A broken barrier generation is transient: the barrier has already
    /// been reset and a fresh `wait` joins the next generation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::BarrierBroken)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::BarrierBroken => write!(f, "barrier generation broken"),
            Self::InvalidConfiguration => write!(f, "invalid configuration"),
        }
    }
}

/// The main error type for monitor-sync operations.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if this error represents cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Creates a cancellation error from a structured reason.
    #[must_use]
    pub fn cancelled(reason: &CancelReason) -> Self {
        Self::new(ErrorKind::Cancelled).with_message(format!("{reason}"))
    }

    /// Creates an invalid-configuration error.
    #[must_use]
    pub fn invalid_configuration(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfiguration).with_message(detail)
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {msg}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<BarrierWaitError> for Error {
    fn from(err: BarrierWaitError) -> Self {
        match err {
            BarrierWaitError::Cancelled => Self::new(ErrorKind::Cancelled).with_source(err),
            BarrierWaitError::Broken => Self::new(ErrorKind::BarrierBroken).with_source(err),
        }
    }
}

impl From<AcquireError> for Error {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::Cancelled => Self::new(ErrorKind::Cancelled).with_source(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::InvalidConfiguration).with_source(err)
    }
}

/// Result alias using the crate error type.
pub type Result<T> = core::result::Result<T, Error>;
