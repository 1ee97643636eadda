//! The cancellation context `Cx`.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::Error;
use crate::tracing_compat::{debug, trace};

/// Why a context was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelKind {
    /// Explicit cancellation requested by user code.
    User,
    /// Cancellation because the owning program is shutting down.
    Shutdown,
}

impl CancelKind {
    /// Returns the severity of this cancellation kind.
    ///
    /// Higher severity wins when a context is cancelled more than once.
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::User => 0,
            Self::Shutdown => 1,
        }
    }
}

impl fmt::Display for CancelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Structured cancellation reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReason {
    kind: CancelKind,
    message: Option<&'static str>,
}

impl CancelReason {
    /// Creates a reason of the given kind with no message.
    #[must_use]
    pub const fn new(kind: CancelKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// A plain user cancellation.
    #[must_use]
    pub const fn user() -> Self {
        Self::new(CancelKind::User)
    }

    /// Attaches a static message.
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> CancelKind {
        self.kind
    }

    /// Returns the message, if any.
    #[must_use]
    pub const fn message(&self) -> Option<&'static str> {
        self.message
    }

    /// Keeps whichever of `self` and `other` is more severe.
    fn strengthen(&mut self, other: Self) {
        if other.kind.severity() > self.kind.severity() {
            *self = other;
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(msg) = self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CxInner {
    cancel_requested: bool,
    cancel_reason: Option<CancelReason>,
}

/// Cancellation context passed to blocking operations.
///
/// Clones share the cancel request: cancelling any clone cancels all of
/// them. The mask is per handle; a clone starts unmasked, so
/// [`Self::masked`] on one thread never defers cancellation for a clone
/// held by another thread.
#[derive(Debug, Default)]
pub struct Cx {
    inner: Arc<RwLock<CxInner>>,
    mask_depth: AtomicU32,
}

impl Clone for Cx {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            mask_depth: AtomicU32::new(0),
        }
    }
}

struct MaskGuard<'a> {
    depth: &'a AtomicU32,
}

impl Drop for MaskGuard<'_> {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Cx {
    /// Creates a fresh, uncancelled context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self::new()
    }

    /// Returns true if cancellation has been requested.
    ///
    /// This ignores masking; see [`Self::checkpoint`] for the masked view.
    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.inner.read().expect("lock poisoned").cancel_requested
    }

    /// Checks for cancellation and returns an error if cancelled.
    ///
    /// Inside [`Self::masked`] this returns `Ok(())` even when cancellation
    /// is pending; the request is observed once the mask is released.
    ///
    /// # Errors
    ///
    /// Returns an error of kind `ErrorKind::Cancelled` if cancellation is
    /// pending and the context is not masked.
    pub fn checkpoint(&self) -> Result<(), Error> {
        let inner = self.inner.read().expect("lock poisoned");
        if !inner.cancel_requested || self.is_masked() {
            return Ok(());
        }
        let reason = inner.cancel_reason.clone().unwrap_or_else(CancelReason::user);
        drop(inner);
        trace!(reason = %reason, "checkpoint observed cancellation");
        Err(Error::cancelled(&reason))
    }

    /// Requests cancellation with [`CancelKind::User`].
    pub fn cancel(&self) {
        self.cancel_with(CancelKind::User, None);
    }

    /// Requests cancellation with a kind and optional message.
    ///
    /// Cancelling an already-cancelled context keeps the more severe reason.
    pub fn cancel_with(&self, kind: CancelKind, message: Option<&'static str>) {
        let mut reason = CancelReason::new(kind);
        if let Some(msg) = message {
            reason = reason.with_message(msg);
        }
        {
            let mut inner = self.inner.write().expect("lock poisoned");
            inner.cancel_requested = true;
            match inner.cancel_reason.as_mut() {
                Some(existing) => existing.strengthen(reason),
                None => inner.cancel_reason = Some(reason),
            }
        }
        debug!(cancel_kind = ?kind, cancel_message = message, "cancel requested");
    }

    /// Sets or clears the cancel flag directly.
    ///
    /// Clearing also drops the recorded reason.
    pub fn set_cancel_requested(&self, value: bool) {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.cancel_requested = value;
        if !value {
            inner.cancel_reason = None;
        }
    }

    /// Returns the recorded cancellation reason, if any.
    #[must_use]
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        self.inner.read().expect("lock poisoned").cancel_reason.clone()
    }

    /// Runs `f` with cancellation deferred.
    ///
    /// Blocking waits inside `f` are uninterruptible: they ignore pending
    /// cancellation until they complete normally.
    ///
    /// Only waits given this handle are masked; other clones still observe
    /// the cancel request.
    pub fn masked<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.mask_depth.fetch_add(1, Ordering::AcqRel);
        let _guard = MaskGuard {
            depth: &self.mask_depth,
        };
        f()
    }

    /// Returns true while inside [`Self::masked`].
    #[must_use]
    pub fn is_masked(&self) -> bool {
        self.mask_depth.load(Ordering::Acquire) > 0
    }

    /// Emits a trace-level event for this context.
    pub fn trace(&self, message: &str) {
        trace!(message = %message, cancel_requested = self.is_cancel_requested());
    }
}
