//! Counting semaphore with cancel-aware acquisition.
//!
//! A semaphore controls access to a pool of interchangeable units. `acquire`
//! takes one unit, blocking while none are available; `release` returns one
//! and wakes every blocked acquirer so each can re-check the count.
//!
//! # Release contract
//!
//! The count is not capped at its initial value. Calling [`Semaphore::release`]
//! more often than [`Semaphore::acquire`] grows the pool; callers must release
//! at most once per successful acquire. Excess releases are logged at `warn`
//! (see [`SyncConfig::warn_on_excess_release`]) but never rejected.
//!
//! # Example
//!
//! ```
//! use monitor_sync::sync::Semaphore;
//! use monitor_sync::Cx;
//!
//! let cx = Cx::new();
//! let sem = Semaphore::new(2);
//!
//! sem.acquire(&cx)?;
//! {
//!     let _permit = sem.acquire_permit(&cx)?;
//!     assert_eq!(sem.available_permits(), 0);
//! }
//! sem.release();
//! assert_eq!(sem.available_permits(), 2);
//! # Ok::<(), monitor_sync::Error>(())
//! ```

use std::sync::{Condvar, Mutex as StdMutex};

use crate::config::SyncConfig;
use crate::cx::Cx;
use crate::error::Error;
use crate::tracing_compat::{trace, warn};

/// Error returned when semaphore acquisition fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// Cancelled while waiting. No unit was taken.
    Cancelled,
}

impl std::fmt::Display for AcquireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "semaphore acquire cancelled"),
        }
    }
}

impl std::error::Error for AcquireError {}

/// Error returned by [`Semaphore::try_acquire`] when no unit is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryAcquireError;

impl std::fmt::Display for TryAcquireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no semaphore permits available")
    }
}

impl std::error::Error for TryAcquireError {}

/// A counting semaphore for limiting concurrent access.
#[derive(Debug)]
pub struct Semaphore {
    /// Number of available permits.
    permits: StdMutex<usize>,
    cvar: Condvar,
    /// Count at construction; only used for diagnostics.
    initial: usize,
    config: SyncConfig,
}

impl Semaphore {
    /// Creates a new semaphore with `permits` available units.
    ///
    /// Negative counts are unrepresentable, so construction cannot fail.
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            permits: StdMutex::new(permits),
            cvar: Condvar::new(),
            initial: permits,
            config: SyncConfig::default(),
        }
    }

    /// Creates a semaphore with explicit configuration.
    ///
    /// # Errors
    ///
    /// `ErrorKind::InvalidConfiguration` if the config fails validation.
    pub fn with_config(permits: usize, config: SyncConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(permits)
        })
    }

    /// Returns the number of currently available permits.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        *self.permits.lock().expect("semaphore lock poisoned")
    }

    /// Returns the count the semaphore was created with.
    #[must_use]
    pub fn initial_permits(&self) -> usize {
        self.initial
    }

    /// Takes one unit, blocking until one is available.
    ///
    /// # Errors
    ///
    /// [`AcquireError::Cancelled`] if `cx` is cancelled on entry or while
    /// blocked. The count is left untouched in that case.
    pub fn acquire(&self, cx: &Cx) -> Result<(), AcquireError> {
        let mut permits = self.permits.lock().expect("semaphore lock poisoned");
        loop {
            if cx.checkpoint().is_err() {
                cx.trace("semaphore::acquire cancelled");
                return Err(AcquireError::Cancelled);
            }
            if *permits > 0 {
                break;
            }
            trace!("semaphore::acquire waiting for a permit");
            let (guard, _) = self
                .cvar
                .wait_timeout(permits, self.config.cancel_poll_interval)
                .expect("semaphore lock poisoned");
            permits = guard;
        }
        *permits -= 1;
        trace!(available = *permits, "semaphore permit acquired");
        Ok(())
    }

    /// Takes one unit without blocking.
    ///
    /// # Errors
    ///
    /// [`TryAcquireError`] if no unit is available.
    pub fn try_acquire(&self) -> Result<(), TryAcquireError> {
        let mut permits = self.permits.lock().expect("semaphore lock poisoned");
        if *permits == 0 {
            return Err(TryAcquireError);
        }
        *permits -= 1;
        Ok(())
    }

    /// Like [`Self::acquire`], but returns a guard that releases on drop.
    ///
    /// # Errors
    ///
    /// [`AcquireError::Cancelled`] as for [`Self::acquire`].
    pub fn acquire_permit(&self, cx: &Cx) -> Result<SemaphorePermit<'_>, AcquireError> {
        self.acquire(cx)?;
        Ok(SemaphorePermit { semaphore: self })
    }

    /// Returns one unit and wakes all blocked acquirers. Never blocks.
    ///
    /// # Panics
    ///
    /// Panics if the count would overflow `usize`.
    pub fn release(&self) {
        let mut permits = self.permits.lock().expect("semaphore lock poisoned");
        *permits = permits
            .checked_add(1)
            .expect("semaphore permit count overflow");
        let available = *permits;
        drop(permits);
        self.cvar.notify_all();

        if available > self.initial && self.config.warn_on_excess_release {
            warn!(
                available,
                initial = self.initial,
                "semaphore released more permits than it was created with"
            );
        } else {
            trace!(available, "semaphore permit released");
        }
    }
}

/// A unit held from a semaphore; released on drop.
#[must_use = "permit will be immediately released if not held"]
#[derive(Debug)]
pub struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
}

impl SemaphorePermit<'_> {
    /// Forgets the permit without releasing it back to the semaphore.
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
