//! Barrier for N-way rendezvous with cancel-aware waiting.
//!
//! The barrier trips when `parties` callers have arrived. Exactly one
//! caller observes `is_leader = true` per generation. Tripping resets the
//! arrival count in the same critical section that wakes the waiters, so the
//! barrier is immediately reusable.
//!
//! # Cancellation
//!
//! A party whose `Cx` is cancelled before its generation trips returns
//! [`BarrierWaitError::Cancelled`] and *breaks* the generation: the other
//! parties of that generation return [`BarrierWaitError::Broken`] instead of
//! waiting for an arrival that will never come. The barrier then starts a
//! fresh generation.
//!
//! Repeated cancellation means no generation ever trips; parties are never
//! stranded, but callers that retry on `Broken` must bound their retries.
//! Wrap the call in [`Cx::masked`] to make a wait uninterruptible.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex as StdMutex};

use crate::config::SyncConfig;
use crate::cx::Cx;
use crate::error::Error;
use crate::tracing_compat::{debug, trace};

/// Error returned when waiting on a barrier fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierWaitError {
    /// Cancelled while waiting.
    Cancelled,
    /// Another party of this generation was cancelled.
    Broken,
}

impl std::fmt::Display for BarrierWaitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "barrier wait cancelled"),
            Self::Broken => write!(f, "barrier generation broken by a cancelled party"),
        }
    }
}

impl std::error::Error for BarrierWaitError {}

/// Outcome flag shared by the waiters of one generation.
#[derive(Debug)]
struct Generation {
    id: u64,
    broken: AtomicBool,
}

impl Generation {
    fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            broken: AtomicBool::new(false),
        })
    }
}

#[derive(Debug)]
struct BarrierState {
    arrived: usize,
    generation: Arc<Generation>,
}

impl BarrierState {
    /// Ends the current generation and opens the next one.
    fn advance(&mut self, broken: bool) {
        self.generation.broken.store(broken, Ordering::Release);
        self.arrived = 0;
        self.generation = Generation::new(self.generation.id.wrapping_add(1));
    }
}

/// Barrier for N-way rendezvous.
#[derive(Debug)]
pub struct Barrier {
    parties: usize,
    state: StdMutex<BarrierState>,
    cvar: Condvar,
    config: SyncConfig,
}

impl Barrier {
    /// Creates a new barrier that trips when `parties` have arrived.
    ///
    /// # Errors
    ///
    /// `ErrorKind::InvalidConfiguration` if `parties == 0`.
    pub fn new(parties: usize) -> Result<Self, Error> {
        Self::with_config(parties, SyncConfig::default())
    }

    /// Creates a barrier with explicit configuration.
    ///
    /// # Errors
    ///
    /// `ErrorKind::InvalidConfiguration` if `parties == 0` or the config
    /// fails validation.
    pub fn with_config(parties: usize, config: SyncConfig) -> Result<Self, Error> {
        if parties == 0 {
            return Err(Error::invalid_configuration(
                "barrier requires at least 1 party",
            ));
        }
        config.validate()?;
        Ok(Self {
            parties,
            state: StdMutex::new(BarrierState {
                arrived: 0,
                generation: Generation::new(0),
            }),
            cvar: Condvar::new(),
            config,
        })
    }

    /// Returns the number of parties required to trip the barrier.
    #[must_use]
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Returns how many parties are waiting in the current generation.
    #[must_use]
    pub fn arrived(&self) -> usize {
        self.state.lock().expect("barrier lock poisoned").arrived
    }

    /// Returns the number of generations that have ended (tripped or broken).
    ///
    /// Only generations with at least one waiting party can break, so a
    /// cancelled call on an idle barrier leaves this unchanged.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.lock().expect("barrier lock poisoned").generation.id
    }

    /// Waits for the barrier to trip.
    ///
    /// # Errors
    ///
    /// - [`BarrierWaitError::Cancelled`] if `cx` is cancelled before this
    ///   generation trips; the generation is broken for everyone else.
    /// - [`BarrierWaitError::Broken`] if another party of this generation was
    ///   cancelled.
    pub fn wait(&self, cx: &Cx) -> Result<BarrierWaitResult, BarrierWaitError> {
        cx.trace("barrier::wait starting");

        let mut state = self.state.lock().expect("barrier lock poisoned");

        if cx.checkpoint().is_err() {
            // Nobody is waiting on an empty generation; leave it open.
            if state.arrived > 0 {
                self.break_generation(&mut state);
            }
            cx.trace("barrier::wait cancelled before arrival");
            return Err(BarrierWaitError::Cancelled);
        }

        let generation = Arc::clone(&state.generation);
        state.arrived += 1;
        trace!(
            generation = generation.id,
            arrived = state.arrived,
            parties = self.parties,
            "barrier arrival"
        );

        if state.arrived == self.parties {
            state.advance(false);
            drop(state);
            self.cvar.notify_all();
            debug!(generation = generation.id, "barrier tripped");
            cx.trace("barrier::wait leader");
            return Ok(BarrierWaitResult { is_leader: true });
        }

        loop {
            if !Arc::ptr_eq(&state.generation, &generation) {
                if generation.broken.load(Ordering::Acquire) {
                    cx.trace("barrier::wait broken");
                    return Err(BarrierWaitError::Broken);
                }
                cx.trace("barrier::wait released");
                return Ok(BarrierWaitResult { is_leader: false });
            }

            if cx.checkpoint().is_err() {
                self.break_generation(&mut state);
                cx.trace("barrier::wait cancelled");
                return Err(BarrierWaitError::Cancelled);
            }

            let (guard, _) = self
                .cvar
                .wait_timeout(state, self.config.cancel_poll_interval)
                .expect("barrier lock poisoned");
            state = guard;
        }
    }

    fn break_generation(&self, state: &mut BarrierState) {
        let id = state.generation.id;
        let stranded = state.arrived;
        state.advance(true);
        self.cvar.notify_all();
        debug!(generation = id, stranded, "barrier generation broken");
    }
}

/// Result of a barrier wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierWaitResult {
    is_leader: bool,
}

impl BarrierWaitResult {
    /// Returns true for exactly one party (the leader) each generation.
    #[must_use]
    pub fn is_leader(&self) -> bool {
        self.is_leader
    }
}
