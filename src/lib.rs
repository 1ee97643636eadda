//! monitor-sync: a cancel-aware rendezvous barrier and counting semaphore.
//!
//! # Overview
//!
//! Both primitives are monitors built directly on `std::sync::Mutex` and
//! `std::sync::Condvar`:
//!
//! - [`sync::Barrier`] holds a fixed-size group of threads until all have
//!   arrived, releases them together, and resets for the next generation.
//! - [`sync::Semaphore`] bounds how many threads hold units of a resource
//!   pool at once.
//!
//! # Core Guarantees
//!
//! - **Broadcast wake + re-check**: every waiter re-tests its predicate after
//!   each wake, so spurious wake-ups and coalesced state changes are harmless
//! - **Reset with release**: a barrier's arrival count is reset in the same
//!   critical section that releases its waiters
//! - **Cancel-correctness**: a blocked wait observes cancellation of its
//!   [`Cx`] and returns an error; it never swallows the request and keeps
//!   waiting, and a cancelled semaphore acquire consumes nothing
//! - **No stranded parties**: a cancelled barrier party breaks its generation,
//!   so the other parties return [`sync::BarrierWaitError::Broken`]
//!
//! # Module Structure
//!
//! - [`sync`]: the primitives
//! - [`cx`]: cancellation context
//! - [`config`]: tuning (poll interval, release warnings), env/TOML loading
//! - [`error`]: error types
//! - [`tracing_compat`]: logging facade over `tracing`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod cx;
pub mod error;
pub mod sync;
pub mod tracing_compat;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{ConfigError, SyncConfig};
pub use cx::{CancelKind, CancelReason, Cx};
pub use error::{Error, ErrorKind, Result};
pub use sync::{
    AcquireError, Barrier, BarrierWaitError, BarrierWaitResult, Semaphore, SemaphorePermit,
    TryAcquireError,
};
