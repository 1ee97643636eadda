//! Blocking synchronization primitives built on `Mutex` + `Condvar`.
//!
//! # Primitives
//!
//! - [`Barrier`]: N-way rendezvous with leader election, reusable across
//!   generations
//! - [`Semaphore`]: counting semaphore over interchangeable units
//!
//! Both follow the monitor pattern: one lock guards the counter, one
//! condition variable is the suspension point, and every wake is a broadcast
//! followed by a re-check of the waiter's predicate. No FIFO order is
//! promised among waiters.
//!
//! # Cancel Safety
//!
//! Blocking calls take a [`Cx`](crate::Cx):
//!
//! - Cancellation during wait: clean abort, nothing consumed
//! - Barrier: a cancelled party breaks its generation so the others are not
//!   left waiting for it
//! - Waits inside [`Cx::masked`](crate::Cx::masked) are uninterruptible

mod barrier;
mod semaphore;

pub use barrier::{Barrier, BarrierWaitError, BarrierWaitResult};
pub use semaphore::{AcquireError, Semaphore, SemaphorePermit, TryAcquireError};
