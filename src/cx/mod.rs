//! Cancellation context.
//!
//! Every blocking operation in [`crate::sync`] takes a [`Cx`]. The context
//! carries a cancel flag that another thread may raise at any time; a thread
//! blocked in `Barrier::wait` or `Semaphore::acquire` observes it and returns
//! an error instead of waiting forever.
//!
//! `Cx` is cheap to clone. Clones share the same cancellation state, so the
//! usual pattern is to hand one clone to the worker and keep another to
//! cancel it:
//!
//! ```
//! use monitor_sync::sync::Semaphore;
//! use monitor_sync::Cx;
//!
//! let sem = std::sync::Arc::new(Semaphore::new(0));
//! let cx = Cx::new();
//!
//! let worker = {
//!     let sem = sem.clone();
//!     let cx = cx.clone();
//!     std::thread::spawn(move || sem.acquire(&cx))
//! };
//!
//! cx.cancel();
//! assert!(worker.join().unwrap().is_err());
//! assert_eq!(sem.available_permits(), 0);
//! ```

mod cx;

pub use cx::{CancelKind, CancelReason, Cx};
