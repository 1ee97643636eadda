//! Semaphore demonstration driver.
//!
//! Ten workers repeatedly compete for five units. Each worker logs the
//! number of units held right after acquiring and right before releasing;
//! that number never exceeds five. Afterwards the driver parks one extra
//! thread on an empty semaphore and cancels it, showing a cancelled acquire
//! returning an error without consuming a unit.
//!
//! ```bash
//! cargo run --example semaphore_demo
//! ```

use monitor_sync::sync::{AcquireError, Semaphore};
use monitor_sync::{CancelKind, Cx, SyncConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const RESOURCES: usize = 5;
const WORKERS: usize = 10;
const ACQUISITIONS_PER_WORKER: usize = 3;
const MAX_HOLD_MS: u64 = 400;

fn hold_ms(worker: usize, round: usize) -> u64 {
    let mut x = ((worker * 31 + round) as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    x ^= x >> 29;
    x % MAX_HOLD_MS
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    let config = SyncConfig::from_env()?;
    let sem = Arc::new(Semaphore::with_config(RESOURCES, config)?);
    let acquired = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::with_capacity(WORKERS);
    for worker in 0..WORKERS {
        let sem = Arc::clone(&sem);
        let acquired = Arc::clone(&acquired);
        let handle = thread::Builder::new()
            .name(format!("worker-{worker}"))
            .spawn(move || -> Result<(), AcquireError> {
                let cx = Cx::new();
                for round in 0..ACQUISITIONS_PER_WORKER {
                    tracing::info!(round, "needs a resource");
                    let permit = sem.acquire_permit(&cx)?;
                    let held = acquired.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::info!(round, held, "acquired a resource");
                    thread::sleep(Duration::from_millis(hold_ms(worker, round)));
                    // Decrement before releasing so the count never overshoots.
                    let held = acquired.fetch_sub(1, Ordering::SeqCst) - 1;
                    drop(permit);
                    tracing::info!(round, held, "released a resource");
                }
                Ok(())
            })?;
        handles.push(handle);
    }

    for handle in handles {
        match handle.join() {
            Ok(result) => result?,
            Err(_) => tracing::error!("worker panicked"),
        }
    }

    // Cancellation: a waiter on an empty semaphore gives up cleanly.
    let empty = Arc::new(Semaphore::new(0));
    let cx = Cx::new();
    let waiter = {
        let empty = Arc::clone(&empty);
        let cx = cx.clone();
        thread::Builder::new()
            .name("waiter".into())
            .spawn(move || empty.acquire(&cx))?
    };
    thread::sleep(Duration::from_millis(100));
    cx.cancel_with(CancelKind::Shutdown, Some("demo finished"));
    match waiter.join() {
        Ok(Err(AcquireError::Cancelled)) => tracing::info!(
            available = empty.available_permits(),
            "waiter cancelled without consuming a unit"
        ),
        Ok(Ok(())) => tracing::warn!("waiter unexpectedly acquired"),
        Err(_) => tracing::error!("waiter panicked"),
    }
    Ok(())
}
