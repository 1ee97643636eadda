//! Barrier demonstration driver.
//!
//! Five workers sleep for a pseudo-random time, arrive at a shared barrier,
//! and pass it together once the last one arrives. Timestamps are
//! milliseconds since start; every "passed" line should carry (almost) the
//! same timestamp, which is the last arrival's.
//!
//! ```bash
//! cargo run --example barrier_demo
//! RUST_LOG=monitor_sync=trace cargo run --example barrier_demo
//! ```

use monitor_sync::sync::Barrier;
use monitor_sync::{Cx, SyncConfig};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const WORKERS: usize = 5;
const MAX_WORK_MS: u64 = 2_000;

/// Small deterministic jitter so runs are reproducible.
fn work_ms(worker: usize) -> u64 {
    let mut x = (worker as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    x ^= x >> 33;
    x = x.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    x ^= x >> 33;
    x % MAX_WORK_MS
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    let config = SyncConfig::from_env()?;
    let barrier = Arc::new(Barrier::with_config(WORKERS, config)?);
    let start = Instant::now();

    let mut handles = Vec::with_capacity(WORKERS);
    for worker in 0..WORKERS {
        let barrier = Arc::clone(&barrier);
        let handle = thread::Builder::new()
            .name(format!("worker-{worker}"))
            .spawn(move || -> monitor_sync::Result<()> {
                let cx = Cx::new();
                thread::sleep(Duration::from_millis(work_ms(worker)));
                tracing::info!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "arrived at barrier"
                );
                let result = barrier.wait(&cx)?;
                tracing::info!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    leader = result.is_leader(),
                    "passed the barrier"
                );
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
    Ok(())
}
