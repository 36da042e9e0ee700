//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries, paced
//! by a [`Ticker`] so tests can drive it tick by tick.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::handle::CacheHandle;

// == Ticker Trait ==
/// Paces the sweep loop.
pub trait Ticker: Send + 'static {
    /// Waits for the next tick. Returns false once no more ticks will come.
    fn tick(&mut self) -> impl Future<Output = bool> + Send;
}

// == Interval Ticker ==
/// Ticks every `period`, starting one period from now.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        // A slow sweep pushes the next one back rather than bursting
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl Ticker for IntervalTicker {
    fn tick(&mut self) -> impl Future<Output = bool> + Send {
        async move {
            self.interval.tick().await;
            true
        }
    }
}

// == Manual Ticker ==
/// Ticks only when its [`TickSender`] says so. Dropping the sender ends the
/// sweep loop once queued ticks are consumed.
#[derive(Debug)]
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Triggers ticks on a [`ManualTicker`].
#[derive(Debug, Clone)]
pub struct TickSender {
    tx: mpsc::UnboundedSender<()>,
}

impl ManualTicker {
    pub fn new() -> (TickSender, ManualTicker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TickSender { tx }, ManualTicker { rx })
    }
}

impl TickSender {
    /// Queues one tick. Returns false if the sweep loop has stopped.
    pub fn tick(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

impl Ticker for ManualTicker {
    fn tick(&mut self) -> impl Future<Output = bool> + Send {
        async move { self.rx.recv().await.is_some() }
    }
}

// == Spawn ==
/// Spawns a task that sweeps expired entries on every tick.
///
/// The cache lock is held only for the synchronous sweep, so sweeps always
/// fall between cache operations.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown. The task also finishes on its own when the ticker runs out.
pub fn spawn_sweep_task<T: Ticker>(cache: CacheHandle, mut ticker: T) -> JoinHandle<()> {
    tokio::spawn(async move {
        while ticker.tick().await {
            let removed = cache.with(|c| c.sweep_expired()).await;

            if removed > 0 {
                info!("TTL sweep: removed {} expired entries", removed);
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
        debug!("TTL sweep: ticker finished, stopping");
    })
}

/// Spawns the sweep task on a fixed interval of `interval_secs` seconds.
///
/// Intervals below one second are raised to one.
pub fn spawn_interval_sweep(cache: CacheHandle, interval_secs: u64) -> JoinHandle<()> {
    let interval_secs = interval_secs.max(1);
    info!(
        "Starting TTL sweep task with interval of {} seconds",
        interval_secs
    );
    spawn_sweep_task(cache, IntervalTicker::new(Duration::from_secs(interval_secs)))
}
