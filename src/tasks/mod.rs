//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - TTL Sweep: Removes expired cache entries on every tick

mod sweep;

pub use sweep::{
    spawn_interval_sweep, spawn_sweep_task, IntervalTicker, ManualTicker, TickSender, Ticker,
};
