//! Background jobs: the source refresh loop and the precache workers
//!
//! The refresh loop replaces the source pool on a fixed interval and hands
//! every new URL list to the precache queue. A small pool of workers drains
//! that queue, warming the cache for the largest catalog size at a paced rate.

pub mod precache_queue;
pub mod precache_worker;
pub mod refresh_loop;
pub mod types;

pub use precache_queue::PrecacheQueue;
pub use precache_worker::PrecacheWorker;
pub use refresh_loop::SourceRefresher;
pub use types::{PrecacheStats, RefreshStatus, SharedRefreshStatus};
