//! Background replay of the offline queue
//!
//! The worker follows explicit lifecycle management: join handle tracking,
//! cancellation support, and bounded timeouts.

pub mod replay_worker;

pub use replay_worker::{ReplayWorker, ReplayWorkerConfig};
