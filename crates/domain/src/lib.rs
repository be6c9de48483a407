//! # SensorLink Domain
//!
//! Wire types, configuration structures, and the error taxonomy shared by
//! the delivery core and its infrastructure adapters.
//!
//! ## Architecture
//! - No dependencies on other SensorLink crates
//! - Only external dependencies allowed
//! - Pure data: no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
