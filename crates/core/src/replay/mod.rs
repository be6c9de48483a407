//! Replay of requests cached while the device was offline

pub mod service;

pub use service::ReplayService;
