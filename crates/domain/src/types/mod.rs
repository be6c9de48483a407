//! Domain types and models

pub mod delivery;
pub mod requests;

pub use delivery::{
    CachedEntry, DeliveryPolicy, DeliveryStatus, Operation, ReplayReport, SendOutcome,
};
pub use requests::{
    Detection, DetectionBatch, ErrorBody, GeoPoint, LoginRequest, LoginResult, Ping,
    RegisterRequest,
};
