//! Delivery model: operations, their caching policy, and queued entries

use serde::{Deserialize, Serialize};

use crate::constants::{
    DETECTION_ENDPOINT, LOGIN_ENDPOINT, PING_ENDPOINT, REGISTER_ENDPOINT,
};
use crate::impl_domain_status_conversions;

/// What the gateway does when the transport never reaches the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Surface the connectivity failure to the caller.
    Propagating,
    /// Persist the request in the offline queue and report success.
    CacheOnConnectivityFailure,
}

impl_domain_status_conversions!(DeliveryPolicy {
    Propagating => "propagating",
    CacheOnConnectivityFailure => "cache_on_connectivity_failure",
});

/// Logical operations exposed by the delivery gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `POST /user/login`
    Login,
    /// `POST /user/register`
    Register,
    /// `POST /ping`
    Ping,
    /// `POST /detection`
    SubmitDetections,
}

impl_domain_status_conversions!(Operation {
    Login => "login",
    Register => "register",
    Ping => "ping",
    SubmitDetections => "submit_detections",
});

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Operation; 4] =
        [Operation::Login, Operation::Register, Operation::Ping, Operation::SubmitDetections];

    /// Endpoint path relative to the service base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Login => LOGIN_ENDPOINT,
            Self::Register => REGISTER_ENDPOINT,
            Self::Ping => PING_ENDPOINT,
            Self::SubmitDetections => DETECTION_ENDPOINT,
        }
    }

    /// Login and registration need a live round trip for the caller to
    /// proceed; background traffic must never be lost to an offline device.
    pub fn policy(self) -> DeliveryPolicy {
        match self {
            Self::Login | Self::Register => DeliveryPolicy::Propagating,
            Self::Ping | Self::SubmitDetections => DeliveryPolicy::CacheOnConnectivityFailure,
        }
    }

    /// Whether connectivity failures are absorbed by the offline queue.
    pub fn is_cacheable(self) -> bool {
        self.policy() == DeliveryPolicy::CacheOnConnectivityFailure
    }
}

/// Terminal success state of a fire-and-cache send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// The server accepted the payload.
    Delivered,
    /// The device was offline; the payload waits in the offline queue.
    Cached,
}

impl_domain_status_conversions!(DeliveryStatus {
    Delivered => "delivered",
    Cached => "cached",
});

/// Result of a successful gateway send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome<T> {
    /// The server answered 2xx; holds the decoded response.
    Delivered(T),
    /// The request was written to the offline queue.
    Cached,
}

impl<T> SendOutcome<T> {
    /// The outcome without its payload.
    pub fn status(&self) -> DeliveryStatus {
        match self {
            Self::Delivered(_) => DeliveryStatus::Delivered,
            Self::Cached => DeliveryStatus::Cached,
        }
    }

    /// The decoded response, if the request was delivered.
    pub fn into_delivered(self) -> Option<T> {
        match self {
            Self::Delivered(value) => Some(value),
            Self::Cached => None,
        }
    }
}

/// A request that failed to reach the server and awaits replay.
///
/// `id` is assigned by the store and increases with every enqueue, so
/// ordering by id is insertion (FIFO) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEntry {
    /// Store-assigned, strictly increasing.
    pub id: i64,
    /// Path relative to the service base URL.
    pub endpoint: String,
    /// Serialized JSON request body.
    pub body: String,
    /// Bearer token that was active when the original send started.
    pub token: String,
    /// Unix milliseconds.
    pub enqueued_at: i64,
}

/// Summary of one replay pass over the offline queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Entries accepted by the server and removed.
    pub delivered: usize,
    /// Entries refused with a definitive 4xx and removed.
    pub rejected: usize,
    /// Entries still queued when the pass ended.
    pub remaining: usize,
    /// The pass stopped early because the peer was unreachable or failing
    /// temporarily (5xx, 408, 429).
    pub interrupted: bool,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn operations_map_to_endpoints() {
        assert_eq!(Operation::Login.endpoint(), "/user/login");
        assert_eq!(Operation::Register.endpoint(), "/user/register");
        assert_eq!(Operation::Ping.endpoint(), "/ping");
        assert_eq!(Operation::SubmitDetections.endpoint(), "/detection");
    }

    #[test]
    fn only_background_operations_are_cacheable() {
        let cacheable: Vec<_> = Operation::ALL.into_iter().filter(|op| op.is_cacheable()).collect();
        assert_eq!(cacheable, vec![Operation::Ping, Operation::SubmitDetections]);
        assert_eq!(Operation::Login.policy(), DeliveryPolicy::Propagating);
    }

    #[test]
    fn operation_labels_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_str(&op.to_string()).unwrap(), op);
        }
        assert!(Operation::from_str("logout").is_err());
    }

    #[test]
    fn send_outcome_reports_status() {
        assert_eq!(SendOutcome::Delivered(()).status(), DeliveryStatus::Delivered);
        assert_eq!(SendOutcome::<()>::Cached.status(), DeliveryStatus::Cached);
        assert_eq!(SendOutcome::Delivered(5).into_delivered(), Some(5));
        assert_eq!(SendOutcome::<i32>::Cached.into_delivered(), None);
    }
}
