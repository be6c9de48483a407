//! Delivery gateway - turns typed requests into HTTP calls
//!
//! Every operation runs the same algorithm:
//! `Created -> Encoding -> Sending -> {Delivered | Rejected | Cached}`.
//! The only per-operation difference is the [`DeliveryPolicy`] consulted
//! when the transport never reached the peer.

use std::sync::Arc;

use sensorlink_domain::{
    DeliveryPolicy, DeliveryStatus, DetectionBatch, LoginRequest, LoginResult, Operation, Ping,
    RegisterRequest, Result, SendOutcome, SensorLinkError,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::classifier::{classify, is_success};
use super::codec;
use super::ports::{CredentialProvider, OfflineQueue, Transport, TransportOutcome};

/// Outbound delivery gateway
pub struct DeliveryGateway {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    queue: Arc<dyn OfflineQueue>,
}

impl DeliveryGateway {
    /// Create a new gateway over the given ports
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
        queue: Arc<dyn OfflineQueue>,
    ) -> Self {
        Self { transport, credentials, queue }
    }

    /// The offline queue cached requests are written to.
    pub fn queue(&self) -> &Arc<dyn OfflineQueue> {
        &self.queue
    }

    /// Authenticate a user.
    ///
    /// # Errors
    ///
    /// Connectivity failures are returned as
    /// [`SensorLinkError::Connectivity`]; nothing is cached.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResult> {
        let outcome = self.send(Operation::Login, request).await?;
        outcome.into_delivered().ok_or_else(|| not_cacheable(Operation::Login))
    }

    /// Create an account. The success body is ignored.
    ///
    /// # Errors
    ///
    /// Same policy as [`login`](Self::login).
    pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
        match self.send_without_content(Operation::Register, request).await? {
            DeliveryStatus::Delivered => Ok(()),
            DeliveryStatus::Cached => Err(not_cacheable(Operation::Register)),
        }
    }

    /// Send a heartbeat, caching it if the device is offline.
    ///
    /// # Errors
    ///
    /// Rejections by the server and offline-queue failures.
    pub async fn ping(&self, ping: &Ping) -> Result<DeliveryStatus> {
        self.send_without_content(Operation::Ping, ping).await
    }

    /// Submit detection events, caching them if the device is offline.
    ///
    /// An empty batch is not sent and reports `Delivered`.
    ///
    /// # Errors
    ///
    /// Rejections by the server and offline-queue failures.
    pub async fn send_detections(&self, batch: &DetectionBatch) -> Result<DeliveryStatus> {
        if batch.is_empty() {
            debug!("empty detection batch, nothing to send");
            return Ok(DeliveryStatus::Delivered);
        }
        self.send_without_content(Operation::SubmitDetections, batch).await
    }

    /// Send `request` for `operation` and decode a 2xx body as `R`.
    ///
    /// # Errors
    ///
    /// - [`SensorLinkError::Protocol`] for any non-2xx status
    /// - [`SensorLinkError::Decode`] when a 2xx body does not match `R`
    /// - [`SensorLinkError::Connectivity`] for propagating operations
    /// - [`SensorLinkError::Storage`] when caching fails
    pub async fn send<Q, R>(&self, operation: Operation, request: &Q) -> Result<SendOutcome<R>>
    where
        Q: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        match self.dispatch(operation, request).await? {
            SendOutcome::Delivered(body) => Ok(SendOutcome::Delivered(codec::decode(&body)?)),
            SendOutcome::Cached => Ok(SendOutcome::Cached),
        }
    }

    /// Like [`send`](Self::send) for operations whose success body carries no
    /// content. The body is discarded rather than decoded, so an accepted
    /// payload is never reported as failed.
    pub async fn send_without_content<Q>(
        &self,
        operation: Operation,
        request: &Q,
    ) -> Result<DeliveryStatus>
    where
        Q: Serialize + Sync + ?Sized,
    {
        Ok(self.dispatch(operation, request).await?.status())
    }

    #[instrument(skip(self, request), fields(operation = %operation, endpoint = operation.endpoint()))]
    async fn dispatch<Q>(&self, operation: Operation, request: &Q) -> Result<SendOutcome<String>>
    where
        Q: Serialize + Sync + ?Sized,
    {
        // Captured once; a rotation during the send does not affect it.
        let token = self.credentials.current_token().await?;
        let body = codec::encode(request)?;
        let endpoint = operation.endpoint();

        match self.transport.post(endpoint, &body, &token).await {
            TransportOutcome::Response { status, body: raw } if is_success(status) => {
                debug!(status, "request delivered");
                Ok(SendOutcome::Delivered(raw))
            }
            TransportOutcome::Response { status, body: raw } => {
                let error = classify(status, &raw);
                warn!(status, error = %error, "request rejected by server");
                Err(error.into())
            }
            TransportOutcome::ConnectivityFailure { reason } => match operation.policy() {
                DeliveryPolicy::Propagating => {
                    warn!(reason = %reason, "connectivity failure");
                    Err(SensorLinkError::Connectivity(reason))
                }
                DeliveryPolicy::CacheOnConnectivityFailure => {
                    let entry = self.queue.enqueue(endpoint, &body, &token).await?;
                    info!(entry_id = entry.id, reason = %reason, "request cached for replay");
                    Ok(SendOutcome::Cached)
                }
            },
        }
    }
}

fn not_cacheable(operation: Operation) -> SensorLinkError {
    SensorLinkError::Internal(format!("{operation} must not be cached"))
}

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use sensorlink_domain::{Detection, ProtocolError};

    use super::*;
    use crate::delivery::testing::{FixedToken, MemoryQueue, ScriptedTransport};

    struct Harness {
        transport: Arc<ScriptedTransport>,
        queue: Arc<MemoryQueue>,
        gateway: DeliveryGateway,
    }

    fn harness(transport: ScriptedTransport, queue: MemoryQueue) -> Harness {
        let transport = Arc::new(transport);
        let queue = Arc::new(queue);
        let gateway = DeliveryGateway::new(
            transport.clone(),
            Arc::new(FixedToken::new("tok-1")),
            queue.clone(),
        );
        Harness { transport, queue, gateway }
    }

    fn login_request() -> LoginRequest {
        LoginRequest { username: "ada".into(), password: "hunter2".into() }
    }

    #[tokio::test]
    async fn login_decodes_successful_response() {
        let h = harness(
            ScriptedTransport::always(TransportOutcome::response(
                200,
                r#"{"token":"new-token","userId":"u-1"}"#,
            )),
            MemoryQueue::default(),
        );

        let result = h.gateway.login(&login_request()).await.unwrap();

        assert_eq!(result, LoginResult { token: "new-token".into(), user_id: Some("u-1".into()) });
        let calls = h.transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].endpoint, "/user/login");
        assert_eq!(calls[0].token, "tok-1");
        assert_eq!(calls[0].body, r#"{"username":"ada","password":"hunter2"}"#);
    }

    #[tokio::test]
    async fn login_with_bad_credentials_surfaces_unauthorized() {
        let h = harness(
            ScriptedTransport::always(TransportOutcome::response(
                401,
                r#"{"message":"bad credentials"}"#,
            )),
            MemoryQueue::default(),
        );

        let err = h.gateway.login(&login_request()).await.unwrap_err();

        assert_eq!(
            err,
            SensorLinkError::Protocol(ProtocolError::Unauthorized {
                message: "bad credentials".into()
            })
        );
        assert!(h.queue.snapshot().is_empty());
    }

    #[tokio::test]
    async fn login_with_malformed_success_body_is_decode_error() {
        let h = harness(
            ScriptedTransport::always(TransportOutcome::response(200, "<html>")),
            MemoryQueue::default(),
        );

        let err = h.gateway.login(&login_request()).await.unwrap_err();
        assert_eq!(err.label(), "decode");
    }

    #[tokio::test]
    async fn synchronous_operations_propagate_connectivity_failures() {
        let h = harness(ScriptedTransport::offline(), MemoryQueue::default());

        let login = h.gateway.login(&login_request()).await.unwrap_err();
        let register = h
            .gateway
            .register(&RegisterRequest {
                username: "ada".into(),
                email: "ada@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap_err();

        assert!(login.is_connectivity());
        assert!(register.is_connectivity());
        assert!(h.queue.snapshot().is_empty());
    }

    #[tokio::test]
    async fn background_operations_cache_on_connectivity_failure() {
        let h = harness(ScriptedTransport::offline(), MemoryQueue::default());

        let ping = Ping::now("device-1");
        assert_eq!(h.gateway.ping(&ping).await.unwrap(), DeliveryStatus::Cached);

        let batch = DetectionBatch::from(Detection::new("device-1", "fox", 0.7));
        assert_eq!(h.gateway.send_detections(&batch).await.unwrap(), DeliveryStatus::Cached);

        let entries = h.queue.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].endpoint, "/ping");
        assert_eq!(entries[0].body, codec::encode(&ping).unwrap());
        assert_eq!(entries[0].token, "tok-1");
        assert_eq!(entries[1].endpoint, "/detection");
        assert_eq!(entries[1].body, codec::encode(&batch).unwrap());
    }

    #[tokio::test]
    async fn rejected_background_payload_is_not_cached() {
        let h = harness(
            ScriptedTransport::always(TransportOutcome::response(400, "not json")),
            MemoryQueue::default(),
        );

        let err = h.gateway.ping(&Ping::now("device-1")).await.unwrap_err();

        assert_eq!(
            err,
            SensorLinkError::Protocol(ProtocolError::BadRequest { message: "not json".into() })
        );
        assert!(h.queue.snapshot().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_propagates_for_cacheable_operations() {
        let h = harness(ScriptedTransport::offline(), MemoryQueue::broken());

        let err = h.gateway.ping(&Ping::now("device-1")).await.unwrap_err();
        assert!(matches!(err, SensorLinkError::Storage(_)));
    }

    #[tokio::test]
    async fn success_body_of_no_content_operations_is_ignored() {
        let h = harness(
            ScriptedTransport::always(TransportOutcome::response(200, "OK")),
            MemoryQueue::default(),
        );

        let status = h.gateway.ping(&Ping::now("device-1")).await.unwrap();
        assert_eq!(status, DeliveryStatus::Delivered);
    }

    #[tokio::test]
    async fn every_success_status_is_delivered() {
        for status in [200, 201, 202, 204, 299] {
            let h = harness(
                ScriptedTransport::always(TransportOutcome::response(status, "")),
                MemoryQueue::default(),
            );
            let result = h.gateway.ping(&Ping::now("device-1")).await;
            assert_eq!(result, Ok(DeliveryStatus::Delivered), "status {status}");
        }
    }

    #[tokio::test]
    async fn empty_detection_batch_is_not_sent() {
        let h = harness(ScriptedTransport::offline(), MemoryQueue::default());

        let status = h.gateway.send_detections(&DetectionBatch::default()).await.unwrap();

        assert_eq!(status, DeliveryStatus::Delivered);
        assert!(h.transport.calls().is_empty());
        assert!(h.queue.snapshot().is_empty());
    }

    #[tokio::test]
    async fn offline_detections_are_cached_in_submission_order() {
        let h = harness(ScriptedTransport::offline(), MemoryQueue::default());
        let batches: Vec<DetectionBatch> = ["owl", "bat", "fox"]
            .iter()
            .map(|label| DetectionBatch::from(Detection::new("device-1", *label, 0.5)))
            .collect();

        for batch in &batches {
            assert_eq!(h.gateway.send_detections(batch).await, Ok(DeliveryStatus::Cached));
        }

        let bodies: Vec<String> = h.queue.snapshot().into_iter().map(|e| e.body).collect();
        let expected: Vec<String> = batches.iter().map(|b| codec::encode(b).unwrap()).collect();
        assert_eq!(bodies, expected);
    }

    #[tokio::test]
    async fn cached_entries_count_matches_failed_sends_amid_successes() {
        let transport = ScriptedTransport::offline()
            .then(TransportOutcome::connectivity_failure("timeout"))
            .then(TransportOutcome::response(204, ""))
            .then(TransportOutcome::connectivity_failure("refused"))
            .then(TransportOutcome::response(200, ""))
            .then(TransportOutcome::connectivity_failure("dns"));
        let h = harness(transport, MemoryQueue::default());

        let mut statuses = Vec::new();
        for n in 0..5u8 {
            let ping = Ping { battery_level: Some(n), ..Ping::now("device-1") };
            statuses.push(h.gateway.ping(&ping).await.unwrap());
        }

        assert_eq!(
            statuses,
            vec![
                DeliveryStatus::Cached,
                DeliveryStatus::Delivered,
                DeliveryStatus::Cached,
                DeliveryStatus::Delivered,
                DeliveryStatus::Cached,
            ]
        );
        let levels: Vec<u8> = h
            .queue
            .snapshot()
            .iter()
            .map(|e| codec::decode::<Ping>(&e.body).unwrap().battery_level.unwrap())
            .collect();
        assert_eq!(levels, vec![0, 2, 4]);
    }

    #[tokio::test]
    async fn concurrent_offline_sends_are_all_cached() {
        let h = harness(ScriptedTransport::offline(), MemoryQueue::default());

        let pings: Vec<Ping> = (0..8).map(|_| Ping::now("device-1")).collect();
        let results = join_all(pings.iter().map(|ping| h.gateway.ping(ping))).await;

        assert!(results.iter().all(|r| *r == Ok(DeliveryStatus::Cached)));
        assert_eq!(h.queue.snapshot().len(), 8);
    }
}
