//! Cache while offline, then replay once the service is reachable.

mod support;

use sensorlink_core::OfflineQueue;
use sensorlink_domain::{
    DeliveryStatus, Detection, DetectionBatch, Ping, ReplayReport,
};
use sensorlink_infra::SharedTokenStore;
use support::{gateway, replay_service, unreachable_base_url, QueueFixture};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread")]
async fn replay_after_reconnect_delivers_in_fifo_order() {
    let fixture = QueueFixture::new();
    let tokens = SharedTokenStore::with_token("T");

    let offline = gateway(&unreachable_base_url(), &tokens, &fixture);
    for label in ["first", "second", "third"] {
        let batch = DetectionBatch::from(Detection::new("dev-1", label, 0.8));
        assert_eq!(offline.send_detections(&batch).await.unwrap(), DeliveryStatus::Cached);
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detection"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&server)
        .await;

    let report = replay_service(&server.uri(), &tokens, &fixture).replay_once().await.unwrap();

    assert_eq!(
        report,
        ReplayReport { delivered: 3, rejected: 0, remaining: 0, interrupted: false }
    );
    assert!(fixture.queue.is_empty().await.unwrap());

    let labels: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| {
            let batch: DetectionBatch = serde_json::from_slice(&request.body).unwrap();
            batch.detections[0].label.clone()
        })
        .collect();
    assert_eq!(labels, ["first", "second", "third"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn replay_while_still_offline_keeps_everything() {
    let fixture = QueueFixture::new();
    let tokens = SharedTokenStore::with_token("T");
    let base_url = unreachable_base_url();

    let offline = gateway(&base_url, &tokens, &fixture);
    offline.ping(&Ping::now("dev-1")).await.unwrap();
    offline.ping(&Ping::now("dev-1")).await.unwrap();

    let report = replay_service(&base_url, &tokens, &fixture).replay_once().await.unwrap();

    assert!(report.interrupted);
    assert_eq!(report.delivered, 0);
    assert_eq!(report.remaining, 2);
    assert_eq!(fixture.queue.len().await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_entries_are_dropped() {
    let fixture = QueueFixture::new();
    let tokens = SharedTokenStore::with_token("T");

    let offline = gateway(&unreachable_base_url(), &tokens, &fixture);
    offline.ping(&Ping::now("dev-1")).await.unwrap();
    offline
        .send_detections(&DetectionBatch::from(Detection::new("dev-1", "cat", 0.4)))
        .await
        .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"message":"stale"}"#))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/detection"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let report = replay_service(&server.uri(), &tokens, &fixture).replay_once().await.unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.remaining, 0);
    assert!(fixture.queue.is_empty().await.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn server_outage_during_replay_keeps_entries_queued() {
    let fixture = QueueFixture::new();
    let tokens = SharedTokenStore::with_token("T");

    let offline = gateway(&unreachable_base_url(), &tokens, &fixture);
    offline.ping(&Ping::now("dev-1")).await.unwrap();
    offline.ping(&Ping::now("dev-1")).await.unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let report = replay_service(&server.uri(), &tokens, &fixture).replay_once().await.unwrap();

    assert_eq!(
        report,
        ReplayReport { delivered: 0, rejected: 0, remaining: 2, interrupted: true }
    );
    assert_eq!(fixture.queue.len().await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_token_is_retried_with_the_rotated_one() {
    let fixture = QueueFixture::new();
    let tokens = SharedTokenStore::with_token("old");

    let offline = gateway(&unreachable_base_url(), &tokens, &fixture);
    offline.ping(&Ping::now("dev-1")).await.unwrap();

    tokens.set_token("new");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"message":"expired"}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let report = replay_service(&server.uri(), &tokens, &fixture).replay_once().await.unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(report.rejected, 0);
    assert!(fixture.queue.is_empty().await.unwrap());
}
