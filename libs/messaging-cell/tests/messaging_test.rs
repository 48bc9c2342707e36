use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use messaging_cell::{MessageService, MessagingError, UnreadPoller};
use shared_utils::test_utils::{MockApiResponses, TestConfig, TestUser};
use shared_utils::SessionContext;

fn service(server: &MockServer, session: SessionContext) -> MessageService {
    let config = TestConfig::with_base_url(&server.uri()).to_app_config();
    MessageService::new(&config, session)
}

#[tokio::test]
async fn test_unread_count_filters_by_receiver() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .and(query_param("receiver_id", "5"))
        .and(query_param("is_read", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                MockApiResponses::message(1, 2, 5, false),
                MockApiResponses::message(2, 3, 5, false),
                MockApiResponses::message(3, 2, 5, true),
                MockApiResponses::message(4, 5, 2, false),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = TestUser::patient("p@example.com").with_id(5);
    let count = service(&server, user.session_context("tok")).unread_count(5).await.unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_mark_read() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/messages/3"))
        .and(body_json(json!({ "is_read": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    service(&server, TestUser::default().session_context("tok"))
        .mark_read(3)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unread_requires_session() {
    let server = MockServer::start().await;
    let result = service(&server, SessionContext::in_memory(None)).unread_count(5).await;
    assert_matches!(result, Err(MessagingError::AuthMissing));
}

#[tokio::test]
async fn test_poller_publishes_and_keeps_last_count_on_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                MockApiResponses::message(1, 2, 5, false),
                MockApiResponses::message(2, 2, 5, false),
            ]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let user = TestUser::patient("p@example.com").with_id(5);
    let mut poller = UnreadPoller::new(service(&server, user.session_context("tok")));
    let mut updates = poller.subscribe();

    poller.start(Duration::from_millis(50));
    assert!(poller.is_running());

    tokio::time::timeout(Duration::from_secs(2), updates.changed())
        .await
        .expect("first poll should publish")
        .unwrap();
    assert_eq!(*updates.borrow(), 2);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(poller.latest(), 2);

    poller.stop();
    assert!(!poller.is_running());
}

#[tokio::test]
async fn test_dropped_poller_stops_polling() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let mut poller = UnreadPoller::new(service(&server, TestUser::default().session_context("tok")));
    poller.start(Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(poller);

    // let an in-flight request settle
    tokio::time::sleep(Duration::from_millis(50)).await;
    let seen = server.received_requests().await.unwrap_or_default().len();
    assert!(seen > 0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    let later = server.received_requests().await.unwrap_or_default().len();
    assert_eq!(seen, later);
}
