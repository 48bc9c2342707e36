use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_models::ErrorCategory;
use shared_utils::test_utils::{local_date_in, MockApiResponses, TestConfig, TestUser};
use shared_utils::SessionContext;
use slot_cell::{DateRange, SlotError, SlotRepositoryClient};

fn repository(server: &MockServer, session: SessionContext) -> SlotRepositoryClient {
    let config = TestConfig::with_base_url(&server.uri()).to_app_config();
    SlotRepositoryClient::new(&config, session)
}

#[tokio::test]
async fn test_fetch_directory_groups_by_therapist() {
    let mock_server = MockServer::start().await;
    let start = local_date_in(1);
    let range = DateRange::week_from(start);

    Mock::given(method("GET"))
        .and(path("/api/time-slots"))
        .and(query_param("start_date", start.format("%Y-%m-%d").to_string()))
        .and(query_param("end_date", range.end.format("%Y-%m-%d").to_string()))
        .and(header("authorization", "Bearer patient-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::time_slots(vec![
            MockApiResponses::time_slot(11, 1, start, "14:00:00", "15:00:00", false),
            MockApiResponses::time_slot(10, 1, start, "09:00:00", "10:00:00", true),
            MockApiResponses::time_slot(20, 2, start, "10:00", "11:00", false),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = TestUser::patient("p@example.com").session_context("patient-token");
    let directory = repository(&mock_server, session)
        .fetch_directory(range)
        .await
        .expect("slots should load");

    assert_eq!(directory.len(), 2);

    let first = directory.schedule(1).unwrap();
    assert_eq!(first.therapist.name, "Therapist 1");
    assert_eq!(first.therapist.session_fee, 5000.0);
    assert!(first.therapist.bio.contains("Cognitive Behavioural Therapy"));
    let labels: Vec<_> = first.slots.iter().map(|s| s.start_label()).collect();
    assert_eq!(labels, vec!["09:00", "14:00"]);
    assert!(first.slots[0].is_booked);

    assert_eq!(directory.slots_on(2, start).len(), 1);
}

#[tokio::test]
async fn test_missing_token_aborts_before_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/time-slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::time_slots(vec![])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = repository(&mock_server, SessionContext::in_memory(None))
        .fetch_slots(DateRange::week_from(local_date_in(0)))
        .await;

    assert_matches!(result, Err(SlotError::AuthMissing));
    assert_eq!(SlotError::AuthMissing.category(), ErrorCategory::AuthMissing);
}

#[tokio::test]
async fn test_server_error_is_generic_fetch_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/time-slots"))
        .respond_with(ResponseTemplate::new(500).set_body_json(MockApiResponses::error_response("db down")))
        .mount(&mock_server)
        .await;

    let session = TestUser::default().session_context("tok");
    let err = repository(&mock_server, session)
        .fetch_slots(DateRange::week_from(local_date_in(0)))
        .await
        .unwrap_err();

    assert_eq!(err, SlotError::FetchFailed { status: 500 });
    assert_eq!(err.to_string(), "Failed to fetch time slots");
}

#[tokio::test]
async fn test_malformed_payload_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/time-slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "slots": [] })))
        .mount(&mock_server)
        .await;

    let session = TestUser::default().session_context("tok");
    let result = repository(&mock_server, session)
        .fetch_directory(DateRange::week_from(local_date_in(0)))
        .await;

    assert_matches!(result, Err(SlotError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_network_failure_surfaces_raw_message() {
    // nothing listens on this port
    let config = TestConfig::with_base_url("http://127.0.0.1:1").to_app_config();
    let session = TestUser::default().session_context("tok");
    let result = SlotRepositoryClient::new(&config, session)
        .fetch_slots(DateRange::week_from(local_date_in(0)))
        .await;

    assert_matches!(result, Err(SlotError::Network(message)) if !message.is_empty());
}

#[tokio::test]
async fn test_inverted_range_is_rejected() {
    let mock_server = MockServer::start().await;
    let session = TestUser::default().session_context("tok");
    let range = DateRange::new(local_date_in(3), local_date_in(1));

    let result = repository(&mock_server, session).fetch_slots(range).await;
    assert_matches!(result, Err(SlotError::InvalidRange { .. }));
}
