use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::{AppointmentViews, Booking, BookingError, BookingService, BookingStatus};
use shared_utils::test_utils::{local_date_in, MockApiResponses, TestConfig, TestUser};
use shared_utils::SessionContext;

fn views(server: &MockServer, session: SessionContext) -> AppointmentViews {
    let config = TestConfig::with_base_url(&server.uri()).to_app_config();
    AppointmentViews::new(&config, session)
}

#[tokio::test]
async fn test_patient_sees_only_own_bookings() {
    let server = MockServer::start().await;
    let user = TestUser::patient("p@example.com").with_id(5);

    Mock::given(method("GET"))
        .and(path("/api/bookings"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::bookings(vec![
            MockApiResponses::booking(1, 5, 2, 10, "Pending"),
            MockApiResponses::booking(2, 6, 2, 11, "Confirmed"),
            MockApiResponses::booking(3, 5, 3, 12, "Cancelled"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let bookings = views(&server, user.session_context("tok")).my_bookings().await.unwrap();
    let ids: Vec<_> = bookings.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(bookings[1].booking_status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_therapist_listing_uses_therapist_filter() {
    let server = MockServer::start().await;
    let user = TestUser::therapist("t@example.com").with_id(2);

    Mock::given(method("GET"))
        .and(path("/api/bookings"))
        .and(query_param("therapistId", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::bookings(vec![
            MockApiResponses::booking(1, 5, 2, 10, "Pending"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let bookings = views(&server, user.session_context("tok")).my_bookings().await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].therapist_id, 2);
}

#[tokio::test]
async fn test_upcoming_skips_cancelled_and_past() {
    let server = MockServer::start().await;
    let user = TestUser::patient("p@example.com").with_id(5);
    let tomorrow = local_date_in(1);
    let yesterday = local_date_in(-1);

    let with_slot = |id: i64, status: &str, slot: serde_json::Value| {
        let mut booking = MockApiResponses::booking(id, 5, 1, id * 10, status);
        booking["slot"] = slot;
        booking
    };

    Mock::given(method("GET"))
        .and(path("/api/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::bookings(vec![
            with_slot(1, "Pending", MockApiResponses::time_slot(10, 1, tomorrow, "15:00", "16:00", true)),
            with_slot(2, "Confirmed", MockApiResponses::time_slot(20, 1, tomorrow, "09:00", "10:00", true)),
            with_slot(3, "Cancelled", MockApiResponses::time_slot(30, 1, tomorrow, "11:00", "12:00", true)),
            with_slot(4, "Confirmed", MockApiResponses::time_slot(40, 1, yesterday, "11:00", "12:00", true)),
            MockApiResponses::booking(5, 5, 1, 50, "Pending"),
        ])))
        .mount(&server)
        .await;

    let upcoming = views(&server, user.session_context("tok")).upcoming().await.unwrap();
    let ids: Vec<_> = upcoming.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn test_cancel_patches_status() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/bookings/7"))
        .and(body_json(json!({ "booking_status": "Cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let booking: Booking = serde_json::from_value(MockApiResponses::booking(7, 5, 1, 10, "Confirmed")).unwrap();
    let updated = views(&server, TestUser::default().session_context("tok"))
        .cancel(&booking)
        .await
        .unwrap();

    assert_eq!(updated.booking_status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_cancelled_booking_cannot_be_confirmed() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let booking: Booking = serde_json::from_value(MockApiResponses::booking(7, 5, 1, 10, "Cancelled")).unwrap();
    let result = views(&server, TestUser::default().session_context("tok"))
        .confirm(&booking)
        .await;

    assert_matches!(
        result,
        Err(BookingError::InvalidStatusTransition {
            from: BookingStatus::Cancelled,
            to: BookingStatus::Confirmed
        })
    );
}

#[tokio::test]
async fn test_delete_booking() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/bookings/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_base_url(&server.uri()).to_app_config();
    let service = BookingService::new(&config, TestUser::default().session_context("tok"));
    service.delete_booking(9).await.unwrap();
}

#[tokio::test]
async fn test_listing_without_session_fails_fast() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = views(&server, SessionContext::in_memory(None)).my_bookings().await;
    assert_matches!(result, Err(BookingError::AuthMissing));
}
