use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{Session, UserIdentity, UserRole};

use crate::session::SessionContext;

pub struct TestConfig {
    pub api_base_url: String,
    pub default_session_fee: f64,
    pub payment_redirect_delay_ms: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            default_session_fee: 5000.0,
            payment_redirect_delay_ms: 20,
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            default_session_fee: self.default_session_fee,
            payment_redirect_delay_ms: self.payment_redirect_delay_ms,
            unread_poll_interval_secs: 1,
            http_timeout_secs: 5,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", UserRole::Patient)
    }
}

impl TestUser {
    pub fn new(email: &str, role: UserRole) -> Self {
        // keep ids small and positive, like the backend's serial keys
        let id = (Uuid::new_v4().as_u128() % 100_000) as i64 + 1;
        Self {
            id,
            name: email.split('@').next().unwrap_or("user").to_string(),
            email: email.to_string(),
            role,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, UserRole::Patient)
    }

    pub fn therapist(email: &str) -> Self {
        Self::new(email, UserRole::Therapist)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, UserRole::Admin)
    }

    pub fn to_identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            name: self.name.clone(),
            email: Some(self.email.clone()),
            role: self.role,
        }
    }

    pub fn to_session(&self, token: &str) -> Session {
        Session::new(token, self.to_identity())
    }

    pub fn session_context(&self, token: &str) -> SessionContext {
        SessionContext::in_memory(Some(self.to_session(token)))
    }
}

/// Date `days` from today in local time, formatted the way the backend sends it.
pub fn local_date_in(days: i64) -> NaiveDate {
    Local::now().date_naive() + Duration::days(days)
}

pub struct MockApiResponses;

impl MockApiResponses {
    pub fn therapist(id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "specialization": "Cognitive Behavioural Therapy",
            "experience": 6,
            "email": format!("therapist{}@example.com", id),
            "phone": "0712000000",
            "session_fee": null,
            "bio": null,
            "image": null
        })
    }

    pub fn time_slot(
        id: i64,
        therapist_id: i64,
        date: NaiveDate,
        start_time: &str,
        end_time: &str,
        is_booked: bool,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "therapist_id": therapist_id,
            "date": date.format("%Y-%m-%d").to_string(),
            "start_time": start_time,
            "end_time": end_time,
            "is_booked": is_booked,
            "therapist": Self::therapist(therapist_id, &format!("Therapist {}", therapist_id))
        })
    }

    pub fn time_slots(slots: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "data": slots })
    }

    pub fn booking_created(booking_id: i64, user_id: i64, therapist_id: i64, slot_id: i64) -> serde_json::Value {
        json!({
            "success": true,
            "data": Self::booking(booking_id, user_id, therapist_id, slot_id, "Pending")
        })
    }

    pub fn booking(
        booking_id: i64,
        user_id: i64,
        therapist_id: i64,
        slot_id: i64,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": booking_id,
            "user_id": user_id,
            "therapist_id": therapist_id,
            "slot_id": slot_id,
            "booking_status": status,
            "created_at": "2026-01-01T00:00:00Z"
        })
    }

    pub fn bookings(bookings: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "success": true, "data": bookings })
    }

    pub fn slot_conflict() -> serde_json::Value {
        json!({
            "error": "Slot already booked",
            "details": "Another booking exists for this slot"
        })
    }

    pub fn mpesa_initiated(checkout_request_id: &str) -> serde_json::Value {
        json!({
            "message": "Success. Request accepted for processing",
            "checkoutRequestID": checkout_request_id,
            "merchantRequestID": format!("merchant-{}", checkout_request_id)
        })
    }

    pub fn payment(id: i64, booking_id: i64, amount: f64, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "booking_id": booking_id,
            "amount": amount,
            "phone_number": "254712345678",
            "checkout_request_id": "ws_CO_000001",
            "merchant_request_id": "merchant-ws_CO_000001",
            "status": status,
            "mpesa_receipt_number": null,
            "created_at": "2026-01-01T00:00:00Z"
        })
    }

    pub fn message(id: i64, sender_id: i64, receiver_id: i64, is_read: bool) -> serde_json::Value {
        json!({
            "id": id,
            "sender_id": sender_id,
            "receiver_id": receiver_id,
            "content": format!("message {}", id),
            "is_read": is_read,
            "created_at": "2026-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str) -> serde_json::Value {
        json!({ "error": message })
    }
}
