use std::sync::Arc;

use reqwest::Method;
use tracing::debug;

use booking_cell::BookingId;
use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::DataEnvelope;
use shared_utils::SessionContext;

use crate::error::PaymentError;
use crate::models::{Payment, PaymentStatus};

const PAYMENTS_PATH: &str = "/api/mpesa";

/// Read access to recorded payments.
pub struct PaymentHistory {
    api: Arc<ApiClient>,
    session: SessionContext,
}

impl PaymentHistory {
    pub fn new(config: &AppConfig, session: SessionContext) -> Self {
        Self::with_client(Arc::new(ApiClient::new(config)), session)
    }

    pub fn with_client(api: Arc<ApiClient>, session: SessionContext) -> Self {
        Self { api, session }
    }

    pub async fn payments_for_booking(&self, booking_id: BookingId) -> Result<Vec<Payment>, PaymentError> {
        let session = self.session.require()?;
        let query = [("booking_id", booking_id.to_string())];

        let envelope: DataEnvelope<Vec<Payment>> = self
            .api
            .request_with_query(Method::GET, PAYMENTS_PATH, Some(session.bearer()), &query)
            .await?;

        debug!("Booking {} has {} payment records", booking_id, envelope.data.len());
        Ok(envelope.data)
    }

    /// True when any payment for the booking has completed.
    pub async fn is_paid(&self, booking_id: BookingId) -> Result<bool, PaymentError> {
        Ok(self
            .payments_for_booking(booking_id)
            .await?
            .iter()
            .any(|p| p.status == PaymentStatus::Completed))
    }
}
