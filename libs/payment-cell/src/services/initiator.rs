// libs/payment-cell/src/services/initiator.rs
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use booking_cell::PaymentHandoff;
use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::AppError;
use shared_utils::{ScheduledTask, SessionContext};

use crate::error::{PaymentError, GENERIC_PAYMENT_FAILURE};
use crate::models::{ConfirmationDetails, InitiatePaymentRequest, InitiationResponse, PaymentMethod, PaymentState};
use crate::services::phone::normalize_phone;

const INITIATE_PATH: &str = "/api/mpesa/initiate";

/// Starts mobile-money payments for created bookings.
///
/// Initiation only waits for the provider's acknowledgement. Settlement is not
/// tracked here; after the acknowledgement a fixed-delay redirect hands the
/// confirmation details to whoever holds the [`PendingRedirect`].
pub struct PaymentInitiator {
    api: Arc<ApiClient>,
    session: SessionContext,
    redirect_delay: Duration,
    state: PaymentState,
}

impl PaymentInitiator {
    pub fn new(config: &AppConfig, session: SessionContext) -> Self {
        Self::with_client(Arc::new(ApiClient::new(config)), session, config.payment_redirect_delay())
    }

    pub fn with_client(api: Arc<ApiClient>, session: SessionContext, redirect_delay: Duration) -> Self {
        Self {
            api,
            session,
            redirect_delay,
            state: PaymentState::Idle,
        }
    }

    pub fn state(&self) -> &PaymentState {
        &self.state
    }

    pub async fn initiate(
        &mut self,
        handoff: &PaymentHandoff,
        method: PaymentMethod,
    ) -> Result<PendingRedirect, PaymentError> {
        if self.state.is_processing() || self.state == PaymentState::Submitting {
            return Err(PaymentError::AlreadyProcessing);
        }

        let phone = match method {
            PaymentMethod::Card => {
                info!("Card payment requested for booking {}; not available", handoff.booking_id);
                return Err(PaymentError::MethodUnavailable);
            }
            PaymentMethod::MobileMoney { phone } => normalize_phone(&phone)?,
        };

        // the provider charges whole shillings
        let amount = handoff.session_fee.round();
        if !amount.is_finite() || amount < 1.0 {
            return Err(PaymentError::InvalidAmount(handoff.session_fee));
        }

        let session = self.session.require()?;

        let request = InitiatePaymentRequest {
            phone_number: phone,
            amount: amount as i64,
            reference_code: reference_code(handoff),
            description: format!("Therapy session with {}", handoff.therapist.name),
            booking_id: handoff.booking_id,
        };

        self.state = PaymentState::Submitting;
        info!(
            "Initiating M-Pesa payment of {} for booking {}",
            request.amount, request.booking_id
        );

        match self.send(&request, session.bearer()).await {
            Ok((checkout_request_id, merchant_request_id)) => {
                self.state = PaymentState::Processing {
                    checkout_request_id: checkout_request_id.clone(),
                    merchant_request_id: merchant_request_id.clone(),
                };

                let details = ConfirmationDetails {
                    booking_id: handoff.booking_id,
                    checkout_request_id,
                    merchant_request_id,
                    therapist: handoff.therapist.clone(),
                    session_fee: handoff.session_fee,
                    slot: handoff.slot.clone(),
                };
                Ok(PendingRedirect::schedule(details, self.redirect_delay))
            }
            Err(err) => {
                error!("Payment initiation for booking {} failed: {}", handoff.booking_id, err);
                self.state = PaymentState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Back to `Idle`, e.g. after the user returns to pick another slot.
    pub fn reset(&mut self) {
        self.state = PaymentState::Idle;
    }

    async fn send(
        &self,
        request: &InitiatePaymentRequest,
        token: &str,
    ) -> Result<(String, Option<String>), PaymentError> {
        let body = serde_json::to_value(request).map_err(|e| PaymentError::Rejected(e.to_string()))?;

        let response: InitiationResponse = self
            .api
            .request(Method::POST, INITIATE_PATH, Some(token), Some(body))
            .await
            .map_err(|e| match e {
                AppError::Api { message, .. } | AppError::Conflict { message, .. } => {
                    PaymentError::Rejected(non_empty_or_generic(message))
                }
                other => PaymentError::from(other),
            })?;

        match response.checkout_request_id.filter(|id| !id.trim().is_empty()) {
            Some(checkout_request_id) => {
                debug!(
                    "Provider accepted request: {}",
                    response.message.as_deref().unwrap_or("no message")
                );
                Ok((checkout_request_id, response.merchant_request_id))
            }
            None => {
                let message = response
                    .error
                    .or(response.message)
                    .map(non_empty_or_generic)
                    .unwrap_or_else(|| GENERIC_PAYMENT_FAILURE.to_string());
                warn!("Initiation response carried no checkout reference");
                Err(PaymentError::Rejected(message))
            }
        }
    }
}

fn reference_code(handoff: &PaymentHandoff) -> String {
    format!("BOOK{}", handoff.booking_id)
}

fn non_empty_or_generic(message: String) -> String {
    if message.trim().is_empty() {
        GENERIC_PAYMENT_FAILURE.to_string()
    } else {
        message
    }
}

/// The scheduled hop to the confirmation view.
///
/// Dropping it cancels the redirect.
pub struct PendingRedirect {
    checkout_request_id: String,
    receiver: oneshot::Receiver<ConfirmationDetails>,
    task: ScheduledTask,
}

impl fmt::Debug for PendingRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRedirect")
            .field("checkout_request_id", &self.checkout_request_id)
            .field("task", &self.task.name())
            .finish()
    }
}

impl PendingRedirect {
    fn schedule(details: ConfirmationDetails, delay: Duration) -> Self {
        let (sender, receiver) = oneshot::channel();
        let checkout_request_id = details.checkout_request_id.clone();
        let booking_id = details.booking_id;

        let task = ScheduledTask::after(format!("payment-redirect-{}", booking_id), delay, async move {
            if sender.send(details).is_err() {
                debug!("Confirmation for booking {} had no listener", booking_id);
            }
        });

        Self {
            checkout_request_id,
            receiver,
            task,
        }
    }

    pub fn checkout_request_id(&self) -> &str {
        &self.checkout_request_id
    }

    pub fn cancel(&self) {
        self.task.cancel();
    }

    /// Resolves with the confirmation details once the delay has elapsed.
    pub async fn wait(self) -> Result<ConfirmationDetails, PaymentError> {
        let PendingRedirect { receiver, task, .. } = self;
        let result = receiver.await.map_err(|_| PaymentError::RedirectCancelled);
        drop(task);
        result
    }
}
