use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, info};

use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::{AppError, DataEnvelope};
use shared_utils::SessionContext;

use crate::error::MessagingError;
use crate::models::{MarkReadRequest, Message, MessageId};

const MESSAGES_PATH: &str = "/api/messages";

#[derive(Clone)]
pub struct MessageService {
    api: Arc<ApiClient>,
    session: SessionContext,
}

impl MessageService {
    pub fn new(config: &AppConfig, session: SessionContext) -> Self {
        Self::with_client(Arc::new(ApiClient::new(config)), session)
    }

    pub fn with_client(api: Arc<ApiClient>, session: SessionContext) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn unread_messages(&self, user_id: i64) -> Result<Vec<Message>, MessagingError> {
        let session = self.session.require()?;
        let query = [("receiver_id", user_id.to_string()), ("is_read", "false".to_string())];

        let envelope: DataEnvelope<Vec<Message>> = self
            .api
            .request_with_query(Method::GET, MESSAGES_PATH, Some(session.bearer()), &query)
            .await?;

        // backend may ignore the query filter
        Ok(envelope
            .data
            .into_iter()
            .filter(|m| m.receiver_id == user_id && !m.is_read)
            .collect())
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<usize, MessagingError> {
        let count = self.unread_messages(user_id).await?.len();
        debug!("User {} has {} unread messages", user_id, count);
        Ok(count)
    }

    pub async fn mark_read(&self, message_id: MessageId) -> Result<(), MessagingError> {
        let session = self.session.require()?;
        let body = serde_json::to_value(MarkReadRequest { is_read: true })
            .map_err(|e| MessagingError::Api(AppError::Validation(e.to_string())))?;

        self.api
            .request_no_content(
                Method::PATCH,
                &format!("{}/{}", MESSAGES_PATH, message_id),
                Some(session.bearer()),
                Some(body),
            )
            .await?;

        info!("Message {} marked as read", message_id);
        Ok(())
    }
}
