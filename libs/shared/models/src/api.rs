use serde::{Deserialize, Serialize};

/// `{ "data": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// `{ "success": bool, "data": ..., "message"?: ..., "error"?: ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl<T> SuccessEnvelope<T> {
    /// The payload when `success` is set, else the server's reason or `fallback`.
    pub fn into_result(self, fallback: &str) -> Result<Option<T>, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self
                .error
                .or(self.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()))
        }
    }
}

/// Error body returned on non-2xx responses, e.g. `{ "error": ..., "details": ... }` on 409.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub details: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn best_message(&self) -> Option<String> {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_without_data() {
        let envelope: SuccessEnvelope<serde_json::Value> =
            serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.into_result("failed"), Ok(None));
    }

    #[test]
    fn test_unsuccessful_envelope_carries_reason() {
        let envelope: SuccessEnvelope<serde_json::Value> =
            serde_json::from_value(json!({ "success": false, "message": "Slot unavailable" })).unwrap();
        assert_eq!(envelope.into_result("failed"), Err("Slot unavailable".to_string()));

        let bare: SuccessEnvelope<serde_json::Value> = serde_json::from_value(json!({})).unwrap();
        assert_eq!(bare.into_result("failed"), Err("failed".to_string()));
    }

    #[test]
    fn test_error_body_prefers_error_field() {
        let body: ErrorBody = serde_json::from_value(json!({
            "error": "Slot already booked",
            "details": "slot 3",
            "message": "ignored"
        }))
        .unwrap();
        assert_eq!(body.best_message().as_deref(), Some("Slot already booked"));
        assert_eq!(body.details.as_deref(), Some("slot 3"));
    }
}
