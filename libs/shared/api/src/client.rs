use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{AppError, ErrorBody};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Thin JSON client for the booking backend. Every response is decoded into a
/// typed value here, so malformed payloads never reach caller state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout ({}), using defaults", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, AppError> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let request_id = Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(REQUEST_ID_HEADER, value);
        }

        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| AppError::Validation("Stored token is not a valid header value".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    async fn send<Q>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        query: Option<&Q>,
        body: Option<Value>,
    ) -> Result<Response, AppError>
    where
        Q: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.get_headers(auth_token)?);

        if let Some(query) = query {
            req = req.query(query);
        }

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        error!("API error ({}): {}", status, error_text);

        Err(map_error_status(status, &error_text))
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send::<[(&str, &str)]>(method, path, auth_token, None, body)
            .await?;
        decode(response).await
    }

    pub async fn request_with_query<T, Q>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        query: &Q,
    ) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .send(method, path, auth_token, Some(query), None)
            .await?;
        decode(response).await
    }

    /// For calls whose response body the client does not depend on (PATCH, DELETE).
    pub async fn request_no_content(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(), AppError> {
        self.send::<[(&str, &str)]>(method, path, auth_token, None, body)
            .await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::Network(e.to_string()))?;

    serde_json::from_slice::<T>(&bytes).map_err(|e| {
        warn!("Rejected malformed response payload: {}", e);
        AppError::MalformedResponse(e.to_string())
    })
}

fn map_error_status(status: StatusCode, error_text: &str) -> AppError {
    let body: ErrorBody = serde_json::from_str(error_text).unwrap_or_default();
    let message = body.best_message().unwrap_or_else(|| {
        if error_text.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        } else {
            error_text.trim().to_string()
        }
    });

    match status {
        StatusCode::CONFLICT => AppError::Conflict {
            message,
            details: body.details,
        },
        _ => AppError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
