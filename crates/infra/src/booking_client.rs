use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::AppConfig;

/// Typed failures for the external hotel-inventory provider. Each variant
/// carries the originating operation name so callers can surface a stable
/// failure kind without leaking provider internals.
#[derive(Debug, thiserror::Error)]
pub enum BookingClientError {
    #[error("booking client configuration error: {0}")]
    Configuration(String),
    #[error("booking {operation} rejected: {detail}")]
    Rejected {
        operation: &'static str,
        detail: String,
    },
    #[error("booking {operation} upstream error: {detail}")]
    Upstream {
        operation: &'static str,
        detail: String,
    },
    #[error("booking {operation} transport error: {detail}")]
    Transport {
        operation: &'static str,
        detail: String,
    },
    #[error("booking {operation} response decode error: {detail}")]
    InvalidResponse {
        operation: &'static str,
        detail: String,
    },
}

/// HTTP client for the third-party hotel-booking API. Shares no data model
/// with the itinerary aggregate; payloads pass through as opaque JSON.
#[derive(Clone)]
pub struct BookingClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl BookingClient {
    pub fn from_config(config: &AppConfig) -> Result<Self, BookingClientError> {
        let base_url = config.booking_base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(BookingClientError::Configuration(
                "booking_base_url is required".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(Duration::from_millis(config.booking_timeout_ms))
            .build()
            .map_err(|err| BookingClientError::Configuration(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            username: config.booking_username.clone(),
            password: config.booking_password.clone(),
        })
    }

    pub async fn search(&self, payload: Value) -> Result<Value, BookingClientError> {
        self.post("Search", "hotel_search", payload).await
    }

    pub async fn pre_book(&self, payload: Value) -> Result<Value, BookingClientError> {
        self.post("PreBook", "hotel_prebook", payload).await
    }

    pub async fn book(&self, payload: Value) -> Result<Value, BookingClientError> {
        self.post("Book", "hotel_book", payload).await
    }

    async fn post(
        &self,
        path: &str,
        operation: &'static str,
        payload: Value,
    ) -> Result<Value, BookingClientError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&payload)
            .send()
            .await
            .map_err(|err| BookingClientError::Transport {
                operation,
                detail: err.to_string(),
            })?;

        let status = response.status();
        let body: Value =
            response
                .json()
                .await
                .map_err(|err| BookingClientError::InvalidResponse {
                    operation,
                    detail: err.to_string(),
                })?;

        if status.is_success() {
            return Ok(body);
        }

        let detail = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("provider rejected the request")
            .to_string();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::NOT_FOUND => {
                Err(BookingClientError::Rejected { operation, detail })
            }
            _ => Err(BookingClientError::Upstream {
                operation,
                detail: format!("status {status}: {detail}"),
            }),
        }
    }
}
