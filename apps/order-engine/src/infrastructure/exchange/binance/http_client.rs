//! Signed HTTP client with retry logic.

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use sha2::Sha256;

use super::api_types::BinanceErrorResponse;
use super::config::{BinanceConfig, RetryConfig};
use super::error::BinanceError;
use crate::application::ports::ApiCredentials;

type HmacSha256 = Hmac<Sha256>;

const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// HTTP client for the Binance REST API.
#[derive(Debug, Clone)]
pub struct BinanceHttpClient {
    client: Client,
    base_url: String,
    recv_window_ms: u64,
    retry_config: RetryConfig,
}

impl BinanceHttpClient {
    /// Create a new HTTP client from config.
    pub fn new(config: &BinanceConfig) -> Result<Self, BinanceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BinanceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.rest_base_url().to_string(),
            recv_window_ms: config.recv_window_ms,
            retry_config: config.retry.clone(),
        })
    }

    /// Unsigned GET of a market data endpoint.
    pub async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, BinanceError> {
        self.request(Method::GET, path, params, None).await
    }

    /// Signed request on behalf of `credentials`.
    pub async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        credentials: &ApiCredentials,
        params: &[(&'static str, String)],
    ) -> Result<T, BinanceError> {
        self.request(method, path, params, Some(credentials)).await
    }

    fn url(
        &self,
        path: &str,
        params: &[(&'static str, String)],
        credentials: Option<&ApiCredentials>,
    ) -> Result<Url, BinanceError> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| BinanceError::Http(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            if credentials.is_some() {
                query.append_pair("recvWindow", &self.recv_window_ms.to_string());
                query.append_pair(
                    "timestamp",
                    &chrono::Utc::now().timestamp_millis().to_string(),
                );
            }
        }

        if let Some(credentials) = credentials {
            let payload = url.query().unwrap_or_default().to_string();
            let signature = sign(&credentials.secret_key, &payload)?;
            url.query_pairs_mut().append_pair("signature", &signature);
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url)
    }

    /// Internal request implementation with retry logic. Signed requests
    /// are re-signed with a fresh timestamp on every attempt.
    #[allow(clippy::too_many_lines)]
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
        credentials: Option<&ApiCredentials>,
    ) -> Result<T, BinanceError> {
        let mut backoff = ExponentialBackoff::new(&self.retry_config);

        loop {
            let url = self.url(path, params, credentials)?;
            let mut request = self.client.request(method.clone(), url);
            if let Some(credentials) = credentials {
                request = request.header(API_KEY_HEADER, &credentials.api_key);
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            error = %e,
                            path,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt,
                            "Network error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(BinanceError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                    });
                }
            };

            let status = response.status();

            if status.is_success() {
                let text = response
                    .text()
                    .await
                    .map_err(|e| BinanceError::Network(e.to_string()))?;
                return serde_json::from_str(&text)
                    .map_err(|e| BinanceError::JsonParse(e.to_string()));
            }

            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());

            let error_body = response.text().await.unwrap_or_default();
            let (error_code, error_message) =
                match serde_json::from_str::<BinanceErrorResponse>(&error_body) {
                    Ok(err) => (err.code, err.msg),
                    Err(_) => (i64::from(status.as_u16()), error_body),
                };

            match categorize_status(status) {
                ErrorCategory::RateLimited => {
                    let delay = backoff
                        .next_backoff()
                        .map(|computed| retry_after.map_or(computed, Duration::from_secs));
                    if let Some(delay) = delay {
                        tracing::warn!(
                            code = error_code,
                            delay_ms = delay.as_millis(),
                            "Rate limited, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(BinanceError::RateLimited {
                        retry_after_secs: retry_after.unwrap_or(60),
                    });
                }
                ErrorCategory::Retryable => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            code = error_code,
                            message = %error_message,
                            delay_ms = delay.as_millis(),
                            "Retryable error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(BinanceError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                    });
                }
                ErrorCategory::NonRetryable => {
                    return Err(BinanceError::from_api(
                        status.as_u16(),
                        error_code,
                        error_message,
                    ));
                }
            }
        }
    }
}

/// HMAC-SHA256 of the query string, hex encoded.
fn sign(secret: &str, payload: &str) -> Result<String, BinanceError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BinanceError::AuthenticationFailed(e.to_string()))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Error category for determining retry behavior.
enum ErrorCategory {
    RateLimited,
    Retryable,
    NonRetryable,
}

/// Categorize HTTP status code for retry handling. 418 is Binance's
/// auto-ban after ignored 429s.
const fn categorize_status(status: StatusCode) -> ErrorCategory {
    match status.as_u16() {
        418 | 429 => ErrorCategory::RateLimited,
        408 | 500 | 502 | 503 | 504 => ErrorCategory::Retryable,
        _ => ErrorCategory::NonRetryable,
    }
}

/// Exponential backoff calculator.
struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
}

impl ExponentialBackoff {
    const fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            max_attempts: config.max_attempts,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
        }
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }

        let backoff = self.current_backoff;
        self.current_backoff = Duration::from_secs_f64(
            (self.current_backoff.as_secs_f64() * self.multiplier)
                .min(self.max_backoff.as_secs_f64()),
        );

        Some(backoff)
    }
}
