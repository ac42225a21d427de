//! HTTP status and transport error mapping shared by the service clients.

use evalmate_core::ServiceError;

/// Seconds to wait when a 429 carries no usable `retry-after` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Build a client with a request timeout.
pub(crate) fn build_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))
}

/// Classify a transport failure.
pub(crate) fn send_error(error: reqwest::Error, timeout_secs: u64) -> ServiceError {
    if error.is_timeout() {
        ServiceError::Timeout(timeout_secs)
    } else {
        ServiceError::NetworkError(error.to_string())
    }
}

/// Pass successful responses through; turn error statuses into a `ServiceError`.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status().as_u16();
    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
            .saturating_mul(1000);
        return Err(ServiceError::RateLimited {
            retry_after_ms: retry_after,
        });
    }
    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::AuthenticationFailed(body));
    }
    if status >= 400 {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::ApiError {
            status,
            message: body,
        });
    }
    Ok(response)
}
