//! Error responses.
//!
//! # Responsibilities
//! - Map resilience errors to HTTP status codes
//! - Emit `Retry-After` for open circuits and rate limits
//! - Render a uniform JSON error body
//!
//! # Status Mapping
//! ```text
//! remote 4xx (not 429) → forwarded as-is
//! circuit_open        → 503 + Retry-After
//! rate_limit          → 429 (+ Retry-After when hinted)
//! authentication      → 401
//! validation          → 400
//! timeout             → 504
//! everything else     → 502
//! ```

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::taxonomy::ErrorCategory;
use crate::errors::types::ServiceError;
use crate::health::report::BreakerHealth;
use crate::resilience::circuit_breaker::CircuitBreakerOpenError;
use crate::resilience::guard::GuardError;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Seconds until a retry is worthwhile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<BreakerHealth>,
}

/// Response status for a final downstream failure.
pub fn status_for(err: &ServiceError) -> StatusCode {
    let forwarded = err
        .status
        .filter(|status| (400..500).contains(status) && *status != 429)
        .and_then(|status| StatusCode::from_u16(status).ok());
    if let Some(status) = forwarded {
        return status;
    }

    match err.category {
        ErrorCategory::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorCategory::CircuitOpen => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Whole seconds, rounded up.
fn retry_after_secs(delay: Duration) -> u64 {
    delay.as_secs() + u64::from(delay.subsec_nanos() > 0)
}

fn with_retry_after(mut response: Response, secs: Option<u64>) -> Response {
    if let Some(secs) = secs {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    }
    response
}

impl IntoResponse for CircuitBreakerOpenError {
    fn into_response(self) -> Response {
        let secs = retry_after_secs(self.retry_after);
        let body = ErrorBody {
            error: ErrorCategory::CircuitOpen.as_str(),
            message: format!(
                "{} is temporarily unavailable, retry in {}s",
                self.service_name, secs
            ),
            service: self.service_name.clone(),
            code: None,
            retry_after: Some(secs),
            stats: Some(BreakerHealth::from_stats(&self.stats)),
        };

        with_retry_after(
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response(),
            Some(secs),
        )
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let secs = self.retry_after.map(retry_after_secs);
        let body = ErrorBody {
            error: self.category.as_str(),
            message: self.to_string(),
            service: self.service.to_string(),
            code: self.code.clone(),
            retry_after: secs,
            stats: None,
        };

        let hint = if status == StatusCode::TOO_MANY_REQUESTS { secs } else { None };
        with_retry_after((status, Json(body)).into_response(), hint)
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        match self {
            GuardError::Open(e) => e.into_response(),
            GuardError::Service(e) => e.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::types::RemoteError;
    use crate::resilience::circuit_breaker::{BreakerError, CircuitBreaker, CircuitBreakerOptions};
    use crate::services::Service;

    fn service_error(err: RemoteError) -> ServiceError {
        ServiceError::wrap(Service::Ticketing, err, 1)
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&service_error(RemoteError::http(429, "x"))), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_for(&service_error(RemoteError::http(401, "x"))), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&service_error(RemoteError::http(403, "x"))), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&service_error(RemoteError::http(404, "x"))), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&service_error(RemoteError::http(422, "x"))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&service_error(RemoteError::Timeout(Duration::from_secs(1)))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(status_for(&service_error(RemoteError::http(503, "x"))), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&service_error(RemoteError::Network("reset".into()))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let err = service_error(RemoteError::http(429, "slow").with_retry_after(Duration::from_millis(1500)));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_circuit_response() {
        let cb = CircuitBreaker::new(CircuitBreakerOptions::new("chat").with_timeout(Duration::from_secs(15)));
        cb.force_open();
        let err = cb
            .execute(|| async { Ok::<_, RemoteError>(()) })
            .await
            .unwrap_err();
        let BreakerError::Open(open) = err else {
            panic!("expected open circuit rejection");
        };
        let response = GuardError::from(open).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "15");
    }
}
