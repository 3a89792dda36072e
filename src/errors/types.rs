//! Typed errors produced and consumed by the resilience layer.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

use crate::errors::taxonomy::{classify, Classify, ErrorCategory, ErrorSeverity};
use crate::services::Service;

/// Malformed caller input. Never retried.
#[derive(Debug, Clone, Error)]
#[error("validation failed for '{field}': {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Classify for ValidationError {
    fn declared_category(&self) -> Option<(ErrorCategory, ErrorSeverity)> {
        Some((ErrorCategory::Validation, ErrorSeverity::Low))
    }
}

/// Failure reported by a remote API client callback.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The remote answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        code: Option<String>,
        retry_after: Option<Duration>,
    },

    /// Connection could not be established or was reset.
    #[error("network error: {0}")]
    Network(String),

    /// The call did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

impl RemoteError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        RemoteError::Http {
            status,
            message: message.into(),
            code: None,
            retry_after: None,
        }
    }

    /// Attach a provider error code to an HTTP failure.
    pub fn with_code(mut self, error_code: impl Into<String>) -> Self {
        if let RemoteError::Http { code, .. } = &mut self {
            *code = Some(error_code.into());
        }
        self
    }

    /// Attach a `Retry-After` hint to an HTTP failure.
    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        if let RemoteError::Http { retry_after, .. } = &mut self {
            *retry_after = Some(delay);
        }
        self
    }
}

impl Classify for RemoteError {
    fn declared_category(&self) -> Option<(ErrorCategory, ErrorSeverity)> {
        match self {
            RemoteError::Network(_) => Some((ErrorCategory::Network, ErrorSeverity::High)),
            RemoteError::Timeout(_) => Some((ErrorCategory::Timeout, ErrorSeverity::Medium)),
            RemoteError::Http { .. } | RemoteError::Other(_) => None,
        }
    }

    fn status_code(&self) -> Option<u16> {
        match self {
            RemoteError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn error_code(&self) -> Option<String> {
        match self {
            RemoteError::Http { code, .. } => code.clone(),
            _ => None,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            RemoteError::Http { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Final failure of a call to a downstream dependency, after retries.
///
/// Carries the classification of the underlying error so that callers
/// upstream can act on it without re-inspecting the source.
#[derive(Debug, Error)]
#[error("{service} request failed: {message}")]
pub struct ServiceError {
    pub service: Service,
    pub status: Option<u16>,
    pub code: Option<String>,
    pub message: String,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub retry_after: Option<Duration>,
    pub attempts: u32,
    /// Diagnostic key/value pairs for logs and error responses.
    pub context: BTreeMap<String, String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ServiceError {
    /// Wrap the final error of a call to `service`.
    pub fn wrap<E>(service: Service, error: E, attempts: u32) -> Self
    where
        E: Classify + std::error::Error + Send + Sync + 'static,
    {
        let classification = classify(&error);
        let mut context = BTreeMap::new();
        context.insert("attempts".to_string(), attempts.to_string());
        context.insert("category".to_string(), classification.category.to_string());

        Self {
            service,
            status: error.status_code(),
            code: error.error_code(),
            message: error.to_string(),
            category: classification.category,
            severity: classification.severity,
            retry_after: error.retry_after(),
            attempts,
            context,
            source: Some(Box::new(error)),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

impl Classify for ServiceError {
    fn declared_category(&self) -> Option<(ErrorCategory, ErrorSeverity)> {
        Some((self.category, self.severity))
    }

    fn status_code(&self) -> Option<u16> {
        self.status
    }

    fn error_code(&self) -> Option<String> {
        self.code.clone()
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}
