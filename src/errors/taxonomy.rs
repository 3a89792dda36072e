//! Failure classification.
//!
//! # Precedence
//! ```text
//! declared_category()  (typed errors: breaker open, validation, service errors)
//!     → status_code()  (HTTP status mapping)
//!     → message text   ("webhook", "timeout", "network"/"fetch", socket resets)
//!     → unknown/medium
//! ```

use std::fmt;
use std::io;
use std::time::Duration;

use serde::Serialize;

/// What kind of failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Authentication,
    RateLimit,
    ServiceUnavailable,
    Network,
    Timeout,
    Webhook,
    /// Rejected by an open circuit breaker; the breaker is the back-pressure signal.
    CircuitOpen,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::ServiceUnavailable => "service_unavailable",
            ErrorCategory::Network => "network",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Webhook => "webhook",
            ErrorCategory::CircuitOpen => "circuit_open",
            ErrorCategory::Unknown => "unknown",
        }
    }

    /// Whether failures of this kind are transient and worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCategory::RateLimit
                | ErrorCategory::ServiceUnavailable
                | ErrorCategory::Network
                | ErrorCategory::Timeout
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How bad a failure is, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Low => "low",
            ErrorSeverity::Medium => "medium",
            ErrorSeverity::High => "high",
            ErrorSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub retryable: bool,
}

impl Classification {
    pub fn new(category: ErrorCategory, severity: ErrorSeverity) -> Self {
        Self {
            category,
            severity,
            retryable: category.is_retryable(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(ErrorCategory::Unknown, ErrorSeverity::Medium)
    }
}

/// Facts about an error that drive classification and retry decisions.
///
/// Every method has a default, so plain message errors only need `Display`.
pub trait Classify: fmt::Display {
    /// Category fixed by the error's type, bypassing status and message checks.
    fn declared_category(&self) -> Option<(ErrorCategory, ErrorSeverity)> {
        None
    }

    /// HTTP status associated with the failure, if any.
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// Provider-specific error code, if any.
    fn error_code(&self) -> Option<String> {
        None
    }

    /// Server-provided `Retry-After` hint.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl<T: Classify + ?Sized> Classify for &T {
    fn declared_category(&self) -> Option<(ErrorCategory, ErrorSeverity)> {
        (**self).declared_category()
    }

    fn status_code(&self) -> Option<u16> {
        (**self).status_code()
    }

    fn error_code(&self) -> Option<String> {
        (**self).error_code()
    }

    fn retry_after(&self) -> Option<Duration> {
        (**self).retry_after()
    }
}

impl Classify for str {}

impl Classify for String {}

impl Classify for io::Error {
    fn declared_category(&self) -> Option<(ErrorCategory, ErrorSeverity)> {
        match self.kind() {
            io::ErrorKind::TimedOut => Some((ErrorCategory::Timeout, ErrorSeverity::Medium)),
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => Some((ErrorCategory::Network, ErrorSeverity::High)),
            _ => None,
        }
    }
}

/// Message fragments that mark a failure as transient.
const TRANSIENT_KEYWORDS: &[&str] = &[
    "network",
    "timeout",
    "timed out",
    "fetch",
    "econnreset",
    "econnrefused",
    "etimedout",
    "enotfound",
    "socket hang up",
    "connection reset",
    "connection refused",
];

/// True when the message looks like a network, timeout or fetch failure.
pub fn is_transient_message(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_KEYWORDS.iter().any(|kw| message.contains(kw))
}

/// Map an HTTP status to a classification, if the status is meaningful on its own.
pub fn classify_status(status: u16) -> Option<Classification> {
    let (category, severity) = match status {
        400 | 422 => (ErrorCategory::Validation, ErrorSeverity::Low),
        401 | 403 => (ErrorCategory::Authentication, ErrorSeverity::High),
        408 => (ErrorCategory::Timeout, ErrorSeverity::Medium),
        429 => (ErrorCategory::RateLimit, ErrorSeverity::Medium),
        500..=599 => (ErrorCategory::ServiceUnavailable, ErrorSeverity::High),
        _ => return None,
    };
    Some(Classification::new(category, severity))
}

/// Classify a failure into (category, severity, retryable).
pub fn classify<E: Classify + ?Sized>(error: &E) -> Classification {
    if let Some((category, severity)) = error.declared_category() {
        return Classification::new(category, severity);
    }

    if let Some(classification) = error.status_code().and_then(classify_status) {
        return classification;
    }

    let message = error.to_string().to_lowercase();
    if message.contains("webhook") {
        return Classification::new(ErrorCategory::Webhook, ErrorSeverity::Medium);
    }
    if message.contains("timeout") || message.contains("timed out") || message.contains("etimedout") {
        return Classification::new(ErrorCategory::Timeout, ErrorSeverity::Medium);
    }
    if message.contains("network") || message.contains("fetch") {
        return Classification::new(ErrorCategory::Network, ErrorSeverity::High);
    }
    if is_transient_message(&message) {
        // socket-level resets without the word "network"
        return Classification::new(ErrorCategory::Network, ErrorSeverity::High);
    }

    Classification::unknown()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StatusError(u16);

    impl fmt::Display for StatusError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "request failed with status {}", self.0)
        }
    }

    impl Classify for StatusError {
        fn status_code(&self) -> Option<u16> {
            Some(self.0)
        }
    }

    #[test]
    fn test_message_heuristics() {
        assert_eq!(classify("webhook signature mismatch").category, ErrorCategory::Webhook);
        assert_eq!(classify("Request timeout after 30s").category, ErrorCategory::Timeout);
        assert_eq!(classify("fetch failed").category, ErrorCategory::Network);
        assert_eq!(classify("Network unreachable").severity, ErrorSeverity::High);
        assert_eq!(classify("read ECONNRESET").category, ErrorCategory::Network);
    }

    #[test]
    fn test_webhook_beats_timeout() {
        let c = classify("webhook delivery timeout");
        assert_eq!(c.category, ErrorCategory::Webhook);
        assert!(!c.retryable);
    }

    #[test]
    fn test_unknown_fallback() {
        let c = classify("something odd happened");
        assert_eq!(c, Classification::unknown());
        assert!(!c.retryable);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(classify(&StatusError(429)).category, ErrorCategory::RateLimit);
        assert_eq!(classify(&StatusError(401)).category, ErrorCategory::Authentication);
        assert_eq!(classify(&StatusError(422)).severity, ErrorSeverity::Low);
        assert_eq!(classify(&StatusError(503)).category, ErrorCategory::ServiceUnavailable);
        assert!(classify(&StatusError(502)).retryable);
        assert!(!classify(&StatusError(403)).retryable);
        // 404 carries no meaning of its own; message heuristics decide
        assert_eq!(classify(&StatusError(404)).category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_io_error_kinds() {
        let timeout = io::Error::new(io::ErrorKind::TimedOut, "deadline");
        assert_eq!(classify(&timeout).category, ErrorCategory::Timeout);

        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "peer");
        assert!(classify(&reset).retryable);

        let other = io::Error::new(io::ErrorKind::Other, "disk full");
        assert_eq!(classify(&other).category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Low < ErrorSeverity::Medium);
        assert!(ErrorSeverity::High < ErrorSeverity::Critical);
    }

    #[test]
    fn test_transient_keywords() {
        assert!(is_transient_message("socket hang up"));
        assert!(is_transient_message("connect ETIMEDOUT 10.0.0.1:443"));
        assert!(!is_transient_message("invalid token"));
    }
}
