//! Generic error-reporting path.
//!
//! Classifies a failure, logs it at a level derived from its severity and
//! counts it by category.

use crate::errors::taxonomy::{classify, Classification, Classify, ErrorSeverity};
use crate::observability::metrics;

/// Whether a classification warrants an operator-visible log line.
pub fn should_report(classification: &Classification) -> bool {
    classification.severity >= ErrorSeverity::Medium
}

/// Classify `error`, log it and return the classification.
pub fn report_error<E: Classify + ?Sized>(error: &E, context: &str) -> Classification {
    let classification = classify(error);
    let category = classification.category.as_str();
    let severity = classification.severity.as_str();

    match classification.severity {
        ErrorSeverity::Low => {
            tracing::debug!(context, category, severity, error = %error, "Handled error");
        }
        ErrorSeverity::Medium => {
            tracing::warn!(
                context,
                category,
                severity,
                retryable = classification.retryable,
                error = %error,
                "Operation failed"
            );
        }
        ErrorSeverity::High => {
            tracing::error!(
                context,
                category,
                severity,
                retryable = classification.retryable,
                error = %error,
                "Operation failed"
            );
        }
        ErrorSeverity::Critical => {
            tracing::error!(
                context,
                category,
                severity,
                critical = true,
                error = %error,
                "Critical failure"
            );
        }
    }

    metrics::record_error(category, severity);
    classification
}
