//! Error taxonomy subsystem.
//!
//! # Data Flow
//! ```text
//! Any failure (typed error, HTTP status, timeout, message)
//!     → taxonomy.rs (classify → category, severity, retryable)
//!     → retry decisions (resilience::retries, resilience::policies)
//!     → report.rs (log at severity, count by category)
//! ```
//!
//! # Design Decisions
//! - Typed errors declare their own category; heuristics only apply to the rest
//! - HTTP status is consulted before message text
//! - Unmatched errors are unknown/medium and not retried

pub mod report;
pub mod taxonomy;
pub mod types;

pub use report::report_error;
pub use taxonomy::{classify, Classification, Classify, ErrorCategory, ErrorSeverity};
pub use types::{RemoteError, ServiceError, ValidationError};
