//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build registry → Register breakers → Build guards
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop HTTP surface → Destroy registry (stop monitors) → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: invalid config is fatal, every violation is reported at once
//! - Breakers for known services are registered eagerly so health shows them all
//! - Monitors are stopped explicitly; nothing relies on process exit

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{bootstrap, Runtime};
