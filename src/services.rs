//! Downstream dependencies guarded by the resilience layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A remote API the integration talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Service {
    /// Ticketing API (webhook source, ticket comments and updates).
    Ticketing,
    /// Task-management API (task creation and sync).
    TaskManagement,
    /// Chat API (notifications).
    Chat,
    /// AI-inference API (summaries and triage).
    Ai,
}

impl Service {
    pub const ALL: [Service; 4] = [
        Service::Ticketing,
        Service::TaskManagement,
        Service::Chat,
        Service::Ai,
    ];

    /// Registry key used for this service's circuit breaker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Ticketing => "ticketing",
            Service::TaskManagement => "task-management",
            Service::Chat => "chat",
            Service::Ai => "ai",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name does not match any known service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service '{0}'")]
pub struct UnknownService(pub String);

impl FromStr for Service {
    type Err = UnknownService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Service::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| UnknownService(s.to_string()))
    }
}
