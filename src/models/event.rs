// Container transition events (published, never persisted)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ContainerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    ContainerUp,
    ContainerDown,
    ContainerRestarted,
    ContainerStopped,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ContainerUp => "CONTAINER_UP",
            EventKind::ContainerDown => "CONTAINER_DOWN",
            EventKind::ContainerRestarted => "CONTAINER_RESTARTED",
            EventKind::ContainerStopped => "CONTAINER_STOPPED",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerEvent {
    pub container_id: String,
    pub container_name: String,
    pub previous_status: ContainerState,
    pub current_status: ContainerState,
    pub occurred_at: DateTime<Utc>,
    pub event_type: EventKind,
}

impl ContainerEvent {
    /// Synthesized after a successful restart command; the resulting state is assumed, not checked.
    pub fn restarted(container_id: &str, container_name: &str, at: DateTime<Utc>) -> Self {
        Self {
            container_id: container_id.to_string(),
            container_name: container_name.to_string(),
            previous_status: ContainerState::Running,
            current_status: ContainerState::Running,
            occurred_at: at,
            event_type: EventKind::ContainerRestarted,
        }
    }

    /// Synthesized after a successful stop command; the resulting state is assumed, not checked.
    pub fn stopped(container_id: &str, container_name: &str, at: DateTime<Utc>) -> Self {
        Self {
            container_id: container_id.to_string(),
            container_name: container_name.to_string(),
            previous_status: ContainerState::Running,
            current_status: ContainerState::Exited,
            occurred_at: at,
            event_type: EventKind::ContainerStopped,
        }
    }
}
