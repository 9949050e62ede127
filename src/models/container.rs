// Docker container models: canonical state, inventory rows and persisted snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical container state derived from Docker's free-text status; serializes lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Exited,
    Paused,
    #[serde(other)]
    Unknown,
}

impl ContainerState {
    /// Map a raw status (e.g. "Up 3 days", "Exited (0) 2 hours ago") to a canonical state.
    /// Case-insensitive prefix match; `Restarting` counts as running.
    pub fn normalize(raw_status: Option<&str>) -> Self {
        let Some(raw) = raw_status else {
            return ContainerState::Unknown;
        };
        let lower = raw.to_lowercase();
        if lower.starts_with("up") || lower.starts_with("restarting") {
            ContainerState::Running
        } else if lower.starts_with("exited") {
            ContainerState::Exited
        } else if lower.starts_with("paused") {
            ContainerState::Paused
        } else {
            ContainerState::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerState::Running => "running",
            ContainerState::Exited => "exited",
            ContainerState::Paused => "paused",
            ContainerState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One container as reported by the inventory source right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInfo {
    /// Short (12 char) container id.
    pub id: String,
    pub name: String,
    pub raw_status: String,
    pub image: String,
}

impl ContainerInfo {
    pub fn state(&self) -> ContainerState {
        ContainerState::normalize(Some(&self.raw_status))
    }
}

/// One observation of one container at one instant. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSnapshot {
    pub id: String,
    pub name: String,
    pub raw_status: String,
    pub image: String,
    pub checked_at: DateTime<Utc>,
}

impl ContainerSnapshot {
    pub fn observe(info: &ContainerInfo, checked_at: DateTime<Utc>) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            raw_status: info.raw_status.clone(),
            image: info.image.clone(),
            checked_at,
        }
    }

    pub fn state(&self) -> ContainerState {
        ContainerState::normalize(Some(&self.raw_status))
    }
}
