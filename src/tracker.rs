// Last observed canonical state per container name; decides which changes are eventable.

use std::collections::HashMap;

use crate::models::{ContainerEvent, ContainerState, EventKind};
use chrono::{DateTime, Utc};

/// A meaningful change between `running` and `exited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: ContainerState,
    pub current: ContainerState,
    pub kind: EventKind,
}

impl Transition {
    pub fn into_event(
        self,
        container_id: &str,
        container_name: &str,
        at: DateTime<Utc>,
    ) -> ContainerEvent {
        ContainerEvent {
            container_id: container_id.to_string(),
            container_name: container_name.to_string(),
            previous_status: self.previous,
            current_status: self.current,
            occurred_at: at,
            event_type: self.kind,
        }
    }
}

/// Single-writer state: owned by the poller and only mutated under its lock.
/// Not persisted; after a restart every container is a first observation again.
#[derive(Debug, Default)]
pub struct TransitionTracker {
    last_known: HashMap<String, ContainerState>,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `state` for `name` and returns the transition if it is eventable.
    /// The first observation of a name never produces one.
    pub fn observe(&mut self, name: &str, state: ContainerState) -> Option<Transition> {
        let previous = self.last_known.insert(name.to_string(), state)?;
        let kind = match (previous, state) {
            (ContainerState::Running, ContainerState::Exited) => EventKind::ContainerDown,
            (ContainerState::Exited, ContainerState::Running) => EventKind::ContainerUp,
            _ => return None,
        };
        Some(Transition {
            previous,
            current: state,
            kind,
        })
    }

    pub fn last_known(&self, name: &str) -> Option<ContainerState> {
        self.last_known.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.last_known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_known.is_empty()
    }
}
