// One observation cycle: inventory -> snapshots -> transition tracking -> events.
// Also hosts the restart/stop commands and the live/history read accessors.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::models::{ContainerEvent, ContainerInfo, ContainerSnapshot};
use crate::ports::{EventPublisher, InventoryError, InventoryPort, SnapshotStore};
use crate::tracker::TransitionTracker;

/// Default look-back window for history queries.
pub const DEFAULT_HISTORY_HOURS: i64 = 24;

/// Result of one `poll_once` call.
#[derive(Debug)]
pub enum PollOutcome {
    /// Another cycle held the tracker; nothing was done.
    Skipped,
    /// Inventory fetch failed; nothing was written and the tracker is untouched.
    InventoryUnavailable,
    Completed {
        observed: usize,
        /// False when the batch write failed; tracking still ran.
        persisted: bool,
        events: Vec<ContainerEvent>,
    },
}

pub struct Poller {
    inventory: Arc<dyn InventoryPort>,
    snapshots: Arc<dyn SnapshotStore>,
    publisher: Arc<dyn EventPublisher>,
    topic: String,
    tracker: Mutex<TransitionTracker>,
}

impl Poller {
    pub fn new(
        inventory: Arc<dyn InventoryPort>,
        snapshots: Arc<dyn SnapshotStore>,
        publisher: Arc<dyn EventPublisher>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            inventory,
            snapshots,
            publisher,
            topic: topic.into(),
            tracker: Mutex::new(TransitionTracker::new()),
        }
    }

    /// Runs one cycle at the current time.
    pub async fn poll_once(&self) -> PollOutcome {
        self.poll_at(Utc::now()).await
    }

    /// Runs one cycle stamped `now`. At most one cycle runs at a time: if the tracker is
    /// held by an in-flight cycle this call is skipped rather than queued.
    #[instrument(skip(self), fields(operation = "poll"))]
    pub async fn poll_at(&self, now: DateTime<Utc>) -> PollOutcome {
        let Ok(mut tracker) = self.tracker.try_lock() else {
            debug!("previous poll still running; skipping tick");
            return PollOutcome::Skipped;
        };

        let containers = match self.inventory.list(true).await {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    error = %e,
                    operation = "list_containers",
                    "poll failed, inventory unavailable"
                );
                return PollOutcome::InventoryUnavailable;
            }
        };

        let snapshots: Vec<ContainerSnapshot> = containers
            .iter()
            .map(|c| ContainerSnapshot::observe(c, now))
            .collect();

        let persisted = match self.snapshots.save_all(&snapshots).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    error = %e,
                    operation = "save_all",
                    snapshots_count = snapshots.len(),
                    "poll could not persist snapshots"
                );
                false
            }
        };

        let mut events = Vec::new();
        for c in &containers {
            if let Some(transition) = tracker.observe(&c.name, c.state()) {
                let event = transition.into_event(&c.id, &c.name, now);
                info!(
                    container = %c.name,
                    from = %transition.previous,
                    to = %transition.current,
                    event = %transition.kind,
                    "container state changed"
                );
                // Completion signal intentionally dropped; the publisher logs failures.
                let _ = self.publisher.publish(&self.topic, event.clone());
                events.push(event);
            }
        }

        debug!(
            observed = containers.len(),
            tracked = tracker.len(),
            events = events.len(),
            "poll complete"
        );
        PollOutcome::Completed {
            observed: containers.len(),
            persisted,
            events,
        }
    }

    /// Restarts the container currently named `name`. Returns false when nothing happened
    /// (no such container, or the inventory call failed; both are logged).
    pub async fn restart(&self, name: &str) -> bool {
        self.run_command(name, Command::Restart).await
    }

    /// Stops the container currently named `name`. Same contract as `restart`.
    pub async fn stop(&self, name: &str) -> bool {
        self.run_command(name, Command::Stop).await
    }

    #[instrument(skip(self), fields(operation = command.as_str()))]
    async fn run_command(&self, name: &str, command: Command) -> bool {
        match self.try_command(name, command).await {
            Ok(Some(event)) => {
                info!(container = %name, "{} container", command.past_tense());
                let _ = self.publisher.publish(&self.topic, event);
                true
            }
            Ok(None) => {
                info!(container = %name, "container not found");
                false
            }
            Err(e) => {
                warn!(
                    container = %name,
                    error = %e,
                    "failed to {} container",
                    command.as_str()
                );
                false
            }
        }
    }

    async fn try_command(
        &self,
        name: &str,
        command: Command,
    ) -> Result<Option<ContainerEvent>, InventoryError> {
        let containers = self.inventory.list(true).await?;
        let Some(target) = containers.into_iter().find(|c| c.name == name) else {
            return Ok(None);
        };
        let event = match command {
            Command::Restart => {
                self.inventory.restart(&target.id).await?;
                ContainerEvent::restarted(&target.id, &target.name, Utc::now())
            }
            Command::Stop => {
                self.inventory.stop(&target.id).await?;
                ContainerEvent::stopped(&target.id, &target.name, Utc::now())
            }
        };
        Ok(Some(event))
    }

    /// Live inventory (including stopped containers) stamped now. Not persisted, not tracked.
    pub async fn current_containers(&self) -> Result<Vec<ContainerSnapshot>, InventoryError> {
        let now = Utc::now();
        let containers: Vec<ContainerInfo> = self.inventory.list(true).await?;
        Ok(containers
            .iter()
            .map(|c| ContainerSnapshot::observe(c, now))
            .collect())
    }

    /// Persisted snapshots of all containers from the last `hours` hours.
    pub async fn recent_history(&self, hours: i64) -> anyhow::Result<Vec<ContainerSnapshot>> {
        let since = history_since(hours, Utc::now())?;
        self.snapshots.find_by_checked_at_after(since).await
    }

    /// Persisted snapshots of one container from the last `hours` hours.
    pub async fn recent_history_for(
        &self,
        name: &str,
        hours: i64,
    ) -> anyhow::Result<Vec<ContainerSnapshot>> {
        let since = history_since(hours, Utc::now())?;
        self.snapshots
            .find_by_name_and_checked_at_after(name, since)
            .await
    }
}

/// Start of a look-back window of `hours` ending at `now`. Fails when the window does not
/// fit the calendar range.
pub fn history_since(hours: i64, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    Duration::try_hours(hours)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| anyhow::anyhow!("history window of {} hours is out of range", hours))
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Restart,
    Stop,
}

impl Command {
    fn as_str(&self) -> &'static str {
        match self {
            Command::Restart => "restart",
            Command::Stop => "stop",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            Command::Restart => "restarted",
            Command::Stop => "stopped",
        }
    }
}
