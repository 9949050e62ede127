// Outbound transition events: in-process broadcast (feeds /ws/events) plus an optional
// HTTP webhook. One attempt per event; failures are logged here and never reach the poller.

use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};

use crate::models::ContainerEvent;
use crate::ports::EventPublisher;

pub const DEFAULT_TOPIC: &str = "container-events";

#[derive(Clone)]
struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    async fn deliver(&self, topic: &str, event: &ContainerEvent) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .header("x-event-topic", topic)
            .header("x-event-key", &event.container_name)
            .json(event)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

pub struct EventBus {
    tx: broadcast::Sender<ContainerEvent>,
    webhook: Option<WebhookSink>,
}

impl EventBus {
    /// Broadcast-only bus.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, webhook: None }
    }

    /// Also POST every event as JSON to `url`.
    pub fn with_webhook(mut self, url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        self.webhook = Some(WebhookSink {
            client,
            url: url.to_string(),
        });
        Ok(self)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContainerEvent> {
        self.tx.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<ContainerEvent> {
        self.tx.clone()
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, topic: &str, event: ContainerEvent) -> oneshot::Receiver<bool> {
        let (done_tx, done_rx) = oneshot::channel();

        let broadcast_ok = match self.tx.send(event.clone()) {
            Ok(receivers) => {
                debug!(topic, receivers, event = %event.event_type, "event broadcast");
                true
            }
            Err(_) => {
                debug!(topic, event = %event.event_type, "no event subscribers");
                false
            }
        };

        let Some(webhook) = self.webhook.clone() else {
            let _ = done_tx.send(broadcast_ok);
            return done_rx;
        };

        let topic = topic.to_string();
        tokio::spawn(async move {
            let delivered = match webhook.deliver(&topic, &event).await {
                Ok(()) => {
                    debug!(
                        topic = %topic,
                        container = %event.container_name,
                        event = %event.event_type,
                        "published event"
                    );
                    true
                }
                Err(e) => {
                    warn!(
                        topic = %topic,
                        container = %event.container_name,
                        error = %e,
                        "event channel unavailable, skipping event"
                    );
                    false
                }
            };
            let _ = done_tx.send(delivered);
        });
        done_rx
    }
}
