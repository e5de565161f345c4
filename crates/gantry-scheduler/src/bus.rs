//! In-process event distribution.

use async_trait::async_trait;
use gantry_core::Result;
use gantry_core::events::Event;
use gantry_core::ports::EventSink;
use tokio::sync::broadcast;

/// Event sink that fans events out to in-process subscribers.
pub struct BroadcastSink {
    tx: broadcast::Sender<Event>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventSink for BroadcastSink {
    async fn publish(&self, event: Event) -> Result<()> {
        // A send with no live subscribers is not an error; events are
        // advisory.
        let _ = self.tx.send(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gantry_core::events::RunStartedPayload;
    use gantry_core::ids::RunId;

    fn run_started() -> Event {
        Event::RunStarted(RunStartedPayload {
            run_id: RunId::new(),
            workflow_name: "checks".to_string(),
            job_count: 1,
            started_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let sink = BroadcastSink::new(16);
        let mut rx = sink.subscribe();

        sink.publish(run_started()).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, Event::RunStarted(_)));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let sink = BroadcastSink::new(16);
        assert!(sink.publish(run_started()).await.is_ok());
    }
}
