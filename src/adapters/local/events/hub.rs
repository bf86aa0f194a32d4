use crate::domain::events::JobEvent;
use tokio::sync::broadcast;

#[derive(Debug)]
pub struct EventHub {
    sender: broadcast::Sender<JobEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        // Slow subscribers lag rather than block the orchestrator.
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Publishes to current subscribers; having none is not an error.
    pub fn publish(&self, event: JobEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let hub = EventHub::new();
        let delivered = hub.publish(JobEvent::JobFailed {
            job_id: None,
            reason: "nobody listening".to_string(),
        });
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();

        hub.publish(JobEvent::RenditionStarted {
            job_id: "abc".to_string(),
            height: 480,
        });
        hub.publish(JobEvent::RenditionFinished {
            job_id: "abc".to_string(),
            height: 480,
        });

        assert!(matches!(
            rx.recv().await.unwrap(),
            JobEvent::RenditionStarted { height: 480, .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            JobEvent::RenditionFinished { height: 480, .. }
        ));
    }
}
