//! Internal event broadcast — tokio::broadcast channel for viewer wake-ups.

use serde::Serialize;
use tokio::sync::broadcast;

/// State changes that materially alter what the dashboard displays.
///
/// Price ticks are deliberately absent: they can arrive many times per
/// second and viewers poll the full list anyway.
#[derive(Debug, Clone, Serialize)]
pub enum TradeEvent {
    /// A trade entered SIGNAL state.
    SignalCreated { trade_id: String },
    /// A trade was refined to SETUP (and siblings possibly reversed).
    SetupConfirmed { trade_id: String },
    /// A lifecycle transition was applied via log_event.
    StatusChanged { trade_id: String, status: String },
    /// Rows were removed by the bulk delete.
    TradesDeleted { count: u64 },
}

/// Central event bus fanning trade changes out to connected viewers.
pub struct EventBus {
    tx: broadcast::Sender<TradeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: TradeEvent) {
        // Ignore error if no subscribers
        let _ = self.tx.send(event);
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> broadcast::Receiver<TradeEvent> {
        self.tx.subscribe()
    }

    /// Get current subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(TradeEvent::TradesDeleted { count: 3 });

        for rx in [&mut a, &mut b] {
            match rx.recv().await {
                Ok(TradeEvent::TradesDeleted { count }) => assert_eq!(count, 3),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new(8);
        bus.publish(TradeEvent::SignalCreated {
            trade_id: "T1".to_string(),
        });
    }
}
