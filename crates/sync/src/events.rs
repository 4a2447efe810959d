use futures::channel::mpsc;
use magnet_feed_core::protocol::SyncEvent;
use std::sync::{Arc, Mutex, PoisonError};

/// Fan-out of [`SyncEvent`]s to any number of subscribers.
///
/// Cloning shares the subscriber list. Closed receivers are dropped on the
/// next publish.
#[derive(Clone, Default)]
pub struct EventBus {
    senders: Arc<Mutex<Vec<mpsc::UnboundedSender<SyncEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SyncEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn publish(&self, event: SyncEvent) {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magnet_feed_core::protocol::RegistrySnapshot;

    #[test]
    fn drops_closed_subscribers() {
        let bus = EventBus::new();
        let mut kept = bus.subscribe();
        let dropped = bus.subscribe();
        drop(dropped);

        bus.publish(SyncEvent::Registry(RegistrySnapshot::default()));
        assert_eq!(bus.subscriber_count(), 1);
        assert!(matches!(
            kept.try_next(),
            Ok(Some(SyncEvent::Registry(_)))
        ));
    }
}
