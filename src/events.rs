use std::sync::Mutex;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::types::{SendTransactionResult, Wallet};

#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionEvent {
    Initialized,
    ConnectionFinished(Option<Wallet>),
    ConnectionFailed(String),
    ConnectionRestored(bool),
    ConnectionPaused,
    ConnectionUnpaused,
    Disconnected,
    TransactionFinished {
        result: Option<SendTransactionResult>,
        success: bool,
    },
}

/// Fan-out of controller events, in emission order, to every live subscriber.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<UnboundedSender<ConnectionEvent>>>,
}

impl EventBus {
    pub fn subscribe(&self) -> UnboundedReceiver<ConnectionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    pub fn emit(&self, event: ConnectionEvent) {
        log::debug!("event: {event:?}");
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_in_order() {
        let bus = EventBus::default();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.emit(ConnectionEvent::Initialized);
        bus.emit(ConnectionEvent::ConnectionRestored(false));

        for rx in [&mut a, &mut b] {
            assert_eq!(rx.try_recv().unwrap(), ConnectionEvent::Initialized);
            assert_eq!(rx.try_recv().unwrap(), ConnectionEvent::ConnectionRestored(false));
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let bus = EventBus::default();
        let dropped = bus.subscribe();
        let mut kept = bus.subscribe();
        drop(dropped);

        bus.emit(ConnectionEvent::Disconnected);

        assert_eq!(bus.subscribers.lock().unwrap().len(), 1);
        assert_eq!(kept.try_recv().unwrap(), ConnectionEvent::Disconnected);
    }
}
