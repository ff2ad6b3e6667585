//! Application message bus and navigation requests.
//!
//! Any component may publish; every live subscriber receives a copy.
//! Subscribers whose receiver was dropped are pruned on the next publish.

use std::path::PathBuf;
use std::sync::Arc;

use flume::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::trace;

use crate::models::MediaHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusMessage {
    /// Reload whatever is currently displayed.
    RefreshRequested,
    /// Replace the play queue with these items, in order.
    PlaylistReplace(Vec<MediaHandle>),
    PlayMedia(MediaHandle),
    PlayNext(MediaHandle),
}

#[derive(Clone, Default)]
pub struct MessageBus {
    subscribers: Arc<Mutex<Vec<Sender<BusMessage>>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<BusMessage> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Delivers `message` to every subscriber; returns how many received it.
    pub fn publish(&self, message: BusMessage) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(message.clone()).is_ok());
        trace!(?message, delivered = subscribers.len(), "Published");
        subscribers.len()
    }

    pub fn request_refresh(&self) -> usize {
        self.publish(BusMessage::RefreshRequested)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Receives forward-navigation requests when the user opens a sub-folder.
pub trait Navigator: Send + Sync {
    fn navigate(&self, breadcrumbs: Vec<PathBuf>);
}

/// Navigator that discards requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNavigation;

impl Navigator for NoNavigation {
    fn navigate(&self, breadcrumbs: Vec<PathBuf>) {
        trace!(?breadcrumbs, "Navigation ignored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let bus = MessageBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        assert_eq!(bus.request_refresh(), 2);
        assert_eq!(a.try_recv().unwrap(), BusMessage::RefreshRequested);
        assert_eq!(b.try_recv().unwrap(), BusMessage::RefreshRequested);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let bus = MessageBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        assert_eq!(bus.request_refresh(), 1);
        assert_eq!(bus.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }
}
