use std::sync::mpsc;

use crate::WatchEvent;

/// Receives scheduler notifications. Implementations must not block or panic.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: WatchEvent);
}

/// Forwards events over an unbounded channel; a dropped receiver is ignored.
pub struct ChannelEventSink {
    tx: mpsc::Sender<WatchEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<WatchEvent>) -> Self {
        Self { tx }
    }

    pub fn pair() -> (Self, mpsc::Receiver<WatchEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: WatchEvent) {
        let _ = self.tx.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: WatchEvent) {}
}
