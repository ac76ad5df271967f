use crate::domain::model::InvalidationKey;
use crate::domain::ports::InvalidationSink;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Discards every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl InvalidationSink for NoopSink {
    fn invalidate(&self, _keys: &[InvalidationKey]) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl InvalidationSink for LoggingSink {
    fn invalidate(&self, keys: &[InvalidationKey]) {
        for key in keys {
            tracing::debug!(key = %key, "invalidated");
        }
    }
}

/// Fans keys out to any number of subscribers, e.g. a UI cache per screen.
///
/// Keys published while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: broadcast::Sender<InvalidationKey>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationKey> {
        self.sender.subscribe()
    }
}

impl Default for ChannelSink {
    fn default() -> Self {
        Self::new(64)
    }
}

impl InvalidationSink for ChannelSink {
    fn invalidate(&self, keys: &[InvalidationKey]) {
        for key in keys {
            // no receivers is fine
            let _ = self.sender.send(key.clone());
        }
    }
}

/// Buffers keys until the owner drains them with [`CollectingSink::take`].
#[derive(Debug, Default)]
pub struct CollectingSink {
    keys: Mutex<Vec<InvalidationKey>>,
}

impl CollectingSink {
    pub fn take(&self) -> Vec<InvalidationKey> {
        match self.keys.lock() {
            Ok(mut keys) => std::mem::take(&mut *keys),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl InvalidationSink for CollectingSink {
    fn invalidate(&self, keys: &[InvalidationKey]) {
        let mut guard = match self.keys.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.extend_from_slice(keys);
    }
}
