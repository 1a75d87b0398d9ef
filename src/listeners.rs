//! Change notification fan-out.
//!
//! Listeners are keyed by a channel name. `broadcast` reaches every listener
//! in registration order; `emit` reaches one channel only. Callbacks run on
//! the caller's thread, outside the registry lock, so a listener may register
//! or unregister others.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;

pub type ListenerFn = Arc<dyn Fn(&str, &Value) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Entry {
    id: ListenerId,
    channel: String,
    callback: ListenerFn,
}

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    entries: RwLock<Vec<Entry>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, channel: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let channel = channel.into();
        tracing::debug!(channel = %channel, id = id.0, "Listener registered");
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push(Entry {
            id,
            channel,
            callback: Arc::new(callback),
        });
        id
    }

    /// Returns whether the listener was registered.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver to listeners of `channel`. Returns how many were called.
    pub fn emit(&self, channel: &str, payload: &Value) -> usize {
        self.dispatch(Some(channel), payload)
    }

    /// Deliver to every listener, each with its own channel name.
    pub fn broadcast(&self, payload: &Value) -> usize {
        self.dispatch(None, payload)
    }

    fn dispatch(&self, channel: Option<&str>, payload: &Value) -> usize {
        let targets: Vec<(String, ListenerFn)> = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            entries
                .iter()
                .filter(|e| channel.is_none_or(|c| c == e.channel))
                .map(|e| (e.channel.clone(), Arc::clone(&e.callback)))
                .collect()
        };

        for (channel, callback) in &targets {
            callback(channel, payload);
        }
        targets.len()
    }
}
