//! Event infrastructure for the note collection.
//!
//! Provides `CollectionEvent` for presentation layers and `EventBus` for
//! subscriptions. The collection emits after every view refresh, so a
//! subscriber re-renders from the collection's derived views instead of the
//! collection reaching into UI state.

use crate::note::NoteId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Events emitted by `NoteCollection`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CollectionEvent {
    /// Filtered/grouped view was rebuilt.
    ViewChanged {
        /// Notes in the filtered view.
        visible: usize,
        /// Number of year groups.
        groups: usize,
    },
    /// Selection moved to another note or was cleared.
    SelectionChanged {
        selected: Option<NoteId>,
    },
    /// A save failed. The in-memory state still holds the change.
    SaveFailed {
        reason: String,
    },
    /// Loading failed and the collection started empty.
    LoadRecovered {
        reason: String,
    },
}

type Listener = Arc<dyn Fn(CollectionEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_key: u64,
    by_key: BTreeMap<u64, Listener>,
}

/// Keeps a listener registered on an `EventBus`. Dropping it removes the
/// listener.
#[must_use = "the listener is removed as soon as the Subscription is dropped"]
pub struct Subscription {
    bus: Weak<EventBus>,
    key: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.key);
        }
    }
}

/// Fan-out of `CollectionEvent`s to registered listeners, in registration
/// order. Listeners run synchronously on the emitting thread.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Listeners>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` until the returned `Subscription` is dropped.
    pub fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(CollectionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let mut listeners = self.lock();
        let key = listeners.next_key;
        listeners.next_key += 1;
        listeners.by_key.insert(key, Arc::new(listener));
        Subscription {
            bus: Arc::downgrade(self),
            key,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().by_key.len()
    }

    pub fn emit(&self, event: CollectionEvent) {
        // Listeners are called with the lock released so they may subscribe
        // or drop subscriptions.
        let listeners: Vec<Listener> = self.lock().by_key.values().cloned().collect();
        for listener in listeners {
            listener(event.clone());
        }
    }

    fn remove(&self, key: u64) {
        self.lock().by_key.remove(&key);
    }

    fn lock(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_and_emit() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _sub = bus.subscribe(move |event| sink.lock().unwrap().push(event));

        bus.emit(CollectionEvent::ViewChanged { visible: 2, groups: 1 });
        assert_eq!(
            *seen.lock().unwrap(),
            vec![CollectionEvent::ViewChanged { visible: 2, groups: 1 }]
        );
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = Arc::new(EventBus::new());
        let sub = bus.subscribe(|_| {});
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_listener_may_subscribe_during_emit() {
        let bus = Arc::new(EventBus::new());
        let inner = Arc::new(Mutex::new(Vec::new()));

        let bus_ref = Arc::clone(&bus);
        let keep = Arc::clone(&inner);
        let _outer = bus.subscribe(move |_| {
            let sub = bus_ref.subscribe(|_| {});
            keep.lock().unwrap().push(sub);
        });

        bus.emit(CollectionEvent::SelectionChanged { selected: None });
        assert_eq!(bus.subscriber_count(), 2);
        inner.lock().unwrap().clear();
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_event_serialization() {
        let event = CollectionEvent::SaveFailed { reason: "disk full".into() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "saveFailed");
        assert_eq!(json["reason"], "disk full");
    }
}
