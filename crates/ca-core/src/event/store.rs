//! In-memory event store with change notification

use tracing::debug;

use super::types::{Category, Event, EventFields, EventId};

/// Change notification delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Added(Event),
    Removed(EventId),
    Updated(Event),
}

/// Handle returned by `EventStore::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&StoreChange) + Send + Sync>;

/// Owner of all events for a session.
///
/// Insertion order is display order. Subscribers are called synchronously,
/// in subscription order, after each successful mutation.
#[derive(Default)]
pub struct EventStore {
    events: Vec<Event>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl EventStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the sample day shown on first launch
    pub fn with_sample_events() -> Self {
        let mut store = Self::new();
        let samples = [
            ("Team Meeting", "09:00 AM", "1h", Category::Meeting),
            ("Project Planning", "11:00 AM", "2h", Category::Work),
            ("Lunch Break", "01:00 PM", "1h", Category::Personal),
        ];
        for (title, time, duration, category) in samples {
            if let Ok(fields) = EventFields::new(title, time, duration, category) {
                store.add(fields);
            }
        }
        store
    }

    /// Add an event, assigning a fresh id
    pub fn add(&mut self, fields: EventFields) -> Event {
        let mut id = EventId::generate();
        while self.position(&id).is_some() {
            id = EventId::generate();
        }

        let event = Event::new(id, fields);
        self.events.push(event.clone());
        debug!("Added event {} ({})", event.id, event.fields.title());

        self.notify(&StoreChange::Added(event.clone()));
        event
    }

    /// Remove the event with the given id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &EventId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        self.events.remove(index);
        debug!("Removed event {}", id);

        self.notify(&StoreChange::Removed(id.clone()));
        true
    }

    /// Replace the stored event sharing `event.id`. Returns false if no such id exists.
    pub fn update(&mut self, event: Event) -> bool {
        let Some(index) = self.position(&event.id) else {
            return false;
        };

        self.events[index] = event.clone();
        debug!("Updated event {}", event.id);

        self.notify(&StoreChange::Updated(event));
        true
    }

    /// Read-only view of all events in display order
    pub fn list(&self) -> &[Event] {
        &self.events
    }

    /// Look up a single event
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|event| &event.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Register a change callback
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&StoreChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Drop a change callback. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    fn position(&self, id: &EventId) -> Option<usize> {
        self.events.iter().position(|event| &event.id == id)
    }

    fn notify(&self, change: &StoreChange) {
        for (_, subscriber) in &self.subscribers {
            subscriber(change);
        }
    }
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("events", &self.events)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
