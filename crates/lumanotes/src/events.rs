//! # Event Bus
//!
//! In-process publish/subscribe used to keep every open view in step with
//! the repository without reloading the whole store.
//!
//! - The bus is an ordinary value: construct one, share it behind an `Rc`,
//!   hand it to the repository and to each view. Nothing is global.
//! - [`EventBus::emit`] calls matching handlers synchronously, in
//!   subscription order, on the caller's thread. Delivery is best effort for
//!   the life of the process; nothing is queued or persisted.
//! - Handlers may subscribe or unsubscribe from inside a callback. An emit
//!   delivers to the handlers registered when it started.
//! - Subscriptions must be released when a view goes away, either with
//!   [`EventBus::unsubscribe`] or by dropping the [`Subscription`] guard.

use crate::model::NoteId;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NoteSaved,
    PinStateChanged,
}

impl EventKind {
    /// Event name shared with other clients of the same bus protocol.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::NoteSaved => "noteUpdated",
            EventKind::PinStateChanged => "pinStateChanged",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "noteUpdated" => Some(EventKind::NoteSaved),
            "pinStateChanged" => Some(EventKind::PinStateChanged),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteEvent {
    NoteSaved { id: NoteId, title: String },
    PinStateChanged { id: NoteId, is_pinned: bool },
}

impl NoteEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            NoteEvent::NoteSaved { .. } => EventKind::NoteSaved,
            NoteEvent::PinStateChanged { .. } => EventKind::PinStateChanged,
        }
    }

    pub fn id(&self) -> &NoteId {
        match self {
            NoteEvent::NoteSaved { id, .. } | NoteEvent::PinStateChanged { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&NoteEvent)>;

struct Entry {
    id: SubscriptionId,
    kind: EventKind,
    handler: Handler,
}

#[derive(Default)]
pub struct EventBus {
    entries: RefCell<Vec<Entry>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&NoteEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push(Entry {
            id,
            kind,
            handler: Rc::new(handler),
        });
        log::debug!("subscribed {:?} to {}", id, kind.name());
        id
    }

    /// Like [`subscribe`](Self::subscribe), released when the guard drops.
    pub fn subscribe_guard<F>(self: &Rc<Self>, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&NoteEvent) + 'static,
    {
        let id = self.subscribe(kind, handler);
        Subscription {
            bus: Rc::downgrade(self),
            id,
        }
    }

    /// Returns false if `id` was not (or no longer) subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    pub fn emit(&self, event: &NoteEvent) {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .entries
            .borrow()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| Rc::clone(&e.handler))
            .collect();
        log::debug!(
            "emit {} for {} to {} handler(s)",
            kind.name(),
            event.id(),
            handlers.len()
        );
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }
}

/// Unsubscribes on drop. Does not keep the bus alive.
pub struct Subscription {
    bus: Weak<EventBus>,
    id: SubscriptionId,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}
