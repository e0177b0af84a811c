//! # Note List View
//!
//! A list screen's copy of the pinned and active notes, kept current by the
//! event bus instead of reloading after every change elsewhere:
//!
//! - `NoteSaved` updates the note's title, re-stamps it and moves it to the
//!   top of its list. An id the view has never seen is a note created
//!   elsewhere and is added to the active list.
//! - `PinStateChanged` moves the note between the pinned and active lists.
//!
//! Events carry neither content nor the stored date. A saved note is stamped
//! with the view's clock when the event arrives, which is never earlier than
//! the date the repository wrote, so the list order matches a reload. Search
//! runs over the content seen at the last [`load`](NoteListView::load). Trashing publishes nothing; the issuing
//! screen calls [`forget`](NoteListView::forget), other screens reload.
//!
//! The view owns its subscriptions: dropping it unsubscribes from the bus.

use crate::error::Result;
use crate::events::{EventBus, EventKind, NoteEvent, Subscription};
use crate::model::{LifecycleState, Note, NoteId};
use crate::repository::NoteRepository;
use crate::search::filter_notes;
use crate::store::KvStore;
use chrono::Utc;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Lists {
    pinned: Vec<Note>,
    active: Vec<Note>,
}

impl Lists {
    fn apply(&mut self, event: &NoteEvent) {
        match event {
            NoteEvent::NoteSaved { id, title } => self.saved(id, title),
            NoteEvent::PinStateChanged { id, is_pinned } => self.pin_changed(id, *is_pinned),
        }
    }

    /// Content is left as last loaded.
    fn saved(&mut self, id: &NoteId, title: &str) {
        let now = Utc::now();
        for list in [&mut self.pinned, &mut self.active] {
            if let Some(pos) = list.iter().position(|n| &n.id == id) {
                let mut note = list.remove(pos);
                note.title = title.to_string();
                note.last_modified = now;
                list.insert(0, note);
                return;
            }
        }
        log::debug!("view: adding {} seen in a save", id);
        self.active.insert(
            0,
            Note {
                id: id.clone(),
                content: String::new(),
                title: title.to_string(),
                last_modified: now,
                state: LifecycleState::Active,
            },
        );
    }

    fn pin_changed(&mut self, id: &NoteId, is_pinned: bool) {
        let (from, to, state) = if is_pinned {
            (&mut self.active, &mut self.pinned, LifecycleState::Pinned)
        } else {
            (&mut self.pinned, &mut self.active, LifecycleState::Active)
        };
        let Some(pos) = from.iter().position(|n| &n.id == id) else {
            log::debug!("view: pin change for unknown note {}", id);
            return;
        };
        let mut note = from.remove(pos);
        note.state = state;
        let at = to
            .iter()
            .position(|n| listed_before(&note, n))
            .unwrap_or(to.len());
        to.insert(at, note);
    }

    fn forget(&mut self, id: &NoteId) -> bool {
        let before = self.pinned.len() + self.active.len();
        self.pinned.retain(|n| &n.id != id);
        self.active.retain(|n| &n.id != id);
        self.pinned.len() + self.active.len() != before
    }
}

/// Newer first, then higher id first: the repository's listing order.
fn listed_before(a: &Note, b: &Note) -> bool {
    (a.last_modified, &a.id) > (b.last_modified, &b.id)
}

pub struct NoteListView {
    lists: Rc<RefCell<Lists>>,
    _subscriptions: Vec<Subscription>,
}

impl NoteListView {
    /// An empty view subscribed to `bus`.
    pub fn attach(bus: &Rc<EventBus>) -> Self {
        let lists = Rc::new(RefCell::new(Lists::default()));
        let subscriptions = [EventKind::NoteSaved, EventKind::PinStateChanged]
            .into_iter()
            .map(|kind| {
                let lists = Rc::clone(&lists);
                bus.subscribe_guard(kind, move |event| lists.borrow_mut().apply(event))
            })
            .collect();
        Self {
            lists,
            _subscriptions: subscriptions,
        }
    }

    /// Attach to the repository's bus and load both lists.
    pub async fn open<S: KvStore>(repo: &NoteRepository<S>) -> Result<Self> {
        let view = Self::attach(repo.bus());
        view.load(repo).await?;
        Ok(view)
    }

    /// Replace both lists with the repository's current contents.
    pub async fn load<S: KvStore>(&self, repo: &NoteRepository<S>) -> Result<()> {
        let pinned = repo.list_pinned().await?;
        let active = repo.list_active().await?;
        let mut lists = self.lists.borrow_mut();
        lists.pinned = pinned;
        lists.active = active;
        Ok(())
    }

    pub fn pinned(&self) -> Vec<Note> {
        self.lists.borrow().pinned.clone()
    }

    pub fn active(&self) -> Vec<Note> {
        self.lists.borrow().active.clone()
    }

    /// Active notes matching `query`, in list order.
    pub fn search(&self, query: &str) -> Vec<Note> {
        filter_notes(&self.lists.borrow().active, query)
    }

    /// Apply an event by hand, as the bus would.
    pub fn apply(&self, event: &NoteEvent) {
        self.lists.borrow_mut().apply(event);
    }

    /// Drop `id` from both lists. Returns false if the view did not hold it.
    pub fn forget(&self, id: &NoteId) -> bool {
        self.lists.borrow_mut().forget(id)
    }
}
