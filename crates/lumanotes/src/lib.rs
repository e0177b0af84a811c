//! # Lumanotes Architecture
//!
//! Lumanotes is the **note lifecycle core** of a personal note manager. It owns
//! note identity, derives display metadata, decides where a note lives (active,
//! pinned or trashed) and tells every open view when something changed. Text
//! editing, markdown rendering and navigation belong to the UI that calls in.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Views (view.rs, format.rs)                                 │
//! │  - Cached pinned/active lists kept current by events        │
//! │  - Display-only helpers: titles, ages, word counts          │
//! └─────────────────────────────────────────────────────────────┘
//!                 │ calls                    ▲ events
//!                 ▼                          │
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Repository (repository/)                  EventBus         │
//! │  - Sole writer of note keys                (events.rs)      │
//! │  - Lifecycle transitions as single write batches            │
//! │  - In-memory id → state index                               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - KvStore trait: string keys, string values, async         │
//! │  - FileStore (production), MemoryStore (testing)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Layout
//!
//! A note is three keys (`note`, `title`, `date`) under one of three
//! namespaces (`""`, `"pinned_"`, `"trash_"`). Pinning, trashing and restoring
//! move all three keys at once. See [`keys`] for the exact format.
//!
//! ## Concurrency
//!
//! Single-threaded and cooperative: every store call is awaited, nothing is
//! spawned, and the event bus delivers synchronously. Types use `Rc` and
//! `RefCell` and their futures are not `Send`.
//!
//! ## Usage
//!
//! ```no_run
//! use lumanotes::config::NotesConfig;
//! use lumanotes::events::EventBus;
//! use lumanotes::view::NoteListView;
//! use std::rc::Rc;
//!
//! # async fn run() -> lumanotes::error::Result<()> {
//! let config = NotesConfig::load(None)?;
//! let repo = config.open_repository(Rc::new(EventBus::new())).await?;
//! let list = NoteListView::open(&repo).await?;
//!
//! let note = repo.create().await?;
//! repo.save(&note.id, "# Groceries\nmilk").await?;
//! assert_eq!(list.active()[0].display_title(), "Groceries");
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`repository`]: create, load, save, pin, trash, restore, purge, list
//! - [`store`]: key-value abstraction and implementations
//! - [`keys`]: key namespace builder and parser
//! - [`lifecycle`]: the state machine, as a pure function
//! - [`events`]: publish/subscribe between the repository and views
//! - [`view`]: event-driven note list
//! - [`title`]: title derivation and display sanitizing
//! - [`search`]: case-insensitive filtering
//! - [`format`]: last-edited labels and text statistics
//! - [`model`]: core data types (`Note`, `NoteId`, `LifecycleState`)
//! - [`config`]: configuration loading
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod keys;
pub mod lifecycle;
pub mod model;
pub mod repository;
pub mod search;
pub mod store;
pub mod title;
pub mod view;
