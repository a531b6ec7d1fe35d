//! In-memory document store for fast, deterministic testing
//!
//! [`InMemoryBackend`] implements [`SocialBackend`] on top of a single
//! `tokio::sync::watch` channel holding the whole database. Every write
//! replaces the database value; every subscription projects the slice it
//! cares about and yields it only when that slice actually changed, so a
//! subscriber sees the current snapshot first and then one item per change.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use dtg_core::backend::{BackendError, BackendFuture, SnapshotStream, SocialBackend};
use dtg_core::model::{
    ArtistId, Event, EventDraft, EventId, Review, ReviewDraft, ReviewId, User, UserId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

#[derive(Clone, Debug, Default)]
struct Database {
    users: BTreeMap<UserId, User>,
    /// Kept sorted by date ascending
    events: Vec<Event>,
    /// Per event, kept sorted by creation time descending
    reviews: HashMap<EventId, Vec<Review>>,
}

impl Database {
    fn user_mut(&mut self, id: &UserId) -> &mut User {
        self.users
            .entry(id.clone())
            .or_insert_with(|| User::new(id.clone()))
    }

    fn insert_event(&mut self, event: Event) {
        self.events.push(event);
        self.events.sort_by_key(|e| e.date);
    }

    fn insert_review(&mut self, review: Review) {
        let reviews = self.reviews.entry(review.event_id.clone()).or_default();
        reviews.insert(0, review);
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

#[derive(Debug)]
struct Inner {
    db: watch::Sender<Database>,
    next_event: AtomicU64,
    next_review: AtomicU64,
    failure: Mutex<Option<BackendError>>,
    writes: AtomicUsize,
}

/// In-memory document store for tests and the demo binary
///
/// Cloning shares the same database.
///
/// # Example
///
/// ```
/// use dtg_testing::InMemoryBackend;
/// use dtg_core::backend::SocialBackend;
/// use dtg_core::model::{EventId, User, UserId};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = InMemoryBackend::new();
/// backend.insert_user(User::new("u1"));
///
/// backend
///     .write_dtg_flag(&UserId::new("u1"), &EventId::new("e1"), true)
///     .await?;
///
/// assert!(backend.user(&UserId::new("u1")).unwrap().is_dtg(&EventId::new("e1")));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryBackend {
    inner: Arc<Inner>,
}

impl InMemoryBackend {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        let (db, _) = watch::channel(Database::default());
        Self {
            inner: Arc::new(Inner {
                db,
                next_event: AtomicU64::new(0),
                next_review: AtomicU64::new(0),
                failure: Mutex::new(None),
                writes: AtomicUsize::new(0),
            }),
        }
    }

    /// Seed a user document, replacing any existing one with the same id
    pub fn insert_user(&self, user: User) {
        self.inner.db.send_modify(|db| {
            db.users.insert(user.id.clone(), user);
        });
    }

    /// Seed an event document
    pub fn insert_event(&self, event: Event) {
        self.inner.db.send_modify(|db| db.insert_event(event));
    }

    /// Seed a review document
    pub fn insert_review(&self, review: Review) {
        self.inner.db.send_modify(|db| db.insert_review(review));
    }

    /// Current user document, if any
    #[must_use]
    pub fn user(&self, id: &UserId) -> Option<User> {
        self.inner.db.borrow().users.get(id).cloned()
    }

    /// All user documents
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.inner.db.borrow().users.values().cloned().collect()
    }

    /// All events, date ascending
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.inner.db.borrow().events.clone()
    }

    /// Reviews of one event, newest first
    #[must_use]
    pub fn reviews(&self, event: &EventId) -> Vec<Review> {
        self.inner
            .db
            .borrow()
            .reviews
            .get(event)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every subsequent write fail with `error`
    pub fn fail_writes_with(&self, error: BackendError) {
        *self.inner.failure.lock().unwrap() = Some(error);
    }

    /// Stop injecting write failures
    pub fn clear_failure(&self) {
        *self.inner.failure.lock().unwrap() = None;
    }

    /// Number of writes the store accepted
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), BackendError> {
        match self.inner.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn commit(&self, op: &'static str, modify: impl FnOnce(&mut Database) -> bool) {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        let changed = self.inner.db.send_if_modified(modify);
        tracing::trace!(op, changed, "In-memory write applied");
    }

    fn project<T, F>(&self, project: F) -> SnapshotStream<T>
    where
        T: Clone + PartialEq + Send + 'static,
        F: Fn(&Database) -> T + Send + 'static,
    {
        let mut rx = self.inner.db.subscribe();

        Box::pin(async_stream::stream! {
            let mut last: Option<T> = None;
            loop {
                let next = project(&rx.borrow_and_update());
                if last.as_ref() != Some(&next) {
                    last = Some(next.clone());
                    yield next;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SocialBackend for InMemoryBackend {
    fn subscribe_users(&self) -> SnapshotStream<Vec<User>> {
        self.project(|db| db.users.values().cloned().collect())
    }

    fn subscribe_following(&self, viewer: &UserId) -> SnapshotStream<Vec<UserId>> {
        let viewer = viewer.clone();
        self.project(move |db| {
            db.users
                .get(&viewer)
                .map(|u| u.following.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    fn subscribe_dtg(&self, user: &UserId) -> SnapshotStream<Vec<EventId>> {
        let user = user.clone();
        self.project(move |db| {
            db.users
                .get(&user)
                .map(|u| u.dtg.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    fn subscribe_recommended(&self, user: &UserId) -> SnapshotStream<Vec<ArtistId>> {
        let user = user.clone();
        self.project(move |db| {
            db.users
                .get(&user)
                .map(|u| u.recommended.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    fn subscribe_events(&self) -> SnapshotStream<Vec<Event>> {
        self.project(|db| db.events.clone())
    }

    fn subscribe_reviews(&self, event: &EventId) -> SnapshotStream<Vec<Review>> {
        let event = event.clone();
        self.project(move |db| db.reviews.get(&event).cloned().unwrap_or_default())
    }

    fn write_dtg_flag(&self, user: &UserId, event: &EventId, on: bool) -> BackendFuture<'_, ()> {
        let user = user.clone();
        let event = event.clone();
        Box::pin(async move {
            self.check_failure()?;
            self.commit("dtg", |db| {
                let created = !db.users.contains_key(&user);
                let dtg = &mut db.user_mut(&user).dtg;
                let changed = if on { dtg.insert(event) } else { dtg.remove(&event) };
                created || changed
            });
            Ok(())
        })
    }

    fn write_recommend_flag(
        &self,
        user: &UserId,
        artist: &ArtistId,
        on: bool,
    ) -> BackendFuture<'_, ()> {
        let user = user.clone();
        let artist = artist.clone();
        Box::pin(async move {
            self.check_failure()?;
            self.commit("recommend", |db| {
                let created = !db.users.contains_key(&user);
                let recommended = &mut db.user_mut(&user).recommended;
                let changed = if on {
                    recommended.insert(artist)
                } else {
                    recommended.remove(&artist)
                };
                created || changed
            });
            Ok(())
        })
    }

    fn write_follow(&self, viewer: &UserId, target: &UserId, on: bool) -> BackendFuture<'_, ()> {
        let viewer = viewer.clone();
        let target = target.clone();
        Box::pin(async move {
            self.check_failure()?;
            self.commit("follow", |db| {
                let created = !db.users.contains_key(&viewer);
                let following = &mut db.user_mut(&viewer).following;
                let changed = if on {
                    following.insert(target)
                } else {
                    following.remove(&target)
                };
                created || changed
            });
            Ok(())
        })
    }

    fn create_event(&self, draft: EventDraft) -> BackendFuture<'_, EventId> {
        Box::pin(async move {
            self.check_failure()?;
            let n = self.inner.next_event.fetch_add(1, Ordering::SeqCst) + 1;
            let id = EventId::new(format!("evt-{n}"));
            let event = Event {
                id: id.clone(),
                title: draft.title,
                venue: draft.venue,
                date: draft.date,
                artist_id: draft.artist_id,
                created_by: draft.created_by,
            };
            self.commit("create_event", |db| {
                db.insert_event(event);
                true
            });
            Ok(id)
        })
    }

    fn create_review(&self, draft: ReviewDraft) -> BackendFuture<'_, ReviewId> {
        Box::pin(async move {
            self.check_failure()?;
            let n = self.inner.next_review.fetch_add(1, Ordering::SeqCst) + 1;
            let id = ReviewId::new(format!("rev-{n}"));
            let review = Review {
                id: id.clone(),
                event_id: draft.event_id,
                author: draft.author,
                stars: draft.stars,
                comment: draft.comment,
                created_at: draft.created_at,
            };
            self.commit("create_review", |db| {
                db.insert_review(review);
                true
            });
            Ok(id)
        })
    }

    fn delete_review(&self, event: &EventId, review: &ReviewId) -> BackendFuture<'_, ()> {
        let event = event.clone();
        let review = review.clone();
        Box::pin(async move {
            self.check_failure()?;
            let exists = self
                .inner
                .db
                .borrow()
                .reviews
                .get(&event)
                .is_some_and(|reviews| reviews.iter().any(|r| r.id == review));
            if !exists {
                return Err(BackendError::NotFound(format!(
                    "events/{event}/reviews/{review}"
                )));
            }
            self.commit("delete_review", |db| {
                if let Some(reviews) = db.reviews.get_mut(&event) {
                    reviews.retain(|r| r.id != review);
                }
                true
            });
            Ok(())
        })
    }
}
