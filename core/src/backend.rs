//! Persistence-and-identity collaborator seam.
//!
//! The hosted document store owns every write and pushes full snapshots back
//! through subscriptions. The [`SocialBackend`] trait is the only way the
//! feed talks to it.
//!
//! # Snapshot semantics
//!
//! ```text
//!   write_dtg_flag(u, e, true) ──► document store ──► subscribe_dtg(u)
//!                                                      yields [..., e]
//! ```
//!
//! - Each item on a [`SnapshotStream`] is a complete replacement of the
//!   previous item, never a delta.
//! - A new subscriber receives the current snapshot first.
//! - Writes are fire-and-forget: success means the store accepted the write,
//!   the new value arrives later on the matching stream.
//!
//! # Implementations
//!
//! - `InMemoryBackend` (in `dtg-testing`) - For tests and the demo binary

use crate::model::{
    ArtistId, Event, EventDraft, EventId, Review, ReviewDraft, ReviewId, User, UserId,
};
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors returned by the document store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The store could not be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write (permissions, validation rules)
    #[error("Write rejected: {0}")]
    Rejected(String),

    /// The addressed document does not exist
    #[error("Document not found: {0}")]
    NotFound(String),
}

/// A stream of full snapshots
pub type SnapshotStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// Boxed future returned by backend writes
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// The document store as seen by the feed
///
/// # Design
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// to enable trait object usage (`Arc<dyn SocialBackend>`), which is how the
/// backend is injected into the reducer environment.
pub trait SocialBackend: Send + Sync {
    /// Every user document. Ordering is unspecified.
    fn subscribe_users(&self) -> SnapshotStream<Vec<User>>;

    /// Ids the viewer follows
    fn subscribe_following(&self, viewer: &UserId) -> SnapshotStream<Vec<UserId>>;

    /// Event ids the user is DTG for
    fn subscribe_dtg(&self, user: &UserId) -> SnapshotStream<Vec<EventId>>;

    /// Artist ids the user recommends
    fn subscribe_recommended(&self, user: &UserId) -> SnapshotStream<Vec<ArtistId>>;

    /// Every event, ordered by date ascending
    fn subscribe_events(&self) -> SnapshotStream<Vec<Event>>;

    /// Reviews of one event, newest first
    fn subscribe_reviews(&self, event: &EventId) -> SnapshotStream<Vec<Review>>;

    /// Adds (`on`) or removes the event from the user's DTG set
    ///
    /// Creates the user document if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the store fails or refuses the write.
    fn write_dtg_flag(&self, user: &UserId, event: &EventId, on: bool) -> BackendFuture<'_, ()>;

    /// Adds (`on`) or removes the artist from the user's recommended set
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the store fails or refuses the write.
    fn write_recommend_flag(
        &self,
        user: &UserId,
        artist: &ArtistId,
        on: bool,
    ) -> BackendFuture<'_, ()>;

    /// Creates (`on`) or deletes the follow edge `viewer → target`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the store fails or refuses the write.
    fn write_follow(&self, viewer: &UserId, target: &UserId, on: bool) -> BackendFuture<'_, ()>;

    /// Stores a new event and returns its id
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the store fails or refuses the write.
    fn create_event(&self, draft: EventDraft) -> BackendFuture<'_, EventId>;

    /// Stores a new review and returns its id
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the store fails or refuses the write.
    fn create_review(&self, draft: ReviewDraft) -> BackendFuture<'_, ReviewId>;

    /// Deletes a review
    ///
    /// The store is not assumed to check authorship; callers gate this with
    /// their own ownership check.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the review does not exist, or
    /// another [`BackendError`] if the store fails.
    fn delete_review(&self, event: &EventId, review: &ReviewId) -> BackendFuture<'_, ()>;
}
