//! State and actions of the feed.
//!
//! [`FeedState`] caches the latest snapshot of every entity the feed shows.
//! Snapshots arrive as actions and replace their slice of the state
//! wholesale; nothing in the state is ever patched in place. Commands never
//! touch the cache either: they issue writes, and the written value comes
//! back through the next snapshot.

use crate::catalog::ArtistCatalog;
use crate::directory::UserDirectory;
use dtg_core::backend::BackendError;
use dtg_core::model::{
    ArtistId, Event, EventId, NewEvent, NewReview, Review, ReviewId, User, UserId,
};
use dtg_macros::Action;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// The feed's single source of truth
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FeedState {
    /// Signed-in user, if any
    pub viewer: Option<UserId>,
    /// Every known user
    pub directory: UserDirectory,
    /// Ids the viewer follows
    pub following: Vec<UserId>,
    /// Events the viewer is DTG for
    pub my_dtg: BTreeSet<EventId>,
    /// Artists the viewer recommends
    pub my_recommended: BTreeSet<ArtistId>,
    /// Every event, date ascending
    pub events: Vec<Event>,
    /// Reviews of the subscribed event, newest first
    pub reviews: HashMap<EventId, Vec<Review>>,
    /// Current search query, as typed
    pub query: String,
    /// Artist reference data
    pub catalog: ArtistCatalog,
    /// Last validation or write error (if any)
    pub last_error: Option<String>,
}

impl FeedState {
    /// Creates an empty, signed-out state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty state with `viewer` signed in
    #[must_use]
    pub fn signed_in(viewer: impl Into<UserId>) -> Self {
        Self {
            viewer: Some(viewer.into()),
            ..Self::default()
        }
    }

    /// Whether `user` is the signed-in viewer
    #[must_use]
    pub fn is_viewer(&self, user: &UserId) -> bool {
        self.viewer.as_ref() == Some(user)
    }

    /// Looks up an event in the latest snapshot
    #[must_use]
    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// Looks up a review in the latest snapshot of its event
    #[must_use]
    pub fn review(&self, event: &EventId, review: &ReviewId) -> Option<&Review> {
        self.reviews
            .get(event)
            .and_then(|reviews| reviews.iter().find(|r| &r.id == review))
    }

    /// Drops everything scoped to the signed-in viewer
    pub(crate) fn clear_viewer_scope(&mut self) {
        self.following.clear();
        self.my_dtg.clear();
        self.my_recommended.clear();
        self.last_error = None;
    }
}

/// Writes the feed issues against the document store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriteOp {
    /// DTG flag set or cleared
    Dtg,
    /// Recommend flag set or cleared
    Recommend,
    /// Follow edge created or deleted
    Follow,
    /// Event created
    CreateEvent,
    /// Review created
    CreateReview,
    /// Review deleted
    DeleteReview,
}

impl WriteOp {
    /// Stable name used in logs and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dtg => "dtg",
            Self::Recommend => "recommend",
            Self::Follow => "follow",
            Self::CreateEvent => "create_event",
            Self::CreateReview => "create_review",
            Self::DeleteReview => "delete_review",
        }
    }
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that can happen to the feed
///
/// Snapshots come from subscriptions, commands from the user, and outcomes
/// from the effects commands start.
#[derive(Action, Clone, Debug)]
pub enum FeedAction {
    // ========== Snapshots ==========
    /// Snapshot: every user document
    #[snapshot]
    UsersUpdated {
        /// Full directory
        users: Vec<User>,
    },

    /// Snapshot: ids `user` follows
    #[snapshot]
    FollowingUpdated {
        /// Whose follow list this is
        user: UserId,
        /// Followed ids
        following: Vec<UserId>,
    },

    /// Snapshot: events `user` is DTG for
    #[snapshot]
    DtgUpdated {
        /// Whose flags these are
        user: UserId,
        /// Flagged events
        event_ids: Vec<EventId>,
    },

    /// Snapshot: artists `user` recommends
    #[snapshot]
    RecommendedUpdated {
        /// Whose flags these are
        user: UserId,
        /// Recommended artists
        artist_ids: Vec<ArtistId>,
    },

    /// Snapshot: every event, date ascending
    #[snapshot]
    EventsUpdated {
        /// Full event list
        events: Vec<Event>,
    },

    /// Snapshot: reviews of one event, newest first
    #[snapshot]
    ReviewsUpdated {
        /// Reviewed event
        event_id: EventId,
        /// Full review list
        reviews: Vec<Review>,
    },

    /// Snapshot scope: the reviews of an event are no longer subscribed
    #[snapshot]
    ReviewsClosed {
        /// Event whose cached reviews are dropped
        event_id: EventId,
    },

    // ========== Commands ==========
    /// Command: a user signed in
    #[command]
    SignIn {
        /// The new viewer
        user: UserId,
    },

    /// Command: the viewer signed out
    #[command]
    SignOut,

    /// Command: the search box changed
    #[command]
    QueryChanged {
        /// Raw query text
        query: String,
    },

    /// Command: flip the viewer's DTG flag for an event
    #[command]
    ToggleDtg {
        /// Target event
        event_id: EventId,
    },

    /// Command: flip the viewer's recommend flag for an artist
    #[command]
    ToggleRecommend {
        /// Target artist
        artist_id: ArtistId,
    },

    /// Command: follow or unfollow another user
    #[command]
    ToggleFollow {
        /// Target user
        target: UserId,
    },

    /// Command: log a new event
    #[command]
    CreateEvent {
        /// Form input
        input: NewEvent,
    },

    /// Command: review an event
    #[command]
    CreateReview {
        /// Form input
        input: NewReview,
    },

    /// Command: delete one of the viewer's reviews
    #[command]
    DeleteReview {
        /// Event the review belongs to
        event_id: EventId,
        /// Review to delete
        review_id: ReviewId,
    },

    // ========== Outcomes ==========
    /// Outcome: the document store accepted a write
    #[outcome]
    WriteSucceeded {
        /// Which write
        op: WriteOp,
    },

    /// Outcome: the document store failed or refused a write
    #[outcome]
    WriteFailed {
        /// Which write
        op: WriteOp,
        /// Why
        error: BackendError,
    },

    /// Outcome: a command was rejected before reaching the store
    #[outcome]
    ValidationFailed {
        /// Error message
        error: String,
    },
}
