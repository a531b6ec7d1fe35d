//! Subscription lifecycle for one viewer.
//!
//! A [`FeedSession`] opens the subscriptions that keep a [`FeedStore`]
//! current and closes them again:
//!
//! - `users` and `events` for as long as the session lives
//! - `following`, `dtg` and `recommended` while a viewer is signed in
//! - `reviews` for the event currently open, replaced when another opens
//!
//! ```ignore
//! let mut session = FeedSession::open(store, backend);
//! session.sign_in("u1".into()).await?;
//! session.open_event("e1".into()).await?;
//!
//! // Page torn down
//! session.close().await?;
//! ```

use crate::error::Result;
use crate::types::FeedAction;
use crate::FeedStore;
use dtg_core::backend::SocialBackend;
use dtg_core::model::{EventId, UserId};
use dtg_runtime::{Subscription, SubscriptionSet};
use std::sync::Arc;

const VIEWER_STREAMS: [&str; 3] = ["following", "dtg", "recommended"];
const REVIEWS: &str = "reviews";

/// The live subscriptions feeding one store
pub struct FeedSession {
    store: FeedStore,
    backend: Arc<dyn SocialBackend>,
    viewer: Option<UserId>,
    viewed_event: Option<EventId>,
    subscriptions: SubscriptionSet,
}

impl FeedSession {
    /// Subscribes `store` to the users and events collections
    #[must_use]
    pub fn open(store: FeedStore, backend: Arc<dyn SocialBackend>) -> Self {
        let mut subscriptions = SubscriptionSet::new();
        subscriptions.insert(Subscription::forward(
            &store,
            "users",
            backend.subscribe_users(),
            |users| FeedAction::UsersUpdated { users },
        ));
        subscriptions.insert(Subscription::forward(
            &store,
            "events",
            backend.subscribe_events(),
            |events| FeedAction::EventsUpdated { events },
        ));

        Self {
            store,
            backend,
            viewer: None,
            viewed_event: None,
            subscriptions,
        }
    }

    /// The store this session feeds
    #[must_use]
    pub const fn store(&self) -> &FeedStore {
        &self.store
    }

    /// Signed-in viewer
    #[must_use]
    pub const fn viewer(&self) -> Option<&UserId> {
        self.viewer.as_ref()
    }

    /// Event whose reviews are subscribed
    #[must_use]
    pub const fn viewed_event(&self) -> Option<&EventId> {
        self.viewed_event.as_ref()
    }

    /// Number of open subscriptions
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    /// Signs `user` in and subscribes to their follow list and flags
    ///
    /// Signing in as someone else first drops the previous viewer's
    /// subscriptions.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`](crate::FeedError::Store) if the store is
    /// shutting down.
    pub async fn sign_in(&mut self, user: UserId) -> Result<()> {
        self.drop_viewer_streams();
        self.store
            .send(FeedAction::SignIn { user: user.clone() })
            .await?;

        let following_user = user.clone();
        self.subscriptions.insert(Subscription::forward(
            &self.store,
            "following",
            self.backend.subscribe_following(&user),
            move |following| FeedAction::FollowingUpdated {
                user: following_user.clone(),
                following,
            },
        ));

        let dtg_user = user.clone();
        self.subscriptions.insert(Subscription::forward(
            &self.store,
            "dtg",
            self.backend.subscribe_dtg(&user),
            move |event_ids| FeedAction::DtgUpdated {
                user: dtg_user.clone(),
                event_ids,
            },
        ));

        let recommended_user = user.clone();
        self.subscriptions.insert(Subscription::forward(
            &self.store,
            "recommended",
            self.backend.subscribe_recommended(&user),
            move |artist_ids| FeedAction::RecommendedUpdated {
                user: recommended_user.clone(),
                artist_ids,
            },
        ));

        self.viewer = Some(user);
        Ok(())
    }

    /// Drops the viewer's subscriptions and signs out
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`](crate::FeedError::Store) if the store is
    /// shutting down.
    pub async fn sign_out(&mut self) -> Result<()> {
        self.drop_viewer_streams();
        self.close_event().await?;
        self.viewer = None;
        self.store.send(FeedAction::SignOut).await?;
        Ok(())
    }

    /// Subscribes to the reviews of `event_id`, replacing the previous event's
    ///
    /// The previous event's cached reviews are dropped from the store.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`](crate::FeedError::Store) if the store is
    /// shutting down.
    pub async fn open_event(&mut self, event_id: EventId) -> Result<()> {
        if self.viewed_event.as_ref() != Some(&event_id) {
            self.close_event().await?;
        }

        let reviews_of = event_id.clone();
        self.subscriptions.insert(Subscription::forward(
            &self.store,
            REVIEWS,
            self.backend.subscribe_reviews(&event_id),
            move |reviews| FeedAction::ReviewsUpdated {
                event_id: reviews_of.clone(),
                reviews,
            },
        ));
        self.viewed_event = Some(event_id);
        Ok(())
    }

    /// Stops following the open event's reviews and drops them from the store
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`](crate::FeedError::Store) if the store is
    /// shutting down.
    pub async fn close_event(&mut self) -> Result<()> {
        self.subscriptions.remove(REVIEWS);
        if let Some(event_id) = self.viewed_event.take() {
            self.store.send(FeedAction::ReviewsClosed { event_id }).await?;
        }
        Ok(())
    }

    /// Unsubscribes everything and waits for in-flight writes
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`](crate::FeedError::Store) if pending
    /// writes do not finish within the store's shutdown timeout.
    pub async fn close(mut self) -> Result<()> {
        self.subscriptions.clear();
        self.store.shutdown_default().await?;
        tracing::info!("Feed session closed");
        Ok(())
    }

    fn drop_viewer_streams(&mut self) {
        for name in VIEWER_STREAMS {
            self.subscriptions.remove(name);
        }
    }
}

impl std::fmt::Debug for FeedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSession")
            .field("viewer", &self.viewer)
            .field("viewed_event", &self.viewed_event)
            .field("subscriptions", &self.subscriptions)
            .finish_non_exhaustive()
    }
}
