//! Subscriptions forwarding snapshot streams into a store.
//!
//! The document store pushes a full snapshot whenever a collection changes.
//! A [`Subscription`] pumps those snapshots into a [`Store`] as actions on a
//! background task until it is unsubscribed. Dropping the handle
//! unsubscribes, so a page that owns its subscriptions cannot leak them.
//!
//! ```ignore
//! let users = Subscription::forward(&store, "users", backend.subscribe_users(), |users| {
//!     FeedAction::UsersUpdated { users }
//! });
//!
//! // Page torn down
//! users.unsubscribe();
//! ```

use crate::Store;
use dtg_core::reducer::Reducer;
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use tokio::task::JoinHandle;

/// A live subscription; aborts its pump task when dropped
#[derive(Debug)]
pub struct Subscription {
    name: String,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Forwards every item of `stream` into `store`, mapped through `into_action`
    ///
    /// The pump stops when the stream ends, when the store starts shutting
    /// down, or when the subscription is dropped.
    pub fn forward<S, A, E, R, T, St, F>(
        store: &Store<S, A, E, R>,
        name: impl Into<String>,
        stream: St,
        into_action: F,
    ) -> Self
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        St: Stream<Item = T> + Send + 'static,
        T: Send + 'static,
        F: Fn(T) -> A + Send + 'static,
    {
        let name = name.into();
        let store = store.clone();
        let stream_name = name.clone();

        tracing::debug!(stream = %name, "Subscription opened");

        let task = tokio::spawn(async move {
            let mut stream = Box::pin(stream);

            while let Some(snapshot) = stream.next().await {
                metrics::counter!("subscription.snapshots.total", "stream" => stream_name.clone())
                    .increment(1);

                if let Err(error) = store.send(into_action(snapshot)).await {
                    tracing::debug!(stream = %stream_name, %error, "Subscription stopped");
                    return;
                }
            }

            tracing::debug!(stream = %stream_name, "Snapshot stream ended");
        });

        Self { name, task }
    }

    /// Stream name used in logs and metrics
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the pump task is still running
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops forwarding snapshots
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            tracing::debug!(stream = %self.name, "Subscription closed");
        }
        self.task.abort();
    }
}

/// The subscriptions owned by one consumer, keyed by name
///
/// Inserting under an existing name replaces (and unsubscribes) the old one.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: HashMap<String, Subscription>,
}

impl SubscriptionSet {
    /// Creates an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscription, unsubscribing any previous one with the same name
    pub fn insert(&mut self, subscription: Subscription) {
        let name = subscription.name().to_string();
        if let Some(previous) = self.subscriptions.insert(name, subscription) {
            previous.unsubscribe();
        }
    }

    /// Unsubscribes the named subscription; returns whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        self.subscriptions
            .remove(name)
            .map(Subscription::unsubscribe)
            .is_some()
    }

    /// Whether a subscription with this name is held
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.subscriptions.contains_key(name)
    }

    /// Number of held subscriptions
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether no subscriptions are held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Unsubscribes everything
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
