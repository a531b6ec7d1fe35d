//! # DTG Testing
//!
//! Testing utilities and helpers for the DTG social feed.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - An in-memory document store implementing [`SocialBackend`](dtg_core::backend::SocialBackend)
//! - A Given-When-Then harness for reducers
//! - Property-based testing strategies for domain types
//!
//! ## Example
//!
//! ```ignore
//! use dtg_testing::{test_clock, InMemoryBackend};
//! use dtg_runtime::Store;
//!
//! #[tokio::test]
//! async fn toggling_dtg_reaches_the_backend() {
//!     let backend = InMemoryBackend::new();
//!     let env = FeedEnvironment::new(Arc::new(backend.clone()), Arc::new(test_clock()));
//!     let store = Store::new(FeedState::signed_in("u1"), FeedReducer::new(), env);
//!
//!     store.send(FeedAction::ToggleDtg { event_id: "e1".into() }).await?.wait().await;
//!
//!     assert!(backend.user(&"u1".into()).unwrap().is_dtg(&"e1".into()));
//! }
//! ```

use chrono::{DateTime, Utc};
use dtg_core::environment::Clock;

mod backend_mocks;

pub use backend_mocks::InMemoryBackend;
pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use dtg_testing::mocks::FixedClock;
    /// use dtg_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    ///
    /// Reviews are ordered by creation time, so tests that write several
    /// reviews advance the clock between writes.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            if let Ok(mut time) = self.time.lock() {
                *time += by;
            }
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
                .lock()
                .map_or_else(|poisoned| *poisoned.into_inner(), |time| *time)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_epoch())
    }

    /// 2025-01-01 00:00:00 UTC
    #[must_use]
    pub fn test_epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(1_735_689_600)
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Installs a `tracing` subscriber writing through the test harness
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities
///
/// proptest strategies for domain types.
pub mod properties {
    use dtg_core::model::{ArtistId, EventId, User, UserId};
    use proptest::collection::{btree_set, vec};
    use proptest::option;
    use proptest::prelude::*;

    /// A user id drawn from a small pool so follow edges hit real users
    pub fn arb_user_id() -> impl Strategy<Value = UserId> {
        (0u8..12).prop_map(|n| UserId::new(format!("user-{n:02}")))
    }

    /// An event id drawn from a small pool
    pub fn arb_event_id() -> impl Strategy<Value = EventId> {
        (0u8..6).prop_map(|n| EventId::new(format!("event-{n}")))
    }

    /// An artist id drawn from a small pool
    pub fn arb_artist_id() -> impl Strategy<Value = ArtistId> {
        (0u8..6).prop_map(|n| ArtistId::new(format!("artist-{n}")))
    }

    /// A user with arbitrary flags (id supplied by the caller)
    pub fn arb_user(id: UserId) -> impl Strategy<Value = User> {
        (
            option::of("[A-Za-z ]{1,12}"),
            btree_set(arb_event_id(), 0..4),
            btree_set(arb_artist_id(), 0..4),
            btree_set(arb_user_id(), 0..4),
        )
            .prop_map(move |(display_name, dtg, recommended, following)| User {
                id: id.clone(),
                display_name,
                dtg,
                recommended,
                following,
            })
    }

    /// A directory with unique user ids
    pub fn arb_directory() -> impl Strategy<Value = Vec<User>> {
        btree_set(arb_user_id(), 0..10).prop_flat_map(|ids| {
            ids.into_iter()
                .map(arb_user)
                .collect::<Vec<_>>()
        })
    }

    /// A follow list for a viewer
    pub fn arb_following() -> impl Strategy<Value = Vec<UserId>> {
        vec(arb_user_id(), 0..5)
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, test_epoch, FixedClock, ManualClock};
