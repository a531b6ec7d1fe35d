//! Friend-scoped aggregation and search for the DTG social feed.
//!
//! Users log events (concerts), mark themselves "down to go" (DTG),
//! recommend artists, follow each other and review events. This crate
//! holds the part with actual logic:
//!
//! - [`visibility`]: which users count as the viewer's friends
//! - [`aggregate`]: "N friends recommend / N friends DTG" tallies
//! - [`search`]: case-insensitive substring search over events
//! - [`reducer`]: toggles, creations and deletions as write effects
//!
//! # Quick Start
//!
//! ```no_run
//! use dtg_feed::{FeedAction, FeedEnvironment, FeedReducer, FeedSession, FeedState};
//! use dtg_core::environment::SystemClock;
//! use dtg_runtime::Store;
//! use dtg_testing::InMemoryBackend;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(InMemoryBackend::new());
//! let env = FeedEnvironment::new(backend.clone(), Arc::new(SystemClock));
//! let store = Store::new(FeedState::new(), FeedReducer::new(), env);
//!
//! let mut session = FeedSession::open(store.clone(), backend);
//! session.sign_in("u1".into()).await?;
//!
//! store
//!     .send(FeedAction::ToggleDtg { event_id: "e1".into() })
//!     .await?
//!     .wait()
//!     .await;
//!
//! let visible = store.state(|s| s.visible_users().len()).await;
//! println!("Friends: {visible}");
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod policy;
pub mod presentation;
pub mod reducer;
pub mod search;
pub mod session;
pub mod types;
pub mod views;
pub mod visibility;

use dtg_runtime::Store;

// Re-export commonly used types
pub use config::FeedConfig;
pub use error::FeedError;
pub use reducer::{FeedEnvironment, FeedReducer};
pub use session::FeedSession;
pub use types::{FeedAction, FeedState, WriteOp};

/// The store running the feed reducer
pub type FeedStore = Store<FeedState, FeedAction, FeedEnvironment, FeedReducer>;
