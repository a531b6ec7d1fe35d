//! Reducer logic for the feed.
//!
//! Snapshot actions replace their slice of state. Commands are validated
//! against the latest snapshot and turned into a single write effect; the
//! outcome of the write is fed back as an action. A toggle's new value is
//! read from the next snapshot, never written into the cache directly.

use crate::policy::{can_delete_review, can_follow};
use crate::types::{FeedAction, FeedState, WriteOp};
use dtg_core::backend::{BackendError, SocialBackend};
use dtg_core::model::UserId;
use dtg_core::{effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec};
use std::sync::Arc;

/// Default limit on review comments, in characters
pub const DEFAULT_MAX_COMMENT_LENGTH: usize = 2000;

/// Environment dependencies for the feed reducer
#[derive(Clone)]
pub struct FeedEnvironment {
    /// Document store all writes go to
    pub backend: Arc<dyn SocialBackend>,
    /// Clock for review timestamps
    pub clock: Arc<dyn Clock>,
    /// Longest accepted review comment, in characters
    pub max_comment_length: usize,
}

impl FeedEnvironment {
    /// Creates a new `FeedEnvironment`
    #[must_use]
    pub fn new(backend: Arc<dyn SocialBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            max_comment_length: DEFAULT_MAX_COMMENT_LENGTH,
        }
    }

    /// Sets the review comment limit
    #[must_use]
    pub const fn with_max_comment_length(mut self, max: usize) -> Self {
        self.max_comment_length = max;
        self
    }
}

/// Reducer for the feed
#[derive(Clone, Debug, Default)]
pub struct FeedReducer;

impl FeedReducer {
    /// Creates a new `FeedReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn require_viewer(state: &FeedState) -> Result<UserId, String> {
        state
            .viewer
            .clone()
            .ok_or_else(|| "Sign in first".to_string())
    }

    /// Records a rejected command; no effect is issued
    fn reject(state: &mut FeedState, error: String) -> SmallVec<[Effect<FeedAction>; 4]> {
        Self::apply_outcome(state, &FeedAction::ValidationFailed { error });
        SmallVec::new()
    }

    fn outcome<T>(op: WriteOp, result: Result<T, BackendError>) -> FeedAction {
        match result {
            Ok(_) => FeedAction::WriteSucceeded { op },
            Err(error) => FeedAction::WriteFailed { op, error },
        }
    }

    /// Applies an outcome to state
    fn apply_outcome(state: &mut FeedState, action: &FeedAction) {
        match action {
            FeedAction::WriteSucceeded { op } => {
                tracing::debug!(%op, "Write accepted");
                state.last_error = None;
            },
            FeedAction::WriteFailed { op, error } => {
                tracing::warn!(%op, %error, "Write failed");
                metrics::counter!("feed.writes.failed", "op" => op.as_str()).increment(1);
                state.last_error = Some(format!("Could not save ({op}): {error}"));
            },
            FeedAction::ValidationFailed { error } => {
                tracing::debug!(%error, "Command rejected");
                metrics::counter!("feed.validation.failed").increment(1);
                state.last_error = Some(error.clone());
            },
            _ => {},
        }
    }

    /// Applies a snapshot to state
    ///
    /// Viewer-scoped snapshots for anyone but the current viewer are stale
    /// deliveries from a previous session and are dropped.
    fn apply_snapshot(state: &mut FeedState, action: FeedAction) {
        match action {
            FeedAction::UsersUpdated { users } => state.directory.replace(users),
            FeedAction::FollowingUpdated { user, following } => {
                if state.is_viewer(&user) {
                    state.following = following;
                }
            },
            FeedAction::DtgUpdated { user, event_ids } => {
                if state.is_viewer(&user) {
                    state.my_dtg = event_ids.into_iter().collect();
                }
            },
            FeedAction::RecommendedUpdated { user, artist_ids } => {
                if state.is_viewer(&user) {
                    state.my_recommended = artist_ids.into_iter().collect();
                }
            },
            FeedAction::EventsUpdated { events } => state.events = events,
            FeedAction::ReviewsUpdated { event_id, reviews } => {
                state.reviews.insert(event_id, reviews);
            },
            FeedAction::ReviewsClosed { event_id } => {
                state.reviews.remove(&event_id);
            },
            _ => {},
        }
    }
}

impl Reducer for FeedReducer {
    type State = FeedState;
    type Action = FeedAction;
    type Environment = FeedEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per command, each short
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Snapshots ==========
            FeedAction::UsersUpdated { .. }
            | FeedAction::FollowingUpdated { .. }
            | FeedAction::DtgUpdated { .. }
            | FeedAction::RecommendedUpdated { .. }
            | FeedAction::EventsUpdated { .. }
            | FeedAction::ReviewsUpdated { .. }
            | FeedAction::ReviewsClosed { .. } => {
                Self::apply_snapshot(state, action);
                SmallVec::new()
            },

            // ========== Session ==========
            FeedAction::SignIn { user } => {
                tracing::info!(%user, "Viewer signed in");
                state.clear_viewer_scope();
                state.viewer = Some(user);
                SmallVec::new()
            },

            FeedAction::SignOut => {
                if let Some(user) = state.viewer.take() {
                    tracing::info!(%user, "Viewer signed out");
                }
                state.clear_viewer_scope();
                SmallVec::new()
            },

            FeedAction::QueryChanged { query } => {
                state.query = query;
                SmallVec::new()
            },

            // ========== Commands ==========
            FeedAction::ToggleDtg { event_id } => {
                let viewer = match Self::require_viewer(state) {
                    Ok(viewer) => viewer,
                    Err(error) => return Self::reject(state, error),
                };
                let on = !state.my_dtg.contains(&event_id);
                let backend = Arc::clone(&env.backend);

                smallvec![Effect::future(async move {
                    let result = backend.write_dtg_flag(&viewer, &event_id, on).await;
                    Some(Self::outcome(WriteOp::Dtg, result))
                })]
            },

            FeedAction::ToggleRecommend { artist_id } => {
                let viewer = match Self::require_viewer(state) {
                    Ok(viewer) => viewer,
                    Err(error) => return Self::reject(state, error),
                };
                let on = !state.my_recommended.contains(&artist_id);
                let backend = Arc::clone(&env.backend);

                smallvec![Effect::future(async move {
                    let result = backend.write_recommend_flag(&viewer, &artist_id, on).await;
                    Some(Self::outcome(WriteOp::Recommend, result))
                })]
            },

            FeedAction::ToggleFollow { target } => {
                let viewer = match Self::require_viewer(state) {
                    Ok(viewer) => viewer,
                    Err(error) => return Self::reject(state, error),
                };
                if !can_follow(&viewer, &target) {
                    return Self::reject(state, "You cannot follow yourself".to_string());
                }
                let on = !state.following.contains(&target);
                let backend = Arc::clone(&env.backend);

                smallvec![Effect::future(async move {
                    let result = backend.write_follow(&viewer, &target, on).await;
                    Some(Self::outcome(WriteOp::Follow, result))
                })]
            },

            FeedAction::CreateEvent { input } => {
                let viewer = match Self::require_viewer(state) {
                    Ok(viewer) => viewer,
                    Err(error) => return Self::reject(state, error),
                };
                let draft = match input.into_draft(viewer) {
                    Ok(draft) => draft,
                    Err(error) => return Self::reject(state, error.to_string()),
                };
                let backend = Arc::clone(&env.backend);

                smallvec![Effect::future(async move {
                    let result = backend.create_event(draft).await;
                    Some(Self::outcome(WriteOp::CreateEvent, result))
                })]
            },

            FeedAction::CreateReview { input } => {
                let viewer = match Self::require_viewer(state) {
                    Ok(viewer) => viewer,
                    Err(error) => return Self::reject(state, error),
                };
                let draft =
                    match input.into_draft(viewer, env.clock.now(), env.max_comment_length) {
                        Ok(draft) => draft,
                        Err(error) => return Self::reject(state, error.to_string()),
                    };
                let backend = Arc::clone(&env.backend);

                smallvec![Effect::future(async move {
                    let result = backend.create_review(draft).await;
                    Some(Self::outcome(WriteOp::CreateReview, result))
                })]
            },

            FeedAction::DeleteReview {
                event_id,
                review_id,
            } => {
                let viewer = match Self::require_viewer(state) {
                    Ok(viewer) => viewer,
                    Err(error) => return Self::reject(state, error),
                };
                let Some(review) = state.review(&event_id, &review_id) else {
                    return Self::reject(state, format!("Review {review_id} not found"));
                };
                if !can_delete_review(Some(&viewer), review) {
                    return Self::reject(
                        state,
                        "Only the author can delete a review".to_string(),
                    );
                }
                let backend = Arc::clone(&env.backend);

                smallvec![Effect::future(async move {
                    let result = backend.delete_review(&event_id, &review_id).await;
                    Some(Self::outcome(WriteOp::DeleteReview, result))
                })]
            },

            // ========== Outcomes ==========
            FeedAction::WriteSucceeded { .. }
            | FeedAction::WriteFailed { .. }
            | FeedAction::ValidationFailed { .. } => {
                Self::apply_outcome(state, &action);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtg_core::model::{
        ArtistId, EventId, NewEvent, NewReview, Review, ReviewId, StarRating, User,
    };
    use dtg_testing::{assertions, test_clock, test_epoch, InMemoryBackend, ReducerTest};

    fn create_test_env() -> FeedEnvironment {
        FeedEnvironment::new(Arc::new(InMemoryBackend::new()), Arc::new(test_clock()))
    }

    fn review(id: &str, author: &str) -> Review {
        Review {
            id: ReviewId::new(id),
            event_id: EventId::new("e1"),
            author: UserId::new(author),
            stars: StarRating::new(5).unwrap(),
            comment: "great".to_string(),
            created_at: test_epoch(),
        }
    }

    #[test]
    fn test_users_snapshot_replaces_directory() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::signed_in("a"))
            .given_actions([FeedAction::UsersUpdated {
                users: vec![User::new("old")],
            }])
            .when_action(FeedAction::UsersUpdated {
                users: vec![User::new("a"), User::new("b")],
            })
            .then_state(|state| {
                assert_eq!(state.directory.len(), 2);
                assert!(state.directory.get(&UserId::new("old")).is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_stale_viewer_snapshot_is_dropped() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::signed_in("a"))
            .when_action(FeedAction::DtgUpdated {
                user: UserId::new("someone-else"),
                event_ids: vec![EventId::new("e1")],
            })
            .then_state(|state| {
                assert!(state.my_dtg.is_empty());
            })
            .run();
    }

    #[test]
    fn test_toggle_dtg_emits_write_and_leaves_cache() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::signed_in("a"))
            .when_action(FeedAction::ToggleDtg {
                event_id: EventId::new("e1"),
            })
            .then_state(|state| {
                assert!(state.my_dtg.is_empty());
                assert!(state.last_error.is_none());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_toggle_requires_viewer() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::new())
            .when_action(FeedAction::ToggleRecommend {
                artist_id: ArtistId::new("caribou"),
            })
            .then_state(|state| {
                assert_eq!(state.last_error.as_deref(), Some("Sign in first"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_self_follow_rejected() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::signed_in("a"))
            .when_action(FeedAction::ToggleFollow {
                target: UserId::new("a"),
            })
            .then_state(|state| {
                assert!(state.last_error.as_ref().unwrap().contains("yourself"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_create_event_invalid_date() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::signed_in("a"))
            .when_action(FeedAction::CreateEvent {
                input: NewEvent {
                    title: "Show".to_string(),
                    venue: "Hall".to_string(),
                    date: "tomorrow".to_string(),
                    artist_id: ArtistId::new("bicep"),
                },
            })
            .then_state(|state| {
                assert!(state.last_error.as_ref().unwrap().contains("YYYY-MM-DD"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_create_review_respects_comment_limit() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env().with_max_comment_length(4))
            .given_state(FeedState::signed_in("a"))
            .when_action(FeedAction::CreateReview {
                input: NewReview {
                    event_id: EventId::new("e1"),
                    stars: 3,
                    comment: "far too long".to_string(),
                },
            })
            .then_state(|state| {
                assert!(state.last_error.as_ref().unwrap().contains("at most 4"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_delete_review_by_author() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::signed_in("a"))
            .given_actions([FeedAction::ReviewsUpdated {
                event_id: EventId::new("e1"),
                reviews: vec![review("r1", "a")],
            }])
            .when_action(FeedAction::DeleteReview {
                event_id: EventId::new("e1"),
                review_id: ReviewId::new("r1"),
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_delete_review_by_other_user_rejected() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::signed_in("a"))
            .given_actions([FeedAction::ReviewsUpdated {
                event_id: EventId::new("e1"),
                reviews: vec![review("r1", "b")],
            }])
            .when_action(FeedAction::DeleteReview {
                event_id: EventId::new("e1"),
                review_id: ReviewId::new("r1"),
            })
            .then_state(|state| {
                assert!(state.last_error.as_ref().unwrap().contains("author"));
                assert_eq!(state.reviews[&EventId::new("e1")].len(), 1);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_closed_reviews_leave_the_cache() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::signed_in("a"))
            .given_actions([FeedAction::ReviewsUpdated {
                event_id: EventId::new("e1"),
                reviews: vec![review("r1", "a")],
            }])
            .when_action(FeedAction::ReviewsClosed {
                event_id: EventId::new("e1"),
            })
            .then_state(|state| {
                assert!(state.reviews.is_empty());
                assert!(state.review(&EventId::new("e1"), &ReviewId::new("r1")).is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_delete_review_after_close_rejected() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::signed_in("a"))
            .given_actions([
                FeedAction::ReviewsUpdated {
                    event_id: EventId::new("e1"),
                    reviews: vec![review("r1", "a")],
                },
                FeedAction::ReviewsClosed {
                    event_id: EventId::new("e1"),
                },
            ])
            .when_action(FeedAction::DeleteReview {
                event_id: EventId::new("e1"),
                review_id: ReviewId::new("r1"),
            })
            .then_state(|state| {
                assert!(state.last_error.as_ref().unwrap().contains("not found"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_write_failure_recorded() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::signed_in("a"))
            .when_action(FeedAction::WriteFailed {
                op: WriteOp::Dtg,
                error: BackendError::Unavailable("offline".to_string()),
            })
            .then_state(|state| {
                let error = state.last_error.as_ref().unwrap();
                assert!(error.contains("dtg"));
                assert!(error.contains("offline"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_sign_out_clears_viewer_scope() {
        ReducerTest::new(FeedReducer::new())
            .with_env(create_test_env())
            .given_state(FeedState::signed_in("a"))
            .given_actions([
                FeedAction::FollowingUpdated {
                    user: UserId::new("a"),
                    following: vec![UserId::new("b")],
                },
                FeedAction::EventsUpdated { events: vec![] },
            ])
            .when_action(FeedAction::SignOut)
            .then_state(|state| {
                assert!(state.viewer.is_none());
                assert!(state.following.is_empty());
            })
            .run();
    }
}
