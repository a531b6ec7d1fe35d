//! End-to-end feed flows: store, session and in-memory document store
//!
//! Writes go out as effects and come back as snapshots, so assertions poll
//! the store until the snapshot has been reduced.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use chrono::NaiveDate;
use dtg_core::backend::BackendError;
use dtg_core::model::{ArtistId, Event, EventId, NewEvent, NewReview, Review, ReviewId, StarRating, User, UserId};
use dtg_feed::{FeedAction, FeedEnvironment, FeedReducer, FeedSession, FeedState, FeedStore};
use dtg_runtime::Store;
use dtg_testing::{helpers::init_test_tracing, test_clock, test_epoch, InMemoryBackend};
use std::sync::Arc;
use std::time::Duration;

fn event(id: &str, title: &str, venue: &str, day: u32, artist: &str) -> Event {
    Event {
        id: EventId::new(id),
        title: title.to_string(),
        venue: venue.to_string(),
        date: NaiveDate::from_ymd_opt(2025, 7, day).unwrap(),
        artist_id: ArtistId::new(artist),
        created_by: UserId::new("bob"),
    }
}

fn seeded() -> Arc<InMemoryBackend> {
    let backend = InMemoryBackend::new();
    backend.insert_user(User::new("alice").with_display_name("Alice"));
    backend.insert_user(
        User::new("bob")
            .with_display_name("Bob")
            .with_dtg("e1")
            .with_recommended("caribou"),
    );
    backend.insert_user(User::new("carol").with_display_name("Carol").with_dtg("e1"));
    backend.insert_event(event("e1", "Summer Nights", "NYC Arena", 4, "caribou"));
    backend.insert_event(event("e2", "Basement Show", "The Garage", 1, "turnstile"));
    Arc::new(backend)
}

fn store_for(backend: &Arc<InMemoryBackend>) -> FeedStore {
    let env = FeedEnvironment::new(backend.clone(), Arc::new(test_clock()));
    Store::new(FeedState::new(), FeedReducer::new(), env)
}

/// Polls the store until `check` holds, panicking after one second
async fn eventually<F>(store: &FeedStore, what: &str, check: F)
where
    F: Fn(&FeedState) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    loop {
        if store.state(&check).await {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            let state = store.state(FeedState::clone).await;
            panic!("timed out waiting for {what}: {state:#?}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn signed_in_session(backend: &Arc<InMemoryBackend>, viewer: &str) -> (FeedStore, FeedSession) {
    init_test_tracing();
    let store = store_for(backend);
    let mut session = FeedSession::open(store.clone(), backend.clone());
    session.sign_in(UserId::new(viewer)).await.unwrap();
    eventually(&store, "initial snapshots", |s| {
        s.directory.len() == 3 && s.events.len() == 2
    })
    .await;
    (store, session)
}

#[tokio::test]
async fn session_loads_directory_and_events() {
    let backend = seeded();
    let (store, session) = signed_in_session(&backend, "alice").await;

    assert_eq!(session.active_subscriptions(), 5);
    let titles = store
        .state(|s| s.events.iter().map(|e| e.title.clone()).collect::<Vec<_>>())
        .await;
    assert_eq!(titles, vec!["Basement Show", "Summer Nights"]);

    session.close().await.unwrap();
}

#[tokio::test]
async fn following_nobody_counts_everyone() {
    let backend = seeded();
    let (store, session) = signed_in_session(&backend, "alice").await;

    let detail = store
        .state(|s| s.event_detail(&EventId::new("e1")))
        .await
        .unwrap();
    assert_eq!(detail.dtg.count, 2);
    assert_eq!(detail.recommend.count, 1);
    assert_eq!(detail.summary(), "1 friends recommend · 2 friends DTG");
    assert_eq!(detail.dtg_line().unwrap(), "Bob, Carol are DTG");

    session.close().await.unwrap();
}

#[tokio::test]
async fn following_narrows_the_tally_to_friends() {
    let backend = seeded();
    let (store, session) = signed_in_session(&backend, "alice").await;

    store
        .send(FeedAction::ToggleFollow {
            target: UserId::new("bob"),
        })
        .await
        .unwrap()
        .wait()
        .await;
    eventually(&store, "follow snapshot", |s| s.following == vec![UserId::new("bob")]).await;

    let detail = store
        .state(|s| s.event_detail(&EventId::new("e1")))
        .await
        .unwrap();
    assert_eq!(detail.dtg.names, vec!["Bob"]);
    assert_eq!(detail.dtg_line().unwrap(), "Bob is DTG");
    assert_eq!(
        detail.recommend_line().unwrap(),
        "Bob recommends Caribou"
    );

    session.close().await.unwrap();
}

#[tokio::test]
async fn toggling_dtg_twice_restores_the_original_state() {
    let backend = seeded();
    let (store, session) = signed_in_session(&backend, "alice").await;
    let e1 = EventId::new("e1");

    let toggle = || FeedAction::ToggleDtg { event_id: e1.clone() };

    store.send(toggle()).await.unwrap().wait().await;
    eventually(&store, "dtg on", |s| s.my_dtg.contains(&e1)).await;
    assert!(backend.user(&UserId::new("alice")).unwrap().is_dtg(&e1));
    let on = store.state(|s| s.event_detail(&e1).unwrap()).await;
    assert!(on.viewer_is_dtg);
    assert_eq!(on.dtg.count, 3);

    store.send(toggle()).await.unwrap().wait().await;
    eventually(&store, "dtg off", |s| !s.my_dtg.contains(&e1)).await;
    assert!(!backend.user(&UserId::new("alice")).unwrap().is_dtg(&e1));
    let off = store.state(|s| s.event_detail(&e1).unwrap()).await;
    assert_eq!(off.dtg.count, 2);

    session.close().await.unwrap();
}

#[tokio::test]
async fn recommending_an_artist_shows_in_the_artist_list() {
    let backend = seeded();
    let (store, session) = signed_in_session(&backend, "alice").await;
    let turnstile = ArtistId::new("turnstile");

    store
        .send(FeedAction::ToggleRecommend {
            artist_id: turnstile.clone(),
        })
        .await
        .unwrap()
        .wait()
        .await;
    eventually(&store, "recommend snapshot", |s| s.my_recommended.contains(&turnstile)).await;

    let rows = store.state(FeedState::recommended_artists).await;
    let row = rows.iter().find(|r| r.artist.id == turnstile).unwrap();
    assert!(row.recommended);

    session.close().await.unwrap();
}

#[tokio::test]
async fn search_matches_title_venue_and_artist_id() {
    let backend = seeded();
    let (store, session) = signed_in_session(&backend, "alice").await;

    let search = |query: &str| {
        let store = store.clone();
        let query = query.to_string();
        async move {
            store.send(FeedAction::QueryChanged { query }).await.unwrap();
            store
                .state(|s| {
                    s.filtered_events()
                        .iter()
                        .map(|e| e.id.to_string())
                        .collect::<Vec<_>>()
                })
                .await
        }
    };

    assert_eq!(search("ARENA").await, vec!["e1"]);
    assert_eq!(search("turnstile").await, vec!["e2"]);
    assert_eq!(search("").await, vec!["e2", "e1"]);
    assert!(search("jazz").await.is_empty());

    session.close().await.unwrap();
}

#[tokio::test]
async fn created_event_arrives_through_the_snapshot() {
    let backend = seeded();
    let (store, session) = signed_in_session(&backend, "alice").await;

    store
        .send(FeedAction::CreateEvent {
            input: NewEvent {
                title: "  Late Show ".to_string(),
                venue: "Pier 17".to_string(),
                date: "2025-08-15".to_string(),
                artist_id: ArtistId::new("bicep"),
            },
        })
        .await
        .unwrap()
        .wait()
        .await;
    eventually(&store, "new event", |s| s.events.len() == 3).await;

    let last = store.state(|s| s.events.last().cloned().unwrap()).await;
    assert_eq!(last.title, "Late Show");
    assert_eq!(last.created_by, UserId::new("alice"));
    assert!(store.state(|s| s.last_error.is_none()).await);

    session.close().await.unwrap();
}

#[tokio::test]
async fn invalid_event_never_reaches_the_backend() {
    let backend = seeded();
    let (store, session) = signed_in_session(&backend, "alice").await;
    let writes = backend.write_count();

    let handle = store
        .send(FeedAction::CreateEvent {
            input: NewEvent {
                title: "Late Show".to_string(),
                venue: "Pier 17".to_string(),
                date: "next friday".to_string(),
                artist_id: ArtistId::new("bicep"),
            },
        })
        .await
        .unwrap();
    assert_eq!(handle.pending(), 0);
    assert_eq!(backend.write_count(), writes);
    assert!(store.state(|s| s.last_error.is_some()).await);

    session.close().await.unwrap();
}

#[tokio::test]
async fn reviews_follow_the_open_event() {
    let backend = seeded();
    backend.insert_review(Review {
        id: ReviewId::new("r-old"),
        event_id: EventId::new("e2"),
        author: UserId::new("carol"),
        stars: StarRating::new(3).unwrap(),
        comment: "Too short".to_string(),
        created_at: test_epoch() - chrono::Duration::days(1),
    });
    let (store, mut session) = signed_in_session(&backend, "alice").await;
    let e1 = EventId::new("e1");
    let e2 = EventId::new("e2");

    session.open_event(e1.clone()).await.unwrap();
    store
        .send(FeedAction::CreateReview {
            input: NewReview {
                event_id: e1.clone(),
                stars: 5,
                comment: "Unreal".to_string(),
            },
        })
        .await
        .unwrap()
        .wait()
        .await;
    eventually(&store, "review on e1", |s| {
        s.reviews.get(&e1).is_some_and(|r| r.len() == 1)
    })
    .await;

    let rows = store.state(|s| s.review_rows(&e1)).await;
    assert_eq!(rows[0].author, "Alice");
    assert_eq!(rows[0].stars, "★★★★★");
    assert!(rows[0].deletable);

    session.open_event(e2.clone()).await.unwrap();
    assert_eq!(session.viewed_event(), Some(&e2));
    eventually(&store, "reviews of e2", |s| s.reviews.contains_key(&e2)).await;
    let rows = store.state(|s| s.review_rows(&e2)).await;
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].deletable);
    assert_eq!(session.active_subscriptions(), 6);

    session.close().await.unwrap();
}

#[tokio::test]
async fn closed_events_leave_no_reviews_behind() {
    let backend = seeded();
    let (store, mut session) = signed_in_session(&backend, "alice").await;
    let e1 = EventId::new("e1");
    let e2 = EventId::new("e2");

    session.open_event(e1.clone()).await.unwrap();
    eventually(&store, "reviews of e1", |s| s.reviews.contains_key(&e1)).await;

    session.open_event(e2.clone()).await.unwrap();
    eventually(&store, "reviews of e2", |s| s.reviews.contains_key(&e2)).await;
    assert!(!store.state(|s| s.reviews.contains_key(&e1)).await);

    backend.insert_review(Review {
        id: ReviewId::new("r-late"),
        event_id: e1.clone(),
        author: UserId::new("bob"),
        stars: StarRating::new(2).unwrap(),
        comment: "Missed it".to_string(),
        created_at: test_epoch(),
    });
    session.close_event().await.unwrap();

    assert_eq!(session.viewed_event(), None);
    assert_eq!(session.active_subscriptions(), 5);
    let state = store.state(FeedState::clone).await;
    assert!(state.reviews.is_empty(), "{:?}", state.reviews);
    assert!(state.review_rows(&e1).is_empty());
    assert_eq!(backend.reviews(&e1).len(), 1);

    session.close().await.unwrap();
}

#[tokio::test]
async fn author_can_delete_their_review() {
    let backend = seeded();
    backend.insert_review(Review {
        id: ReviewId::new("r1"),
        event_id: EventId::new("e1"),
        author: UserId::new("alice"),
        stars: StarRating::new(4).unwrap(),
        comment: "Great".to_string(),
        created_at: test_epoch(),
    });
    let (store, mut session) = signed_in_session(&backend, "alice").await;
    let e1 = EventId::new("e1");
    session.open_event(e1.clone()).await.unwrap();
    eventually(&store, "review loaded", |s| s.review(&e1, &ReviewId::new("r1")).is_some()).await;

    store
        .send(FeedAction::DeleteReview {
            event_id: e1.clone(),
            review_id: ReviewId::new("r1"),
        })
        .await
        .unwrap()
        .wait()
        .await;
    eventually(&store, "review removed", |s| {
        s.reviews.get(&e1).is_some_and(Vec::is_empty)
    })
    .await;
    assert!(backend.reviews(&e1).is_empty());

    session.close().await.unwrap();
}

#[tokio::test]
async fn failed_write_is_reported_and_state_unchanged() {
    let backend = seeded();
    let (store, session) = signed_in_session(&backend, "alice").await;
    backend.fail_writes_with(BackendError::Unavailable("offline".to_string()));

    store
        .send(FeedAction::ToggleDtg {
            event_id: EventId::new("e1"),
        })
        .await
        .unwrap()
        .wait()
        .await;
    eventually(&store, "write failure", |s| s.last_error.is_some()).await;

    let (error, dtg) = store
        .state(|s| (s.last_error.clone().unwrap(), s.my_dtg.clone()))
        .await;
    assert!(error.contains("dtg"), "{error}");
    assert!(error.contains("offline"), "{error}");
    assert!(dtg.is_empty());

    backend.clear_failure();
    store
        .send(FeedAction::ToggleDtg {
            event_id: EventId::new("e1"),
        })
        .await
        .unwrap()
        .wait()
        .await;
    eventually(&store, "retry by hand", |s| s.last_error.is_none() && s.my_dtg.len() == 1).await;

    session.close().await.unwrap();
}

#[tokio::test]
async fn self_follow_is_rejected_without_a_write() {
    let backend = seeded();
    let (store, session) = signed_in_session(&backend, "alice").await;
    let writes = backend.write_count();

    store
        .send(FeedAction::ToggleFollow {
            target: UserId::new("alice"),
        })
        .await
        .unwrap();

    assert_eq!(
        store.state(|s| s.last_error.clone()).await.as_deref(),
        Some("You cannot follow yourself")
    );
    assert_eq!(backend.write_count(), writes);

    session.close().await.unwrap();
}

#[tokio::test]
async fn switching_viewer_drops_the_previous_viewers_flags() {
    let backend = seeded();
    let (store, mut session) = signed_in_session(&backend, "bob").await;
    eventually(&store, "bob's flags", |s| s.my_dtg.len() == 1).await;

    session.sign_in(UserId::new("carol")).await.unwrap();
    assert_eq!(session.viewer(), Some(&UserId::new("carol")));
    eventually(&store, "carol's flags", |s| {
        s.is_viewer(&UserId::new("carol")) && s.my_dtg.len() == 1 && s.my_recommended.is_empty()
    })
    .await;

    session.sign_out().await.unwrap();
    let state = store.state(FeedState::clone).await;
    assert!(state.viewer.is_none());
    assert!(state.my_dtg.is_empty());
    assert_eq!(session.active_subscriptions(), 2);

    session.close().await.unwrap();
}
