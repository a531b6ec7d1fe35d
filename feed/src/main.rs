//! DTG feed demo
//!
//! Seeds an in-memory document store and walks one viewer through the
//! feed: following a friend, toggling DTG, searching, reviewing.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --bin dtg-demo
//! ```

use chrono::NaiveDate;
use dtg_core::environment::SystemClock;
use dtg_core::model::{ArtistId, Event, EventId, NewReview, User, UserId};
use dtg_feed::{FeedAction, FeedConfig, FeedEnvironment, FeedReducer, FeedSession, FeedState};
use dtg_runtime::metrics::MetricsServer;
use dtg_runtime::Store;
use dtg_testing::InMemoryBackend;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Time for snapshots to reach the store after a write
const SETTLE: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = FeedConfig::from_env();
    config.validate()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},dtg_feed=debug", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(addr) = config.metrics_addr {
        MetricsServer::new(addr).start()?;
    }

    println!("=== DTG Feed Demo ===\n");

    let backend = Arc::new(seed());
    let env = FeedEnvironment::new(backend.clone(), Arc::new(SystemClock))
        .with_max_comment_length(config.max_comment_length);
    let store = Store::with_config(
        FeedState::new(),
        FeedReducer::new(),
        env,
        config.store_config(),
    );

    let mut session = FeedSession::open(store.clone(), backend.clone());
    let viewer = UserId::new("alice");
    session.sign_in(viewer.clone()).await?;
    tokio::time::sleep(SETTLE).await;

    let event_id = EventId::new("evt-summer");
    print_event(&store, &event_id, "Before following anyone").await;

    println!("\nalice follows bob...");
    store
        .send(FeedAction::ToggleFollow {
            target: UserId::new("bob"),
        })
        .await?
        .wait()
        .await;
    tokio::time::sleep(SETTLE).await;
    print_event(&store, &event_id, "Friends only").await;

    println!("\nalice is DTG...");
    store
        .send(FeedAction::ToggleDtg {
            event_id: event_id.clone(),
        })
        .await?
        .wait()
        .await;
    tokio::time::sleep(SETTLE).await;
    print_event(&store, &event_id, "After toggling DTG").await;

    println!("\nSearching for \"arena\"...");
    store
        .send(FeedAction::QueryChanged {
            query: "arena".to_string(),
        })
        .await?;
    let titles = store
        .state(|s| {
            s.filtered_events()
                .iter()
                .map(|e| format!("{} @ {} ({})", e.title, e.venue, e.date))
                .collect::<Vec<_>>()
        })
        .await;
    for title in titles {
        println!("  {title}");
    }

    println!("\nalice reviews the show...");
    session.open_event(event_id.clone()).await?;
    store
        .send(FeedAction::CreateReview {
            input: NewReview {
                event_id: event_id.clone(),
                stars: 4,
                comment: "Loud, sweaty, perfect".to_string(),
            },
        })
        .await?
        .wait()
        .await;
    tokio::time::sleep(SETTLE).await;

    let rows = store.state(|s| s.review_rows(&event_id)).await;
    for row in rows {
        let action = if row.deletable { " [delete]" } else { "" };
        println!("  {} {} - {}{action}", row.stars, row.author, row.comment);
    }

    if let Some(error) = store.state(|s| s.last_error.clone()).await {
        println!("\nLast error: {error}");
    }

    session.close().await?;
    println!("\n=== Demo Complete ===");
    Ok(())
}

fn seed() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    backend.insert_user(User::new("alice").with_display_name("Alice"));
    backend.insert_user(
        User::new("bob")
            .with_display_name("Bob")
            .with_recommended("caribou"),
    );
    backend.insert_user(
        User::new("c7f3a9e2-5d41-4b8e-9f06-2a1d3e4b5c6d")
            .with_dtg("evt-summer")
            .with_recommended("caribou"),
    );

    let date = |m, d| NaiveDate::from_ymd_opt(2025, m, d).unwrap_or_default();
    backend.insert_event(Event {
        id: EventId::new("evt-summer"),
        title: "Summer Nights".to_string(),
        venue: "NYC Arena".to_string(),
        date: date(7, 4),
        artist_id: ArtistId::new("caribou"),
        created_by: UserId::new("bob"),
    });
    backend.insert_event(Event {
        id: EventId::new("evt-basement"),
        title: "Basement Show".to_string(),
        venue: "The Garage".to_string(),
        date: date(6, 1),
        artist_id: ArtistId::new("turnstile"),
        created_by: UserId::new("alice"),
    });
    backend
}

async fn print_event(store: &dtg_feed::FeedStore, event_id: &EventId, heading: &str) {
    let Some(detail) = store.state(|s| s.event_detail(event_id)).await else {
        println!("{heading}: event not loaded yet");
        return;
    };

    println!("{heading}: {} ({})", detail.event.title, detail.artist_name);
    println!("  {}", detail.summary());
    if let Some(line) = detail.dtg_line() {
        println!("  {line}");
    }
    if let Some(line) = detail.recommend_line() {
        println!("  {line}");
    }
}
