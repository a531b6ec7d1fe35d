//! Derived views, recomputed from the latest [`FeedState`].
//!
//! Everything here is a pure function of the state. Nothing is cached; a
//! view reflects whatever snapshots the state held when it was computed.

use crate::aggregate::{dtg_tally, display_label, recommend_tally, FlagTally};
use crate::policy::can_delete_review;
use crate::presentation::{dtg_sentence, friends_summary, recommend_sentence, render_stars};
use crate::search::filter_events;
use crate::types::FeedState;
use crate::visibility::resolve;
use dtg_core::model::{Artist, Event, EventId, ReviewId, User, UserId};
use serde::Serialize;

/// Everything the event page shows above the reviews
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventDetail {
    /// The event
    pub event: Event,
    /// Resolved artist name (raw id when unknown)
    pub artist_name: String,
    /// Visible users DTG for the event
    pub dtg: FlagTally,
    /// Visible users recommending the artist
    pub recommend: FlagTally,
    /// Whether the viewer is DTG
    pub viewer_is_dtg: bool,
}

impl EventDetail {
    /// `"N friends recommend · M friends DTG"`
    #[must_use]
    pub fn summary(&self) -> String {
        friends_summary(self.recommend.count, self.dtg.count)
    }

    /// Who is DTG, if anyone
    #[must_use]
    pub fn dtg_line(&self) -> Option<String> {
        dtg_sentence(&self.dtg.names)
    }

    /// Who recommends the artist, if anyone
    #[must_use]
    pub fn recommend_line(&self) -> Option<String> {
        recommend_sentence(&self.recommend.names, &self.artist_name)
    }
}

/// One rendered review
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewRow {
    /// Review identifier
    pub review_id: ReviewId,
    /// Author label
    pub author: String,
    /// Five-symbol star rendering
    pub stars: String,
    /// Comment text
    pub comment: String,
    /// Whether the viewer may delete it
    pub deletable: bool,
}

/// One artist on the profile page
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArtistRow {
    /// The artist
    pub artist: Artist,
    /// Whether the viewer recommends it
    pub recommended: bool,
}

impl FeedState {
    /// The viewer's friends (everyone when signed out or following nobody)
    #[must_use]
    pub fn visible_users(&self) -> Vec<&User> {
        match &self.viewer {
            Some(viewer) => resolve(viewer, &self.following, self.directory.users()),
            None => self.directory.users().iter().collect(),
        }
    }

    /// The event page, or `None` while the event is not in the snapshot
    #[must_use]
    pub fn event_detail(&self, event_id: &EventId) -> Option<EventDetail> {
        let event = self.event(event_id)?;
        let visible = self.visible_users();

        Some(EventDetail {
            artist_name: self.catalog.name_of(&event.artist_id),
            dtg: dtg_tally(visible.iter().copied(), &event.id),
            recommend: recommend_tally(visible.iter().copied(), &event.artist_id),
            viewer_is_dtg: self.my_dtg.contains(&event.id),
            event: event.clone(),
        })
    }

    /// Events matching the current query, date ascending
    #[must_use]
    pub fn filtered_events(&self) -> Vec<&Event> {
        filter_events(&self.events, &self.query)
    }

    /// Rendered reviews of an event, newest first
    #[must_use]
    pub fn review_rows(&self, event_id: &EventId) -> Vec<ReviewRow> {
        let Some(reviews) = self.reviews.get(event_id) else {
            return Vec::new();
        };

        reviews
            .iter()
            .map(|review| ReviewRow {
                review_id: review.id.clone(),
                author: self.author_label(&review.author),
                stars: render_stars(review.stars),
                comment: review.comment.clone(),
                deletable: can_delete_review(self.viewer.as_ref(), review),
            })
            .collect()
    }

    /// The artist catalog with the viewer's recommend flags
    #[must_use]
    pub fn recommended_artists(&self) -> Vec<ArtistRow> {
        self.catalog
            .iter()
            .map(|artist| ArtistRow {
                recommended: self.my_recommended.contains(&artist.id),
                artist: artist.clone(),
            })
            .collect()
    }

    fn author_label(&self, author: &UserId) -> String {
        self.directory
            .get(author)
            .map_or_else(|| display_label(&User::new(author.clone())), display_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtg_core::model::{ArtistId, Review, StarRating};
    use dtg_core::NaiveDate;
    use dtg_testing::test_epoch;

    fn state() -> FeedState {
        let mut state = FeedState::signed_in("alice");
        state.directory.replace(vec![
            User::new("alice")
                .with_display_name("Alice")
                .with_dtg("e1")
                .with_recommended("caribou"),
            User::new("bob-0123456789").with_dtg("e1"),
            User::new("carol").with_recommended("caribou"),
        ]);
        state.events = vec![Event {
            id: EventId::new("e1"),
            title: "Summer Nights".to_string(),
            venue: "NYC Arena".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
            artist_id: ArtistId::new("caribou"),
            created_by: UserId::new("alice"),
        }];
        state.my_dtg.insert(EventId::new("e1"));
        state
    }

    #[test]
    fn event_detail_counts_all_users_when_following_nobody() {
        let detail = state().event_detail(&EventId::new("e1")).unwrap();

        assert_eq!(detail.artist_name, "Caribou");
        assert_eq!(detail.dtg.names, vec!["Alice", "bob-0123"]);
        assert_eq!(detail.summary(), "2 friends recommend · 2 friends DTG");
        assert_eq!(detail.dtg_line().as_deref(), Some("Alice, bob-0123 are DTG"));
        assert!(detail.viewer_is_dtg);
    }

    #[test]
    fn event_detail_scoped_to_followed_users() {
        let mut state = state();
        state.following = vec![UserId::new("carol")];

        let detail = state.event_detail(&EventId::new("e1")).unwrap();
        assert_eq!(detail.dtg.names, vec!["Alice"]);
        assert_eq!(detail.dtg_line().as_deref(), Some("Alice is DTG"));
        assert_eq!(
            detail.recommend_line().as_deref(),
            Some("Alice, carol recommend Caribou")
        );
    }

    #[test]
    fn missing_event_has_no_detail() {
        assert!(state().event_detail(&EventId::new("nope")).is_none());
    }

    #[test]
    fn review_rows_mark_own_reviews_deletable() {
        let mut state = state();
        let review = |id: &str, author: &str| Review {
            id: ReviewId::new(id),
            event_id: EventId::new("e1"),
            author: UserId::new(author),
            stars: StarRating::new(3).unwrap(),
            comment: "ok".to_string(),
            created_at: test_epoch(),
        };
        state.reviews.insert(
            EventId::new("e1"),
            vec![review("r2", "bob-0123456789"), review("r1", "alice")],
        );

        let rows = state.review_rows(&EventId::new("e1"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].author, "bob-0123");
        assert!(!rows[0].deletable);
        assert_eq!(rows[1].author, "Alice");
        assert!(rows[1].deletable);
        assert_eq!(rows[1].stars, "★★★☆☆");
    }

    #[test]
    fn filtered_events_use_query() {
        let mut state = state();
        state.query = "arena".to_string();
        assert_eq!(state.filtered_events().len(), 1);
        state.query = "stadium".to_string();
        assert!(state.filtered_events().is_empty());
    }

    #[test]
    fn recommended_artists_reflect_viewer_flags() {
        let mut state = state();
        state.my_recommended.insert(ArtistId::new("caribou"));

        let rows = state.recommended_artists();
        assert_eq!(rows.len(), state.catalog.len());
        let caribou = rows.iter().find(|r| r.artist.id.as_str() == "caribou").unwrap();
        assert!(caribou.recommended);
        assert_eq!(rows.iter().filter(|r| r.recommended).count(), 1);
    }
}
