//! Domain model shared by every layer of the feed.
//!
//! Identifiers are opaque strings issued by the hosted document store. They
//! are wrapped in newtypes so a user id cannot be passed where an event id
//! is expected; on the wire they serialize as plain strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Errors raised while building domain values from untrusted input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A star rating outside `1..=5`
    #[error("Star rating must be between 1 and 5, got {0}")]
    InvalidStarRating(i64),

    /// A date that is not `YYYY-MM-DD`
    #[error("Invalid event date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A required text field was blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A free-text field exceeded its limit
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Offending field
        field: &'static str,
        /// Accepted length in characters
        max: usize,
    },
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the raw identifier
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a user account
    UserId
);
string_id!(
    /// Identifier of an event (a concert)
    EventId
);
string_id!(
    /// Identifier of an artist in the static catalog
    ArtistId
);
string_id!(
    /// Identifier of a review, unique within its event
    ReviewId
);

/// A user document with its flag sets and follow edges
///
/// Flag collections missing from the stored document deserialize as empty
/// sets; an absent list is never an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account identifier
    pub id: UserId,
    /// Name shown in "friends" lists, if the account has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Events this user is down to go to
    #[serde(default)]
    pub dtg: BTreeSet<EventId>,
    /// Artists this user recommends
    #[serde(default)]
    pub recommended: BTreeSet<ArtistId>,
    /// Users this user follows (directed, not necessarily reciprocal)
    #[serde(default)]
    pub following: BTreeSet<UserId>,
}

impl User {
    /// Creates a user with no display name and empty flag sets
    #[must_use]
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            dtg: BTreeSet::new(),
            recommended: BTreeSet::new(),
            following: BTreeSet::new(),
        }
    }

    /// Sets the display name
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Adds an event to the DTG set
    #[must_use]
    pub fn with_dtg(mut self, event_id: impl Into<EventId>) -> Self {
        self.dtg.insert(event_id.into());
        self
    }

    /// Adds an artist to the recommended set
    #[must_use]
    pub fn with_recommended(mut self, artist_id: impl Into<ArtistId>) -> Self {
        self.recommended.insert(artist_id.into());
        self
    }

    /// Adds a follow edge to another user
    #[must_use]
    pub fn with_following(mut self, user_id: impl Into<UserId>) -> Self {
        self.following.insert(user_id.into());
        self
    }

    /// Whether this user is DTG for the event
    #[must_use]
    pub fn is_dtg(&self, event_id: &EventId) -> bool {
        self.dtg.contains(event_id)
    }

    /// Whether this user recommends the artist
    #[must_use]
    pub fn recommends(&self, artist_id: &ArtistId) -> bool {
        self.recommended.contains(artist_id)
    }

    /// Whether this user follows `other`
    #[must_use]
    pub fn follows(&self, other: &UserId) -> bool {
        self.following.contains(other)
    }
}

/// A logged event; immutable once created
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Title as entered by its creator
    pub title: String,
    /// Venue name
    pub venue: String,
    /// Calendar day of the show
    pub date: NaiveDate,
    /// Headlining artist
    pub artist_id: ArtistId,
    /// User who logged the event
    pub created_by: UserId,
}

/// Star rating of a review, always within `1..=5`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct StarRating(u8);

impl StarRating {
    /// Lowest accepted rating
    pub const MIN: u8 = 1;
    /// Highest accepted rating
    pub const MAX: u8 = 5;

    /// Validates a rating
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidStarRating`] when `stars` is outside `1..=5`.
    pub fn new(stars: u8) -> Result<Self, ModelError> {
        if (Self::MIN..=Self::MAX).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(ModelError::InvalidStarRating(i64::from(stars)))
        }
    }

    /// Clamps an arbitrary stored value into `1..=5`
    ///
    /// For callers rendering data that bypassed validation.
    #[must_use]
    pub fn clamped(raw: i64) -> Self {
        let clamped = raw.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        // The clamp above keeps the value inside u8 range.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let stars = clamped as u8;
        Self(stars)
    }

    /// The rating as a number
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for StarRating {
    type Error = ModelError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        u8::try_from(raw)
            .map_err(|_| ModelError::InvalidStarRating(raw))
            .and_then(Self::new)
    }
}

impl From<StarRating> for i64 {
    fn from(rating: StarRating) -> Self {
        Self::from(rating.0)
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A star review left on an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review identifier
    pub id: ReviewId,
    /// Event the review belongs to
    pub event_id: EventId,
    /// Author of the review
    pub author: UserId,
    /// Star rating
    pub stars: StarRating,
    /// Free-text comment
    pub comment: String,
    /// When the review was written
    pub created_at: DateTime<Utc>,
}

/// Read-only artist reference data
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    /// Artist identifier
    pub id: ArtistId,
    /// Display name
    pub name: String,
}

/// Raw event form input, before validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Event title
    pub title: String,
    /// Venue name
    pub venue: String,
    /// Date as typed in the form, `YYYY-MM-DD`
    pub date: String,
    /// Selected artist
    pub artist_id: ArtistId,
}

impl NewEvent {
    /// Validates the form input and attaches its creator
    ///
    /// Title and venue are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingField`] for a blank title, venue or
    /// artist and [`ModelError::InvalidDate`] for an unparseable date.
    pub fn into_draft(self, created_by: UserId) -> Result<EventDraft, ModelError> {
        let title = required("Title", &self.title)?;
        let venue = required("Venue", &self.venue)?;
        if self.artist_id.as_str().trim().is_empty() {
            return Err(ModelError::MissingField("Artist"));
        }
        let date = parse_event_date(&self.date)?;

        Ok(EventDraft {
            title,
            venue,
            date,
            artist_id: self.artist_id,
            created_by,
        })
    }
}

/// A validated event ready to be written
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Event title
    pub title: String,
    /// Venue name
    pub venue: String,
    /// Calendar day of the show
    pub date: NaiveDate,
    /// Headlining artist
    pub artist_id: ArtistId,
    /// Creator
    pub created_by: UserId,
}

/// A validated review ready to be written
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
    /// Event being reviewed
    pub event_id: EventId,
    /// Author of the review
    pub author: UserId,
    /// Star rating
    pub stars: StarRating,
    /// Free-text comment
    pub comment: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Raw review form input, before validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    /// Event being reviewed
    pub event_id: EventId,
    /// Star rating as selected in the form
    pub stars: i64,
    /// Free-text comment
    pub comment: String,
}

impl NewReview {
    /// Validates the form input and stamps author and creation time
    ///
    /// The comment is trimmed and limited to `max_comment_chars` characters.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingField`] for a blank comment,
    /// [`ModelError::TooLong`] for an oversized one and
    /// [`ModelError::InvalidStarRating`] for stars outside `1..=5`.
    pub fn into_draft(
        self,
        author: UserId,
        created_at: DateTime<Utc>,
        max_comment_chars: usize,
    ) -> Result<ReviewDraft, ModelError> {
        let comment = required("Comment", &self.comment)?;
        if comment.chars().count() > max_comment_chars {
            return Err(ModelError::TooLong {
                field: "Comment",
                max: max_comment_chars,
            });
        }
        let stars = StarRating::try_from(self.stars)?;

        Ok(ReviewDraft {
            event_id: self.event_id,
            author,
            stars,
            comment,
            created_at,
        })
    }
}

/// Parses a form date in `YYYY-MM-DD` form
///
/// # Errors
///
/// Returns [`ModelError::InvalidDate`] if the input does not parse.
pub fn parse_event_date(raw: &str) -> Result<NaiveDate, ModelError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ModelError::InvalidDate(raw.to_string()))
}

fn required(field: &'static str, value: &str) -> Result<String, ModelError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ModelError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}
