//! Counting and naming the visible users who flagged a target.
//!
//! The counter never chooses between singular and plural wording; that is
//! a presentation concern (see [`crate::presentation::VerbForm`]).

use dtg_core::model::{ArtistId, EventId, User};
use serde::{Deserialize, Serialize};

/// Characters of the id shown for a user without a display name
pub const FALLBACK_LABEL_CHARS: usize = 8;

/// How many visible users flagged a target, and who
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagTally {
    /// Number of visible users satisfying the predicate
    pub count: usize,
    /// Their labels, in visible-user order
    pub names: Vec<String>,
}

impl FlagTally {
    /// Whether nobody flagged the target
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Label shown for a user in "friends" lists
///
/// The display name when present, otherwise the first
/// [`FALLBACK_LABEL_CHARS`] characters of the id.
#[must_use]
pub fn display_label(user: &User) -> String {
    user.display_name.clone().unwrap_or_else(|| {
        user.id
            .as_str()
            .chars()
            .take(FALLBACK_LABEL_CHARS)
            .collect()
    })
}

/// Counts and names the users for which `predicate` holds
pub fn count_flag<'a, I, P>(visible: I, predicate: P) -> FlagTally
where
    I: IntoIterator<Item = &'a User>,
    P: Fn(&User) -> bool,
{
    let names: Vec<String> = visible
        .into_iter()
        .filter(|user| predicate(user))
        .map(display_label)
        .collect();

    FlagTally {
        count: names.len(),
        names,
    }
}

/// Visible users who are DTG for `event`
pub fn dtg_tally<'a, I>(visible: I, event: &EventId) -> FlagTally
where
    I: IntoIterator<Item = &'a User>,
{
    count_flag(visible, |user| user.is_dtg(event))
}

/// Visible users who recommend `artist`
pub fn recommend_tally<'a, I>(visible: I, artist: &ArtistId) -> FlagTally
where
    I: IntoIterator<Item = &'a User>,
{
    count_flag(visible, |user| user.recommends(artist))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::resolve;
    use dtg_core::model::UserId;
    use dtg_testing::properties::{arb_directory, arb_event_id};
    use proptest::prelude::*;

    #[test]
    fn scenario_viewer_follows_nobody() {
        let users = vec![User::new("a").with_dtg("e1"), User::new("b")];
        let visible = resolve(&UserId::new("a"), &[], &users);

        let tally = dtg_tally(visible.iter().copied(), &EventId::new("e1"));
        assert_eq!(tally.count, 1);
        assert_eq!(tally.names, vec!["a"]);
    }

    #[test]
    fn display_name_preferred_over_id() {
        let users = vec![
            User::new("u-1234567890").with_recommended("a1"),
            User::new("u2")
                .with_display_name("Sam")
                .with_recommended("a1"),
        ];

        let tally = recommend_tally(&users, &ArtistId::new("a1"));
        assert_eq!(tally.names, vec!["u-123456", "Sam"]);
    }

    #[test]
    fn fallback_label_truncates_by_character() {
        let user = User::new("ünïcødé-user");
        assert_eq!(display_label(&user), "ünïcødé-");

        let short = User::new("ab");
        assert_eq!(display_label(&short), "ab");
    }

    #[test]
    fn absent_flags_count_as_empty() {
        let users = vec![User::new("a"), User::new("b")];
        let tally = dtg_tally(&users, &EventId::new("e1"));
        assert!(tally.is_empty());
        assert!(tally.names.is_empty());
    }

    proptest! {
        #[test]
        fn count_matches_names(users in arb_directory(), event in arb_event_id()) {
            let tally = dtg_tally(&users, &event);
            prop_assert_eq!(tally.count, tally.names.len());
            prop_assert_eq!(tally.count, users.iter().filter(|u| u.is_dtg(&event)).count());
        }
    }
}
