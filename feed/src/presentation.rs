//! Text rendering of tallies and ratings.

use dtg_core::model::StarRating;

const FILLED_STAR: char = '★';
const EMPTY_STAR: char = '☆';

/// Verb agreement for a list of names
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerbForm {
    /// Exactly one name ("is", "recommends")
    Singular,
    /// Zero or several names ("are", "recommend")
    Plural,
}

impl VerbForm {
    /// Singular iff `n == 1`
    #[must_use]
    pub const fn for_count(n: usize) -> Self {
        if n == 1 { Self::Singular } else { Self::Plural }
    }

    /// Picks between the two spellings
    #[must_use]
    pub const fn pick<'a>(self, singular: &'a str, plural: &'a str) -> &'a str {
        match self {
            Self::Singular => singular,
            Self::Plural => plural,
        }
    }
}

/// `"{rec} friends recommend · {dtg} friends DTG"`
#[must_use]
pub fn friends_summary(recommend_count: usize, dtg_count: usize) -> String {
    format!("{recommend_count} friends recommend · {dtg_count} friends DTG")
}

/// `"a, b are DTG"` / `"a is DTG"`, or `None` when nobody is
#[must_use]
pub fn dtg_sentence(names: &[String]) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    let verb = VerbForm::for_count(names.len()).pick("is", "are");
    Some(format!("{} {verb} DTG", names.join(", ")))
}

/// `"a recommends X"` / `"a, b recommend X"`, or `None` when nobody does
#[must_use]
pub fn recommend_sentence(names: &[String], artist_name: &str) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    let verb = VerbForm::for_count(names.len()).pick("recommends", "recommend");
    Some(format!("{} {verb} {artist_name}", names.join(", ")))
}

/// Five symbols: one filled star per rating point, the rest empty
#[must_use]
pub fn render_stars(stars: StarRating) -> String {
    let filled = usize::from(stars.get());
    let empty = usize::from(StarRating::MAX) - filled;

    std::iter::repeat_n(FILLED_STAR, filled)
        .chain(std::iter::repeat_n(EMPTY_STAR, empty))
        .collect()
}

/// `"1 star"` / `"n stars"`
#[must_use]
pub fn stars_label(n: u8) -> String {
    if n == 1 {
        "1 star".to_string()
    } else {
        format!("{n} stars")
    }
}

/// Review form options, highest rating first
#[must_use]
pub fn star_options() -> Vec<(u8, String)> {
    (StarRating::MIN..=StarRating::MAX)
        .rev()
        .map(|n| (n, stars_label(n)))
        .collect()
}
