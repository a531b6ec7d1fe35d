//! Case-insensitive substring search over the event list.

use dtg_core::model::Event;

/// Events whose title, venue or artist id contains `query`
///
/// Matching is case-insensitive and preserves input order. An empty query
/// matches every event. The query is not trimmed, so `" "` only matches
/// fields containing a space.
///
/// The artist is matched by its raw id, not its display name.
#[must_use]
pub fn filter_events<'a>(events: &'a [Event], query: &str) -> Vec<&'a Event> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return events.iter().collect();
    }

    events.iter().filter(|event| matches(event, &needle)).collect()
}

fn matches(event: &Event, needle: &str) -> bool {
    [
        event.title.as_str(),
        event.venue.as_str(),
        event.artist_id.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}
