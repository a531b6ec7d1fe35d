//! Authorization predicates checked before a write is issued.
//!
//! The document store is not trusted to enforce these.

use dtg_core::model::{Review, UserId};

/// A review may only be deleted by its author
#[must_use]
pub fn can_delete_review(viewer: Option<&UserId>, review: &Review) -> bool {
    viewer.is_some_and(|viewer| viewer == &review.author)
}

/// A user may follow anyone but themselves
#[must_use]
pub fn can_follow(viewer: &UserId, target: &UserId) -> bool {
    viewer != target
}
