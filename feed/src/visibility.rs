//! Friend scoping: which users a viewer sees.
//!
//! A viewer who follows nobody sees everyone. Once they follow at least one
//! user, they see themselves plus the users they follow.

use dtg_core::model::{User, UserId};

/// Computes the visible subset of `all_users` for `viewer`
///
/// Preserves directory order. Followed ids missing from the directory are
/// ignored, and the viewer appears at most once.
#[must_use]
pub fn resolve<'a>(viewer: &UserId, following: &[UserId], all_users: &'a [User]) -> Vec<&'a User> {
    if following.is_empty() {
        return all_users.iter().collect();
    }

    all_users
        .iter()
        .filter(|user| &user.id == viewer || following.contains(&user.id))
        .collect()
}
