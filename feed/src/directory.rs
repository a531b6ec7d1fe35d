//! The set of known users, refreshed by subscription.

use dtg_core::model::{User, UserId};
use serde::{Deserialize, Serialize};

/// Every user document from the latest snapshot
///
/// Order is the order the document store delivered; nothing downstream
/// depends on it beyond keeping output stable between renders.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    /// A directory holding `users`
    #[must_use]
    pub const fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Replaces the whole directory with a new snapshot
    pub fn replace(&mut self, users: Vec<User>) {
        self.users = users;
    }

    /// All users
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Looks up a user
    #[must_use]
    pub fn get(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    /// Whether the user is known
    #[must_use]
    pub fn contains(&self, id: &UserId) -> bool {
        self.get(id).is_some()
    }

    /// Number of users
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no users are known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
