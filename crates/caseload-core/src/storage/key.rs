use std::fmt;

use crate::models::UserId;

/// The record collections kept per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Students,
    Teachers,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Teachers => "teachers",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key addressing one collection inside one user's partition.
///
/// Two keys are equal only when both the collection and the user match, so
/// data written for one user can never be read back under another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    collection: Collection,
    user: UserId,
}

impl StorageKey {
    pub fn new(collection: Collection, user: UserId) -> Self {
        Self { collection, user }
    }

    pub fn students(user: &UserId) -> Self {
        Self::new(Collection::Students, user.clone())
    }

    pub fn teachers(user: &UserId) -> Self {
        Self::new(Collection::Teachers, user.clone())
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.collection, self.user)
    }
}
