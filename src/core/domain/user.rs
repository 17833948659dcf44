//! User type.

use serde::{Deserialize, Serialize};

use crate::core::types::Email;

/// A person who owns one or more devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable UUID
    pub id: String,
    pub name: String,
    pub email: Email,
}

impl User {
    /// New user with a fresh id.
    pub fn new(name: impl Into<String>, email: impl Into<Email>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
        }
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}
