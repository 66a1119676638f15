/// User model
///
/// Users are the identities every board and ticket operation is performed by.
/// A user is created on signup and its identity (id, email) never changes.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     email TEXT NOT NULL,
///     password_hash TEXT NOT NULL,
///     name TEXT NOT NULL,
///     role TEXT NOT NULL DEFAULT 'member' CHECK (role IN ('member', 'admin')),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX users_email_key ON users (LOWER(email));
/// ```
///
/// # Example
///
/// ```no_run
/// use tickettrack_shared::models::user::{CreateUser, UserRole};
/// use tickettrack_shared::store::{memory::MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let user = store.create_user(CreateUser {
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: "Ada".to_string(),
///     role: UserRole::Member,
/// }).await?;
///
/// let found = store.find_user_by_email("ADA@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Global role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account
    Member,

    /// Account allowed to perform admin-only actions on boards it belongs to
    Admin,
}

impl UserRole {
    /// Converts role to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Member => "member",
            UserRole::Admin => "admin",
        }
    }

    /// Parses role from its stored form
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "member" => Some(UserRole::Member),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Member
    }
}

/// User account
///
/// `password_hash` is never serialized, so a `User` can be returned from
/// handlers as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, stored normalized (trimmed, lowercase)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// Global role
    pub role: UserRole,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Checks whether `email` addresses this user
    pub fn has_email(&self, email: &str) -> bool {
        self.email == normalize_email(email)
    }

    /// Short public form used when references are resolved
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Resolved user reference (id, name, email)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address (normalized by the store)
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// Global role (defaults to Member)
    #[serde(default)]
    pub role: UserRole,
}

/// Normalizes an email address for storage and comparison
///
/// Emails are compared case-insensitively everywhere (signup uniqueness,
/// invitations, invitation acceptance).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
