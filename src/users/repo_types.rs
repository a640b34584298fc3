use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account state. Chosen at creation time; no transitions are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Active,
    Disabled,
}

impl UserStatus {
    pub const ALL: [UserStatus; 3] = [UserStatus::Pending, UserStatus::Active, UserStatus::Disabled];
}

/// User row as stored in the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    #[sqlx(rename = "uuid")]
    #[serde(rename = "uuid")]
    pub external_id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, never exposed
    pub avatar_url: Option<String>,
    pub status: UserStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A user record that has not been stored yet (no surrogate key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(rename = "uuid")]
    pub external_id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub status: UserStatus,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub last_login_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl NewUser {
    /// Attach the key the repository assigned on insert.
    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            external_id: self.external_id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            avatar_url: self.avatar_url,
            status: self.status,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Output of the synthetic user factory.
///
/// The plaintext password only lives here, for operator display right after
/// generation. Storage only ever receives `record`.
#[derive(Clone, Serialize)]
pub struct GeneratedUser {
    #[serde(flatten)]
    pub record: NewUser,
    pub plain_password: String,
}

impl std::fmt::Debug for GeneratedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedUser")
            .field("record", &self.record)
            .field("plain_password", &"<redacted>")
            .finish()
    }
}

/// Scan direction over the surrogate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    IdAscending,
    IdDescending,
}
