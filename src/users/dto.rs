use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::form_urlencoded;
use uuid::Uuid;

use crate::users::repo_types::{User, UserStatus};

/// Raw `?page=&limit=` values. Kept as strings so malformed input falls back
/// to defaults instead of rejecting the request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListParams {
    /// Reads `page` and `limit` from a raw query string. The first occurrence
    /// of a repeated key wins; unknown keys are ignored.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Public view of a user. Has no credential fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
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

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            uuid: u.external_id,
            name: u.name,
            email: u.email,
            avatar_url: u.avatar_url,
            status: u.status,
            last_login_at: u.last_login_at,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub count: usize,
}

/// `{ data: [...], meta: {...} }` envelope for list responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub data: Vec<UserResponse>,
    pub meta: PaginationMeta,
}
