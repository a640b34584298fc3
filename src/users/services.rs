use std::sync::Arc;

use tracing::debug;

use crate::users::dto::{ListParams, PaginationMeta, UserResponse, UsersResponse};
use crate::users::repo::{RepoError, UserRepository};
use crate::users::repo_types::SortOrder;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

/// Normalised page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn from_params(params: &ListParams) -> Self {
        let page = parse_positive(params.page.as_deref(), DEFAULT_PAGE);
        let limit = parse_positive(params.limit.as_deref(), DEFAULT_LIMIT).min(MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse_positive(raw: Option<&str>, fallback: i64) -> i64 {
    match raw.map(str::trim).and_then(|v| v.parse::<i64>().ok()) {
        Some(v) if v > 0 => v,
        _ => fallback,
    }
}

/// Either the surrogate key or the external UUID of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentifier {
    NumericKey(u64),
    ExternalKey(String),
}

impl UserIdentifier {
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LookupError::InvalidIdentifier);
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = trimmed.parse::<u64>() {
                return Ok(Self::NumericKey(id));
            }
        }
        Ok(Self::ExternalKey(trimmed.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("user identifier is required")]
    InvalidIdentifier,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// Read side of the directory: paging and single-user lookup.
#[derive(Clone)]
pub struct UserQueryService {
    users: Arc<dyn UserRepository>,
}

impl UserQueryService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn list(&self, pagination: Pagination) -> Result<UsersResponse, RepoError> {
        let rows = self
            .users
            .list(SortOrder::IdDescending, pagination.limit, pagination.offset())
            .await?;
        let data: Vec<UserResponse> = rows.into_iter().map(UserResponse::from).collect();
        debug!(page = pagination.page, limit = pagination.limit, count = data.len(), "users listed");
        Ok(UsersResponse {
            meta: PaginationMeta {
                page: pagination.page,
                limit: pagination.limit,
                count: data.len(),
            },
            data,
        })
    }

    pub async fn get(&self, raw_identifier: &str) -> Result<UserResponse, LookupError> {
        let identifier = UserIdentifier::parse(raw_identifier)?;
        let found = match &identifier {
            // Keys beyond BIGINT range cannot exist.
            UserIdentifier::NumericKey(id) => match i64::try_from(*id) {
                Ok(id) => self.users.find_by_id(id).await?,
                Err(_) => None,
            },
            UserIdentifier::ExternalKey(external_id) => {
                self.users.find_by_external_id(external_id).await?
            }
        };
        found.map(UserResponse::from).ok_or(LookupError::NotFound)
    }
}
