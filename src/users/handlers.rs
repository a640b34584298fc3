use axum::{
    extract::{rejection::PathRejection, Path, RawQuery, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, error, instrument, warn};

use crate::{
    error::AppError,
    state::AppState,
    users::{
        dto::{ListParams, UserResponse, UsersResponse},
        services::{LookupError, Pagination},
    },
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/", get(missing_identifier))
        .route("/users/:id", get(get_user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<UsersResponse>, AppError> {
    let pagination = Pagination::from_params(&ListParams::from_query(query.as_deref()));
    let resp = state.user_queries().list(pagination).await.map_err(|e| {
        error!(error = %e, page = pagination.page, limit = pagination.limit, "list users failed");
        AppError::Internal("failed to query users".into())
    })?;
    Ok(Json(resp))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<UserResponse>, AppError> {
    // A segment that does not decode to UTF-8 cannot name any user.
    let Path(id) = id.map_err(|e| {
        debug!(error = %e, "undecodable user identifier");
        lookup_error(LookupError::NotFound)
    })?;
    let user = state.user_queries().get(&id).await.map_err(lookup_error)?;
    Ok(Json(user))
}

pub async fn missing_identifier() -> AppError {
    lookup_error(LookupError::InvalidIdentifier)
}

fn lookup_error(e: LookupError) -> AppError {
    match e {
        LookupError::InvalidIdentifier => {
            warn!("blank user identifier");
            AppError::BadRequest("user identifier is required".into())
        }
        LookupError::NotFound => AppError::NotFound("user not found".into()),
        LookupError::Repository(e) => {
            error!(error = %e, "get user failed");
            AppError::Internal("failed to query user".into())
        }
    }
}
