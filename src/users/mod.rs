use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod generator;
pub mod handlers;
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::read_routes())
}
