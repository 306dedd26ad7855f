pub mod form;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_router())
        .merge(handlers::write_router())
}
