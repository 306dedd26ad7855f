use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::instrument;

use crate::{
    error::AppError, posts::form::PostForm, state::AppState, users::form::ProfileForm,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let form = PostForm::new(state.previews.clone());
    render_home(&state, StatusCode::OK, &form, None)
}

/// Renders the page shell around a composition form and an optional
/// edit-profile dialog.
pub fn render_home(
    state: &AppState,
    status: StatusCode,
    compose: &PostForm,
    modal: Option<&ProfileForm>,
) -> Result<Response, AppError> {
    let html = state.views.home(&state.config, compose, modal)?;
    Ok((status, html).into_response())
}
