use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use super::{form::PostForm, repo_types::PostWithUser, services::fetch_feed};
use crate::{
    error::AppError,
    forms::{FormData, Intent},
    routes::home::render_home,
    state::AppState,
};

/// Upper bound for a posted form. A file still streaming when it is reached
/// is reported as too large; parts after it are dropped.
pub const MAX_FORM_BYTES: usize = 16 * 1024 * 1024;

pub fn read_router() -> Router<AppState> {
    Router::new()
        .route("/fragments/feed", get(feed_fragment))
        .route("/api/posts", get(list_posts))
}

pub fn write_router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(submit_post))
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
}

#[instrument(skip(state))]
pub async fn feed_fragment(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let posts = fetch_feed(&state).await;
    Ok(state.views.feed(&state.config, &posts, OffsetDateTime::now_utc())?)
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> Json<Vec<PostWithUser>> {
    Json(fetch_feed(&state).await)
}

/// POST /posts (multipart): `body`, `image`, `preview_token`, `intent`.
///
/// Intents other than submit re-render the page with the form as edited.
/// A successful share redirects to the page.
#[instrument(skip(state, mp))]
pub async fn submit_post(State(state): State<AppState>, mp: Multipart) -> Result<Response, AppError> {
    let mut data = FormData::from_multipart(mp).await?;
    let mut form = PostForm::new(state.previews.clone());

    let body_refused = form.set_body(data.text("body").unwrap_or_default()).is_err();
    if let Some(token) = data.text("preview_token").and_then(|t| t.parse().ok()) {
        form.restore_image(token);
    }
    let image_refused = match data.take_file("image") {
        Some(file) => form.select_image(file).is_err(),
        None => false,
    };
    let refused = body_refused || image_refused;

    let intent = data.intent();
    match intent {
        Intent::RemoveImage => form.remove_image(),
        Intent::ReplaceImage => form.replace_image(),
        Intent::Preview | Intent::AddNetwork | Intent::RemoveNetwork(_) | Intent::Unknown => {}
        Intent::Submit if refused => {}
        Intent::Submit => {
            return match form.submit(&state).await {
                Ok(_) => Ok(Redirect::to("/").into_response()),
                Err(e) => {
                    let status = if e.is_validation() {
                        StatusCode::UNPROCESSABLE_ENTITY
                    } else {
                        StatusCode::BAD_GATEWAY
                    };
                    render_home(&state, status, &form, None)
                }
            };
        }
    }

    let status = if refused || intent == Intent::Unknown {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    render_home(&state, status, &form, None)
}
