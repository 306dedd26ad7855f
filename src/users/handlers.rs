use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    extractors::CurrentUser,
    form::{ProfileError, ProfileForm},
    repo_types::User,
};
use crate::{
    error::AppError,
    forms::{FormData, Intent},
    posts::{form::PostForm, handlers::MAX_FORM_BYTES},
    routes::home::render_home,
    state::AppState,
};

pub fn read_router() -> Router<AppState> {
    Router::new()
        .route("/fragments/profile", get(profile_fragment))
        .route("/api/me", get(me))
}

pub fn write_router() -> Router<AppState> {
    Router::new()
        .route("/profile/edit", get(edit_profile))
        .route("/profile", post(save_profile))
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
}

/// Always renders: an unavailable profile shows a placeholder card.
#[instrument(skip_all)]
pub async fn profile_fragment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    Ok(state.views.profile(&state.config, user.as_ref())?)
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Result<Json<User>, AppError> {
    user.map(Json).ok_or_else(|| AppError::NotFound("user".into()))
}

#[instrument(skip_all)]
pub async fn edit_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let compose = PostForm::new(state.previews.clone());
    match user {
        Some(user) => {
            let modal = ProfileForm::from_user(&user, state.previews.clone());
            render_home(&state, StatusCode::OK, &compose, Some(&modal))
        }
        None => render_home(&state, StatusCode::NOT_FOUND, &compose, None),
    }
}

/// POST /profile (multipart): `name`, `birthday`, `city`, repeated
/// `networks`, `profile_pic`, `preview_token`, `intent`.
#[instrument(skip_all)]
pub async fn save_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mp: Multipart,
) -> Result<Response, AppError> {
    let compose = PostForm::new(state.previews.clone());
    let Some(user) = user else {
        warn!("profile submitted but no user could be loaded");
        return render_home(&state, StatusCode::NOT_FOUND, &compose, None);
    };

    let mut data = FormData::from_multipart(mp).await?;
    let mut form = ProfileForm::from_user(&user, state.previews.clone());
    form.set_name(data.text("name").unwrap_or_default());
    form.set_city(data.text("city").unwrap_or_default());
    form.set_birthday(data.text("birthday").unwrap_or_default());
    form.set_networks(data.texts("networks"));
    if let Some(token) = data.text("preview_token").and_then(|t| t.parse().ok()) {
        form.restore_picture(token);
    }
    let refused = match data.take_file("profile_pic") {
        Some(file) => form.select_picture(file).is_err(),
        None => false,
    };

    let intent = data.intent();
    match intent {
        Intent::AddNetwork => form.add_network(),
        Intent::RemoveNetwork(index) => {
            form.remove_network(index);
        }
        Intent::RemoveImage => form.remove_picture(),
        Intent::ReplaceImage => form.replace_picture(),
        Intent::Preview | Intent::Unknown => {}
        Intent::Submit if refused => {}
        Intent::Submit => {
            return match form.submit(&state).await {
                Ok(_) => Ok(Redirect::to("/").into_response()),
                Err(e) => {
                    let status = match e {
                        ProfileError::NotFound => StatusCode::NOT_FOUND,
                        e if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
                        _ => StatusCode::BAD_GATEWAY,
                    };
                    render_home(&state, status, &compose, Some(&form))
                }
            };
        }
    }

    let status = if refused || intent == Intent::Unknown {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    render_home(&state, status, &compose, Some(&form))
}
