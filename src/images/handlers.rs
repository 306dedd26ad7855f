use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::instrument;

use super::previews::PreviewToken;
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/previews/:token", get(get_preview))
}

#[instrument(skip(state))]
pub async fn get_preview(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let token: PreviewToken = token
        .parse()
        .map_err(|_| AppError::NotFound("preview".into()))?;
    let file = state
        .previews
        .get(&token)
        .ok_or_else(|| AppError::NotFound("preview".into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CACHE_CONTROL, "private, no-store".to_string()),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            (header::CONTENT_SECURITY_POLICY, "sandbox".to_string()),
        ],
        file.bytes,
    ))
}
