use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::{repo_types::User, services::load_current_user};
use crate::state::AppState;

/// Resolves the configured current user; `None` when it cannot be loaded.
pub struct CurrentUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(load_current_user(state).await))
    }
}
