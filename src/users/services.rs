use tracing::error;
use uuid::Uuid;

use super::repo_types::{ProfileChanges, User};
use crate::state::AppState;

/// The configured current user; a failed read is logged and treated as absent.
pub async fn load_current_user(st: &AppState) -> Option<User> {
    match st.db.find_user(st.config.current_user).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = ?e, "fetching user failed");
            None
        }
    }
}

pub async fn update_profile(
    st: &AppState,
    user_id: Uuid,
    changes: &ProfileChanges,
) -> anyhow::Result<Option<User>> {
    st.db.update_user(user_id, changes).await
}
