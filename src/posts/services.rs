use anyhow::Context;
use tracing::{error, info};

use super::repo_types::{NewPost, Post, PostWithUser};
use crate::state::AppState;

/// The feed, newest first. A failed read degrades to an empty feed.
pub async fn fetch_feed(st: &AppState) -> Vec<PostWithUser> {
    match st.db.list_posts_with_user().await {
        Ok(posts) => posts,
        Err(e) => {
            error!(error = ?e, "fetching posts failed; rendering empty feed");
            Vec::new()
        }
    }
}

/// Inserts a post owned by the current user.
pub async fn create_post(st: &AppState, body: &str, image_url: Option<String>) -> anyhow::Result<Post> {
    let user = st
        .db
        .find_user(st.config.current_user)
        .await?
        .context("no user to own the post")?;

    let post = st
        .db
        .insert_post(&NewPost {
            user_id: user.id,
            body: body.to_string(),
            image_url,
        })
        .await?;

    info!(post_id = %post.id, user_id = %user.id, has_image = post.image_url.is_some(), "post created");
    Ok(post)
}
