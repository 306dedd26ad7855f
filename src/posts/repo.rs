use anyhow::Context;
use sqlx::PgPool;

use super::repo_types::{NewPost, Post, PostWithUser, PostWithUserRow};

pub async fn insert_post(db: &PgPool, new: &NewPost) -> anyhow::Result<Post> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (user_id, body, image_url)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, body, image_url, created_at
        "#,
    )
    .bind(new.user_id)
    .bind(&new.body)
    .bind(new.image_url.as_deref()) // Option<&str> → NULL allowed
    .fetch_one(db)
    .await
    .context("insert post")?;

    Ok(post)
}

/// Every post with its author's name and picture, newest first.
pub async fn list_with_user(db: &PgPool) -> anyhow::Result<Vec<PostWithUser>> {
    let rows = sqlx::query_as::<_, PostWithUserRow>(
        r#"
        SELECT p.id, p.user_id, p.body, p.image_url, p.created_at,
               u.name AS user_name, u.profile_pic AS user_profile_pic
          FROM posts p
          JOIN users u ON u.id = p.user_id
         ORDER BY p.created_at DESC
        "#,
    )
    .fetch_all(db)
    .await
    .context("list posts with user")?;

    Ok(rows.into_iter().map(PostWithUser::from).collect())
}
