use anyhow::Context;
use axum::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::posts::{
    repo as posts_repo,
    repo_types::{NewPost, Post, PostWithUser},
};
use crate::users::{
    repo as users_repo,
    repo_types::{ProfileChanges, User, UserSelector},
};

/// Table access against the hosted backend.
#[async_trait]
pub trait Database: Send + Sync {
    async fn find_user(&self, selector: UserSelector) -> anyhow::Result<Option<User>>;
    async fn update_user(&self, user_id: Uuid, changes: &ProfileChanges) -> anyhow::Result<Option<User>>;
    async fn insert_post(&self, new: &NewPost) -> anyhow::Result<Post>;
    async fn list_posts_with_user(&self) -> anyhow::Result<Vec<PostWithUser>>;
}

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn find_user(&self, selector: UserSelector) -> anyhow::Result<Option<User>> {
        users_repo::find_user(&self.pool, selector).await
    }

    async fn update_user(&self, user_id: Uuid, changes: &ProfileChanges) -> anyhow::Result<Option<User>> {
        users_repo::update_user(&self.pool, user_id, changes).await
    }

    async fn insert_post(&self, new: &NewPost) -> anyhow::Result<Post> {
        posts_repo::insert_post(&self.pool, new).await
    }

    async fn list_posts_with_user(&self) -> anyhow::Result<Vec<PostWithUser>> {
        posts_repo::list_with_user(&self.pool).await
    }
}
