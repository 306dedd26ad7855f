use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub body: String,
    pub image_url: Option<String>,
}

/// Author fields joined onto each post in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub name: Option<String>,
    pub profile_pic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithUser {
    #[serde(flatten)]
    pub post: Post,
    pub user: PostAuthor,
}

#[derive(Debug, FromRow)]
pub(crate) struct PostWithUserRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub user_name: Option<String>,
    pub user_profile_pic: Option<String>,
}

impl From<PostWithUserRow> for PostWithUser {
    fn from(row: PostWithUserRow) -> Self {
        Self {
            post: Post {
                id: row.id,
                user_id: row.user_id,
                body: row.body,
                image_url: row.image_url,
                created_at: row.created_at,
            },
            user: PostAuthor {
                name: row.user_name,
                profile_pic: row.user_profile_pic,
            },
        }
    }
}
