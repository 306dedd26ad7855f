use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{ProfileChanges, User, UserSelector};

/// Fetch the single user this deployment serves, if it exists.
pub async fn find_user(db: &PgPool, selector: UserSelector) -> anyhow::Result<Option<User>> {
    let user = match selector {
        UserSelector::ById(id) => {
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, birthday, city, networks, profile_pic, created_at
                  FROM users
                 WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(db)
            .await
        }
        UserSelector::FirstCreated => {
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, birthday, city, networks, profile_pic, created_at
                  FROM users
                 ORDER BY created_at ASC, id ASC
                 LIMIT 1
                "#,
            )
            .fetch_optional(db)
            .await
        }
    }
    .context("select user")?;

    Ok(user)
}

pub async fn update_user(
    db: &PgPool,
    user_id: Uuid,
    changes: &ProfileChanges,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
           SET name = $2, birthday = $3, city = $4, networks = $5, profile_pic = $6
         WHERE id = $1
        RETURNING id, name, birthday, city, networks, profile_pic, created_at
        "#,
    )
    .bind(user_id)
    .bind(changes.name.as_deref())
    .bind(changes.birthday)
    .bind(changes.city.as_deref())
    .bind(&changes.networks)
    .bind(changes.profile_pic.as_deref())
    .fetch_optional(db)
    .await
    .with_context(|| format!("update user {user_id}"))?;

    Ok(user)
}
