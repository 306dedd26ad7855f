use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    #[serde(with = "iso_date::option")]
    pub birthday: Option<Date>,
    pub city: Option<String>,
    pub networks: Option<Vec<String>>,
    pub profile_pic: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Which row counts as "the" user of this single-user deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSelector {
    ById(Uuid),
    /// Earliest-created row; deterministic when no id is configured.
    FirstCreated,
}

/// Full replacement of the editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub birthday: Option<Date>,
    pub city: Option<String>,
    pub networks: Vec<String>,
    pub profile_pic: Option<String>,
}
