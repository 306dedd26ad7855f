use serde::Serialize;
use time::OffsetDateTime;

use super::humanize::{long_date, time_ago};
use crate::{
    config::AppConfig,
    images::ImageUpload,
    posts::{form::PostForm, form::MAX_BODY_CHARS, repo_types::PostWithUser},
    users::{form::ProfileForm, repo_types::User},
};

const NEAR_LIMIT: usize = 20;

#[derive(Debug, Serialize)]
pub struct UploadView {
    pub preview_url: Option<String>,
    pub preview_token: Option<String>,
    pub error: Option<String>,
    pub open_picker: bool,
}

impl From<&ImageUpload> for UploadView {
    fn from(upload: &ImageUpload) -> Self {
        Self {
            preview_url: upload.preview_url(),
            preview_token: upload.preview_token().map(|t| t.to_string()),
            error: upload.error().map(str::to_string),
            open_picker: upload.picker_requested(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComposeView {
    pub body: String,
    pub char_count: usize,
    pub max_chars: usize,
    pub near_limit: bool,
    pub at_limit: bool,
    pub submitting: bool,
    pub error: Option<String>,
    pub upload: UploadView,
}

impl From<&PostForm> for ComposeView {
    fn from(form: &PostForm) -> Self {
        let count = form.char_count();
        let remaining = MAX_BODY_CHARS.saturating_sub(count);
        Self {
            body: form.body().to_string(),
            char_count: count,
            max_chars: MAX_BODY_CHARS,
            near_limit: remaining <= NEAR_LIMIT,
            at_limit: remaining == 0,
            submitting: form.is_submitting(),
            error: form.error().map(str::to_string),
            upload: UploadView::from(form.upload()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileCardView {
    pub name: String,
    pub birthday: String,
    pub city: String,
    pub networks: Vec<String>,
    pub profile_pic: Option<String>,
}

impl ProfileCardView {
    pub fn new(user: &User, config: &AppConfig) -> Self {
        Self {
            name: user.name.clone().unwrap_or_else(|| "Anonymous".into()),
            birthday: user
                .birthday
                .map(long_date)
                .unwrap_or_else(|| "Not specified".into()),
            city: user.city.clone().unwrap_or_else(|| "Not specified".into()),
            networks: user.networks.clone().unwrap_or_default(),
            profile_pic: renderable(user.profile_pic.as_deref(), config),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileModalView {
    pub name: String,
    pub city: String,
    pub birthday: String,
    pub networks: Vec<String>,
    pub current_pic: Option<String>,
    pub submitting: bool,
    pub error: Option<String>,
    pub upload: UploadView,
}

impl ProfileModalView {
    pub fn new(form: &ProfileForm, config: &AppConfig) -> Self {
        Self {
            name: form.name().to_string(),
            city: form.city().to_string(),
            birthday: form.birthday().to_string(),
            networks: form.networks().to_vec(),
            current_pic: renderable(form.current_pic(), config),
            submitting: form.is_submitting(),
            error: form.error().map(str::to_string),
            upload: UploadView::from(form.upload()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostCardView {
    pub id: String,
    pub author_name: String,
    pub author_pic: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
    pub posted_ago: String,
}

impl PostCardView {
    pub fn new(item: &PostWithUser, config: &AppConfig, now: OffsetDateTime) -> Self {
        Self {
            id: item.post.id.to_string(),
            author_name: item.user.name.clone().unwrap_or_else(|| "Anonymous".into()),
            author_pic: renderable(item.user.profile_pic.as_deref(), config),
            body: item.post.body.clone(),
            image_url: renderable(item.post.image_url.as_deref(), config),
            posted_ago: time_ago(item.post.created_at, now),
        }
    }
}

/// Image references from origins that are not allowed are dropped.
fn renderable(reference: Option<&str>, config: &AppConfig) -> Option<String> {
    let reference = reference.filter(|r| !r.is_empty())?;
    if config.image_allowed(reference) {
        Some(reference.to_string())
    } else {
        tracing::debug!(%reference, "image origin not allowed; not rendering");
        None
    }
}

#[cfg(test)]
mod models_tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::{
        images::{ImageFile, PreviewRegistry},
        posts::repo_types::{Post, PostAuthor},
    };

    #[test]
    fn test_compose_counter_flags() {
        let mut form = PostForm::new(PreviewRegistry::new());
        form.set_body("a".repeat(259)).unwrap();
        let view = ComposeView::from(&form);
        assert_eq!(view.char_count, 259);
        assert!(!view.near_limit);

        form.set_body("a".repeat(260)).unwrap();
        assert!(ComposeView::from(&form).near_limit);

        form.set_body("a".repeat(280)).unwrap();
        let view = ComposeView::from(&form);
        assert!(view.at_limit);
        assert_eq!(view.max_chars, 280);
    }

    #[test]
    fn test_compose_view_carries_preview() {
        let mut form = PostForm::new(PreviewRegistry::new());
        form.select_image(ImageFile::new("a.png", "image/png", &b"x"[..])).unwrap();
        let view = ComposeView::from(&form);
        let token = view.upload.preview_token.clone().unwrap();
        assert_eq!(view.upload.preview_url, Some(format!("/previews/{token}")));
    }

    #[test]
    fn test_profile_card_placeholders() {
        let config = AppConfig::for_tests();
        let user = User {
            id: Uuid::new_v4(),
            name: None,
            birthday: None,
            city: None,
            networks: None,
            profile_pic: Some("https://elsewhere.example/pic.png".into()),
            created_at: datetime!(2024-01-01 0:00 UTC),
        };
        let view = ProfileCardView::new(&user, &config);
        assert_eq!(view.name, "Anonymous");
        assert_eq!(view.birthday, "Not specified");
        assert_eq!(view.city, "Not specified");
        assert!(view.networks.is_empty());
        assert_eq!(view.profile_pic, None);
    }

    #[test]
    fn test_post_card() {
        let config = AppConfig::for_tests();
        let item = PostWithUser {
            post: Post {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                body: "hello".into(),
                image_url: Some("https://storage.test/posts/1-a.png".into()),
                created_at: datetime!(2024-06-01 10:00 UTC),
            },
            user: PostAuthor {
                name: Some("Ada".into()),
                profile_pic: None,
            },
        };
        let view = PostCardView::new(&item, &config, datetime!(2024-06-01 12:00 UTC));
        assert_eq!(view.author_name, "Ada");
        assert_eq!(view.author_pic, None);
        assert_eq!(view.image_url.as_deref(), Some("https://storage.test/posts/1-a.png"));
        assert_eq!(view.posted_ago, "about 2 hours ago");
    }
}
