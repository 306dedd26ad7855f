//! Server-side rendering of the single page and its fragments.
//!
//! Templates are compiled into the binary and registered with one Tera
//! instance at startup. Every render goes through a view model from
//! [`models`], so templates never see raw records.

pub mod humanize;
pub mod models;

use axum::response::Html;
use tera::{Context, Tera};
use time::OffsetDateTime;

use crate::{
    config::AppConfig,
    posts::{form::PostForm, repo_types::PostWithUser},
    users::{form::ProfileForm, repo_types::User},
};
use models::{ComposeView, PostCardView, ProfileCardView, ProfileModalView};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("macros.html", include_str!("../../templates/macros.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("partials/navbar.html", include_str!("../../templates/partials/navbar.html")),
    ("partials/feed.html", include_str!("../../templates/partials/feed.html")),
    ("partials/feed_skeleton.html", include_str!("../../templates/partials/feed_skeleton.html")),
    ("partials/profile_card.html", include_str!("../../templates/partials/profile_card.html")),
    ("partials/profile_skeleton.html", include_str!("../../templates/partials/profile_skeleton.html")),
    ("partials/profile_unavailable.html", include_str!("../../templates/partials/profile_unavailable.html")),
];

pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        tera.autoescape_on(vec![".html"]);
        Ok(Self { tera })
    }

    /// The page shell: navbar, composition form, skeletons for the read side
    /// and, when `modal` is set, the edit-profile dialog.
    pub fn home(
        &self,
        config: &AppConfig,
        compose: &PostForm,
        modal: Option<&ProfileForm>,
    ) -> Result<Html<String>, tera::Error> {
        let mut ctx = Context::new();
        ctx.insert("compose", &ComposeView::from(compose));
        ctx.insert("modal", &modal.map(|form| ProfileModalView::new(form, config)));
        self.tera.render("index.html", &ctx).map(Html)
    }

    pub fn profile(&self, config: &AppConfig, user: Option<&User>) -> Result<Html<String>, tera::Error> {
        match user {
            Some(user) => {
                let mut ctx = Context::new();
                ctx.insert("profile", &ProfileCardView::new(user, config));
                self.tera.render("partials/profile_card.html", &ctx).map(Html)
            }
            None => self
                .tera
                .render("partials/profile_unavailable.html", &Context::new())
                .map(Html),
        }
    }

    pub fn feed(
        &self,
        config: &AppConfig,
        posts: &[PostWithUser],
        now: OffsetDateTime,
    ) -> Result<Html<String>, tera::Error> {
        let cards: Vec<PostCardView> = posts
            .iter()
            .map(|p| PostCardView::new(p, config, now))
            .collect();
        let mut ctx = Context::new();
        ctx.insert("posts", &cards);
        self.tera.render("partials/feed.html", &ctx).map(Html)
    }
}

#[cfg(test)]
mod views_tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::{
        images::{ImageFile, PreviewRegistry},
        posts::repo_types::{Post, PostAuthor},
    };

    fn views() -> Views {
        Views::new().unwrap()
    }

    #[test]
    fn test_home_shell_has_skeletons_and_form() {
        let config = AppConfig::for_tests();
        let form = PostForm::new(PreviewRegistry::new());
        let Html(html) = views().home(&config, &form, None).unwrap();

        assert!(html.contains(r#"action="/posts""#));
        assert!(html.contains(r#"data-fragment="/fragments/profile""#));
        assert!(html.contains(r#"data-fragment="/fragments/feed""#));
        assert!(html.contains("0 / 280"));
        assert!(html.contains(r#"id="modal-root""#));
        assert!(!html.contains("Edit Profile</h2>"));
    }

    #[test]
    fn test_home_escapes_body_and_shows_errors() {
        let config = AppConfig::for_tests();
        let mut form = PostForm::new(PreviewRegistry::new());
        form.set_body("<script>alert(1)</script>").unwrap();
        let _ = form.select_image(ImageFile::new("a.txt", "text/plain", &b"x"[..]));

        let Html(html) = views().home(&config, &form, None).unwrap();

        assert!(html.contains("&lt;script&gt;alert(1)"));
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("Please select a valid image file"));
    }

    #[test]
    fn test_home_with_modal() {
        let config = AppConfig::for_tests();
        let user = User {
            id: Uuid::new_v4(),
            name: Some("Ada".into()),
            birthday: None,
            city: None,
            networks: Some(vec!["first".into(), "second".into()]),
            profile_pic: None,
            created_at: datetime!(2024-01-01 0:00 UTC),
        };
        let modal = ProfileForm::from_user(&user, PreviewRegistry::new());
        let form = PostForm::new(PreviewRegistry::new());

        let Html(html) = views().home(&config, &form, Some(&modal)).unwrap();

        assert!(html.contains("Edit Profile</h2>"));
        assert!(html.contains(r#"value="remove_network:1""#));
        let first = html.find(r#"value="first""#).unwrap();
        let second = html.find(r#"value="second""#).unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_profile_fragments() {
        let config = AppConfig::for_tests();
        let Html(missing) = views().profile(&config, None).unwrap();
        assert!(missing.contains("Could not load user profile."));

        let user = User {
            id: Uuid::new_v4(),
            name: Some("Ada".into()),
            birthday: Some(time::macros::date!(1815 - 12 - 10)),
            city: Some("London".into()),
            networks: Some(vec![]),
            profile_pic: None,
            created_at: datetime!(2024-01-01 0:00 UTC),
        };
        let Html(card) = views().profile(&config, Some(&user)).unwrap();
        assert!(card.contains("Ada"));
        assert!(card.contains("December 10, 1815"));
        assert!(card.contains("London"));
        assert!(!card.contains("Networks:"));
        assert!(card.contains(r#"href="/profile/edit""#));
    }

    #[test]
    fn test_feed_fragment() {
        let config = AppConfig::for_tests();
        let now = datetime!(2024-06-01 12:00 UTC);

        let Html(empty) = views().feed(&config, &[], now).unwrap();
        assert!(empty.contains("No posts yet. Be the first to share something!"));

        let posts = vec![PostWithUser {
            post: Post {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                body: "line one\nline two".into(),
                image_url: None,
                created_at: datetime!(2024-06-01 11:55 UTC),
            },
            user: PostAuthor {
                name: None,
                profile_pic: None,
            },
        }];
        let Html(html) = views().feed(&config, &posts, now).unwrap();
        assert!(html.contains("Anonymous"));
        assert!(html.contains("5 minutes ago"));
        assert!(html.contains("line one\nline two"));
        assert!(!html.contains("No posts yet"));
    }
}
