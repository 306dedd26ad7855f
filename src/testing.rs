//! In-memory backends and request helpers for unit and router tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use axum::{
    async_trait,
    body::Body,
    http::{header, Request},
};
use bytes::Bytes;
use time::{macros::date, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    db::Database,
    images::PreviewRegistry,
    posts::repo_types::{NewPost, Post, PostAuthor, PostWithUser},
    state::AppState,
    storage::StorageClient,
    users::repo_types::{ProfileChanges, User, UserSelector},
    views::Views,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    clock: Option<OffsetDateTime>,
}

impl Tables {
    /// Strictly increasing timestamps, like a `now()` default under load.
    fn tick(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let next = match self.clock {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }

    fn insert_post(&mut self, new: &NewPost) -> Post {
        let post = Post {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            body: new.body.clone(),
            image_url: new.image_url.clone(),
            created_at: self.tick(),
        };
        self.posts.push(post.clone());
        post
    }
}

#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryDatabase {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn post_count(&self) -> usize {
        self.tables.lock().unwrap().posts.len()
    }

    /// The earliest-created user, read without counting as a call.
    pub fn user(&self) -> Option<User> {
        self.tables.lock().unwrap().users.first().cloned()
    }

    fn seed_user(&self, user: User) {
        self.tables.lock().unwrap().users.push(user);
    }

    fn seed_post(&self, body: &str) -> Post {
        let mut tables = self.tables.lock().unwrap();
        let user_id = tables.users.first().map(|u| u.id).expect("seed a user first");
        tables.insert_post(&NewPost {
            user_id,
            body: body.to_string(),
            image_url: None,
        })
    }

    fn read(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(!self.fail_reads.load(Ordering::SeqCst), "read failed");
        Ok(())
    }

    fn write(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(!self.fail_writes.load(Ordering::SeqCst), "write failed");
        Ok(())
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn find_user(&self, selector: UserSelector) -> anyhow::Result<Option<User>> {
        self.read()?;
        let tables = self.tables.lock().unwrap();
        let found = match selector {
            UserSelector::ById(id) => tables.users.iter().find(|u| u.id == id),
            UserSelector::FirstCreated => tables.users.iter().min_by_key(|u| (u.created_at, u.id)),
        };
        Ok(found.cloned())
    }

    async fn update_user(&self, user_id: Uuid, changes: &ProfileChanges) -> anyhow::Result<Option<User>> {
        self.write()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        user.name = changes.name.clone();
        user.birthday = changes.birthday;
        user.city = changes.city.clone();
        user.networks = Some(changes.networks.clone());
        user.profile_pic = changes.profile_pic.clone();
        Ok(Some(user.clone()))
    }

    async fn insert_post(&self, new: &NewPost) -> anyhow::Result<Post> {
        self.write()?;
        let mut tables = self.tables.lock().unwrap();
        anyhow::ensure!(
            tables.users.iter().any(|u| u.id == new.user_id),
            "posts.user_id violates foreign key"
        );
        Ok(tables.insert_post(new))
    }

    async fn list_posts_with_user(&self) -> anyhow::Result<Vec<PostWithUser>> {
        self.read()?;
        let tables = self.tables.lock().unwrap();
        let mut posts: Vec<PostWithUser> = tables
            .posts
            .iter()
            .map(|post| {
                let author = tables.users.iter().find(|u| u.id == post.user_id);
                PostWithUser {
                    post: post.clone(),
                    user: PostAuthor {
                        name: author.and_then(|u| u.name.clone()),
                        profile_pic: author.and_then(|u| u.profile_pic.clone()),
                    },
                }
            })
            .collect();
        posts.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
        Ok(posts)
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
    puts: AtomicUsize,
    fail_puts: AtomicBool,
}

impl MemoryStorage {
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Every put attempt, failed ones included.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn object(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(!self.fail_puts.load(Ordering::SeqCst), "put failed");
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://storage.test/{key}")
    }
}

/// An [`AppState`] wired to in-memory backends, with handles on both.
pub struct Harness {
    pub state: AppState,
    pub db: Arc<MemoryDatabase>,
    pub storage: Arc<MemoryStorage>,
}

impl Harness {
    pub fn empty() -> Self {
        let db = Arc::new(MemoryDatabase::default());
        let storage = Arc::new(MemoryStorage::default());
        let state = AppState::from_parts(
            db.clone(),
            storage.clone(),
            Arc::new(AppConfig::for_tests()),
            PreviewRegistry::new(),
            Arc::new(Views::new().unwrap()),
        );
        Self { state, db, storage }
    }

    pub fn with_user() -> Self {
        let h = Self::empty();
        h.db.seed_user(User {
            id: Uuid::new_v4(),
            name: Some("Ada".into()),
            birthday: Some(date!(1815 - 12 - 10)),
            city: Some("London".into()),
            networks: Some(vec!["Analytical Engine Society".into()]),
            profile_pic: None,
            created_at: OffsetDateTime::now_utc() - Duration::days(1),
        });
        h
    }

    pub fn seed_post(&self, body: &str) -> Post {
        self.db.seed_post(body)
    }
}

const BOUNDARY: &str = "timeline-test-boundary";

/// Builds `multipart/form-data` request bodies.
#[derive(Default)]
pub struct MultipartBody {
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.buf
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        // Sent in 64 KiB frames, like a client upload.
        let chunks: Vec<Result<Bytes, std::io::Error>> = self
            .buf
            .chunks(64 * 1024)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from_stream(futures::stream::iter(chunks)))
            .unwrap()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_text(res: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
