use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::validation::ImageFile;
use crate::storage::StorageClient;

/// Folder inside the bucket an upload lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    Posts,
    Profiles,
}

impl ImageFolder {
    fn as_str(self) -> &'static str {
        match self {
            ImageFolder::Posts => "posts",
            ImageFolder::Profiles => "profiles",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
    pub public_url: String,
}

/// Uploads `file` under a fresh, timestamp-prefixed key and resolves its public URL.
#[instrument(skip(storage, file), fields(file_name = %file.file_name, size = file.size()))]
pub async fn upload_image(
    storage: &dyn StorageClient,
    folder: ImageFolder,
    file: &ImageFile,
) -> anyhow::Result<StoredImage> {
    let key = object_key(folder, file, OffsetDateTime::now_utc());
    storage
        .put_object(&key, file.bytes.clone(), &file.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    let public_url = storage.public_url(&key);
    info!(%key, "image uploaded");
    Ok(StoredImage { key, public_url })
}

/// Best-effort removal of an upload nothing refers to.
pub async fn discard_image(storage: &dyn StorageClient, image: &StoredImage) {
    if let Err(e) = storage.delete_object(&image.key).await {
        warn!(error = %e, key = %image.key, "failed to delete orphaned image");
    }
}

fn object_key(folder: ImageFolder, file: &ImageFile, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let short_id = Uuid::new_v4().simple().to_string();
    let ext = ext_from_mime(&file.content_type)
        .map(str::to_string)
        .or_else(|| ext_from_name(&file.file_name))
        .unwrap_or_else(|| "bin".into());
    format!(
        "{}/{}-{}-{}.{}",
        folder.as_str(),
        millis,
        &short_id[..8],
        file_stem(&file.file_name),
        ext
    )
}

fn file_stem(name: &str) -> String {
    lazy_static! {
        static ref UNSAFE_RE: Regex = Regex::new(r"[^A-Za-z0-9_-]+").unwrap();
    }
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = base.rsplit_once('.').map(|(s, _)| s).unwrap_or(base);
    let cleaned = UNSAFE_RE.replace_all(stem, "-");
    let cleaned: String = cleaned.trim_matches('-').chars().take(48).collect();
    if cleaned.is_empty() {
        "image".into()
    } else {
        cleaned.to_lowercase()
    }
}

fn ext_from_name(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}
