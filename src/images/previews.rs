//! Staged images backing the local preview shown before a form is submitted.
//!
//! A preview is acquired when a valid file is selected and released when it
//! is replaced, removed, consumed by a successful submission, or left alone
//! for longer than the configured TTL. The oldest previews are evicted
//! early when the registry's byte budget would be exceeded.

use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::validation::ImageFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewToken(Uuid);

impl PreviewToken {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn url(&self) -> String {
        format!("/previews/{}", self.0)
    }
}

impl fmt::Display for PreviewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PreviewToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Default ceiling on the bytes held by staged previews.
pub const DEFAULT_MAX_PREVIEW_BYTES: usize = 64 * 1024 * 1024;

struct Staged {
    file: ImageFile,
    created: Instant,
}

#[derive(Default)]
struct Staging {
    entries: HashMap<PreviewToken, Staged>,
    bytes: usize,
}

impl Staging {
    fn remove(&mut self, token: &PreviewToken) -> bool {
        match self.entries.remove(token) {
            Some(staged) => {
                self.bytes -= staged.file.bytes.len();
                true
            }
            None => false,
        }
    }

    fn oldest(&self) -> Option<PreviewToken> {
        self.entries
            .iter()
            .min_by_key(|(_, staged)| staged.created)
            .map(|(token, _)| *token)
    }
}

/// Previews held in memory, bounded by `max_bytes`. Creating a preview that
/// would pass the bound evicts the oldest ones first; a single file larger
/// than the bound is still kept, alone.
#[derive(Clone)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<Staging>>,
    max_bytes: usize,
}

impl Default for PreviewRegistry {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_PREVIEW_BYTES)
    }
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_bytes: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Staging::default())),
            max_bytes,
        }
    }

    pub fn create(&self, file: ImageFile) -> PreviewToken {
        let token = PreviewToken::generate();
        let size = file.bytes.len();
        let mut staging = self.lock();
        while staging.bytes + size > self.max_bytes {
            let Some(oldest) = staging.oldest() else {
                break;
            };
            staging.remove(&oldest);
            info!(token = %oldest, "preview evicted to stay under the memory limit");
        }
        staging.entries.insert(
            token,
            Staged {
                file,
                created: Instant::now(),
            },
        );
        staging.bytes += size;
        debug!(%token, size, staged_bytes = staging.bytes, "preview created");
        token
    }

    pub fn get(&self, token: &PreviewToken) -> Option<ImageFile> {
        self.lock().entries.get(token).map(|s| s.file.clone())
    }

    /// Returns whether the token was still live.
    pub fn revoke(&self, token: &PreviewToken) -> bool {
        let removed = self.lock().remove(token);
        if removed {
            debug!(%token, "preview revoked");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn staged_bytes(&self) -> usize {
        self.lock().bytes
    }

    /// Drops every preview older than `ttl`; returns how many were dropped.
    pub fn sweep(&self, ttl: Duration) -> usize {
        let mut staging = self.lock();
        let expired: Vec<PreviewToken> = staging
            .entries
            .iter()
            .filter(|(_, staged)| staged.created.elapsed() >= ttl)
            .map(|(token, _)| *token)
            .collect();
        for token in &expired {
            staging.remove(token);
        }
        expired.len()
    }

    pub fn spawn_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        let period = (ttl / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tick.tick().await;
                let dropped = registry.sweep(ttl);
                if dropped > 0 {
                    debug!(dropped, "expired previews swept");
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Staging> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("preview registry lock was poisoned");
            poisoned.into_inner()
        })
    }
}
