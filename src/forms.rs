//! Multipart form plumbing shared by the composition and profile forms.

use axum::{
    extract::multipart::{Field, Multipart, MultipartError},
    http::StatusCode,
};
use bytes::BytesMut;
use tracing::{debug, warn};

use crate::{
    error::AppError,
    images::{validation::MAX_IMAGE_BYTES, ImageFile},
};

/// Which submit button posted the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Re-render with the newly selected file previewed.
    Preview,
    RemoveImage,
    ReplaceImage,
    AddNetwork,
    RemoveNetwork(usize),
    /// The primary action: share a post or save the profile. Also used when
    /// no intent was posted (Enter in a text field, scripted submits).
    Submit,
    /// A value no button carries; never acted upon.
    Unknown,
}

impl Intent {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("share") | Some("save") => Intent::Submit,
            Some("preview") => Intent::Preview,
            Some("remove_image") => Intent::RemoveImage,
            Some("replace_image") => Intent::ReplaceImage,
            Some("add_network") => Intent::AddNetwork,
            Some(other) => match other
                .strip_prefix("remove_network:")
                .and_then(|i| i.parse::<usize>().ok())
            {
                Some(index) => Intent::RemoveNetwork(index),
                None => {
                    warn!(intent = %other, "unknown form intent");
                    Intent::Unknown
                }
            },
        }
    }
}

/// Text fields in submission order plus any attached files.
#[derive(Debug, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<(String, ImageFile)>,
}

impl FormData {
    /// Reads the whole form. File parts are buffered up to
    /// [`MAX_IMAGE_BYTES`]; past that only their size is kept, so validation
    /// can still report them. When the request outgrows the body limit the
    /// parts read so far are returned and the rest is dropped.
    pub async fn from_multipart(mut mp: Multipart) -> Result<Self, AppError> {
        let mut data = FormData::default();
        loop {
            let field = match mp.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) if over_limit(&e) => {
                    warn!("form exceeded the body limit; remaining parts dropped");
                    break;
                }
                Err(e) => return Err(AppError::BadRequest(e.body_text())),
            };
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .map(str::to_string)
                        .unwrap_or_else(|| "application/octet-stream".into());
                    let (file, complete) = read_file(field, file_name, content_type).await?;
                    // Browsers send an empty part when no file was chosen.
                    if !(file.file_name.is_empty() && file.size() == 0) {
                        debug!(field = %name, file_name = %file.file_name, content_type = %file.content_type, size = file.size(), "file field received");
                        data.files.push((name, file));
                    }
                    if !complete {
                        warn!("form exceeded the body limit inside a file; remaining parts dropped");
                        break;
                    }
                }
                None => match field.text().await {
                    Ok(value) => data.fields.push((name, value)),
                    Err(e) if over_limit(&e) => {
                        warn!(field = %name, "form exceeded the body limit; remaining parts dropped");
                        break;
                    }
                    Err(e) => return Err(AppError::BadRequest(e.body_text())),
                },
            }
        }
        Ok(data)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value posted under `name`, in order.
    pub fn texts(&self, name: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn take_file(&mut self, name: &str) -> Option<ImageFile> {
        let idx = self.files.iter().position(|(n, _)| n == name)?;
        Some(self.files.remove(idx).1)
    }

    pub fn intent(&self) -> Intent {
        Intent::parse(self.text("intent"))
    }
}

/// Buffers one file part. Returns `false` alongside the file when the body
/// limit cut the part short.
async fn read_file(
    mut field: Field<'_>,
    file_name: String,
    content_type: String,
) -> Result<(ImageFile, bool), AppError> {
    let mut buf = BytesMut::new();
    let mut seen = 0usize;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                seen += chunk.len();
                if seen <= MAX_IMAGE_BYTES {
                    buf.extend_from_slice(&chunk);
                } else if !buf.is_empty() {
                    buf = BytesMut::new();
                }
            }
            Ok(None) => break,
            Err(e) if over_limit(&e) || seen > MAX_IMAGE_BYTES => {
                debug!(%file_name, seen, error = %e, "file part cut short");
                return Ok((ImageFile::oversized(file_name, content_type, seen), false));
            }
            Err(e) => return Err(AppError::BadRequest(e.body_text())),
        }
    }

    let file = if seen > MAX_IMAGE_BYTES {
        ImageFile::oversized(file_name, content_type, seen)
    } else {
        ImageFile::new(file_name, content_type, buf.freeze())
    };
    Ok((file, true))
}

fn over_limit(e: &MultipartError) -> bool {
    e.status() == StatusCode::PAYLOAD_TOO_LARGE
}

#[cfg(test)]
mod forms_tests {
    use super::*;

    #[test]
    fn test_intent_parsing() {
        assert_eq!(Intent::parse(None), Intent::Submit);
        assert_eq!(Intent::parse(Some("share")), Intent::Submit);
        assert_eq!(Intent::parse(Some("save")), Intent::Submit);
        assert_eq!(Intent::parse(Some("preview")), Intent::Preview);
        assert_eq!(Intent::parse(Some("remove_image")), Intent::RemoveImage);
        assert_eq!(Intent::parse(Some("replace_image")), Intent::ReplaceImage);
        assert_eq!(Intent::parse(Some("add_network")), Intent::AddNetwork);
        assert_eq!(Intent::parse(Some("remove_network:3")), Intent::RemoveNetwork(3));
        assert_eq!(Intent::parse(Some("remove_network:x")), Intent::Unknown);
        assert_eq!(Intent::parse(Some("publish")), Intent::Unknown);
        assert_eq!(Intent::parse(Some("")), Intent::Unknown);
    }
}
