use tracing::{error, warn};

use super::{repo_types::Post, services};
use crate::{
    images::{
        services::{discard_image, upload_image, ImageFolder},
        ImageError, ImageFile, ImageUpload, PreviewRegistry, PreviewToken,
    },
    state::AppState,
};

pub const MAX_BODY_CHARS: usize = 280;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("Post exceeds character limit")]
    TooLong,
    #[error("Please enter some text or add an image")]
    Empty,
    #[error("Image upload failed. Please try again.")]
    UploadFailed,
    #[error("Failed to create post. Please try again.")]
    CreateFailed,
}

impl ComposeError {
    /// Rejected locally, before any backend call.
    pub fn is_validation(&self) -> bool {
        matches!(self, ComposeError::TooLong | ComposeError::Empty)
    }
}

/// The composition form: body text, the selected image and submission state.
pub struct PostForm {
    body: String,
    image: Option<ImageFile>,
    upload: ImageUpload,
    submitting: bool,
    error: Option<String>,
}

impl PostForm {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            body: String::new(),
            image: None,
            upload: ImageUpload::new(previews),
            submitting: false,
            error: None,
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn char_count(&self) -> usize {
        self.body.chars().count()
    }

    pub fn image(&self) -> Option<&ImageFile> {
        self.image.as_ref()
    }

    pub fn upload(&self) -> &ImageUpload {
        &self.upload
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && self.check().is_ok()
    }

    /// Edits beyond the cap are refused; the previous body stays.
    pub fn set_body(&mut self, text: impl Into<String>) -> Result<(), ComposeError> {
        let text = text.into();
        if text.chars().count() > MAX_BODY_CHARS {
            self.error = Some(ComposeError::TooLong.to_string());
            return Err(ComposeError::TooLong);
        }
        self.body = text;
        self.error = None;
        Ok(())
    }

    pub fn select_image(&mut self, file: ImageFile) -> Result<(), ImageError> {
        let image = &mut self.image;
        self.upload.select(file, |f| *image = f)
    }

    pub fn restore_image(&mut self, token: PreviewToken) {
        let image = &mut self.image;
        self.upload.restore(token, |f| *image = f);
    }

    pub fn remove_image(&mut self) {
        let image = &mut self.image;
        self.upload.remove(|f| *image = f);
    }

    /// Drops the current image and asks the page to open the file picker.
    pub fn replace_image(&mut self) {
        self.remove_image();
        self.upload.open_file_picker();
    }

    /// Uploads the image (if any), then inserts the post. On success the form
    /// is cleared; on failure it is left as it was, apart from the error.
    pub async fn submit(&mut self, st: &AppState) -> Result<Post, ComposeError> {
        self.error = None;
        if let Err(e) = self.check() {
            warn!(error = %e, chars = self.char_count(), "post rejected");
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.submitting = true;
        let result = self.publish(st).await;
        self.submitting = false;

        match result {
            Ok(post) => {
                self.body.clear();
                let image = &mut self.image;
                self.upload.reset(|f| *image = f);
                Ok(post)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn check(&self) -> Result<(), ComposeError> {
        if self.char_count() > MAX_BODY_CHARS {
            return Err(ComposeError::TooLong);
        }
        if self.body.trim().is_empty() && self.image.is_none() {
            return Err(ComposeError::Empty);
        }
        Ok(())
    }

    async fn publish(&self, st: &AppState) -> Result<Post, ComposeError> {
        let stored = match &self.image {
            Some(file) => Some(
                upload_image(st.storage.as_ref(), ImageFolder::Posts, file)
                    .await
                    .map_err(|e| {
                        error!(error = ?e, "post image upload failed");
                        ComposeError::UploadFailed
                    })?,
            ),
            None => None,
        };

        let image_url = stored.as_ref().map(|s| s.public_url.clone());
        match services::create_post(st, &self.body, image_url).await {
            Ok(post) => Ok(post),
            Err(e) => {
                error!(error = ?e, "post creation failed");
                if let Some(stored) = &stored {
                    discard_image(st.storage.as_ref(), stored).await;
                }
                Err(ComposeError::CreateFailed)
            }
        }
    }
}
