use tracing::warn;

use super::previews::{PreviewRegistry, PreviewToken};
use super::validation::{validate, ImageError, ImageFile};

/// State of an image picker: the live preview, the last validation error and
/// whether the page should open the file dialog on render.
///
/// The widget never talks to the backend. It reports the selected file to its
/// owner through the `on_change` callbacks and leaves the upload to it.
pub struct ImageUpload {
    previews: PreviewRegistry,
    preview: Option<PreviewToken>,
    error: Option<String>,
    picker_requested: bool,
}

impl ImageUpload {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            previews,
            preview: None,
            error: None,
            picker_requested: false,
        }
    }

    /// Picks up a preview staged by an earlier request. Unknown or expired
    /// tokens are ignored.
    pub fn restore(&mut self, token: PreviewToken, on_change: impl FnOnce(Option<ImageFile>)) {
        match self.previews.get(&token) {
            Some(file) => {
                self.preview = Some(token);
                on_change(Some(file));
            }
            None => warn!(%token, "preview expired or unknown; ignoring"),
        }
    }

    pub fn select(
        &mut self,
        file: ImageFile,
        on_change: impl FnOnce(Option<ImageFile>),
    ) -> Result<(), ImageError> {
        if let Err(e) = validate(&file) {
            warn!(file_name = %file.file_name, content_type = %file.content_type, size = file.size(), error = %e, "image rejected");
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.release();
        self.preview = Some(self.previews.create(file.clone()));
        self.error = None;
        on_change(Some(file));
        Ok(())
    }

    pub fn remove(&mut self, on_change: impl FnOnce(Option<ImageFile>)) {
        self.release();
        self.error = None;
        on_change(None);
    }

    /// Clears preview, error and selection; used after a successful submission.
    pub fn reset(&mut self, on_change: impl FnOnce(Option<ImageFile>)) {
        self.remove(on_change);
        self.picker_requested = false;
    }

    pub fn open_file_picker(&mut self) {
        self.picker_requested = true;
    }

    pub fn preview_token(&self) -> Option<PreviewToken> {
        self.preview
    }

    pub fn preview_url(&self) -> Option<String> {
        self.preview.map(|t| t.url())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn picker_requested(&self) -> bool {
        self.picker_requested
    }

    fn release(&mut self) {
        if let Some(token) = self.preview.take() {
            self.previews.revoke(&token);
        }
    }
}
