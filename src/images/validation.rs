use bytes::Bytes;

/// Upper bound for a single image, inclusive.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// A file picked or dropped by the user, fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
    size: usize,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size: bytes.len(),
            bytes,
        }
    }

    /// A file whose contents were not kept because it was already too big.
    /// `size` is the number of bytes seen before reading stopped.
    pub fn oversized(file_name: impl Into<String>, content_type: impl Into<String>, size: usize) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: Bytes::new(),
            size: size.max(MAX_IMAGE_BYTES + 1),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("Please select a valid image file")]
    InvalidType,
    #[error("File size must be less than 5MB")]
    TooLarge,
}

/// Type is checked before size.
pub fn validate(file: &ImageFile) -> Result<(), ImageError> {
    if !file.content_type.starts_with("image/") {
        return Err(ImageError::InvalidType);
    }
    if file.size() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge);
    }
    Ok(())
}
