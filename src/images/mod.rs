pub mod handlers;
pub mod previews;
pub mod services;
pub mod validation;
pub mod widget;

pub use previews::{PreviewRegistry, PreviewToken};
pub use validation::{ImageError, ImageFile};
pub use widget::ImageUpload;
