pub mod media;
pub mod program;

pub use media::{FileUpload, MediaKind};
pub use program::{Program, PublishStatus};
