// Media module - record model and chronological ordering
mod sorting;
mod types;

pub use sorting::merge;
pub use types::{MediaKind, MediaRecord, PHOTO_EXTENSIONS, VIDEO_EXTENSIONS};
