use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Extensions accepted as photos. Anything else is rejected at upload time.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Extensions accepted as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Map a filename to its media kind via the extension allow-list.
    pub fn from_filename(filename: &str) -> Option<MediaKind> {
        let (_, extension) = filename.rsplit_once('.')?;
        let extension = extension.to_ascii_lowercase();

        if PHOTO_EXTENSIONS.contains(&extension.as_str()) {
            Some(MediaKind::Photo)
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }
}

/// One stored asset as seen by a listing request. Constructed transiently
/// from store metadata, never persisted itself.
///
/// Field order drives the derived ordering: primarily the effective
/// last-modified instant, filename as the deterministic secondary key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MediaRecord {
    pub last_modified: DateTime<Utc>,
    pub filename: String,
    pub kind: MediaKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(MediaKind::from_filename("a.jpg"), Some(MediaKind::Photo));
        assert_eq!(MediaKind::from_filename("a.jpeg"), Some(MediaKind::Photo));
        assert_eq!(MediaKind::from_filename("a.webp"), Some(MediaKind::Photo));
        assert_eq!(MediaKind::from_filename("b.mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_filename("b.mov"), Some(MediaKind::Video));
    }

    #[test]
    fn extension_mapping_is_case_insensitive() {
        assert_eq!(MediaKind::from_filename("A.JPG"), Some(MediaKind::Photo));
        assert_eq!(MediaKind::from_filename("B.Mp4"), Some(MediaKind::Video));
    }

    #[test]
    fn unknown_or_missing_extensions_are_rejected() {
        assert_eq!(MediaKind::from_filename("notes.txt"), None);
        assert_eq!(MediaKind::from_filename("archive.tar.gz"), None);
        assert_eq!(MediaKind::from_filename("no_extension"), None);
    }

    #[test]
    fn records_order_by_instant_then_filename() {
        let earlier = MediaRecord {
            last_modified: at(0),
            filename: "z.jpg".to_string(),
            kind: MediaKind::Photo,
        };
        let later = MediaRecord {
            last_modified: at(10),
            filename: "a.jpg".to_string(),
            kind: MediaKind::Photo,
        };
        let tied = MediaRecord {
            last_modified: at(0),
            filename: "a.mp4".to_string(),
            kind: MediaKind::Video,
        };

        assert!(earlier < later);
        assert!(tied < earlier, "ties break on filename");
    }
}
