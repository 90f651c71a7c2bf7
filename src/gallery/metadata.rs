use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, trace};

/// Pull the capture date out of a photo's EXIF data, if any. Used as the
/// effective timestamp when the uploader did not supply one.
pub(crate) fn extract_capture_date(bytes: &[u8]) -> Option<DateTime<Utc>> {
    let exif = match rexif::parse_buffer(bytes) {
        Ok(exif) => exif,
        Err(err) => {
            trace!("no EXIF data in upload: {}", err);
            return None;
        }
    };

    // Try different date fields in order of preference
    let date_fields = [
        rexif::ExifTag::DateTimeOriginal,
        rexif::ExifTag::DateTimeDigitized,
        rexif::ExifTag::DateTime,
    ];

    for field in &date_fields {
        if let Some(entry) = exif.entries.iter().find(|e| e.tag == *field)
            && let Some(date) = parse_exif_datetime(&entry.value_more_readable)
        {
            debug!("found capture date in {:?}: {:?}", field, date);
            return Some(date);
        }
    }

    None
}

fn parse_exif_datetime(datetime_str: &str) -> Option<DateTime<Utc>> {
    // EXIF datetime format: "2005:07:30 07:22:46"
    if let Ok(naive) = NaiveDateTime::parse_from_str(datetime_str, "%Y:%m:%d %H:%M:%S") {
        return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    // Some writers use dashes or omit the time entirely.
    let formats = ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];
    for format in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(datetime_str, format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    let date_formats = ["%Y:%m:%d", "%Y-%m-%d", "%Y/%m/%d"];
    for format in &date_formats {
        let with_time = format!("{} 00:00:00", datetime_str);
        let format_with_time = format!("{} %H:%M:%S", format);
        if let Ok(naive) = NaiveDateTime::parse_from_str(&with_time, &format_with_time) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    None
}
