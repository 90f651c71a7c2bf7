use super::thumbnail::ThumbnailError;
use super::{Gallery, GalleryError};
use crate::AppState;
use crate::media::{MediaKind, MediaRecord};
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};

/// One listed asset as the API presents it: the record plus signed URLs for
/// the thumbnail and the original.
#[derive(Serialize)]
pub struct MediaView {
    pub filename: String,
    pub kind: MediaKind,
    pub last_modified: DateTime<Utc>,
    pub thumbnail_url: String,
    pub media_url: String,
}

fn media_views(
    gallery: &Gallery,
    records: Vec<MediaRecord>,
) -> Result<Vec<MediaView>, GalleryError> {
    records
        .into_iter()
        .map(|record| {
            let thumbnail_url = gallery.thumbnail_url(&record.filename)?;
            let media_url = gallery.media_url(&record.filename, record.kind)?;
            Ok(MediaView {
                filename: record.filename,
                kind: record.kind,
                last_modified: record.last_modified,
                thumbnail_url,
                media_url,
            })
        })
        .collect()
}

fn error_response(context: &str, err: GalleryError) -> Response {
    let status = match &err {
        GalleryError::NotFound(_) => StatusCode::NOT_FOUND,
        GalleryError::AlreadyExists(_) => StatusCode::CONFLICT,
        GalleryError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        GalleryError::Thumbnail(thumb) if thumb.is_unreadable_input() => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        GalleryError::Thumbnail(ThumbnailError::ToolUnavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("{}: {}", context, err);
    } else {
        warn!("{}: {}", context, err);
    }
    (status, err.to_string()).into_response()
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn list_media_handler(State(state): State<AppState>) -> Response {
    let records = match state.gallery.recent_media().await {
        Ok(records) => records,
        Err(err) => return error_response("media listing failed", err),
    };
    match media_views(&state.gallery, records) {
        Ok(views) => Json(views).into_response(),
        Err(err) => error_response("media listing failed", err),
    }
}

// Album handlers

pub async fn list_albums_handler(State(state): State<AppState>) -> Response {
    match state.gallery.albums().list().await {
        Ok(mut names) => {
            names.sort();
            Json(names).into_response()
        }
        Err(err) => error_response("album listing failed", err),
    }
}

pub async fn create_album_handler(
    State(state): State<AppState>,
    Path(album): Path<String>,
) -> Response {
    match state.gallery.albums().create(&album).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => error_response("album creation failed", err),
    }
}

pub async fn delete_album_handler(
    State(state): State<AppState>,
    Path(album): Path<String>,
) -> Response {
    match state.gallery.albums().delete(&album).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response("album deletion failed", err),
    }
}

pub async fn rename_album_handler(
    State(state): State<AppState>,
    Path((album, new_name)): Path<(String, String)>,
) -> Response {
    match state.gallery.albums().rename(&album, &new_name).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response("album rename failed", err),
    }
}

pub async fn album_media_handler(
    State(state): State<AppState>,
    Path(album): Path<String>,
) -> Response {
    let records = match state.gallery.album_media(&album).await {
        Ok(records) => records,
        Err(err) => return error_response("album media listing failed", err),
    };
    match media_views(&state.gallery, records) {
        Ok(views) => Json(views).into_response(),
        Err(err) => error_response("album media listing failed", err),
    }
}

pub async fn add_to_album_handler(
    State(state): State<AppState>,
    Path((album, filename)): Path<(String, String)>,
) -> Response {
    match state.gallery.albums().add(&album, &filename).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => error_response("album membership add failed", err),
    }
}

pub async fn remove_from_album_handler(
    State(state): State<AppState>,
    Path((album, filename)): Path<(String, String)>,
) -> Response {
    match state.gallery.albums().remove(&album, &filename).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response("album membership removal failed", err),
    }
}

/// Redirect to the thumbnail of the album's most recent asset.
pub async fn album_thumbnail_handler(
    State(state): State<AppState>,
    Path(album): Path<String>,
) -> Response {
    let media = match state.gallery.album_media(&album).await {
        Ok(media) => media,
        Err(err) => return error_response("album thumbnail failed", err),
    };

    let Some(first) = media.first() else {
        return (StatusCode::NOT_FOUND, "album has no media").into_response();
    };
    match state.gallery.thumbnail_url(&first.filename) {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(err) => error_response("album thumbnail failed", err),
    }
}

// Media handlers

pub async fn upload_media_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    upload_into(state, None, multipart).await
}

pub async fn upload_to_album_handler(
    State(state): State<AppState>,
    Path(album): Path<String>,
    multipart: Multipart,
) -> Response {
    upload_into(state, Some(album), multipart).await
}

/// Response body for an upload batch: what landed and what was skipped as
/// unreadable.
#[derive(Serialize)]
pub struct UploadOutcome {
    pub stored: Vec<MediaView>,
    pub skipped: Vec<String>,
}

async fn upload_into(state: AppState, album: Option<String>, multipart: Multipart) -> Response {
    let uploads = match collect_upload(multipart).await {
        Ok(uploads) => uploads,
        Err(response) => return response,
    };

    // Unreadable files are skipped rather than failing the whole batch;
    // anything else aborts.
    let mut stored = Vec::new();
    let mut skipped = Vec::new();
    for (filename, bytes, taken_at) in uploads {
        match state
            .gallery
            .upload_media(&filename, bytes, taken_at, album.as_deref())
            .await
        {
            Ok(record) => stored.push(record),
            Err(GalleryError::UnsupportedMedia(_)) => {
                warn!("skipping upload {}: unsupported media type", filename);
                skipped.push(filename);
            }
            Err(GalleryError::Thumbnail(thumb)) if thumb.is_unreadable_input() => {
                warn!("skipping upload {}: {}", filename, thumb);
                skipped.push(filename);
            }
            Err(err) => return error_response("upload failed", err),
        }
    }

    if stored.is_empty() && !skipped.is_empty() {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "no readable media in upload",
        )
            .into_response();
    }

    match media_views(&state.gallery, stored) {
        Ok(views) => (StatusCode::CREATED, Json(UploadOutcome { stored: views, skipped }))
            .into_response(),
        Err(err) => error_response("upload failed", err),
    }
}

pub async fn delete_media_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    match state.gallery.delete_media(&filename).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response("media deletion failed", err),
    }
}

/// Redirect to the signed blob URL of an asset's thumbnail.
pub async fn media_thumbnail_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    match state.gallery.thumbnail_url(&filename) {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(err) => error_response("thumbnail redirect failed", err),
    }
}

/// Redirect to the signed blob URL of an original asset.
pub async fn media_original_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    let Some(kind) = MediaKind::from_filename(&filename) else {
        return error_response(
            "original redirect failed",
            GalleryError::UnsupportedMedia(filename),
        );
    };
    match state.gallery.media_url(&filename, kind) {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(err) => error_response("original redirect failed", err),
    }
}

/// Serve the original bytes straight from the store.
pub async fn media_content_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    match state.gallery.download_media(&filename).await {
        Ok((_, bytes)) => {
            let mime_type = mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .to_string();
            serve_bytes(bytes, &mime_type)
        }
        Err(err) => error_response("media download failed", err),
    }
}

/// Serve thumbnail bytes straight from the store.
pub async fn thumbnail_content_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    match state.gallery.download_thumbnail(&filename).await {
        Ok(bytes) => serve_bytes(bytes, "image/jpeg"),
        Err(err) => error_response("thumbnail download failed", err),
    }
}

fn serve_bytes(bytes: Vec<u8>, content_type: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type.parse().unwrap());
    headers.insert(
        header::CONTENT_LENGTH,
        bytes.len().to_string().parse().unwrap(),
    );
    headers.insert(
        header::CACHE_CONTROL,
        "public, max-age=86400".parse().unwrap(),
    );
    (StatusCode::OK, headers, bytes).into_response()
}

type Upload = (String, Vec<u8>, Option<DateTime<Utc>>);

/// Pull files and their optional taken-at timestamps out of a multipart
/// body. Files arrive in `upload` fields, timestamps in parallel
/// `dateTaken` fields as ISO-8601 strings.
async fn collect_upload(mut multipart: Multipart) -> Result<Vec<Upload>, Response> {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    let mut dates: Vec<Option<DateTime<Utc>>> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err(
                    (StatusCode::BAD_REQUEST, format!("malformed upload: {}", err)).into_response(),
                );
            }
        };

        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("upload") => {
                let Some(filename) = field.file_name().and_then(sanitize_filename) else {
                    return Err(
                        (StatusCode::BAD_REQUEST, "upload is missing a usable filename")
                            .into_response(),
                    );
                };
                match field.bytes().await {
                    Ok(bytes) => files.push((filename, bytes.to_vec())),
                    Err(err) => {
                        return Err((
                            StatusCode::BAD_REQUEST,
                            format!("failed to read upload: {}", err),
                        )
                            .into_response());
                    }
                }
            }
            Some("dateTaken") => match field.text().await {
                Ok(text) => dates.push(
                    DateTime::parse_from_rfc3339(text.trim())
                        .ok()
                        .map(|instant| instant.with_timezone(&Utc)),
                ),
                Err(err) => {
                    return Err((
                        StatusCode::BAD_REQUEST,
                        format!("failed to read dateTaken: {}", err),
                    )
                        .into_response());
                }
            },
            _ => {}
        }
    }

    if files.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "no files in upload").into_response());
    }

    Ok(files
        .into_iter()
        .enumerate()
        .map(|(index, (filename, bytes))| {
            let taken_at = dates.get(index).copied().flatten();
            (filename, bytes, taken_at)
        })
        .collect())
}

/// Reduce a client-supplied filename to its final path component and refuse
/// anything that could escape the container namespace.
fn sanitize_filename(raw: &str) -> Option<String> {
    let name = std::path::Path::new(raw)
        .file_name()?
        .to_string_lossy()
        .to_string();
    if name.is_empty() || name.starts_with('.') {
        return None;
    }
    Some(name)
}
