use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod gallery;
pub mod media;
pub mod startup_checks;
pub mod storage;
pub mod token_cache;
pub mod tokens;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub tokens: TokenConfig,
    pub thumbnail: ThumbnailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    /// Public base URL of the blob store, used to build signed media URLs.
    pub blob_base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend.
    pub root: PathBuf,
    pub photos_container: String,
    pub videos_container: String,
    pub thumbnails_container: String,
    /// Filename (under `root`) of the persisted album table.
    pub albums_table: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    pub secret: String,
    /// How long a cached container token is served before re-issuance.
    pub refresh_interval_minutes: u64,
    /// Validity window stamped into issued tokens.
    pub validity_minutes: u64,
    /// Backdating applied to the token start instant.
    pub clock_skew_minutes: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub height: u32,
    pub jpeg_quality: u8,
    /// External frame-extraction tool for video previews.
    pub video_tool: String,
    /// Seek offset into the video, skipping likely-black leading frames.
    pub video_seek_seconds: f32,
}

pub const DEFAULT_TOKEN_SECRET: &str = "change-me-in-production";

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            app: AppConfig {
                name: "Shashinkan".to_string(),
                log_level: "info".to_string(),
                blob_base_url: "http://127.0.0.1:3000/blobs".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Filesystem,
                root: PathBuf::from("media"),
                photos_container: "photos".to_string(),
                videos_container: "videos".to_string(),
                thumbnails_container: "thumbnails".to_string(),
                albums_table: "albums.json".to_string(),
            },
            tokens: TokenConfig {
                secret: DEFAULT_TOKEN_SECRET.to_string(),
                refresh_interval_minutes: 15,
                validity_minutes: 30,
                clock_skew_minutes: 1,
            },
            thumbnail: ThumbnailConfig {
                width: 370,
                height: 280,
                jpeg_quality: 85,
                video_tool: "ffmpeg".to_string(),
                video_seek_seconds: 1.0,
            },
        }
    }
}

use axum::Router;
use std::sync::Arc;
use storage::{
    BlobStore, EntityTable, FsBlobStore, FsEntityTable, MemoryBlobStore, MemoryEntityTable,
    StorageError,
};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub gallery: gallery::SharedGallery,
    pub config: Config,
}

/// Construct the configured storage backends.
pub fn build_stores(
    config: &StorageConfig,
) -> Result<(Arc<dyn BlobStore>, Arc<dyn EntityTable>), StorageError> {
    match config.backend {
        StorageBackend::Filesystem => {
            let table = FsEntityTable::open(config.root.join(&config.albums_table))?;
            Ok((
                Arc::new(FsBlobStore::new(config.root.clone())),
                Arc::new(table),
            ))
        }
        StorageBackend::Memory => Ok((
            Arc::new(MemoryBlobStore::new()),
            Arc::new(MemoryEntityTable::new()),
        )),
    }
}

pub fn create_app(config: Config) -> Result<Router, StorageError> {
    let (blobs, table) = build_stores(&config.storage)?;
    Ok(create_app_with_stores(config, blobs, table))
}

pub fn create_app_with_stores(
    config: Config,
    blobs: Arc<dyn BlobStore>,
    table: Arc<dyn EntityTable>,
) -> Router {
    let gallery = Arc::new(gallery::Gallery::new(&config, blobs, table));

    let app_state = AppState { gallery, config };

    Router::new()
        .route("/api/health", axum::routing::get(gallery::health_handler))
        .route(
            "/api/media",
            axum::routing::get(gallery::list_media_handler).post(gallery::upload_media_handler),
        )
        .route(
            "/api/media/{filename}",
            axum::routing::delete(gallery::delete_media_handler),
        )
        .route(
            "/api/media/{filename}/thumbnail",
            axum::routing::get(gallery::media_thumbnail_handler),
        )
        .route(
            "/api/media/{filename}/thumbnail/content",
            axum::routing::get(gallery::thumbnail_content_handler),
        )
        .route(
            "/api/media/{filename}/original",
            axum::routing::get(gallery::media_original_handler),
        )
        .route(
            "/api/media/{filename}/content",
            axum::routing::get(gallery::media_content_handler),
        )
        .route(
            "/api/albums",
            axum::routing::get(gallery::list_albums_handler),
        )
        .route(
            "/api/albums/{album}",
            axum::routing::post(gallery::create_album_handler).delete(gallery::delete_album_handler),
        )
        .route(
            "/api/albums/{album}/rename/{new_name}",
            axum::routing::put(gallery::rename_album_handler),
        )
        .route(
            "/api/albums/{album}/media",
            axum::routing::get(gallery::album_media_handler).post(gallery::upload_to_album_handler),
        )
        .route(
            "/api/albums/{album}/media/{filename}",
            axum::routing::post(gallery::add_to_album_handler)
                .delete(gallery::remove_from_album_handler),
        )
        .route(
            "/api/albums/{album}/thumbnail",
            axum::routing::get(gallery::album_thumbnail_handler),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let method = request.method();
                    let uri = request.uri();
                    let user_agent = request
                        .headers()
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %method,
                        path = %uri.path(),
                        query = ?uri.query(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status();
                        let size = response
                            .headers()
                            .get("content-length")
                            .and_then(|h| h.to_str().ok())
                            .unwrap_or("-");

                        tracing::info!(
                            target: "access_log",
                            status = %status,
                            size = %size,
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
