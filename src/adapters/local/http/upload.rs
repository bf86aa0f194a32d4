use super::{ApiError, AppState};
use crate::application::library::playlist_url;
use crate::domain::id;
use crate::domain::jobs::InputSource;
use crate::ports::encoder::RenditionEncoder;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    BoxError, Json,
};
use futures::{Stream, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::{fs::File, io::AsyncWriteExt, io::BufWriter};
use tokio_util::io::StreamReader;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
struct UrlRequest {
    #[serde(rename = "videoUrl")]
    video_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessResponse {
    success: bool,
    playlist_url: String,
    processing_time: u64,
    message: &'static str,
}

#[derive(Debug)]
enum Submission {
    Upload(PathBuf),
    Url(String),
}

/// `POST /process-video`: a multipart `video` file or `videoUrl` field, or a JSON `{"videoUrl": ...}`.
pub async fn process_video<E>(State(state): State<Arc<AppState<E>>>, request: Request) -> Response
where
    E: RenditionEncoder + 'static,
{
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| ct.starts_with("application/json"));

    let submission = if is_json {
        match Json::<UrlRequest>::from_request(request, &state).await {
            Ok(Json(body)) => body.video_url.map(Submission::Url),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return ApiError::TooLarge.into_response()
            }
            Err(rejection) => return ApiError::BadRequest(rejection.body_text()).into_response(),
        }
    } else {
        let multipart = match Multipart::from_request(request, &state).await {
            Ok(multipart) => multipart,
            Err(rejection) => return ApiError::BadRequest(rejection.body_text()).into_response(),
        };
        match receive_multipart(&state.upload_dir, multipart).await {
            Ok(submission) => submission,
            Err(e) => return e.into_response(),
        }
    };

    let input = match &submission {
        Some(Submission::Upload(path)) => InputSource::Local(path.clone()),
        Some(Submission::Url(url)) => match remote_input(url) {
            Ok(input) => input,
            Err(e) => return e.into_response(),
        },
        None => {
            return ApiError::BadRequest("No video file or URL provided".to_string()).into_response()
        }
    };

    let result = state.library.submit(&input).await;

    if let Some(Submission::Upload(path)) = &submission {
        discard_spool(path).await;
    }

    match result {
        Ok(job) => Json(ProcessResponse {
            success: true,
            playlist_url: playlist_url(&job),
            processing_time: job.elapsed_seconds,
            message: "Video processed successfully",
        })
        .into_response(),
        // Already logged with its cause by the orchestrator.
        Err(_) => ApiError::ProcessingFailed.into_response(),
    }
}

/// Only network URLs are accepted from clients; local paths never reach the engine this way.
fn remote_input(url: &str) -> Result<InputSource, ApiError> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(InputSource::Remote(url.to_string()))
    } else {
        Err(ApiError::BadRequest(
            "videoUrl must be an http(s) URL".to_string(),
        ))
    }
}

async fn receive_multipart(
    upload_dir: &Path,
    multipart: Multipart,
) -> Result<Option<Submission>, ApiError> {
    let mut upload: Option<PathBuf> = None;
    let mut url: Option<String> = None;

    let read = read_fields(upload_dir, multipart, &mut upload, &mut url).await;
    if let Err(e) = read {
        if let Some(path) = upload.take() {
            discard_spool(&path).await;
        }
        return Err(e);
    }

    // An uploaded file wins over a URL.
    Ok(upload
        .map(Submission::Upload)
        .or(url.map(Submission::Url)))
}

async fn read_fields(
    upload_dir: &Path,
    mut multipart: Multipart,
    upload: &mut Option<PathBuf>,
    url: &mut Option<String>,
) -> Result<(), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("video") if upload.is_none() => {
                let file_name = match field.file_name() {
                    Some(name) if !name.is_empty() => name.to_owned(),
                    _ => continue,
                };
                let is_video = field
                    .content_type()
                    .map_or(false, |ct| ct.starts_with("video/"));
                if !is_video {
                    return Err(ApiError::UnsupportedMedia);
                }

                tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
                    error!("Could not create {:?}: {}", upload_dir, e);
                    ApiError::Storage
                })?;
                let path = upload_dir.join(spool_name(&file_name));
                info!("Saving upload to {:?}", path);
                if let Err(e) = stream_to_file(&path, field).await {
                    warn!("Upload to {:?} failed: {}", path, e);
                    discard_spool(&path).await;
                    return Err(upload_error(&e));
                }
                *upload = Some(path);
            }
            Some("videoUrl") => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    *url = Some(text);
                }
            }
            _ => continue,
        }
    }
    Ok(())
}

async fn discard_spool(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Error removing temporary file {:?}: {}", path, e);
        }
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

/// A failed upload stream is either the body limit or a broken request; the I/O detail stays in the logs.
fn upload_error(e: &io::Error) -> ApiError {
    let too_large = e
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<MultipartError>())
        .map_or(false, |inner| inner.status() == StatusCode::PAYLOAD_TOO_LARGE);
    if too_large {
        ApiError::TooLarge
    } else {
        ApiError::BadRequest("Upload failed".to_string())
    }
}

fn spool_name(file_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{}-{}{}", millis, id::generate(6), safe_extension(file_name))
}

/// `.ext` of a client-supplied file name, or nothing if it looks suspicious.
pub fn safe_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// Save a `Stream` to a file
pub async fn stream_to_file<S, E>(path: &Path, stream: S) -> Result<(), io::Error>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    let body_with_io_error = stream.map_err(io::Error::other);
    let body_reader = StreamReader::new(body_with_io_error);
    futures::pin_mut!(body_reader);

    let mut file = BufWriter::new(File::create(path).await?);
    tokio::io::copy(&mut body_reader, &mut file).await?;
    file.flush().await?;

    Ok(())
}
