//! HTTP handlers for guest uploads, galleries and the organiser's zip
//! download. Storage concerns are delegated to `StorageService`.

use crate::{
    errors::AppError,
    models::event::{event_prefix, is_placeholder, media_path, subevent_prefix},
    services::qr_service::encode_path_segment,
    state::AppState,
    views,
};
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{debug, info};

/// `GET /upload/{event_id}/{subevent}`
pub async fn upload_form(Path((event_id, subevent)): Path<(String, String)>) -> Html<String> {
    Html(views::upload_page(&event_id, &subevent))
}

/// `POST /upload/{event_id}/{subevent}` — store the `file` field unmodified,
/// then send the guest back to the form. Without a usable file the form is
/// simply shown again.
pub async fn upload(
    State(state): State<AppState>,
    Path((event_id, subevent)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let Some(filename) = field.file_name().and_then(upload_filename) else {
            debug!("ignoring file field without a usable filename");
            continue;
        };

        let path = media_path(&event_id, &subevent, &filename);
        let size = state.storage.upload(&path, field).await?;
        info!("guest upload {} ({} bytes)", path, size);

        let back = format!(
            "/upload/{}/{}",
            encode_path_segment(&event_id),
            encode_path_segment(&subevent)
        );
        return Ok(Redirect::to(&back).into_response());
    }

    Ok(Html(views::upload_page(&event_id, &subevent)).into_response())
}

/// `GET /gallery/{event_id}/{subevent}` — public URLs of everything uploaded
/// to one sub-event.
pub async fn gallery(
    State(state): State<AppState>,
    Path((event_id, subevent)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let names = state
        .storage
        .list(&subevent_prefix(&event_id, &subevent))
        .await?;
    let urls: Vec<String> = names
        .iter()
        .filter(|name| !is_placeholder(name))
        .map(|name| state.storage.public_url(name))
        .collect();
    Ok(Html(views::gallery_page(&event_id, &subevent, &urls)))
}

/// `GET /download/{event_id}.zip` — every object of the event in one archive.
pub async fn download_zip(
    State(state): State<AppState>,
    Path(archive): Path<String>,
) -> Result<Response, AppError> {
    let event_id = archive
        .strip_suffix(".zip")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::not_found(format!("no archive named `{}`", archive)))?;

    let paths: Vec<String> = state
        .storage
        .list(&event_prefix(event_id))
        .await?
        .into_iter()
        .filter(|name| !is_placeholder(name))
        .collect();
    let bytes = state.storage.download_as_zip(&paths).await?;
    info!(
        "serving archive for event {} ({} objects, {} bytes)",
        event_id,
        paths.len(),
        bytes.len()
    );

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );
    let disposition = format!(
        "attachment; filename=\"{}.zip\"",
        event_id.replace(['"', '\\'], "_")
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    Ok(response)
}

/// Final path segment of a client-supplied filename, or `None` when nothing
/// usable remains.
fn upload_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}
