//! HTTP handlers for event creation and the organiser's admin view.

use crate::{
    errors::AppError,
    models::event::{
        DEFAULT_EVENT_NAME, DEFAULT_SUBEVENTS_INPUT, Event, event_prefix, new_event_id,
        parse_subevents,
    },
    state::AppState,
    views,
};
use axum::{
    Form,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, Redirect, Response},
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::info;

/// Attempts at drawing an unused event id before giving up.
const EVENT_ID_ATTEMPTS: usize = 5;

/// Form body of `POST /event/create`.
#[derive(Debug, Deserialize)]
pub struct CreateEventForm {
    pub name: Option<String>,
    pub subevents: Option<String>,
}

/// `GET /`
pub async fn home() -> Html<String> {
    Html(views::home_page())
}

/// `GET /event/create`
pub async fn create_event_form() -> Html<String> {
    Html(views::create_event_page())
}

/// `POST /event/create` — store metadata, generate QR codes, redirect to admin.
pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CreateEventForm>,
) -> Result<Redirect, AppError> {
    let name = form
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string());
    let subevents = parse_subevents(form.subevents.as_deref().unwrap_or(DEFAULT_SUBEVENTS_INPUT));

    let event_id = allocate_event_id(&state).await?;
    let event = Event::new(name, subevents);

    state.storage.ensure_path(&event_prefix(&event_id)).await?;
    state.storage.save_event(&event_id, &event).await?;

    let base_url = base_url(&state, &headers);
    state
        .qr
        .write_event_codes(&event_id, &base_url, &event.subevents)
        .await?;

    info!(
        "created event {} ({}) with sub-events {:?}",
        event_id, event.name, event.subevents
    );
    Ok(Redirect::to(&format!("/admin/{}", event_id)))
}

/// `GET /admin/{event_id}` — QR codes from local disk plus event metadata when
/// it can be read.
pub async fn admin(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let images = state.qr.list_event_codes(&event_id).await?;
    let event = match state.storage.load_event(&event_id).await {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!("could not load metadata for event {}: {}", event_id, err);
            None
        }
    };
    Ok(Html(views::admin_page(&event_id, event.as_ref(), &images)))
}

/// `GET /static/qr/{event_id}/{file}` — stream a generated QR image.
pub async fn qr_image(
    State(state): State<AppState>,
    Path((event_id, file)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let handle = state.qr.open_code(&event_id, &file).await?;
    let mut response = Response::new(Body::from_stream(ReaderStream::new(handle)));
    *response.status_mut() = StatusCode::OK;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("image/svg+xml"));
    Ok(response)
}

async fn allocate_event_id(state: &AppState) -> Result<String, AppError> {
    for _ in 0..EVENT_ID_ATTEMPTS {
        let candidate = new_event_id();
        if !state.storage.event_exists(&candidate).await? {
            return Ok(candidate);
        }
        tracing::debug!("event id {} already taken", candidate);
    }
    Err(AppError::internal("could not allocate a unique event id"))
}

/// Origin encoded into QR codes: configured base URL, else the request's
/// `Host` header.
fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(url) = &state.config.base_url {
        return url.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("localhost:{}", state.config.port));
    format!("http://{}", host)
}
