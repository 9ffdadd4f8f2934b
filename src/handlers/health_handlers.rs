//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the blob backend and the QR directory

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Asks the blob backend whether a probe object exists.
/// 2. Performs a best-effort write/read/delete in the static directory, where
///    QR images are generated.
///
/// HTTP 200 when both checks pass, HTTP 503 otherwise.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    // 1) Blob backend check
    let storage_check = match state.storage.check_ready().await {
        Ok(()) => (true, None::<String>),
        Err(e) => (false, Some(format!("error: {}", e))),
    };

    // 2) Disk write/read/delete check
    let static_dir = state.qr.static_dir().to_path_buf();
    let disk_check = match fs::create_dir_all(&static_dir).await {
        Err(e) => (false, Some(format!("could not create static dir: {}", e))),
        Ok(()) => {
            let tmp_path = static_dir.join(format!(".readyz-{}", Uuid::new_v4()));
            match fs::write(&tmp_path, b"readyz").await {
                Ok(_) => {
                    let read = fs::read(&tmp_path).await;
                    let removed = fs::remove_file(&tmp_path).await;
                    match (read, removed) {
                        (Ok(bytes), Ok(())) if bytes == b"readyz" => (true, None),
                        (Ok(bytes), Err(e)) if bytes == b"readyz" => {
                            (true, Some(format!("could not remove tmp file: {}", e)))
                        }
                        (Ok(_), _) => (false, Some("file content mismatch".to_string())),
                        (Err(e), _) => (false, Some(format!("could not read tmp file: {}", e))),
                    }
                }
                Err(e) => (false, Some(format!("could not write tmp file: {}", e))),
            }
        }
    };

    let overall_ok = storage_check.0 && disk_check.0;

    let mut checks = HashMap::new();
    checks.insert(
        "storage",
        CheckStatus {
            ok: storage_check.0,
            error: storage_check.1,
        },
    );
    checks.insert(
        "disk",
        CheckStatus {
            ok: disk_check.0,
            error: disk_check.1,
        },
    );

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
