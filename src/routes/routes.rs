//! Defines routes for the guest and organiser pages.
//!
//! ## Structure
//! - **Organiser endpoints**
//!   - `GET         /`                       — home page
//!   - `GET | POST  /event/create`           — create an event
//!   - `GET         /admin/{event_id}`       — QR codes and links
//!   - `GET         /download/{event_id}.zip` — every upload as one archive
//!
//! - **Guest endpoints**
//!   - `GET | POST  /upload/{event_id}/{subevent}` — upload form / upload
//!   - `GET         /gallery/{event_id}/{subevent}` — uploaded media
//!
//! - **Assets & probes**
//!   - `GET /static/qr/{event_id}/{file}`, `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        event_handlers::{admin, create_event, create_event_form, home, qr_image},
        health_handlers::{healthz, readyz},
        media_handlers::{download_zip, gallery, upload, upload_form},
    },
    state::AppState,
};
use axum::{Router, extract::DefaultBodyLimit, routing::get};

/// Build and return the router for all routes.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Organiser routes
        .route("/", get(home))
        .route("/event/create", get(create_event_form).post(create_event))
        .route("/admin/{event_id}", get(admin))
        .route("/download/{archive}", get(download_zip))
        // Guest routes
        .route("/upload/{event_id}/{subevent}", get(upload_form).post(upload))
        .route("/gallery/{event_id}/{subevent}", get(gallery))
        // Generated QR images
        .route("/static/qr/{event_id}/{file}", get(qr_image))
}

/// Routes bound to `state`, with the upload size limit applied.
pub fn app(state: AppState) -> Router {
    let limit = state.config.max_upload_bytes;
    routes()
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        models::event::Event,
        services::{
            blob_store::BlobStore, memory_store::MemoryStore, storage_service::StorageService,
        },
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, Response, StatusCode, header},
    };
    use bytes::Bytes;
    use std::{
        collections::HashMap,
        io::{Cursor, Read},
        sync::Arc,
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "X-EVENT-MEDIA-BOUNDARY";

    struct TestApp {
        router: Router,
        store: MemoryStore,
        static_dir: TempDir,
    }

    fn test_app() -> TestApp {
        let static_dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            static_dir: static_dir.path().to_string_lossy().into_owned(),
            ..AppConfig::default()
        };
        let store = MemoryStore::new(config.container.clone());
        let storage = StorageService::new(Arc::new(store.clone()));
        TestApp {
            router: app(AppState::new(config, storage)),
            store,
            static_dir,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
        router.clone().oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn location(response: &Response<Body>) -> String {
        response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string()
    }

    fn multipart_upload(uri: &str, filename: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
                 Content-Type: image/jpeg\r\n\r\n",
                b = BOUNDARY,
                f = filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn create_event_stores_metadata_and_qr_codes() {
        let app = test_app();
        let request = Request::post("/event/create")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::HOST, "photos.test")
            .body(Body::from("name=Our+Wedding&subevents=a%2C+b%2C+%2C"))
            .unwrap();

        let response = send(&app.router, request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let admin_url = location(&response);
        let event_id = admin_url.strip_prefix("/admin/").unwrap().to_string();
        assert_eq!(event_id.len(), 8);

        let meta = app
            .store
            .get(&format!("events/{}/event.json", event_id))
            .await
            .unwrap();
        let event: Event = serde_json::from_slice(&meta).unwrap();
        assert_eq!(event.name, "Our Wedding");
        assert_eq!(event.subevents, vec!["a", "b"]);
        assert!(
            app.store
                .exists(&format!("events/{}/.init", event_id))
                .await
                .unwrap()
        );

        let qr_dir = app.static_dir.path().join("qr").join(&event_id);
        assert!(qr_dir.join("a.svg").exists());
        assert!(qr_dir.join("b.svg").exists());

        let admin = send(&app.router, get(&admin_url)).await;
        assert_eq!(admin.status(), StatusCode::OK);
        let page = body_text(admin).await;
        assert!(page.contains("Our Wedding"));
        assert!(page.contains(&format!("/static/qr/{}/a.svg", event_id)));
        assert!(page.contains(&format!("/static/qr/{}/b.svg", event_id)));

        let image = send(&app.router, get(&format!("/static/qr/{}/a.svg", event_id))).await;
        assert_eq!(image.status(), StatusCode::OK);
        assert_eq!(image.headers()[header::CONTENT_TYPE], "image/svg+xml");
        assert!(body_text(image).await.contains("<svg"));
    }

    #[tokio::test]
    async fn create_event_without_subevents_field_uses_defaults() {
        let app = test_app();
        let request = Request::post("/event/create")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Party"))
            .unwrap();

        let response = send(&app.router, request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let event_id = location(&response).trim_start_matches("/admin/").to_string();

        let meta = app
            .store
            .get(&format!("events/{}/event.json", event_id))
            .await
            .unwrap();
        let event: Event = serde_json::from_slice(&meta).unwrap();
        assert_eq!(event.subevents, vec!["mehndi", "nikkah", "reception"]);
    }

    #[tokio::test]
    async fn upload_stores_file_and_redirects_to_form() {
        let app = test_app();

        let response = send(
            &app.router,
            multipart_upload("/upload/E/a", "photo.jpg", b"\xff\xd8jpeg-bytes"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/upload/E/a");

        assert_eq!(
            app.store.list("events/E/a/").await.unwrap(),
            vec!["events/E/a/photo.jpg"]
        );
        assert_eq!(
            app.store.get("events/E/a/photo.jpg").await.unwrap(),
            Bytes::from_static(b"\xff\xd8jpeg-bytes")
        );

        let gallery = send(&app.router, get("/gallery/E/a")).await;
        assert_eq!(gallery.status(), StatusCode::OK);
        assert!(
            body_text(gallery)
                .await
                .contains("memory://wedding-media/events/E/a/photo.jpg")
        );
    }

    #[tokio::test]
    async fn upload_without_file_rerenders_form() {
        let app = test_app();
        let response = send(&app.router, multipart_upload("/upload/E/a", "", b"ignored")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("multipart/form-data"));
        assert_eq!(app.store.write_count().await, 0);
    }

    #[tokio::test]
    async fn gallery_of_unknown_event_is_empty() {
        let app = test_app();
        let response = send(&app.router, get("/gallery/nope/a")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("No uploads yet"));
    }

    #[tokio::test]
    async fn download_zip_bundles_event_objects() {
        let app = test_app();
        app.store.put("events/E/.init", Bytes::new()).await.unwrap();
        app.store
            .put("events/E/a/x.jpg", Bytes::from("x-bytes"))
            .await
            .unwrap();
        app.store
            .put("events/E/b/y.jpg", Bytes::from("y-bytes"))
            .await
            .unwrap();
        app.store
            .put("events/F/a/z.jpg", Bytes::from("other event"))
            .await
            .unwrap();

        let response = send(&app.router, get("/download/E.zip")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"E.zip\""
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut entries = HashMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            let mut data = String::new();
            file.read_to_string(&mut data).unwrap();
            entries.insert(file.name().to_string(), data);
        }
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["x.jpg"], "x-bytes");
        assert_eq!(entries["y.jpg"], "y-bytes");
    }

    #[tokio::test]
    async fn download_requires_zip_suffix() {
        let app = test_app();
        let response = send(&app.router, get("/download/E")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn qr_asset_rejects_traversal_and_missing_files() {
        let app = test_app();
        let traversal = send(&app.router, get("/static/qr/E/..%2Fsecret")).await;
        assert_eq!(traversal.status(), StatusCode::BAD_REQUEST);

        let missing = send(&app.router, get("/static/qr/E/none.svg")).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn probes_report_healthy_memory_backend() {
        let app = test_app();
        assert_eq!(send(&app.router, get("/healthz")).await.status(), StatusCode::OK);
        let ready = send(&app.router, get("/readyz")).await;
        assert_eq!(ready.status(), StatusCode::OK);
        assert!(body_text(ready).await.contains("\"storage\""));
    }

    #[tokio::test]
    async fn unconfigured_storage_fails_requests_but_serves_admin() {
        let static_dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            static_dir: static_dir.path().to_string_lossy().into_owned(),
            ..AppConfig::default()
        };
        let storage = StorageService::from_config(&config).unwrap();
        let router = app(AppState::new(config, storage));

        let gallery = send(&router, get("/gallery/E/a")).await;
        assert_eq!(gallery.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            body_text(gallery)
                .await
                .contains("AZURE_STORAGE_CONNECTION_STRING")
        );

        assert_eq!(
            send(&router, get("/readyz")).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(send(&router, get("/admin/E")).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn pages_render() {
        let app = test_app();
        for uri in ["/", "/event/create", "/upload/E/a"] {
            let response = send(&app.router, get(uri)).await;
            assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
        }
    }
}
