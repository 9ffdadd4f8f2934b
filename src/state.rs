use crate::{
    config::AppConfig,
    services::{qr_service::QrService, storage_service::StorageService},
};
use std::sync::Arc;

/// Shared, immutable state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: StorageService,
    pub qr: QrService,
}

impl AppState {
    pub fn new(config: AppConfig, storage: StorageService) -> Self {
        let qr = QrService::new(config.static_dir.clone());
        Self {
            config: Arc::new(config),
            storage,
            qr,
        }
    }
}
