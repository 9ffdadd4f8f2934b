pub mod azure_store;
pub mod blob_store;
pub mod memory_store;
pub mod qr_service;
pub mod storage_service;
