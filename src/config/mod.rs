/// Choice catalog loading from config.toml
pub mod catalog;

/// Database configuration and connection management
pub mod database;

/// Blob storage settings from environment variables
pub mod storage;
