//! Blob storage settings read from environment variables.
//!
//! `STORAGE_BACKEND` picks the backend (`supabase`, `fs` or `memory`, default `fs`);
//! the remaining variables only matter for the backend that uses them.

use crate::errors::{Error, Result};
use std::path::PathBuf;

/// Bucket documents are stored in unless `STORAGE_BUCKET` says otherwise.
pub const DEFAULT_BUCKET: &str = "containers_files";

/// Which blob store implementation to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Supabase Storage HTTP API
    Supabase {
        /// Project URL
        url: String,
        /// Service role key sent with every request
        service_key: String,
    },
    /// Local directory served under `public_base_url`
    Filesystem {
        /// Directory holding one subdirectory per bucket
        root: PathBuf,
        /// URL that `root` is served under
        public_base_url: String,
    },
    /// Process memory; nothing survives a restart
    Memory {
        /// Prefix of the URLs handed out
        public_base_url: String,
    },
}

/// Complete blob storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Where blobs are written
    pub backend: StorageBackend,
    /// Bucket every document goes to
    pub bucket: String,
    /// HTTP timeout for remote backends
    pub timeout_secs: u64,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|e| Error::Config {
        message: format!("{key} is required for the selected storage backend: {e}"),
    })
}

impl StorageConfig {
    /// Builds the configuration from `STORAGE_*` and `SUPABASE_*` variables.
    ///
    /// # Errors
    /// Returns an error if the backend name is unknown, a variable the backend needs is
    /// missing, or `STORAGE_TIMEOUT_SECS` is not a number.
    pub fn from_env() -> Result<Self> {
        let backend_name = var_or("STORAGE_BACKEND", "fs");
        let public_base_url = var_or("STORAGE_PUBLIC_BASE_URL", "http://localhost:8080/files");

        let backend = match backend_name.to_lowercase().as_str() {
            "supabase" => StorageBackend::Supabase {
                url: required_var("SUPABASE_URL")?,
                service_key: required_var("SUPABASE_SERVICE_KEY")?,
            },
            "fs" => StorageBackend::Filesystem {
                root: PathBuf::from(var_or("STORAGE_DIR", "data/blobs")),
                public_base_url,
            },
            "memory" => StorageBackend::Memory { public_base_url },
            other => {
                return Err(Error::Config {
                    message: format!("Unknown STORAGE_BACKEND '{other}'"),
                });
            }
        };

        let timeout_secs = var_or("STORAGE_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| Error::Config {
                message: format!("STORAGE_TIMEOUT_SECS must be a whole number: {e}"),
            })?;

        Ok(Self {
            backend,
            bucket: var_or("STORAGE_BUCKET", DEFAULT_BUCKET),
            timeout_secs,
        })
    }
}
