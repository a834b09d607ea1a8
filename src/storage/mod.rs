//! Blob storage backends for document attachments.
//!
//! [`BlobStore`] is the seam between the document uploader and wherever the bytes live.
//! Paths are bucket-relative (`CONTRACT/BL_..pdf`); every backend can turn a path into a
//! public URL and, through [`BlobStore::path_from_public_url`], turn its own URLs back
//! into paths. Path segments are percent-encoded in URLs, so keys containing `#`, `?` or
//! spaces survive the round trip.

use crate::config::storage::{StorageBackend, StorageConfig};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use url::{Position, Url};

pub mod fs;
pub mod memory;
pub mod supabase;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;
pub use supabase::SupabaseStore;

/// Object storage organised in buckets
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at `path`. With `overwrite == false` an existing object is an error.
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, overwrite: bool)
    -> Result<()>;

    /// Deletes every object in `paths`.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;

    /// Publicly resolvable URL for `path`. Pure; does not check that the object exists.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Inverse of [`BlobStore::public_url`]: strips the bucket's public prefix and decodes
    /// what is left.
    ///
    /// Returns `None` for URLs that do not start with the prefix or name no object.
    fn path_from_public_url(&self, bucket: &str, url: &str) -> Option<String> {
        relative_path(&self.public_url(bucket, ""), url)
    }
}

/// Opens the backend selected by `config`.
///
/// # Errors
/// Returns an error if a base URL is invalid or the HTTP client cannot be built.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match &config.backend {
        StorageBackend::Supabase { url, service_key } => Arc::new(SupabaseStore::new(
            url,
            service_key,
            std::time::Duration::from_secs(config.timeout_secs),
        )?),
        StorageBackend::Filesystem {
            root,
            public_base_url,
        } => Arc::new(FsBlobStore::new(root.clone(), public_base_url)?),
        StorageBackend::Memory { public_base_url } => {
            Arc::new(MemoryBlobStore::new(public_base_url)?)
        }
    };
    Ok(store)
}

/// Parses a base URL that paths can be appended to.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::Config {
        message: format!("invalid base URL '{raw}': {e}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(Error::Config {
            message: format!("'{raw}' cannot be used as a base URL"),
        });
    }
    Ok(url)
}

/// Appends `parts` to `base` as path segments. Each part is split on `/` and every
/// segment is percent-encoded; an empty last part leaves a trailing `/`.
pub(crate) fn join_url(base: &Url, parts: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty();
        for part in parts {
            segments.extend(part.split('/'));
        }
    }
    url
}

/// Decoded path of `url` below `prefix`, ignoring any query or fragment.
fn relative_path(prefix: &str, url: &str) -> Option<String> {
    let prefix = Url::parse(prefix).ok()?;
    let url = Url::parse(url).ok()?;
    if prefix[..Position::BeforePath] != url[..Position::BeforePath] {
        return None;
    }

    let encoded = url.path().strip_prefix(prefix.path())?;
    if encoded.is_empty() {
        return None;
    }
    let segments = encoded
        .split('/')
        .map(|segment| {
            percent_decode_str(segment)
                .decode_utf8()
                .ok()
                .map(|decoded| decoded.into_owned())
        })
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}
