//! Filesystem blob store.
//!
//! Objects live at `{root}/{bucket}/{path}`; something else (a static file server or a
//! reverse proxy) is expected to serve `{root}` under `public_base_url`.

use super::{BlobStore, join_url, parse_base_url};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

/// Blob store rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: Url,
}

impl FsBlobStore {
    /// Creates a store writing under `root`, served under `public_base_url`.
    ///
    /// # Errors
    /// Returns a configuration error if `public_base_url` is not an absolute URL.
    pub fn new(root: PathBuf, public_base_url: &str) -> Result<Self> {
        Ok(Self {
            root,
            public_base_url: parse_base_url(public_base_url)?,
        })
    }

    /// Resolves a bucket-relative path, refusing anything that would escape the bucket.
    fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes || bucket.contains(['/', '\\']) || bucket == ".." {
            return Err(Error::Storage {
                message: format!("invalid object path {bucket}/{path}"),
            });
        }
        Ok(self.root.join(bucket).join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        overwrite: bool,
    ) -> Result<()> {
        let target = self.resolve(bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(&target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                Error::Storage {
                    message: format!("{bucket}/{path} already exists"),
                }
            } else {
                Error::Io(e)
            }
        })?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        tracing::debug!("Stored {} bytes at {:?}", bytes.len(), target);
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        for path in paths {
            let target = self.resolve(bucket, path)?;
            tokio::fs::remove_file(&target).await?;
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        join_url(&self.public_base_url, &[bucket, path]).into()
    }
}
