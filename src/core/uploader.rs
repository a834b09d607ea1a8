//! Document replacement uploader.
//!
//! Stores a new attachment under a deterministic path, retires the blob it replaces and
//! returns the public URL to persist. Retiring the old blob is best effort: it runs as a
//! detached task, and its [`CleanupOutcome`] is only ever logged. A failed write of the new
//! blob is the one error that propagates.

use crate::core::document::{CorrelationKeys, DocumentKind, PendingFile, document_path};
use crate::errors::{Error, Result};
use crate::storage::BlobStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What happened to the blob a new upload superseded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The previous blob was deleted
    Removed {
        /// Bucket-relative path that was deleted
        path: String,
    },
    /// The previous URL is not one of this store's public URLs
    Unparseable {
        /// The URL as stored on the record
        url: String,
    },
    /// The store refused or the task died
    Failed {
        /// Bucket-relative path that was meant to go
        path: String,
        /// Error text from the store or the runtime
        reason: String,
    },
}

/// Handle on the detached deletion of a superseded blob
#[derive(Debug)]
pub struct Cleanup {
    path: String,
    handle: JoinHandle<CleanupOutcome>,
}

impl Cleanup {
    /// Waits for the deletion to finish. Only useful for logging and tests.
    pub async fn outcome(self) -> CleanupOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => CleanupOutcome::Failed {
                path: self.path,
                reason: e.to_string(),
            },
        }
    }
}

/// Result of a successful upload
#[derive(Debug)]
pub struct StoredDocument {
    /// Slot the document was uploaded for
    pub kind: DocumentKind,
    /// Bucket-relative path of the new blob
    pub path: String,
    /// URL to persist on the record
    pub public_url: String,
    /// Pending deletion of the replaced blob, if there was one
    pub cleanup: Option<Cleanup>,
}

/// Uploads shipment documents into one bucket
#[derive(Clone)]
pub struct DocumentUploader {
    store: Arc<dyn BlobStore>,
    bucket: String,
}

impl DocumentUploader {
    /// Uploader writing to `bucket` of `store`.
    pub fn new(store: Arc<dyn BlobStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    #[must_use]
    /// Bucket documents are written to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Uploads `file` into `kind`'s folder, replacing `previous_url` if given.
    ///
    /// # Errors
    /// Returns [`Error::Upload`] if the new blob cannot be written. Problems deleting the
    /// previous blob never surface here.
    pub async fn upload(
        &self,
        file: PendingFile,
        kind: DocumentKind,
        keys: &CorrelationKeys,
        previous_url: Option<&str>,
    ) -> Result<StoredDocument> {
        self.upload_at(file, kind, keys, previous_url, Utc::now())
            .await
    }

    /// [`DocumentUploader::upload`] with an explicit timestamp for the blob name.
    pub async fn upload_at(
        &self,
        file: PendingFile,
        kind: DocumentKind,
        keys: &CorrelationKeys,
        previous_url: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<StoredDocument> {
        let cleanup = previous_url.map(|url| self.retire(url));

        let path = document_path(kind, keys, at, &file);
        debug!("Uploading {} ({} bytes) to {}", file.file_name, file.bytes.len(), path);

        self.store
            .upload(&self.bucket, &path, file.bytes, false)
            .await
            .map_err(|e| {
                error!("Upload of {} failed: {}", path, e);
                Error::Upload {
                    path: path.clone(),
                    message: e.to_string(),
                }
            })?;

        let public_url = self.store.public_url(&self.bucket, &path);
        info!("Stored {} document at {}", kind, path);

        Ok(StoredDocument {
            kind,
            path,
            public_url,
            cleanup,
        })
    }

    /// Spawns the deletion of the blob behind `url`.
    fn retire(&self, url: &str) -> Cleanup {
        let store = Arc::clone(&self.store);
        let bucket = self.bucket.clone();
        let url = url.to_string();
        let path = store.path_from_public_url(&bucket, &url).unwrap_or_default();

        let task_path = path.clone();
        let handle = tokio::spawn(async move {
            if task_path.is_empty() {
                warn!("Cannot derive a storage path from {}, leaving it in place", url);
                return CleanupOutcome::Unparseable { url };
            }

            match store.remove(&bucket, std::slice::from_ref(&task_path)).await {
                Ok(()) => {
                    debug!("Removed superseded blob {}", task_path);
                    CleanupOutcome::Removed { path: task_path }
                }
                Err(e) => {
                    warn!("Could not remove superseded blob {}: {}", task_path, e);
                    CleanupOutcome::Failed {
                        path: task_path,
                        reason: e.to_string(),
                    }
                }
            }
        });

        Cleanup { path, handle }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::storage::MemoryBlobStore;
    use chrono::TimeZone;

    const BUCKET: &str = "containers_files";

    fn setup() -> (Arc<MemoryBlobStore>, DocumentUploader) {
        let store = Arc::new(MemoryBlobStore::new("https://host").unwrap());
        let uploader = DocumentUploader::new(Arc::clone(&store) as Arc<dyn BlobStore>, BUCKET);
        (store, uploader)
    }

    fn keys() -> CorrelationKeys {
        CorrelationKeys::new("BL1", "CONT1", "BATCH1")
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 10, 20, 30).unwrap()
    }

    #[tokio::test]
    async fn test_upload_without_previous_never_removes() -> Result<()> {
        let (store, uploader) = setup();

        let stored = uploader
            .upload(PendingFile::new("a.pdf", b"new".to_vec()), DocumentKind::Swb, &keys(), None)
            .await?;

        assert!(stored.cleanup.is_none());
        assert!(store.removed().is_empty());
        assert_eq!(store.get(BUCKET, &stored.path), Some(b"new".to_vec()));
        Ok(())
    }

    #[tokio::test]
    async fn test_replacement_removes_old_and_returns_public_url() -> Result<()> {
        let (store, uploader) = setup();
        store
            .upload(BUCKET, "CONTRACT/old.pdf", b"old".to_vec(), false)
            .await?;

        let stored = uploader
            .upload_at(
                PendingFile::new("a.pdf", b"new".to_vec()),
                DocumentKind::Contract,
                &keys(),
                Some("https://host/containers_files/CONTRACT/old.pdf"),
                at(),
            )
            .await?;

        let expected_path = "CONTRACT/BL_BL1-CONT_CONT1-BATCH_BATCH1-2025-03-04T10-20-30-000Z.pdf";
        assert_eq!(stored.path, expected_path);
        assert_eq!(
            stored.public_url,
            format!("https://host/containers_files/{expected_path}")
        );

        let outcome = stored.cleanup.unwrap().outcome().await;
        assert_eq!(
            outcome,
            CleanupOutcome::Removed {
                path: "CONTRACT/old.pdf".to_string()
            }
        );
        assert_eq!(store.removed(), vec!["CONTRACT/old.pdf"]);
        assert_eq!(store.paths(BUCKET), vec![expected_path]);
        Ok(())
    }

    #[tokio::test]
    async fn test_unparseable_previous_url_still_uploads() -> Result<()> {
        let (store, uploader) = setup();

        let stored = uploader
            .upload(
                PendingFile::new("a.pdf", b"new".to_vec()),
                DocumentKind::Contract,
                &keys(),
                Some("ftp://somewhere-else/old.pdf"),
            )
            .await?;

        assert_eq!(store.get(BUCKET, &stored.path), Some(b"new".to_vec()));
        let outcome = stored.cleanup.unwrap().outcome().await;
        assert!(matches!(outcome, CleanupOutcome::Unparseable { .. }));
        assert!(store.removed().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_removal_is_swallowed() -> Result<()> {
        let (store, uploader) = setup();
        store.fail_removes(true);

        let stored = uploader
            .upload(
                PendingFile::new("a.pdf", b"new".to_vec()),
                DocumentKind::Contract,
                &keys(),
                Some("https://host/containers_files/CONTRACT/old.pdf"),
            )
            .await?;

        let outcome = stored.cleanup.unwrap().outcome().await;
        assert!(matches!(outcome, CleanupOutcome::Failed { .. }));
        assert!(store.get(BUCKET, &stored.path).is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_write_is_upload_error() {
        let (store, uploader) = setup();
        store.fail_uploads(true);

        let result = uploader
            .upload(PendingFile::new("a.pdf", vec![]), DocumentKind::Swb, &keys(), None)
            .await;

        match result {
            Err(Error::Upload { path, .. }) => assert!(path.starts_with("SWB/BL_BL1-")),
            other => panic!("expected upload error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_same_instant_twice_is_rejected_not_overwritten() -> Result<()> {
        let (store, uploader) = setup();
        let file = PendingFile::new("a.pdf", b"first".to_vec());
        uploader
            .upload_at(file, DocumentKind::Swb, &keys(), None, at())
            .await?;

        let again = PendingFile::new("a.pdf", b"second".to_vec());
        let result = uploader
            .upload_at(again, DocumentKind::Swb, &keys(), None, at())
            .await;
        assert!(matches!(result, Err(Error::Upload { .. })));

        let paths = store.paths(BUCKET);
        assert_eq!(paths.len(), 1);
        assert_eq!(store.get(BUCKET, &paths[0]), Some(b"first".to_vec()));
        Ok(())
    }

    #[tokio::test]
    async fn test_replacement_with_reserved_characters_in_keys() -> Result<()> {
        let (store, uploader) = setup();
        let keys = CorrelationKeys::new("BL 1", "CONT?1", "LOT#3");

        let first = uploader
            .upload_at(
                PendingFile::new("a.pdf", b"old".to_vec()),
                DocumentKind::Contract,
                &keys,
                None,
                at(),
            )
            .await?;
        assert_eq!(
            first.path,
            "CONTRACT/BL_BL 1-CONT_CONT?1-BATCH_LOT#3-2025-03-04T10-20-30-000Z.pdf"
        );
        assert!(!first.public_url.contains('#'));
        assert!(!first.public_url.contains('?'));

        let second = uploader
            .upload_at(
                PendingFile::new("b.pdf", b"new".to_vec()),
                DocumentKind::Contract,
                &keys,
                Some(first.public_url.as_str()),
                at() + chrono::Duration::seconds(1),
            )
            .await?;

        let outcome = second.cleanup.unwrap().outcome().await;
        assert_eq!(
            outcome,
            CleanupOutcome::Removed {
                path: first.path.clone()
            }
        );
        assert_eq!(store.paths(BUCKET), vec![second.path]);
        Ok(())
    }
}
