//! In-process blob store.
//!
//! Keeps objects in a map and records every path passed to `remove`, which makes it the
//! backend of choice for tests and dry runs. Failures can be switched on to exercise the
//! error paths of callers.

use super::{BlobStore, join_url, parse_base_url};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<(String, String), Vec<u8>>,
    removed: Vec<String>,
}

/// Blob store backed by process memory
#[derive(Debug)]
pub struct MemoryBlobStore {
    public_base_url: Url,
    inner: Mutex<Inner>,
    fail_uploads: AtomicBool,
    fail_removes: AtomicBool,
}

impl MemoryBlobStore {
    /// Creates an empty store whose public URLs start with `public_base_url`.
    ///
    /// # Errors
    /// Returns a configuration error if `public_base_url` is not an absolute URL.
    pub fn new(public_base_url: &str) -> Result<Self> {
        Ok(Self {
            public_base_url: parse_base_url(public_base_url)?,
            inner: Mutex::new(Inner::default()),
            fail_uploads: AtomicBool::new(false),
            fail_removes: AtomicBool::new(false),
        })
    }

    /// Makes every subsequent upload fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent remove fail (after recording the request).
    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Bytes stored at `bucket`/`path`, if any.
    #[must_use]
    pub fn get(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Every stored path in `bucket`, sorted.
    #[must_use]
    pub fn paths(&self, bucket: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .lock()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, path)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Paths passed to `remove`, in call order, whether or not the removal succeeded.
    #[must_use]
    pub fn removed(&self) -> Vec<String> {
        self.lock().removed.clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        overwrite: bool,
    ) -> Result<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Error::Storage {
                message: format!("upload to {bucket}/{path} rejected"),
            });
        }

        let mut inner = self.lock();
        let key = (bucket.to_string(), path.to_string());
        if !overwrite && inner.objects.contains_key(&key) {
            return Err(Error::Storage {
                message: format!("{bucket}/{path} already exists"),
            });
        }
        inner.objects.insert(key, bytes);
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        let mut inner = self.lock();
        inner.removed.extend(paths.iter().cloned());
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(Error::Storage {
                message: format!("remove from {bucket} rejected"),
            });
        }
        for path in paths {
            inner.objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        join_url(&self.public_base_url, &[bucket, path]).into()
    }
}
