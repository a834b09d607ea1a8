//! Supabase Storage backend.
//!
//! Talks to the storage REST API with the service key:
//! - upload: `POST {url}/storage/v1/object/{bucket}/{path}` with `x-upsert`
//! - remove: `DELETE {url}/storage/v1/object/{bucket}` with `{"prefixes": [...]}`
//! - public objects are served from `{url}/storage/v1/object/public/{bucket}/{path}`

use super::{BlobStore, join_url, parse_base_url};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// Blob store for a Supabase project
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: Url,
    service_key: String,
}

fn storage_error(e: &reqwest::Error) -> Error {
    Error::Storage {
        message: e.to_string(),
    }
}

/// Content type sent with an upload, from the path's extension.
fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

impl SupabaseStore {
    /// Creates a client for the project at `base_url`.
    ///
    /// # Errors
    /// Returns an error if `base_url` is not an absolute URL or the HTTP client cannot be
    /// built.
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| storage_error(&e))?;

        Ok(Self {
            client,
            base_url,
            service_key: service_key.to_string(),
        })
    }

    fn object_url(&self, parts: &[&str]) -> Url {
        let mut all = vec!["storage/v1/object"];
        all.extend_from_slice(parts);
        join_url(&self.base_url, &all)
    }

    async fn check(response: Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Storage {
            message: format!("storage API returned {status}: {body}"),
        })
    }
}

#[async_trait]
impl BlobStore for SupabaseStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        overwrite: bool,
    ) -> Result<()> {
        let response = self
            .client
            .post(self.object_url(&[bucket, path]))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("x-upsert", if overwrite { "true" } else { "false" })
            .header(reqwest::header::CONTENT_TYPE, content_type_for(path))
            .body(bytes)
            .send()
            .await
            .map_err(|e| storage_error(&e))?;

        Self::check(response).await
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        let response = self
            .client
            .delete(self.object_url(&[bucket]))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| storage_error(&e))?;

        Self::check(response).await
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.object_url(&["public", bucket, path]).into()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::document::{CorrelationKeys, DocumentKind, PendingFile};
    use crate::core::uploader::DocumentUploader;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BUCKET: &str = "containers_files";

    fn store() -> SupabaseStore {
        SupabaseStore::new("https://abc.supabase.co/", "key", Duration::from_secs(5)).unwrap()
    }

    fn store_for(server: &MockServer) -> SupabaseStore {
        SupabaseStore::new(&server.uri(), "key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_public_url_layout() {
        assert_eq!(
            store().public_url(BUCKET, "SWB/a.pdf"),
            "https://abc.supabase.co/storage/v1/object/public/containers_files/SWB/a.pdf"
        );
    }

    #[test]
    fn test_path_from_public_url() {
        let url = "https://abc.supabase.co/storage/v1/object/public/containers_files/CONTRACT/old.pdf";
        assert_eq!(
            store().path_from_public_url(BUCKET, url),
            Some("CONTRACT/old.pdf".to_string())
        );
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("CONTRACT/a.PDF"), "application/pdf");
        assert_eq!(content_type_for("SWB/scan.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("SWB/noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_upload_posts_without_upsert() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/containers_files/CONTRACT/a.pdf"))
            .and(header("x-upsert", "false"))
            .and(header("authorization", "Bearer key"))
            .and(header("apikey", "key"))
            .and(header("content-type", "application/pdf"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server)
            .upload(BUCKET, "CONTRACT/a.pdf", b"pdf".to_vec(), false)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_encodes_reserved_characters_in_path() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/storage/v1/object/containers_files/CONTRACT/BL_A%20B-BATCH_LOT%233.pdf",
            ))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        let object = "CONTRACT/BL_A B-BATCH_LOT#3.pdf";
        store.upload(BUCKET, object, b"pdf".to_vec(), false).await?;

        let url = store.public_url(BUCKET, object);
        assert_eq!(store.path_from_public_url(BUCKET, &url).as_deref(), Some(object));
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_sends_prefixes() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/containers_files"))
            .and(header("authorization", "Bearer key"))
            .and(body_json(serde_json::json!({ "prefixes": ["SWB/a.pdf", "SWB/b.pdf"] })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server)
            .remove(BUCKET, &["SWB/a.pdf".to_string(), "SWB/b.pdf".to_string()])
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_is_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_string("Duplicate"))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let upload = store.upload(BUCKET, "SWB/a.pdf", vec![1], false).await;
        match upload {
            Err(Error::Storage { message }) => {
                assert!(message.contains("409"));
                assert!(message.contains("Duplicate"));
            }
            other => panic!("expected storage error, got {other:?}"),
        }

        let remove = store.remove(BUCKET, &["SWB/a.pdf".to_string()]).await;
        assert!(matches!(remove, Err(Error::Storage { .. })));
    }

    #[tokio::test]
    async fn test_rejected_upload_surfaces_as_upload_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let uploader = DocumentUploader::new(Arc::new(store_for(&server)), BUCKET);
        let result = uploader
            .upload(
                PendingFile::new("a.pdf", b"pdf".to_vec()),
                DocumentKind::Contract,
                &CorrelationKeys::new("BL1", "CONT1", "BATCH1"),
                None,
            )
            .await;

        match result {
            Err(Error::Upload { path, message }) => {
                assert!(path.starts_with("CONTRACT/BL_BL1-CONT_CONT1-BATCH_BATCH1-"));
                assert!(message.contains("400"));
            }
            other => panic!("expected upload error, got {other:?}"),
        }
    }
}
