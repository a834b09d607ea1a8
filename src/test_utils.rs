//! Shared test utilities for the shipment registry.
//!
//! This module provides common helper functions for setting up test databases,
//! an in-memory document store, and test records with sensible defaults.

use crate::{
    core::{
        document::PendingFile,
        person::{self, PersonDraft},
        shipment::{self, ShipmentForm, ShipmentText},
        uploader::DocumentUploader,
    },
    entities::{self, PersonKind},
    errors::Result,
    storage::{BlobStore, MemoryBlobStore},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Bucket used by every test uploader
pub const TEST_BUCKET: &str = "containers_files";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an uploader backed by a fresh in-memory store.
/// Public URLs look like `https://host/containers_files/<path>`.
pub fn memory_uploader() -> Result<(Arc<MemoryBlobStore>, DocumentUploader)> {
    let store = Arc::new(MemoryBlobStore::new("https://host")?);
    let uploader = DocumentUploader::new(Arc::clone(&store) as Arc<dyn BlobStore>, TEST_BUCKET);
    Ok((store, uploader))
}

/// A small fake PDF named `file_name`.
pub fn sample_pdf(file_name: &str) -> PendingFile {
    PendingFile::new(file_name, b"%PDF-1.4 test".to_vec())
}

/// Creates a test shipment with no documents and no optional fields.
pub async fn create_test_shipment(
    db: &DatabaseConnection,
    bl_number: &str,
    container_number: &str,
    batch: &str,
) -> Result<entities::shipment::Model> {
    let (_store, uploader) = memory_uploader()?;
    let form = ShipmentForm::new()
        .with_text(ShipmentText::BlNumber, bl_number)
        .with_text(ShipmentText::ContainerNumber, container_number)
        .with_text(ShipmentText::Batch, batch);
    shipment::create_shipment(db, &uploader, &form).await
}

/// Creates an active test person with only a first name.
pub async fn create_test_person(
    db: &DatabaseConnection,
    kind: PersonKind,
    first_name: &str,
) -> Result<entities::person::Model> {
    person::create_person(db, kind, &PersonDraft::new(first_name)).await
}

/// A stored-looking shipment row that never touched a database.
///
/// # Defaults
/// * natural key: `BL1` / `CONT1` / `BATCH1`
/// * every optional column: `None`
pub fn sample_shipment_model() -> entities::shipment::Model {
    let now = chrono::Utc::now();
    entities::shipment::Model {
        id: 1,
        bl_number: "BL1".to_string(),
        container_number: "CONT1".to_string(),
        batch: "BATCH1".to_string(),
        number_of_packages: None,
        weight_packages_kg: None,
        total_weight_kg: None,
        quality: None,
        brand: None,
        product: None,
        departure_port: None,
        departure_date: None,
        port_of_arrival: None,
        possible_date_of_arrival: None,
        importer_cuba: None,
        incoterms: None,
        total_price_usd: None,
        price_per_t_fob_usd: None,
        price_per_t_forwarder_usd: None,
        forwarding_company: None,
        number_contract: None,
        specifications: None,
        bl_draft_url: None,
        swb_url: None,
        invoice_forwarder_url: None,
        contract_url: None,
        invoice_supplier_url: None,
        especification_supplier_url: None,
        raw_timestamp: Some(now),
        created_at: now,
    }
}
