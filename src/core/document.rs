//! Document slots and deterministic blob naming.
//!
//! A shipment owns six document slots. Each slot's logical name doubles as its storage
//! folder, and a new file is stored at
//! `{SLOT}/BL_{bl}-CONT_{container}-BATCH_{batch}-{timestamp}.{ext}`. The millisecond
//! timestamp keeps repeated uploads for the same slot and shipment from colliding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The six document categories attached to a shipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Draft bill of lading
    BlDraft,
    /// Sea waybill
    Swb,
    /// Forwarder's invoice
    InvoiceForwarder,
    /// Sales contract
    Contract,
    /// Supplier's invoice
    InvoiceSupplier,
    /// Supplier's product specification
    EspecificationSupplier,
}

impl DocumentKind {
    /// Every slot, in form order.
    pub const ALL: [Self; 6] = [
        Self::BlDraft,
        Self::Swb,
        Self::InvoiceForwarder,
        Self::Contract,
        Self::InvoiceSupplier,
        Self::EspecificationSupplier,
    ];

    /// Logical name, also used as the storage folder.
    #[must_use]
    pub const fn logical_name(self) -> &'static str {
        match self {
            Self::BlDraft => "BL_DRAFT",
            Self::Swb => "SWB",
            Self::InvoiceForwarder => "INVOICE_FORWARDER",
            Self::Contract => "CONTRACT",
            Self::InvoiceSupplier => "INVOICE_SUPPLIER",
            Self::EspecificationSupplier => "ESPECIFICATION_SUPPLIER",
        }
    }

    /// Human label for the form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BlDraft => "BL DRAFT",
            Self::Swb => "SWB",
            Self::InvoiceForwarder => "INVOICE FORWARDER",
            Self::Contract => "CONTRACT",
            Self::InvoiceSupplier => "INVOICE SUPPLIER",
            Self::EspecificationSupplier => "ESPECIFICATION SUPPLIER",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.logical_name())
    }
}

/// A file picked by the user and not uploaded yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    /// Original file name, only used for its extension
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl PendingFile {
    /// A picked file with its contents.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Text after the last `.` of the file name, if there is one.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// One document slot of a shipment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSlot {
    /// Which of the six slots this is
    pub kind: DocumentKind,
    /// Public URL of the blob currently attached
    pub current_url: Option<String>,
    /// Replacement waiting for the next submit
    pub pending_file: Option<PendingFile>,
}

impl DocumentSlot {
    #[must_use]
    /// A slot with nothing attached.
    pub const fn empty(kind: DocumentKind) -> Self {
        Self {
            kind,
            current_url: None,
            pending_file: None,
        }
    }

    #[must_use]
    /// A slot showing an already stored document.
    pub const fn with_url(kind: DocumentKind, current_url: Option<String>) -> Self {
        Self {
            kind,
            current_url,
            pending_file: None,
        }
    }
}

/// Identifiers of the shipment a document belongs to, embedded in its blob name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationKeys {
    /// Bill of lading number
    pub bl_number: String,
    /// Container number
    pub container_number: String,
    /// Production batch
    pub batch: String,
}

impl CorrelationKeys {
    /// Keys as given; callers trim.
    pub fn new(
        bl_number: impl Into<String>,
        container_number: impl Into<String>,
        batch: impl Into<String>,
    ) -> Self {
        Self {
            bl_number: bl_number.into(),
            container_number: container_number.into(),
            batch: batch.into(),
        }
    }
}

/// ISO-8601 UTC instant with millisecond precision, `:` and `.` replaced by `-`.
///
/// `2025-01-02T03:04:05.678Z` becomes `2025-01-02T03-04-05-678Z`.
#[must_use]
pub fn path_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

/// Storage path for a new blob in `kind`'s folder.
#[must_use]
pub fn document_path(
    kind: DocumentKind,
    keys: &CorrelationKeys,
    at: DateTime<Utc>,
    file: &PendingFile,
) -> String {
    let stem = format!(
        "{}/BL_{}-CONT_{}-BATCH_{}-{}",
        kind.logical_name(),
        keys.bl_number,
        keys.container_number,
        keys.batch,
        path_timestamp(at)
    );
    match file.extension() {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}
