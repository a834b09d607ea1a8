//! Shipment entity - One container travelling under a bill of lading.
//!
//! The natural key is `(bl_number, container_number, batch)`; uniqueness is enforced by an
//! index created alongside the table, not by this model. Choice columns (`quality`, `brand`,
//! ...) hold the effective string only, custom values included. The six `*_url` columns point
//! at the current blob for each document slot.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shipment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    /// Unique identifier for the shipment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Bill of lading number
    pub bl_number: String,
    /// Container number
    pub container_number: String,
    /// Production batch
    pub batch: String,
    /// Package count, digits only
    pub number_of_packages: Option<String>,
    /// Weight of a single package, e.g. `"50 kg"`
    pub weight_packages_kg: Option<String>,
    /// Total weight in kilograms, digits only
    pub total_weight_kg: Option<String>,
    /// Flour quality; a catalog option or custom text
    pub quality: Option<String>,
    /// Brand; a catalog option or custom text
    pub brand: Option<String>,
    /// Product; a catalog option or custom text
    pub product: Option<String>,
    /// Port of loading; a catalog option or custom text
    pub departure_port: Option<String>,
    /// Kept as entered (`YYYY-MM-DD`), not parsed
    pub departure_date: Option<String>,
    /// Port of discharge; a catalog option or custom text
    pub port_of_arrival: Option<String>,
    /// Estimated arrival, kept as entered
    pub possible_date_of_arrival: Option<String>,
    /// Importing company; a catalog option or custom text
    pub importer_cuba: Option<String>,
    /// Incoterm; a catalog option or custom text
    pub incoterms: Option<String>,
    /// Total price in USD, digits only
    pub total_price_usd: Option<String>,
    /// FOB price per tonne in USD, digits only
    pub price_per_t_fob_usd: Option<String>,
    /// Forwarder price per tonne in USD, digits only
    pub price_per_t_forwarder_usd: Option<String>,
    /// Freight forwarder
    pub forwarding_company: Option<String>,
    /// Contract number, digits only
    pub number_contract: Option<String>,
    /// Free-form product specification
    #[sea_orm(column_type = "Text", nullable)]
    pub specifications: Option<String>,
    /// Public URL of the BL draft
    pub bl_draft_url: Option<String>,
    /// Public URL of the sea waybill
    pub swb_url: Option<String>,
    /// Public URL of the forwarder's invoice
    pub invoice_forwarder_url: Option<String>,
    /// Public URL of the sales contract
    pub contract_url: Option<String>,
    /// Public URL of the supplier's invoice
    pub invoice_supplier_url: Option<String>,
    /// Public URL of the supplier's specification sheet
    pub especification_supplier_url: Option<String>,
    /// Instant the form was submitted, as reported by the client
    pub raw_timestamp: Option<DateTimeUtc>,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
}

/// Sales reference shipments by BL and container number only, so there is no foreign key
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
