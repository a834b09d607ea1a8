//! Sale entity - Links a shipped container to its final client.
//!
//! A sale names the container by `bl_number` + `container_number` and optionally references
//! the client and the seller in the `people` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier for the sale
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Bill of lading the container shipped under
    pub bl_number: String,
    /// Container sold
    pub container_number: String,
    /// Person (kind `client`) buying the container
    pub client_id: Option<i64>,
    /// Person (kind `seller`) who closed the deal
    pub seller_id: Option<i64>,
    /// Agreed price in USD, digits only
    pub agreed_price_usd: Option<String>,
    /// Payment terms in days, digits only
    pub payment_terms_days: Option<String>,
    /// Whether the client asked to change the importer
    pub importer_change_request: Option<String>,
    /// Delivery priority asked for by the client
    pub priority_requested: Option<String>,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Sale and Person. Deleting a person clears the reference.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The buying client
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::ClientId",
        to = "super::person::Column::Id",
        on_delete = "SetNull"
    )]
    Client,
    /// The seller
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::SellerId",
        to = "super::person::Column::Id",
        on_delete = "SetNull"
    )]
    Seller,
}

impl ActiveModelBehavior for ActiveModel {}
