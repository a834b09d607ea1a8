//! Person entity - Clients and sellers that take part in sales.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a person buys from us or sells on our behalf
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PersonKind {
    /// Buys containers
    #[sea_orm(string_value = "client")]
    Client,
    /// Closes sales
    #[sea_orm(string_value = "seller")]
    Seller,
}

/// Person database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "people")]
pub struct Model {
    /// Unique identifier for the person
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Client or seller; fixed at creation
    pub kind: PersonKind,
    /// Given name, always present
    pub first_name: String,
    /// Surnames, if given
    pub last_names: Option<String>,
    /// National ID, passport or company registration
    pub identification: Option<String>,
    /// Contact phone, as entered
    pub phone: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Inactive people are hidden from the sale form dropdowns
    pub active: bool,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
    /// Last edit, refreshed by every update
    pub updated_at: DateTimeUtc,
}

/// People are referenced from sales; nothing is navigated from this side
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
