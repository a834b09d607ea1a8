//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod person;
pub mod sale;
pub mod shipment;

// Re-export specific types to avoid conflicts
pub use person::{Column as PersonColumn, Entity as Person, Model as PersonModel, PersonKind};
pub use sale::{Column as SaleColumn, Entity as Sale, Model as SaleModel};
pub use shipment::{Column as ShipmentColumn, Entity as Shipment, Model as ShipmentModel};
