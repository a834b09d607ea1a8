//! Core business logic - framework-agnostic form state and record operations.

pub mod choice;
pub mod document;
pub mod input;
pub mod person;
pub mod sale;
pub mod shipment;
pub mod uploader;
