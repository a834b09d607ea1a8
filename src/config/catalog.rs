//! Choice catalog loading from config.toml
//!
//! The curated option lists behind every overridable-choice field on the shipment form.
//! Each list can be replaced from the `[choices]` table of `config.toml`; lists that are not
//! mentioned keep their built-in defaults, and a missing file means all defaults.

use crate::core::shipment::ShipmentChoice;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Option lists for the shipment choice fields
    #[serde(default)]
    pub choices: ChoiceCatalog,
}

/// Option lists for every choice field, in display order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChoiceCatalog {
    /// Package sizes
    pub weight_packages_kg: Vec<String>,
    /// Flour qualities
    pub quality: Vec<String>,
    /// Brands
    pub brand: Vec<String>,
    /// Products
    pub product: Vec<String>,
    /// Ports of loading
    pub departure_port: Vec<String>,
    /// Ports of discharge
    pub port_of_arrival: Vec<String>,
    /// Importing companies
    pub importer_cuba: Vec<String>,
    /// Incoterms
    pub incoterms: Vec<String>,
}

fn owned(options: &[&str]) -> Vec<String> {
    options.iter().map(|option| (*option).to_string()).collect()
}

impl Default for ChoiceCatalog {
    fn default() -> Self {
        Self {
            weight_packages_kg: owned(&["50 kg", "25 kg", "1 kg"]),
            quality: owned(&["STANDARD", "HIGH GLUTEN", "SEMOLA"]),
            brand: owned(&["FINKA PATRON", "NITZA", "PERSHYY MLYN"]),
            product: owned(&["ACEITE", "HARINA"]),
            departure_port: owned(&["CONSTANTA", "ODESSA", "Chornomorsk"]),
            port_of_arrival: owned(&["MARIEL", "SANTIAGO DE CUBA"]),
            importer_cuba: owned(&["CONSUMIMPORT", "AGRIMPEX"]),
            incoterms: owned(&["FOB", "CFR", "CIF"]),
        }
    }
}

impl ChoiceCatalog {
    /// The option list backing `field`.
    #[must_use]
    pub fn options(&self, field: ShipmentChoice) -> &[String] {
        match field {
            ShipmentChoice::WeightPackagesKg => &self.weight_packages_kg,
            ShipmentChoice::Quality => &self.quality,
            ShipmentChoice::Brand => &self.brand,
            ShipmentChoice::Product => &self.product,
            ShipmentChoice::DeparturePort => &self.departure_port,
            ShipmentChoice::PortOfArrival => &self.port_of_arrival,
            ShipmentChoice::ImporterCuba => &self.importer_cuba,
            ShipmentChoice::Incoterms => &self.incoterms,
        }
    }
}

/// Loads the configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file exists but cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!("No config file at {:?}, using default choice lists", path);
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path:?}: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {path:?}: {e}"),
    })
}

/// Loads the configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}
