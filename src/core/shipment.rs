//! Shipment business logic - the container form and its persistence.
//!
//! [`ShipmentForm`] is the whole editable state of one shipment: plain text fields, eight
//! overridable-choice fields and six document slots. It changes only through by-value
//! reducer methods. Submitting validates the natural key, uploads every pending document
//! (concurrently, all awaited), then writes the flat row in one statement.

use crate::{
    config::catalog::ChoiceCatalog,
    core::{
        choice::{ChoiceFieldValue, Selection},
        document::{CorrelationKeys, DocumentKind, DocumentSlot, PendingFile},
        input::{matches_term, non_empty, only_digits, to_upper},
        uploader::DocumentUploader,
    },
    entities::{Shipment, shipment},
    errors::{DUPLICATE_SHIPMENT_MESSAGE, Error, Result},
};
use futures::future::join_all;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Shipment columns edited through an overridable-choice field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipmentChoice {
    /// Package size
    WeightPackagesKg,
    /// Flour quality
    Quality,
    /// Brand
    Brand,
    /// Product
    Product,
    /// Port of loading
    DeparturePort,
    /// Port of discharge
    PortOfArrival,
    /// Importing company
    ImporterCuba,
    /// Incoterm
    Incoterms,
}

impl ShipmentChoice {
    /// Every choice field, in form order.
    pub const ALL: [Self; 8] = [
        Self::WeightPackagesKg,
        Self::Quality,
        Self::Brand,
        Self::Product,
        Self::DeparturePort,
        Self::PortOfArrival,
        Self::ImporterCuba,
        Self::Incoterms,
    ];
}

/// Plain text columns of the shipment form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipmentText {
    /// Bill of lading number
    BlNumber,
    /// Container number
    ContainerNumber,
    /// Production batch
    Batch,
    /// Package count
    NumberOfPackages,
    /// Total weight in kilograms
    TotalWeightKg,
    /// Departure date
    DepartureDate,
    /// Estimated arrival date
    PossibleDateOfArrival,
    /// Total price in USD
    TotalPriceUsd,
    /// FOB price per tonne in USD
    PricePerTFobUsd,
    /// Forwarder price per tonne in USD
    PricePerTForwarderUsd,
    /// Freight forwarder
    ForwardingCompany,
    /// Contract number
    NumberContract,
    /// Product specification
    Specifications,
}

impl ShipmentText {
    /// Fields that only accept digits.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::NumberOfPackages
                | Self::TotalWeightKg
                | Self::TotalPriceUsd
                | Self::PricePerTFobUsd
                | Self::PricePerTForwarderUsd
                | Self::NumberContract
        )
    }

    const fn is_date(self) -> bool {
        matches!(self, Self::DepartureDate | Self::PossibleDateOfArrival)
    }
}

/// Editable state of one shipment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentForm {
    /// Bill of lading number; part of the natural key
    pub bl_number: String,
    /// Container number; part of the natural key
    pub container_number: String,
    /// Production batch; part of the natural key
    pub batch: String,
    /// Digits only
    pub number_of_packages: String,
    /// Digits only
    pub total_weight_kg: String,
    /// `YYYY-MM-DD` as entered
    pub departure_date: String,
    /// `YYYY-MM-DD` as entered
    pub possible_date_of_arrival: String,
    /// Digits only
    pub total_price_usd: String,
    /// Digits only
    pub price_per_t_fob_usd: String,
    /// Digits only
    pub price_per_t_forwarder_usd: String,
    /// Freight forwarder
    pub forwarding_company: String,
    /// Digits only
    pub number_contract: String,
    /// Free-form product specification
    pub specifications: String,
    /// Package size
    pub weight_packages_kg: ChoiceFieldValue,
    /// Flour quality
    pub quality: ChoiceFieldValue,
    /// Brand
    pub brand: ChoiceFieldValue,
    /// Product
    pub product: ChoiceFieldValue,
    /// Port of loading
    pub departure_port: ChoiceFieldValue,
    /// Port of discharge
    pub port_of_arrival: ChoiceFieldValue,
    /// Importing company
    pub importer_cuba: ChoiceFieldValue,
    /// Incoterm
    pub incoterms: ChoiceFieldValue,
    documents: [DocumentSlot; 6],
    /// New-record forms upper-case free text as it is typed
    uppercase_input: bool,
}

impl Default for ShipmentForm {
    fn default() -> Self {
        Self {
            bl_number: String::new(),
            container_number: String::new(),
            batch: String::new(),
            number_of_packages: String::new(),
            total_weight_kg: String::new(),
            departure_date: String::new(),
            possible_date_of_arrival: String::new(),
            total_price_usd: String::new(),
            price_per_t_fob_usd: String::new(),
            price_per_t_forwarder_usd: String::new(),
            forwarding_company: String::new(),
            number_contract: String::new(),
            specifications: String::new(),
            weight_packages_kg: ChoiceFieldValue::new(),
            quality: ChoiceFieldValue::new(),
            brand: ChoiceFieldValue::new(),
            product: ChoiceFieldValue::new(),
            departure_port: ChoiceFieldValue::new(),
            port_of_arrival: ChoiceFieldValue::new(),
            importer_cuba: ChoiceFieldValue::new(),
            incoterms: ChoiceFieldValue::new(),
            documents: DocumentKind::ALL.map(DocumentSlot::empty),
            uppercase_input: false,
        }
    }
}

fn document_index(kind: DocumentKind) -> usize {
    DocumentKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default()
}

/// Current URL stored in `kind`'s column.
#[must_use]
pub fn document_url(model: &shipment::Model, kind: DocumentKind) -> Option<&str> {
    match kind {
        DocumentKind::BlDraft => model.bl_draft_url.as_deref(),
        DocumentKind::Swb => model.swb_url.as_deref(),
        DocumentKind::InvoiceForwarder => model.invoice_forwarder_url.as_deref(),
        DocumentKind::Contract => model.contract_url.as_deref(),
        DocumentKind::InvoiceSupplier => model.invoice_supplier_url.as_deref(),
        DocumentKind::EspecificationSupplier => model.especification_supplier_url.as_deref(),
    }
}

impl ShipmentForm {
    /// Empty form for a new shipment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            uppercase_input: true,
            ..Self::default()
        }
    }

    /// Edit form for a stored shipment. Every choice column is re-inferred against `catalog`.
    #[must_use]
    pub fn from_model(model: &shipment::Model, catalog: &ChoiceCatalog) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let choice = |field: ShipmentChoice, value: &Option<String>| {
            ChoiceFieldValue::render(value.as_deref().unwrap_or_default(), catalog.options(field))
        };

        Self {
            bl_number: model.bl_number.clone(),
            container_number: model.container_number.clone(),
            batch: model.batch.clone(),
            number_of_packages: text(&model.number_of_packages),
            total_weight_kg: text(&model.total_weight_kg),
            departure_date: text(&model.departure_date),
            possible_date_of_arrival: text(&model.possible_date_of_arrival),
            total_price_usd: text(&model.total_price_usd),
            price_per_t_fob_usd: text(&model.price_per_t_fob_usd),
            price_per_t_forwarder_usd: text(&model.price_per_t_forwarder_usd),
            forwarding_company: text(&model.forwarding_company),
            number_contract: text(&model.number_contract),
            specifications: text(&model.specifications),
            weight_packages_kg: choice(ShipmentChoice::WeightPackagesKg, &model.weight_packages_kg),
            quality: choice(ShipmentChoice::Quality, &model.quality),
            brand: choice(ShipmentChoice::Brand, &model.brand),
            product: choice(ShipmentChoice::Product, &model.product),
            departure_port: choice(ShipmentChoice::DeparturePort, &model.departure_port),
            port_of_arrival: choice(ShipmentChoice::PortOfArrival, &model.port_of_arrival),
            importer_cuba: choice(ShipmentChoice::ImporterCuba, &model.importer_cuba),
            incoterms: choice(ShipmentChoice::Incoterms, &model.incoterms),
            documents: DocumentKind::ALL
                .map(|kind| DocumentSlot::with_url(kind, document_url(model, kind).map(String::from))),
            uppercase_input: false,
        }
    }

    #[must_use]
    /// Current value of a text field.
    pub fn text(&self, field: ShipmentText) -> &str {
        match field {
            ShipmentText::BlNumber => &self.bl_number,
            ShipmentText::ContainerNumber => &self.container_number,
            ShipmentText::Batch => &self.batch,
            ShipmentText::NumberOfPackages => &self.number_of_packages,
            ShipmentText::TotalWeightKg => &self.total_weight_kg,
            ShipmentText::DepartureDate => &self.departure_date,
            ShipmentText::PossibleDateOfArrival => &self.possible_date_of_arrival,
            ShipmentText::TotalPriceUsd => &self.total_price_usd,
            ShipmentText::PricePerTFobUsd => &self.price_per_t_fob_usd,
            ShipmentText::PricePerTForwarderUsd => &self.price_per_t_forwarder_usd,
            ShipmentText::ForwardingCompany => &self.forwarding_company,
            ShipmentText::NumberContract => &self.number_contract,
            ShipmentText::Specifications => &self.specifications,
        }
    }

    fn text_mut(&mut self, field: ShipmentText) -> &mut String {
        match field {
            ShipmentText::BlNumber => &mut self.bl_number,
            ShipmentText::ContainerNumber => &mut self.container_number,
            ShipmentText::Batch => &mut self.batch,
            ShipmentText::NumberOfPackages => &mut self.number_of_packages,
            ShipmentText::TotalWeightKg => &mut self.total_weight_kg,
            ShipmentText::DepartureDate => &mut self.departure_date,
            ShipmentText::PossibleDateOfArrival => &mut self.possible_date_of_arrival,
            ShipmentText::TotalPriceUsd => &mut self.total_price_usd,
            ShipmentText::PricePerTFobUsd => &mut self.price_per_t_fob_usd,
            ShipmentText::PricePerTForwarderUsd => &mut self.price_per_t_forwarder_usd,
            ShipmentText::ForwardingCompany => &mut self.forwarding_company,
            ShipmentText::NumberContract => &mut self.number_contract,
            ShipmentText::Specifications => &mut self.specifications,
        }
    }

    #[must_use]
    /// Current state of a choice field.
    pub const fn choice(&self, field: ShipmentChoice) -> &ChoiceFieldValue {
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

    fn choice_mut(&mut self, field: ShipmentChoice) -> &mut ChoiceFieldValue {
        match field {
            ShipmentChoice::WeightPackagesKg => &mut self.weight_packages_kg,
            ShipmentChoice::Quality => &mut self.quality,
            ShipmentChoice::Brand => &mut self.brand,
            ShipmentChoice::Product => &mut self.product,
            ShipmentChoice::DeparturePort => &mut self.departure_port,
            ShipmentChoice::PortOfArrival => &mut self.port_of_arrival,
            ShipmentChoice::ImporterCuba => &mut self.importer_cuba,
            ShipmentChoice::Incoterms => &mut self.incoterms,
        }
    }

    #[must_use]
    /// The slot for `kind`.
    pub fn document(&self, kind: DocumentKind) -> &DocumentSlot {
        &self.documents[document_index(kind)]
    }

    #[must_use]
    /// All six slots, in form order.
    pub const fn documents(&self) -> &[DocumentSlot; 6] {
        &self.documents
    }

    /// Sets a text field. Numeric fields drop non-digits; on a new form, free text is
    /// upper-cased.
    #[must_use]
    pub fn with_text(mut self, field: ShipmentText, value: &str) -> Self {
        let value = if field.is_numeric() {
            only_digits(value)
        } else if self.uppercase_input && !field.is_date() {
            to_upper(value)
        } else {
            value.to_string()
        };
        *self.text_mut(field) = value;
        self
    }

    /// Applies a raw select value to a choice field.
    ///
    /// # Errors
    /// Returns a validation error if `raw` is not empty, `OTHER`, or one of the field's options.
    pub fn with_selection(
        mut self,
        field: ShipmentChoice,
        raw: &str,
        catalog: &ChoiceCatalog,
    ) -> Result<Self> {
        let selection = Selection::parse(raw, catalog.options(field))?;
        let slot = self.choice_mut(field);
        *slot = std::mem::take(slot).on_selection_change(selection);
        Ok(self)
    }

    /// Sets the free text of a choice field that is on `OTHER`.
    ///
    /// # Errors
    /// Returns a validation error if the field is not on `OTHER`.
    pub fn with_custom_text(mut self, field: ShipmentChoice, text: &str) -> Result<Self> {
        let slot = self.choice_mut(field);
        *slot = std::mem::take(slot).on_custom_text_change(text)?;
        Ok(self)
    }

    /// Queues `file` to replace the document in `kind`'s slot on the next submit.
    #[must_use]
    pub fn with_file(mut self, kind: DocumentKind, file: PendingFile) -> Self {
        self.documents[document_index(kind)].pending_file = Some(file);
        self
    }

    /// Drops a queued file, keeping the stored document.
    #[must_use]
    pub fn without_file(mut self, kind: DocumentKind) -> Self {
        self.documents[document_index(kind)].pending_file = None;
        self
    }

    /// Checks the natural key is filled in. Runs before anything touches the network.
    ///
    /// # Errors
    /// Returns a validation error naming the first blank key field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("bl_number", "BL is required", &self.bl_number),
            ("container_number", "Container is required", &self.container_number),
            ("batch", "Batch is required", &self.batch),
        ];
        for (field, message, value) in required {
            if value.trim().is_empty() {
                return Err(Error::validation(field, message));
            }
        }
        Ok(())
    }

    /// Correlation keys for blob names, trimmed the same way the row stores them.
    #[must_use]
    pub fn keys(&self) -> CorrelationKeys {
        CorrelationKeys::new(
            self.bl_number.trim(),
            self.container_number.trim(),
            self.batch.trim(),
        )
    }

    /// Copies the form onto `active`, with `urls` holding the final URL of every slot.
    fn apply_to(&self, active: &mut shipment::ActiveModel, urls: [Option<String>; 6]) {
        let choice = |field: ShipmentChoice| non_empty(&self.choice(field).to_persisted_value());

        active.bl_number = Set(self.bl_number.trim().to_string());
        active.container_number = Set(self.container_number.trim().to_string());
        active.batch = Set(self.batch.trim().to_string());
        active.number_of_packages = Set(non_empty(&self.number_of_packages));
        active.total_weight_kg = Set(non_empty(&self.total_weight_kg));
        active.departure_date = Set(non_empty(&self.departure_date));
        active.possible_date_of_arrival = Set(non_empty(&self.possible_date_of_arrival));
        active.total_price_usd = Set(non_empty(&self.total_price_usd));
        active.price_per_t_fob_usd = Set(non_empty(&self.price_per_t_fob_usd));
        active.price_per_t_forwarder_usd = Set(non_empty(&self.price_per_t_forwarder_usd));
        active.forwarding_company = Set(non_empty(&self.forwarding_company));
        active.number_contract = Set(non_empty(&self.number_contract));
        active.specifications = Set(non_empty(&self.specifications));
        active.weight_packages_kg = Set(choice(ShipmentChoice::WeightPackagesKg));
        active.quality = Set(choice(ShipmentChoice::Quality));
        active.brand = Set(choice(ShipmentChoice::Brand));
        active.product = Set(choice(ShipmentChoice::Product));
        active.departure_port = Set(choice(ShipmentChoice::DeparturePort));
        active.port_of_arrival = Set(choice(ShipmentChoice::PortOfArrival));
        active.importer_cuba = Set(choice(ShipmentChoice::ImporterCuba));
        active.incoterms = Set(choice(ShipmentChoice::Incoterms));

        let [bl_draft, swb, invoice_forwarder, contract, invoice_supplier, especification] = urls;
        active.bl_draft_url = Set(bl_draft);
        active.swb_url = Set(swb);
        active.invoice_forwarder_url = Set(invoice_forwarder);
        active.contract_url = Set(contract);
        active.invoice_supplier_url = Set(invoice_supplier);
        active.especification_supplier_url = Set(especification);
    }
}

/// Uploads every pending file and returns the URL each slot should store.
///
/// All uploads run to completion before this returns, even when one of them fails; the
/// first failure is then reported. Blobs that did upload are not rolled back. With
/// `replace`, each slot's current URL is handed over for retirement.
async fn upload_pending(
    uploader: &DocumentUploader,
    form: &ShipmentForm,
    replace: bool,
) -> Result<[Option<String>; 6]> {
    let keys = &form.keys();
    let uploads = form.documents.iter().filter_map(|slot| {
        let file = slot.pending_file.clone()?;
        let previous = if replace { slot.current_url.as_deref() } else { None };
        Some(async move { uploader.upload(file, slot.kind, keys, previous).await })
    });
    let results = join_all(uploads).await;

    let mut urls = form.documents.clone().map(|slot| slot.current_url);
    for result in results {
        // Superseded blobs are retired by detached tasks that log their own outcome
        let stored = result?;
        urls[document_index(stored.kind)] = Some(stored.public_url);
    }
    Ok(urls)
}

/// Creates a shipment from a new-record form.
///
/// # Errors
/// Returns an error if:
/// - BL, container or batch is blank (nothing is uploaded)
/// - A document upload fails (nothing is written)
/// - The natural key already exists ([`Error::DuplicateKey`])
/// - The database insert fails
pub async fn create_shipment(
    db: &DatabaseConnection,
    uploader: &DocumentUploader,
    form: &ShipmentForm,
) -> Result<shipment::Model> {
    form.validate()?;
    let urls = upload_pending(uploader, form, false).await?;

    let now = chrono::Utc::now();
    let mut active = shipment::ActiveModel {
        raw_timestamp: Set(Some(now)),
        created_at: Set(now),
        ..Default::default()
    };
    form.apply_to(&mut active, urls);

    let model = active
        .insert(db)
        .await
        .map_err(|e| Error::from_write(e, DUPLICATE_SHIPMENT_MESSAGE))?;
    info!(
        "Created shipment {} (BL {}, container {}, batch {})",
        model.id, model.bl_number, model.container_number, model.batch
    );
    Ok(model)
}

/// Saves an edit form over shipment `shipment_id`.
///
/// Slots with a pending file get a new blob and the old one is retired; other slots keep
/// their URL.
///
/// # Errors
/// Returns an error if:
/// - BL, container or batch is blank
/// - The shipment does not exist
/// - A document upload fails (the row is left untouched)
/// - The edit collides with another shipment's natural key
/// - The database update fails
pub async fn update_shipment(
    db: &DatabaseConnection,
    uploader: &DocumentUploader,
    shipment_id: i64,
    form: &ShipmentForm,
) -> Result<shipment::Model> {
    form.validate()?;

    let mut active: shipment::ActiveModel = Shipment::find_by_id(shipment_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Shipment",
            id: shipment_id,
        })?
        .into();

    let urls = upload_pending(uploader, form, true).await?;
    form.apply_to(&mut active, urls);

    let model = active
        .update(db)
        .await
        .map_err(|e| Error::from_write(e, DUPLICATE_SHIPMENT_MESSAGE))?;
    info!("Updated shipment {}", model.id);
    Ok(model)
}

/// Deletes a shipment row. Its document blobs stay in storage.
///
/// # Errors
/// Returns an error if the shipment does not exist or the delete fails.
pub async fn delete_shipment(db: &DatabaseConnection, shipment_id: i64) -> Result<()> {
    let result = Shipment::delete_by_id(shipment_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Shipment",
            id: shipment_id,
        });
    }
    info!("Deleted shipment {}", shipment_id);
    Ok(())
}

/// Retrieves a shipment by ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_shipment(
    db: &DatabaseConnection,
    shipment_id: i64,
) -> Result<Option<shipment::Model>> {
    Shipment::find_by_id(shipment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every shipment, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_shipments(db: &DatabaseConnection) -> Result<Vec<shipment::Model>> {
    Shipment::find()
        .order_by_desc(shipment::Column::CreatedAt)
        .order_by_desc(shipment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Filters `shipments` by a case-insensitive term over BL, container, batch, brand,
/// quality and both ports.
#[must_use]
pub fn search_shipments<'a>(
    shipments: &'a [shipment::Model],
    term: &str,
) -> Vec<&'a shipment::Model> {
    shipments
        .iter()
        .filter(|s| {
            matches_term(
                term,
                &[
                    Some(s.bl_number.as_str()),
                    Some(s.container_number.as_str()),
                    Some(s.batch.as_str()),
                    s.brand.as_deref(),
                    s.quality.as_deref(),
                    s.departure_port.as_deref(),
                    s.port_of_arrival.as_deref(),
                ],
            )
        })
        .collect()
}
