//! Sales business logic - containers sold to final clients.

use crate::{
    core::{
        input::{matches_term, non_empty, only_digits},
        person::display_name,
    },
    entities::{Person, PersonKind, Sale, Shipment, person, sale, shipment},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Editable fields of a sale
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDraft {
    /// Bill of lading; required
    pub bl_number: String,
    /// Container sold; required
    pub container_number: String,
    /// Person of kind client buying the container
    pub client_id: Option<i64>,
    /// Person of kind seller who closed the deal
    pub seller_id: Option<i64>,
    #[serde(default)]
    /// Agreed price in USD; non-digits are dropped
    pub agreed_price_usd: String,
    #[serde(default)]
    /// Payment terms in days; non-digits are dropped
    pub payment_terms_days: String,
    #[serde(default)]
    /// Importer change asked for by the client
    pub importer_change_request: String,
    #[serde(default)]
    /// Delivery priority asked for by the client
    pub priority_requested: String,
}

impl SaleDraft {
    /// Draft for a container with every optional field blank.
    pub fn new(bl_number: impl Into<String>, container_number: impl Into<String>) -> Self {
        Self {
            bl_number: bl_number.into(),
            container_number: container_number.into(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.bl_number.trim().is_empty() {
            return Err(Error::validation("bl_number", "BL is required"));
        }
        if self.container_number.trim().is_empty() {
            return Err(Error::validation("container_number", "Container is required"));
        }
        Ok(())
    }

    fn apply_to(&self, active: &mut sale::ActiveModel) {
        active.bl_number = Set(self.bl_number.trim().to_string());
        active.container_number = Set(self.container_number.trim().to_string());
        active.client_id = Set(self.client_id);
        active.seller_id = Set(self.seller_id);
        active.agreed_price_usd = Set(non_empty(&only_digits(&self.agreed_price_usd)));
        active.payment_terms_days = Set(non_empty(&only_digits(&self.payment_terms_days)));
        active.importer_change_request = Set(non_empty(self.importer_change_request.trim()));
        active.priority_requested = Set(non_empty(self.priority_requested.trim()));
    }
}

impl From<&sale::Model> for SaleDraft {
    fn from(model: &sale::Model) -> Self {
        Self {
            bl_number: model.bl_number.clone(),
            container_number: model.container_number.clone(),
            client_id: model.client_id,
            seller_id: model.seller_id,
            agreed_price_usd: model.agreed_price_usd.clone().unwrap_or_default(),
            payment_terms_days: model.payment_terms_days.clone().unwrap_or_default(),
            importer_change_request: model.importer_change_request.clone().unwrap_or_default(),
            priority_requested: model.priority_requested.clone().unwrap_or_default(),
        }
    }
}

/// A sale with its client and seller resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleWithParties {
    /// The sale row
    pub sale: sale::Model,
    /// Buying client, if set and still on record
    pub client: Option<person::Model>,
    /// Seller, if set and still on record
    pub seller: Option<person::Model>,
}

/// Containers registered under one BL, for the sale form pickers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlContainers {
    /// Bill of lading number
    pub bl_number: String,
    /// Distinct containers under this BL, ascending
    pub containers: Vec<String>,
}

/// Checks that `person_id`, if set, names a person of `kind`.
async fn check_party(
    db: &DatabaseConnection,
    field: &str,
    person_id: Option<i64>,
    kind: PersonKind,
) -> Result<()> {
    let Some(id) = person_id else {
        return Ok(());
    };
    match Person::find_by_id(id).one(db).await? {
        Some(person) if person.kind == kind => Ok(()),
        Some(_) => Err(Error::validation(
            field,
            format!("Person {id} is not a {kind:?}"),
        )),
        None => Err(Error::validation(field, format!("Person {id} does not exist"))),
    }
}

async fn check_parties(db: &DatabaseConnection, draft: &SaleDraft) -> Result<()> {
    check_party(db, "client_id", draft.client_id, PersonKind::Client).await?;
    check_party(db, "seller_id", draft.seller_id, PersonKind::Seller).await
}

/// Records a sale.
///
/// # Errors
/// Returns an error if BL or container is blank, a referenced client or seller does not
/// exist with the right kind, or the insert fails.
pub async fn create_sale(db: &DatabaseConnection, draft: &SaleDraft) -> Result<sale::Model> {
    draft.validate()?;
    check_parties(db, draft).await?;

    let mut active = sale::ActiveModel {
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    draft.apply_to(&mut active);

    let model = active.insert(db).await?;
    info!(
        "Created sale {} for BL {} container {}",
        model.id, model.bl_number, model.container_number
    );
    Ok(model)
}

/// Overwrites a sale's fields.
///
/// # Errors
/// Returns an error if validation fails, the sale does not exist or the update fails.
pub async fn update_sale(
    db: &DatabaseConnection,
    sale_id: i64,
    draft: &SaleDraft,
) -> Result<sale::Model> {
    draft.validate()?;

    let mut active: sale::ActiveModel = Sale::find_by_id(sale_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Sale",
            id: sale_id,
        })?
        .into();
    check_parties(db, draft).await?;
    draft.apply_to(&mut active);

    active.update(db).await.map_err(Into::into)
}

/// Deletes a sale.
///
/// # Errors
/// Returns an error if the sale does not exist or the delete fails.
pub async fn delete_sale(db: &DatabaseConnection, sale_id: i64) -> Result<()> {
    let result = Sale::delete_by_id(sale_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Sale",
            id: sale_id,
        });
    }
    info!("Deleted sale {}", sale_id);
    Ok(())
}

/// Retrieves a sale by ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_sale(db: &DatabaseConnection, sale_id: i64) -> Result<Option<sale::Model>> {
    Sale::find_by_id(sale_id).one(db).await.map_err(Into::into)
}

/// Retrieves every sale, newest first, with client and seller attached.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn list_sales(db: &DatabaseConnection) -> Result<Vec<SaleWithParties>> {
    let sales = Sale::find()
        .order_by_desc(sale::Column::CreatedAt)
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await?;

    let ids: Vec<i64> = sales
        .iter()
        .flat_map(|s| [s.client_id, s.seller_id])
        .flatten()
        .collect();
    let people: HashMap<i64, person::Model> = if ids.is_empty() {
        HashMap::new()
    } else {
        Person::find()
            .filter(person::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    let lookup = |id: Option<i64>| id.and_then(|id| people.get(&id).cloned());
    Ok(sales
        .into_iter()
        .map(|sale| SaleWithParties {
            client: lookup(sale.client_id),
            seller: lookup(sale.seller_id),
            sale,
        })
        .collect())
}

/// Distinct BL numbers of registered shipments, ascending, each with its containers.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn container_options(db: &DatabaseConnection) -> Result<Vec<BlContainers>> {
    let rows: Vec<(String, String)> = Shipment::find()
        .select_only()
        .column(shipment::Column::BlNumber)
        .column(shipment::Column::ContainerNumber)
        .order_by_asc(shipment::Column::BlNumber)
        .order_by_asc(shipment::Column::ContainerNumber)
        .into_tuple()
        .all(db)
        .await?;

    let mut options: Vec<BlContainers> = Vec::new();
    for (bl_number, container_number) in rows {
        match options.last_mut() {
            Some(last) if last.bl_number == bl_number => {
                // Several batches can share a container
                if last.containers.last() != Some(&container_number) {
                    last.containers.push(container_number);
                }
            }
            _ => options.push(BlContainers {
                bl_number,
                containers: vec![container_number],
            }),
        }
    }
    Ok(options)
}

/// Filters `sales` by a case-insensitive term over BL, container and party names.
#[must_use]
pub fn search_sales<'a>(sales: &'a [SaleWithParties], term: &str) -> Vec<&'a SaleWithParties> {
    sales
        .iter()
        .filter(|s| {
            let client = s.client.as_ref().map(display_name);
            let seller = s.seller.as_ref().map(display_name);
            matches_term(
                term,
                &[
                    Some(s.sale.bl_number.as_str()),
                    Some(s.sale.container_number.as_str()),
                    client.as_deref(),
                    seller.as_deref(),
                ],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_sale_requires_bl_and_container() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_sale(&db, &SaleDraft::new("", "CONT1")).await;
        assert!(matches!(result, Err(Error::Validation { ref field, .. }) if field == "bl_number"));

        let result = create_sale(&db, &SaleDraft::new("BL1", " ")).await;
        assert!(
            matches!(result, Err(Error::Validation { ref field, .. }) if field == "container_number")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_create_sale_checks_party_kinds() -> Result<()> {
        let db = setup_test_db().await?;
        let seller = create_test_person(&db, PersonKind::Seller, "Luis").await?;

        let draft = SaleDraft {
            client_id: Some(seller.id),
            ..SaleDraft::new("BL1", "CONT1")
        };
        let result = create_sale(&db, &draft).await;
        assert!(matches!(result, Err(Error::Validation { ref field, .. }) if field == "client_id"));

        let draft = SaleDraft {
            seller_id: Some(999),
            ..SaleDraft::new("BL1", "CONT1")
        };
        assert!(create_sale(&db, &draft).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_sales_attaches_parties() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_person(&db, PersonKind::Client, "Ana").await?;
        let seller = create_test_person(&db, PersonKind::Seller, "Luis").await?;

        let draft = SaleDraft {
            client_id: Some(client.id),
            seller_id: Some(seller.id),
            agreed_price_usd: "$ 41,000".to_string(),
            ..SaleDraft::new("BL1", "CONT1")
        };
        let first = create_sale(&db, &draft).await?;
        assert_eq!(first.agreed_price_usd.as_deref(), Some("41000"));
        create_sale(&db, &SaleDraft::new("BL2", "CONT9")).await?;

        let sales = list_sales(&db).await?;
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].sale.bl_number, "BL2");
        assert!(sales[0].client.is_none());
        assert_eq!(sales[1].client.as_ref().unwrap().id, client.id);
        assert_eq!(sales[1].seller.as_ref().unwrap().id, seller.id);

        assert_eq!(search_sales(&sales, "luis").len(), 1);
        assert_eq!(search_sales(&sales, "cont").len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_sale() -> Result<()> {
        let db = setup_test_db().await?;
        let sale = create_sale(&db, &SaleDraft::new("BL1", "CONT1")).await?;

        let draft = SaleDraft {
            priority_requested: "ALTA".to_string(),
            ..SaleDraft::from(&sale)
        };
        let updated = update_sale(&db, sale.id, &draft).await?;
        assert_eq!(updated.priority_requested.as_deref(), Some("ALTA"));
        assert_eq!(updated.created_at, sale.created_at);

        delete_sale(&db, sale.id).await?;
        assert!(get_sale(&db, sale.id).await?.is_none());
        assert!(matches!(
            update_sale(&db, sale.id, &draft).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_container_options_groups_by_bl() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_shipment(&db, "BL2", "CONT3", "B1").await?;
        create_test_shipment(&db, "BL1", "CONT2", "B1").await?;
        create_test_shipment(&db, "BL1", "CONT1", "B1").await?;
        create_test_shipment(&db, "BL1", "CONT1", "B2").await?;

        let options = container_options(&db).await?;

        assert_eq!(
            options,
            vec![
                BlContainers {
                    bl_number: "BL1".to_string(),
                    containers: vec!["CONT1".to_string(), "CONT2".to_string()],
                },
                BlContainers {
                    bl_number: "BL2".to_string(),
                    containers: vec!["CONT3".to_string()],
                },
            ]
        );
        Ok(())
    }
}
