//! People business logic - clients and sellers.

use crate::{
    core::input::{matches_term, non_empty},
    entities::{Person, PersonKind, person},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Editable fields of a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDraft {
    /// Given name; required, trimmed on save
    pub first_name: String,
    #[serde(default)]
    /// Surnames
    pub last_names: String,
    #[serde(default)]
    /// National ID or company registration
    pub identification: String,
    #[serde(default)]
    /// Contact phone
    pub phone: String,
    #[serde(default)]
    /// Contact email
    pub email: String,
    #[serde(default = "default_active")]
    /// Inactive people are left out of the sale form dropdowns
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl PersonDraft {
    /// Active draft with only a first name.
    pub fn new(first_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_names: String::new(),
            identification: String::new(),
            phone: String::new(),
            email: String::new(),
            active: true,
        }
    }

    fn validated_first_name(&self) -> Result<String> {
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err(Error::validation("first_name", "Name is required"));
        }
        Ok(first_name.to_string())
    }

    fn apply_to(&self, active: &mut person::ActiveModel, first_name: String) {
        active.first_name = Set(first_name);
        active.last_names = Set(non_empty(self.last_names.trim()));
        active.identification = Set(non_empty(self.identification.trim()));
        active.phone = Set(non_empty(self.phone.trim()));
        active.email = Set(non_empty(self.email.trim()));
        active.active = Set(self.active);
    }
}

impl From<&person::Model> for PersonDraft {
    fn from(model: &person::Model) -> Self {
        Self {
            first_name: model.first_name.clone(),
            last_names: model.last_names.clone().unwrap_or_default(),
            identification: model.identification.clone().unwrap_or_default(),
            phone: model.phone.clone().unwrap_or_default(),
            email: model.email.clone().unwrap_or_default(),
            active: model.active,
        }
    }
}

/// Full display name, first name followed by last names.
#[must_use]
pub fn display_name(person: &person::Model) -> String {
    match person.last_names.as_deref() {
        Some(last_names) => format!("{} {}", person.first_name, last_names),
        None => person.first_name.clone(),
    }
}

/// Creates a client or seller.
///
/// # Errors
/// Returns an error if the first name is blank or the insert fails.
pub async fn create_person(
    db: &DatabaseConnection,
    kind: PersonKind,
    draft: &PersonDraft,
) -> Result<person::Model> {
    let first_name = draft.validated_first_name()?;
    let now = chrono::Utc::now();

    let mut active = person::ActiveModel {
        kind: Set(kind),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    draft.apply_to(&mut active, first_name);

    let model = active.insert(db).await?;
    info!("Created {:?} {} ({})", kind, model.id, model.first_name);
    Ok(model)
}

/// Overwrites a person's fields and refreshes `updated_at`. The kind never changes.
///
/// # Errors
/// Returns an error if the first name is blank, the person does not exist or the update fails.
pub async fn update_person(
    db: &DatabaseConnection,
    person_id: i64,
    draft: &PersonDraft,
) -> Result<person::Model> {
    let first_name = draft.validated_first_name()?;

    let mut active: person::ActiveModel = Person::find_by_id(person_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Person",
            id: person_id,
        })?
        .into();
    draft.apply_to(&mut active, first_name);
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Deletes a person. Sales that referenced them keep the sale with the party cleared.
///
/// # Errors
/// Returns an error if the person does not exist or the delete fails.
pub async fn delete_person(db: &DatabaseConnection, person_id: i64) -> Result<()> {
    let result = Person::delete_by_id(person_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Person",
            id: person_id,
        });
    }
    info!("Deleted person {}", person_id);
    Ok(())
}

/// Retrieves a person by ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_person(db: &DatabaseConnection, person_id: i64) -> Result<Option<person::Model>> {
    Person::find_by_id(person_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every person of `kind`, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_people(db: &DatabaseConnection, kind: PersonKind) -> Result<Vec<person::Model>> {
    Person::find()
        .filter(person::Column::Kind.eq(kind))
        .order_by_desc(person::Column::CreatedAt)
        .order_by_desc(person::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active people of `kind` ordered by first name, for the sale form dropdowns.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_active_people(
    db: &DatabaseConnection,
    kind: PersonKind,
) -> Result<Vec<person::Model>> {
    Person::find()
        .filter(person::Column::Kind.eq(kind))
        .filter(person::Column::Active.eq(true))
        .order_by_asc(person::Column::FirstName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Filters `people` by a case-insensitive term over names, identification, phone and email.
#[must_use]
pub fn search_people<'a>(people: &'a [person::Model], term: &str) -> Vec<&'a person::Model> {
    people
        .iter()
        .filter(|p| {
            matches_term(
                term,
                &[
                    Some(p.first_name.as_str()),
                    p.last_names.as_deref(),
                    p.identification.as_deref(),
                    p.phone.as_deref(),
                    p.email.as_deref(),
                ],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::sale::{SaleDraft, create_sale, get_sale, list_sales};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_person_requires_first_name() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_person(&db, PersonKind::Client, &PersonDraft::new("   ")).await;

        assert!(matches!(result, Err(Error::Validation { ref field, .. }) if field == "first_name"));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_person_normalizes_fields() -> Result<()> {
        let db = setup_test_db().await?;

        let draft = PersonDraft {
            last_names: "  ".to_string(),
            email: " ana@example.com ".to_string(),
            ..PersonDraft::new("  Ana ")
        };
        let person = create_person(&db, PersonKind::Client, &draft).await?;

        assert_eq!(person.kind, PersonKind::Client);
        assert_eq!(person.first_name, "Ana");
        assert_eq!(person.last_names, None);
        assert_eq!(person.email.as_deref(), Some("ana@example.com"));
        assert!(person.active);
        assert_eq!(display_name(&person), "Ana");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_person_refreshes_updated_at() -> Result<()> {
        let db = setup_test_db().await?;
        let person = create_test_person(&db, PersonKind::Seller, "Luis").await?;

        let draft = PersonDraft {
            last_names: "Pérez".to_string(),
            active: false,
            ..PersonDraft::from(&person)
        };
        let updated = update_person(&db, person.id, &draft).await?;

        assert_eq!(display_name(&updated), "Luis Pérez");
        assert!(!updated.active);
        assert_eq!(updated.kind, PersonKind::Seller);
        assert_eq!(updated.created_at, person.created_at);
        assert!(updated.updated_at >= person.updated_at);

        let missing = update_person(&db, 999, &draft).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_people_by_kind() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_person(&db, PersonKind::Client, "Zoe").await?;
        let inactive = create_test_person(&db, PersonKind::Client, "Bea").await?;
        create_test_person(&db, PersonKind::Client, "Carla").await?;
        create_test_person(&db, PersonKind::Seller, "Alba").await?;

        let draft = PersonDraft {
            active: false,
            ..PersonDraft::from(&inactive)
        };
        update_person(&db, inactive.id, &draft).await?;

        let clients = list_people(&db, PersonKind::Client).await?;
        assert_eq!(clients.len(), 3);
        assert_eq!(clients[0].first_name, "Carla");

        let active: Vec<_> = list_active_people(&db, PersonKind::Client)
            .await?
            .into_iter()
            .map(|p| p.first_name)
            .collect();
        assert_eq!(active, vec!["Carla", "Zoe"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_person_clears_sale_references() -> Result<()> {
        let db = setup_test_db().await?;
        let ana = create_test_person(&db, PersonKind::Client, "Ana").await?;
        let luis = create_test_person(&db, PersonKind::Seller, "Luis").await?;
        let draft = SaleDraft {
            client_id: Some(ana.id),
            seller_id: Some(luis.id),
            ..SaleDraft::new("BL1", "CONT1")
        };
        let sale = create_sale(&db, &draft).await?;

        delete_person(&db, ana.id).await?;

        let kept = get_sale(&db, sale.id).await?.unwrap();
        assert_eq!(kept.client_id, None);
        assert_eq!(kept.seller_id, Some(luis.id));
        assert_eq!(list_sales(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_and_search_people() -> Result<()> {
        let db = setup_test_db().await?;
        let ana = create_test_person(&db, PersonKind::Client, "Ana").await?;
        let draft = PersonDraft {
            phone: "+53 5555 1234".to_string(),
            ..PersonDraft::new("Marta")
        };
        create_person(&db, PersonKind::Client, &draft).await?;

        let all = list_people(&db, PersonKind::Client).await?;
        assert_eq!(search_people(&all, "5555").len(), 1);
        assert_eq!(search_people(&all, "ANA").len(), 1);

        delete_person(&db, ana.id).await?;
        assert!(get_person(&db, ana.id).await?.is_none());
        assert!(matches!(
            delete_person(&db, ana.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }
}
