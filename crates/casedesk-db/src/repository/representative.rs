//! SurrealDB implementation of [`RepresentativeRepository`].
//!
//! Representatives form a shallow hierarchy inside one organization via
//! `main_representative_id`. Re-parenting walks the proposed main's
//! ancestor chain so the hierarchy never contains a cycle.

use casedesk_core::error::{CaseError, CaseResult};
use casedesk_core::models::representative::{
    CreateRepresentative, Representative, UpdateRepresentative,
};
use casedesk_core::repository::{PaginatedResult, Pagination, RepresentativeRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

const SELECT_REPRESENTATIVE: &str =
    "SELECT meta::id(id) AS record_id, * FROM type::record('representative', $id)";

/// Maximum depth for ancestor traversal to prevent infinite loops.
const MAX_ANCESTOR_DEPTH: usize = 50;

#[derive(Debug, SurrealValue)]
struct RepresentativeRow {
    record_id: String,
    user_id: String,
    organization_id: String,
    main_representative_id: Option<String>,
    surname: String,
    name: String,
    patronymic: String,
    email: String,
    phone: String,
    is_shared: bool,
}

impl RepresentativeRow {
    fn try_into_representative(self) -> Result<Representative, DbError> {
        Ok(Representative {
            id: parse_uuid(&self.record_id, "representative")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            organization_id: parse_uuid(&self.organization_id, "organization")?,
            main_representative_id: parse_opt_uuid(
                self.main_representative_id,
                "main representative",
            )?,
            surname: self.surname,
            name: self.name,
            patronymic: self.patronymic,
            email: self.email,
            phone: self.phone,
            is_shared: self.is_shared,
        })
    }
}

/// SurrealDB implementation of the Representative repository.
#[derive(Clone)]
pub struct SurrealRepresentativeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRepresentativeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Representative>, DbError> {
        let mut result = self
            .db
            .query(SELECT_REPRESENTATIVE)
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<RepresentativeRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(RepresentativeRow::try_into_representative)
            .transpose()
    }

    async fn count(&self, query: &str, key: &'static str, value: String) -> Result<u64, DbError> {
        let mut result = self.db.query(query).bind((key, value)).await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(CountRow::total(rows))
    }

    /// Check that `main_id` can be the main representative of `subject`
    /// (an existing representative, or `None` while creating one) inside
    /// `organization_id`.
    async fn validate_main(
        &self,
        subject: Option<Uuid>,
        organization_id: Uuid,
        main_id: Uuid,
    ) -> CaseResult<()> {
        if subject == Some(main_id) {
            return Err(CaseError::validation(
                "representative cannot be its own main representative",
            ));
        }

        let main = self
            .fetch(main_id)
            .await?
            .ok_or_else(|| CaseError::validation("main representative not found"))?;
        if main.organization_id != organization_id {
            return Err(CaseError::validation(
                "main representative belongs to another organization",
            ));
        }

        let Some(subject) = subject else {
            return Ok(());
        };

        let mut current = main.main_representative_id;
        for _ in 0..MAX_ANCESTOR_DEPTH {
            let Some(ancestor_id) = current else {
                return Ok(());
            };
            if ancestor_id == subject {
                return Err(CaseError::validation(
                    "representative cannot be its own ancestor",
                ));
            }
            current = match self.fetch(ancestor_id).await? {
                Some(ancestor) => ancestor.main_representative_id,
                None => None,
            };
        }

        Err(CaseError::validation("representative hierarchy is too deep"))
    }
}

impl<C: Connection> RepresentativeRepository for SurrealRepresentativeRepository<C> {
    async fn create(&self, input: CreateRepresentative) -> CaseResult<Representative> {
        let taken = self
            .count(
                "SELECT count() AS total FROM representative \
                 WHERE user_id = $user_id GROUP ALL",
                "user_id",
                input.user_id.to_string(),
            )
            .await?;
        if taken > 0 {
            return Err(CaseError::AlreadyExists {
                entity: "representative".into(),
            });
        }

        if let Some(main_id) = input.main_representative_id {
            self.validate_main(None, input.organization_id, main_id)
                .await?;
        }

        let id_str = Uuid::new_v4().to_string();
        let query = format!(
            "CREATE type::record('representative', $id) SET \
             user_id = $user_id, organization_id = $organization_id, \
             main_representative_id = $main_id, \
             surname = $surname, name = $name, patronymic = $patronymic, \
             email = $email, phone = $phone, is_shared = $is_shared; \
             {SELECT_REPRESENTATIVE}"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind((
                "main_id",
                input.main_representative_id.map(|m| m.to_string()),
            ))
            .bind(("surname", input.surname))
            .bind(("name", input.name))
            .bind(("patronymic", input.patronymic))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .bind(("is_shared", input.is_shared))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<RepresentativeRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "representative".into(),
            id: id_str,
        })?;

        Ok(row.try_into_representative()?)
    }

    async fn get_by_id(&self, id: Uuid) -> CaseResult<Representative> {
        self.fetch(id).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "representative".into(),
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn get_by_user_id(&self, user_id: Uuid) -> CaseResult<Option<Representative>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM representative \
                 WHERE user_id = $user_id",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RepresentativeRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(RepresentativeRow::try_into_representative)
            .transpose()?)
    }

    async fn update(&self, id: Uuid, input: UpdateRepresentative) -> CaseResult<Representative> {
        let current = self.get_by_id(id).await?;

        if let Some(Some(main_id)) = input.main_representative_id {
            self.validate_main(Some(id), current.organization_id, main_id)
                .await?;
        }

        let mut sets = Vec::new();
        if input.main_representative_id.is_some() {
            sets.push("main_representative_id = $main_id");
        }
        if input.surname.is_some() {
            sets.push("surname = $surname");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.patronymic.is_some() {
            sets.push("patronymic = $patronymic");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.is_shared.is_some() {
            sets.push("is_shared = $is_shared");
        }
        if sets.is_empty() {
            return Ok(current);
        }

        let query = format!(
            "UPDATE type::record('representative', $id) SET {}; {SELECT_REPRESENTATIVE}",
            sets.join(", ")
        );

        let id_str = id.to_string();
        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(main_id) = input.main_representative_id {
            builder = builder.bind(("main_id", main_id.map(|m| m.to_string())));
        }
        if let Some(surname) = input.surname {
            builder = builder.bind(("surname", surname));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(patronymic) = input.patronymic {
            builder = builder.bind(("patronymic", patronymic));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(is_shared) = input.is_shared {
            builder = builder.bind(("is_shared", is_shared));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<RepresentativeRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "representative".into(),
            id: id_str,
        })?;

        Ok(row.try_into_representative()?)
    }

    async fn delete(&self, id: Uuid) -> CaseResult<()> {
        self.get_by_id(id).await?;

        let id_str = id.to_string();
        let subordinates = self
            .count(
                "SELECT count() AS total FROM representative \
                 WHERE main_representative_id = $id GROUP ALL",
                "id",
                id_str.clone(),
            )
            .await?;
        if subordinates > 0 {
            return Err(CaseError::Conflict {
                reason: "representative has subordinate representatives".into(),
            });
        }

        self.db
            .query("DELETE type::record('representative', $id)")
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Representative>> {
        let organization_id_str = organization_id.to_string();

        let total = self
            .count(
                "SELECT count() AS total FROM representative \
                 WHERE organization_id = $organization_id GROUP ALL",
                "organization_id",
                organization_id_str.clone(),
            )
            .await?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM representative \
                 WHERE organization_id = $organization_id \
                 ORDER BY surname ASC, name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("organization_id", organization_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RepresentativeRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(RepresentativeRow::try_into_representative)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn get_subordinates(&self, main_representative_id: Uuid) -> CaseResult<Vec<Representative>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM representative \
                 WHERE main_representative_id = $main_id \
                 ORDER BY surname ASC, name ASC",
            )
            .bind(("main_id", main_representative_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RepresentativeRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(RepresentativeRow::try_into_representative)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }
}
