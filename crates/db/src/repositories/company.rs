//! Company registry.

use chrono::Utc;
use mizan_core::compound::CompanyLink;
use mizan_core::LedgerError;
use mizan_shared::types::CompanyId;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set};
use tracing::info;

use crate::entities::companies;
use crate::error::FinanceError;

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a company, optionally as a branch of `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name or `NotFound` for an
    /// unknown parent.
    pub async fn create(
        &self,
        name: &str,
        parent_id: Option<CompanyId>,
    ) -> Result<companies::Model, FinanceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::validation("Company name is required").into());
        }

        if let Some(parent_id) = parent_id {
            find_company(&self.db, parent_id).await?;
        }

        let company = companies::ActiveModel {
            id: Set(CompanyId::new().into_inner()),
            name: Set(name.to_string()),
            parent_id: Set(parent_id.map(CompanyId::into_inner)),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        info!(company_id = %company.id, parent_id = ?company.parent_id, "Company created");
        Ok(company)
    }

    /// Gets a company by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the company does not exist.
    pub async fn get(&self, id: CompanyId) -> Result<companies::Model, FinanceError> {
        find_company(&self.db, id).await
    }
}

pub(crate) async fn find_company<C: ConnectionTrait>(
    conn: &C,
    id: CompanyId,
) -> Result<companies::Model, FinanceError> {
    Ok(companies::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::not_found("Company", id))?)
}

/// Reads a company and its parent link.
pub(crate) async fn company_link<C: ConnectionTrait>(
    conn: &C,
    id: CompanyId,
) -> Result<CompanyLink, FinanceError> {
    let company = find_company(conn, id).await?;
    Ok(CompanyLink {
        id,
        parent_id: company.parent_id.map(CompanyId::from_uuid),
    })
}
