//! PostgreSQL-backed `OrganisationLinkRepository` implementation.
//!
//! Links are inserted with `ON CONFLICT DO NOTHING`; when no row is written
//! the stored link is read back and reported as already linked.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{
    OrganisationLinkInsert, OrganisationLinkRepository, OrganisationLinkRepositoryError,
};
use crate::domain::{CrmCompanyId, OrganisationId, OrganisationLink};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewOrganisationLinkRow, OrganisationLinkRow};
use super::pool::{DbPool, PoolError};
use super::schema::crm_organisation_links;

/// Diesel-backed implementation of the organisation link repository port.
#[derive(Clone)]
pub struct DieselOrganisationLinkRepository {
    pool: DbPool,
}

impl DieselOrganisationLinkRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrganisationLinkRepositoryError {
    map_basic_pool_error(error, OrganisationLinkRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OrganisationLinkRepositoryError {
    map_basic_diesel_error(
        error,
        OrganisationLinkRepositoryError::query,
        OrganisationLinkRepositoryError::connection,
    )
}

fn row_to_link(row: OrganisationLinkRow) -> OrganisationLink {
    OrganisationLink {
        organisation_id: OrganisationId::new(row.organisation_id),
        company_id: CrmCompanyId::new(row.crm_company_id),
    }
}

fn insert_outcome(
    inserted: usize,
    stored: Option<OrganisationLinkRow>,
) -> Result<OrganisationLinkInsert, OrganisationLinkRepositoryError> {
    if inserted > 0 {
        return Ok(OrganisationLinkInsert::Created);
    }
    stored
        .map(|row| OrganisationLinkInsert::AlreadyLinked(row_to_link(row)))
        .ok_or_else(|| {
            OrganisationLinkRepositoryError::query("conflicting organisation link vanished")
        })
}

#[async_trait]
impl OrganisationLinkRepository for DieselOrganisationLinkRepository {
    async fn find_by_organisation(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<OrganisationLink>, OrganisationLinkRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<OrganisationLinkRow> = crm_organisation_links::table
            .filter(crm_organisation_links::organisation_id.eq(organisation_id.get()))
            .select(OrganisationLinkRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_link))
    }

    async fn create(
        &self,
        link: &OrganisationLink,
    ) -> Result<OrganisationLinkInsert, OrganisationLinkRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewOrganisationLinkRow {
            organisation_id: link.organisation_id.get(),
            crm_company_id: link.company_id.as_str(),
        };
        let inserted = diesel::insert_into(crm_organisation_links::table)
            .values(&row)
            .on_conflict(crm_organisation_links::organisation_id)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if inserted > 0 {
            return insert_outcome(inserted, None);
        }

        debug!(
            organisation_id = %link.organisation_id,
            "organisation link insert conflicted; reading stored link"
        );
        let stored = crm_organisation_links::table
            .filter(crm_organisation_links::organisation_id.eq(link.organisation_id.get()))
            .select(OrganisationLinkRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        insert_outcome(inserted, stored)
    }
}
