//! PostgreSQL-backed `LeadRecordRepository` implementation using Diesel ORM.
//!
//! Upserts rely on the unique `user_id` constraint so concurrent writers for
//! the same user converge on the last contact identifier written.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{LeadRecordRepository, LeadRecordRepositoryError};
use crate::domain::{CrmContactId, LeadRecord, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{LeadRow, NewLeadRow};
use super::pool::{DbPool, PoolError};
use super::schema::crm_leads;

/// Diesel-backed implementation of the lead record repository port.
#[derive(Clone)]
pub struct DieselLeadRecordRepository {
    pool: DbPool,
}

impl DieselLeadRecordRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LeadRecordRepositoryError {
    map_basic_pool_error(error, LeadRecordRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LeadRecordRepositoryError {
    map_basic_diesel_error(
        error,
        LeadRecordRepositoryError::query,
        LeadRecordRepositoryError::connection,
    )
}

fn row_to_lead_record(row: LeadRow) -> LeadRecord {
    LeadRecord {
        user_id: UserId::new(row.user_id),
        contact_id: CrmContactId::new(row.crm_contact_id),
    }
}

#[async_trait]
impl LeadRecordRepository for DieselLeadRecordRepository {
    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<LeadRecord>, LeadRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<LeadRow> = crm_leads::table
            .filter(crm_leads::user_id.eq(user_id.get()))
            .select(LeadRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_lead_record))
    }

    async fn upsert(&self, record: &LeadRecord) -> Result<(), LeadRecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewLeadRow {
            user_id: record.user_id.get(),
            crm_contact_id: record.contact_id.as_str(),
        };
        diesel::insert_into(crm_leads::table)
            .values(&row)
            .on_conflict(crm_leads::user_id)
            .do_update()
            .set((
                crm_leads::crm_contact_id.eq(excluded(crm_leads::crm_contact_id)),
                crm_leads::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn converts_rows_into_records() {
        let record = row_to_lead_record(LeadRow {
            user_id: 12,
            crm_contact_id: "contact-12".to_owned(),
        });

        assert_eq!(record.user_id, UserId::new(12));
        assert_eq!(record.contact_id, CrmContactId::new("contact-12"));
    }

    #[rstest]
    fn pool_failures_are_connection_errors() {
        let error = map_pool_error(PoolError::checkout("timed out"));
        assert!(matches!(error, LeadRecordRepositoryError::Connection { .. }));
    }
}
