//! Port abstraction for lead record persistence.
use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{LeadRecord, UserId};

define_port_error! {
    /// Persistence errors raised by lead record adapters.
    pub enum LeadRecordRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "lead record repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "lead record repository query failed: {message}",
    }
}

/// Storage for user to CRM contact mappings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadRecordRepository: Send + Sync {
    /// Fetch the lead record for a user.
    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<LeadRecord>, LeadRecordRepositoryError>;

    /// Create the record, or replace the contact id of an existing one.
    async fn upsert(&self, record: &LeadRecord) -> Result<(), LeadRecordRepositoryError>;
}
