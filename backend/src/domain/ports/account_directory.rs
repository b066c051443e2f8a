//! Read-only port over host-owned users and organisations.
//!
//! Inbound adapters receive identifiers (from a job payload or the command
//! line) and resolve them here before driving the reconciler.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Organisation, OrganisationId, User, UserId};

define_port_error! {
    /// Errors raised while reading host accounts.
    pub enum AccountDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } => "account directory connection failed: {message}",
        /// Query failed or returned malformed data.
        Query { message: String } => "account directory query failed: {message}",
    }
}

/// Lookup of host users and organisations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_user(&self, user_id: &UserId) -> Result<Option<User>, AccountDirectoryError>;

    /// Fetch an organisation, including its subscription, by identifier.
    async fn find_organisation(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<Organisation>, AccountDirectoryError>;
}
