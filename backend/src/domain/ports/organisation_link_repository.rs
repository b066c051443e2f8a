//! Port abstraction for organisation to CRM company links.
//!
//! Links are write-once. Adapters must enforce one link per organisation and
//! report a losing concurrent insert as [`OrganisationLinkInsert::AlreadyLinked`]
//! rather than as an error.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{OrganisationId, OrganisationLink};

define_port_error! {
    /// Persistence errors raised by organisation link adapters.
    pub enum OrganisationLinkRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "organisation link repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "organisation link repository query failed: {message}",
    }
}

/// Result of attempting to store a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganisationLinkInsert {
    /// The link was stored.
    Created,
    /// Another writer linked the organisation first; carries the stored link.
    AlreadyLinked(OrganisationLink),
}

/// Storage for organisation to CRM company mappings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganisationLinkRepository: Send + Sync {
    /// Fetch the link for an organisation.
    async fn find_by_organisation(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<OrganisationLink>, OrganisationLinkRepositoryError>;

    /// Store a new link unless one already exists.
    async fn create(
        &self,
        link: &OrganisationLink,
    ) -> Result<OrganisationLinkInsert, OrganisationLinkRepositoryError>;
}
