//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Ports describe how the reconciler expects to interact with driven adapters
//! (the CRM API and the database). Each trait exposes strongly typed errors so
//! adapters map their failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod account_directory;
mod crm_client;
mod crm_sleeper;
mod lead_record_repository;
mod organisation_link_repository;
mod tracker_repository;

#[cfg(test)]
pub use account_directory::MockAccountDirectory;
pub use account_directory::{AccountDirectory, AccountDirectoryError};
#[cfg(test)]
pub use crm_client::MockCrmClient;
pub use crm_client::{
    CompanyUpdate, CrmClient, CrmClientError, CrmCompany, CrmContact, LeadFormRequest, NewCompany,
};
pub use crm_sleeper::{CrmSleeper, TokioSleeper};
#[cfg(test)]
pub use lead_record_repository::MockLeadRecordRepository;
pub use lead_record_repository::{LeadRecordRepository, LeadRecordRepositoryError};
#[cfg(test)]
pub use organisation_link_repository::MockOrganisationLinkRepository;
pub use organisation_link_repository::{
    OrganisationLinkInsert, OrganisationLinkRepository, OrganisationLinkRepositoryError,
};
#[cfg(test)]
pub use tracker_repository::MockTrackerRepository;
pub use tracker_repository::{TrackerRepository, TrackerRepositoryError};
