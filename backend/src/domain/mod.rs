//! Domain primitives, ports and the lead reconciler.
//!
//! Purpose: define strongly typed entities for the records the reconciler
//! reads (users, organisations, subscriptions, trackers) and writes (lead
//! records, organisation links), the ports adapters implement, and the
//! orchestration service that drives them.
//!
//! Public surface:
//! - Error (alias to `error::Error`): failure payload returned by the
//!   reconciler.
//! - EligibilityFilter: pure allow/deny decision over email domains.
//! - LeadReconciler: contact, company, association and subscription sync.

pub mod eligibility;
pub mod error;
pub mod lead;
pub mod lead_reconciler;
pub mod organisation;
pub mod ports;
pub mod user;

pub use self::eligibility::{EligibilityConfig, EligibilityConfigError, EligibilityFilter};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::lead::{CrmCompanyId, CrmContactId, LeadRecord, OrganisationLink, Tracker};
pub use self::lead_reconciler::{
    ContactPollPolicy, LeadReconciler, LeadReconcilerConfig, LeadReconcilerPorts,
    LeadReconcilerRuntime, LeadTrackingOutcome,
};
pub use self::organisation::{Organisation, OrganisationId, Subscription};
pub use self::user::{EmailAddress, User, UserId, UserValidationError};

/// Convenient result alias for reconciler operations.
///
/// # Examples
/// ```
/// use lead_sync::domain::{Error, SyncResult};
///
/// fn unavailable() -> SyncResult<()> {
///     Err(Error::service_unavailable("crm is down"))
/// }
/// assert!(unavailable().is_err());
/// ```
pub type SyncResult<T> = Result<T, Error>;
