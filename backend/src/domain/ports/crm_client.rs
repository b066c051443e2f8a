//! Driven port for the remote CRM.
//!
//! The domain owns request and record shapes so reconciliation stays
//! adapter-agnostic. Lead-form submission is fire-and-forget: the CRM creates
//! the contact asynchronously and returns no identifier.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{CrmCompanyId, CrmContactId, OrganisationId, Tracker, User};

/// Contact record returned by the CRM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmContact {
    /// CRM identifier.
    pub id: CrmContactId,
    /// Email stored on the contact, when returned.
    pub email: Option<String>,
}

/// Company record returned by the CRM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmCompany {
    /// CRM identifier.
    pub id: CrmCompanyId,
    /// Stored display name, if any.
    pub name: Option<String>,
    /// Email domain the company is keyed by, if returned.
    pub domain: Option<String>,
    /// Active subscription plan, if set.
    pub active_subscription: Option<String>,
}

impl CrmCompany {
    /// Company known only by its identifier.
    pub fn new(id: CrmCompanyId) -> Self {
        Self {
            id,
            name: None,
            domain: None,
            active_subscription: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Lead-form submission for a user, with optional acquisition attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadFormRequest {
    /// Contact email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Browser token stitching prior page views to the new contact.
    pub acquisition_token: Option<String>,
    /// Campaign attribution fields forwarded as form fields.
    pub campaign_fields: BTreeMap<String, String>,
}

impl LeadFormRequest {
    /// Build a submission for `user`, attaching tracker data when present.
    pub fn for_user(user: &User, tracker: Option<&Tracker>) -> Self {
        let (acquisition_token, campaign_fields) = tracker
            .map(|tracker| {
                (
                    tracker.acquisition_token.clone(),
                    tracker.campaign_fields.clone(),
                )
            })
            .unwrap_or_default();

        Self {
            email: user.email().as_ref().to_owned(),
            first_name: user.first_name().to_owned(),
            last_name: user.last_name().to_owned(),
            acquisition_token,
            campaign_fields,
        }
    }
}

/// Company creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompany {
    /// Display name.
    pub name: String,
    /// Email domain the CRM keys companies by.
    pub domain: String,
    /// Host organisation identifier, stored for cross-reference.
    pub organisation_id: OrganisationId,
    /// Active subscription plan, if any.
    pub active_subscription: Option<String>,
}

/// Partial company update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New active subscription plan.
    pub active_subscription: Option<String>,
}

impl CompanyUpdate {
    /// Update only the display name.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Update only the active subscription.
    pub fn active_subscription(plan: impl Into<String>) -> Self {
        Self {
            active_subscription: Some(plan.into()),
            ..Self::default()
        }
    }
}

define_port_error! {
    /// Errors surfaced while calling the CRM.
    pub enum CrmClientError {
        /// Network transport failed or the CRM returned a server error.
        Transport { message: String } => "crm transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } => "crm timeout: {message}",
        /// The CRM rate-limited the call.
        RateLimited { message: String } => "crm rate limited request: {message}",
        /// Credentials were missing, invalid, or lacked scope.
        Unauthorized { message: String } => "crm rejected credentials: {message}",
        /// The CRM rejected the request as invalid.
        Rejected { message: String } => "crm rejected request: {message}",
        /// The CRM response could not be decoded.
        Decode { message: String } => "crm response decode failed: {message}",
    }
}

impl CrmClientError {
    /// Return whether the failure is likely to clear on its own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }
}

/// Port for the remote CRM API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Look up the contact for `user` by email.
    async fn get_contact(&self, user: &User) -> Result<Option<CrmContact>, CrmClientError>;

    /// Submit a lead form; the CRM creates the contact asynchronously.
    async fn create_lead_form(&self, request: &LeadFormRequest) -> Result<(), CrmClientError>;

    /// Look up a company by email domain.
    async fn get_company_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<CrmCompany>, CrmClientError>;

    /// Create a company.
    async fn create_company(&self, company: &NewCompany) -> Result<CrmCompany, CrmClientError>;

    /// Apply a partial update to a company.
    async fn update_company(
        &self,
        company_id: &CrmCompanyId,
        update: &CompanyUpdate,
    ) -> Result<CrmCompany, CrmClientError>;

    /// Associate a contact with a company.
    async fn associate_contact_to_company(
        &self,
        contact_id: &CrmContactId,
        company_id: &CrmCompanyId,
    ) -> Result<(), CrmClientError>;
}
