//! Domain orchestration service reconciling users and organisations with the
//! CRM.
//!
//! The reconciler owns the eligibility gate, the contact resolution chain
//! (stored record, remote lookup, lead-form creation with polling), company
//! resolution keyed by email domain, the contact/company association and the
//! subscription push. Remote failures propagate as [`Error`](crate::domain::Error); missing
//! prerequisites degrade to `None` outcomes.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::eligibility::normalise_domains;
use crate::domain::ports::{
    CompanyUpdate, CrmClient, CrmCompany, CrmSleeper, LeadRecordRepository,
    OrganisationLinkRepository, TrackerRepository,
};
use crate::domain::{
    CrmCompanyId, CrmContactId, EligibilityFilter, Organisation, Subscription, SyncResult, User,
};

mod company;
mod contact;
mod mapping;
mod policy;
mod runtime;

pub use policy::ContactPollPolicy;
pub use runtime::{LeadReconcilerPorts, LeadReconcilerRuntime};

/// Reconciler configuration beyond the eligibility rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadReconcilerConfig {
    /// Email domains for which no company is ever created or linked.
    pub ignore_organisation_domains: Vec<String>,
    /// Polling budget after a lead-form submission.
    pub contact_poll: ContactPollPolicy,
}

/// Result of driving one user/organisation pair through the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LeadTrackingOutcome {
    /// The eligibility rules excluded the user; nothing was called.
    Ineligible,
    /// No contact could be resolved yet; nothing further was called.
    ContactUnresolved,
    /// The contact resolved but no company may be linked for this domain.
    CompanyUnresolved {
        /// Resolved contact.
        contact_id: CrmContactId,
    },
    /// Contact and company were resolved and associated.
    Associated {
        /// Resolved contact.
        contact_id: CrmContactId,
        /// Resolved company.
        company_id: CrmCompanyId,
    },
}

/// Domain-owned lead reconciler.
pub struct LeadReconciler {
    crm: Arc<dyn CrmClient>,
    lead_records: Arc<dyn LeadRecordRepository>,
    organisation_links: Arc<dyn OrganisationLinkRepository>,
    trackers: Arc<dyn TrackerRepository>,
    sleeper: Arc<dyn CrmSleeper>,
    eligibility: EligibilityFilter,
    ignored_organisation_domains: BTreeSet<String>,
    contact_poll: ContactPollPolicy,
}

impl LeadReconciler {
    /// Build a reconciler using default runtime dependencies.
    /// ```rust,ignore
    /// let reconciler = LeadReconciler::new(ports, eligibility, config);
    /// ```
    pub fn new(
        ports: LeadReconcilerPorts,
        eligibility: EligibilityFilter,
        config: LeadReconcilerConfig,
    ) -> Self {
        Self::with_runtime(
            ports,
            eligibility,
            LeadReconcilerRuntime::default(),
            config,
        )
    }

    /// Build a reconciler with injected runtime abstractions.
    /// ```rust,ignore
    /// let reconciler = LeadReconciler::with_runtime(ports, eligibility, runtime, config);
    /// ```
    pub fn with_runtime(
        ports: LeadReconcilerPorts,
        eligibility: EligibilityFilter,
        runtime: LeadReconcilerRuntime,
        config: LeadReconcilerConfig,
    ) -> Self {
        Self {
            crm: ports.crm,
            lead_records: ports.lead_records,
            organisation_links: ports.organisation_links,
            trackers: ports.trackers,
            sleeper: runtime.sleeper,
            eligibility,
            ignored_organisation_domains: normalise_domains(config.ignore_organisation_domains),
            contact_poll: config.contact_poll,
        }
    }

    /// Return whether `user` may be forwarded to the CRM.
    pub fn should_track(&self, user: &User) -> bool {
        self.eligibility.should_track(user)
    }

    /// Gated entry point: check eligibility, then run [`Self::create_lead`].
    ///
    /// # Errors
    ///
    /// Propagates CRM and persistence failures from [`Self::create_lead`].
    pub async fn track_lead(
        &self,
        user: &User,
        organisation: &Organisation,
    ) -> SyncResult<LeadTrackingOutcome> {
        if !self.should_track(user) {
            debug!(user_id = %user.id(), "user is not eligible for lead tracking");
            return Ok(LeadTrackingOutcome::Ineligible);
        }
        self.create_lead(user, organisation).await
    }

    /// Resolve the contact and company, then associate them in the CRM.
    ///
    /// Stops without further calls as soon as either side is unresolved.
    ///
    /// # Errors
    ///
    /// Returns an error when a CRM call or a repository operation fails. The
    /// association itself is not retried.
    pub async fn create_lead(
        &self,
        user: &User,
        organisation: &Organisation,
    ) -> SyncResult<LeadTrackingOutcome> {
        let Some(contact_id) = self.resolve_or_create_contact(user).await? else {
            return Ok(LeadTrackingOutcome::ContactUnresolved);
        };
        let Some(company_id) = self.resolve_or_create_company(user, organisation).await? else {
            return Ok(LeadTrackingOutcome::CompanyUnresolved { contact_id });
        };

        self.crm
            .associate_contact_to_company(&contact_id, &company_id)
            .await
            .map_err(mapping::crm_error("associate contact to company"))?;

        info!(
            user_id = %user.id(),
            organisation_id = %organisation.id(),
            crm_contact_id = %contact_id,
            crm_company_id = %company_id,
            "associated crm contact with company"
        );
        Ok(LeadTrackingOutcome::Associated {
            contact_id,
            company_id,
        })
    }

    /// Push the subscription's plan to the linked CRM company.
    ///
    /// Returns `None` without calling the CRM when the plan is blank or the
    /// organisation has no link yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the link lookup or the CRM update fails.
    pub async fn update_company_active_subscription(
        &self,
        subscription: &Subscription,
    ) -> SyncResult<Option<CrmCompany>> {
        let Some(plan) = subscription.plan() else {
            return Ok(None);
        };

        let organisation_id = subscription.organisation_id();
        let Some(link) = self
            .organisation_links
            .find_by_organisation(&organisation_id)
            .await
            .map_err(mapping::organisation_link_error)?
        else {
            debug!(%organisation_id, "organisation has no crm company yet");
            return Ok(None);
        };

        let company = self
            .crm
            .update_company(&link.company_id, &CompanyUpdate::active_subscription(plan))
            .await
            .map_err(mapping::crm_error("update company subscription"))?;

        info!(
            %organisation_id,
            crm_company_id = %link.company_id,
            plan,
            "pushed active subscription to crm"
        );
        Ok(Some(company))
    }
}
