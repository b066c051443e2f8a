//! Port and runtime dependency bundles for the lead reconciler.

use std::sync::Arc;

use crate::domain::ports::{
    CrmClient, CrmSleeper, LeadRecordRepository, OrganisationLinkRepository, TokioSleeper,
    TrackerRepository,
};

/// Port bundle required by the lead reconciler.
pub struct LeadReconcilerPorts {
    /// Outbound CRM adapter.
    pub crm: Arc<dyn CrmClient>,
    /// Lead record persistence adapter.
    pub lead_records: Arc<dyn LeadRecordRepository>,
    /// Organisation link persistence adapter.
    pub organisation_links: Arc<dyn OrganisationLinkRepository>,
    /// Acquisition tracker lookup adapter.
    pub trackers: Arc<dyn TrackerRepository>,
}

impl LeadReconcilerPorts {
    /// Build a strongly-typed reconciler port bundle.
    pub fn new(
        crm: Arc<dyn CrmClient>,
        lead_records: Arc<dyn LeadRecordRepository>,
        organisation_links: Arc<dyn OrganisationLinkRepository>,
        trackers: Arc<dyn TrackerRepository>,
    ) -> Self {
        Self {
            crm,
            lead_records,
            organisation_links,
            trackers,
        }
    }
}

/// Runtime helpers used by the polling loop.
pub struct LeadReconcilerRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn CrmSleeper>,
}

impl Default for LeadReconcilerRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
        }
    }
}
