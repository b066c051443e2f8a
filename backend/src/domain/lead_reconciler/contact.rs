//! Contact resolution chain.
//!
//! Strategies run in order and the first one yielding an identifier wins:
//! the stored lead record, a remote lookup by email, then a lead-form
//! submission followed by bounded polling.

use tracing::{debug, error, info};

use super::{LeadReconciler, mapping};
use crate::domain::ports::LeadFormRequest;
use crate::domain::{CrmContactId, LeadRecord, SyncResult, User};

/// One link of the contact resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ContactStrategy {
    StoredLeadRecord,
    RemoteLookup,
    LeadFormCreation,
}

impl ContactStrategy {
    fn as_str(self) -> &'static str {
        match self {
            Self::StoredLeadRecord => "stored_lead_record",
            Self::RemoteLookup => "remote_lookup",
            Self::LeadFormCreation => "lead_form_creation",
        }
    }
}

pub(super) const CONTACT_RESOLUTION_CHAIN: [ContactStrategy; 3] = [
    ContactStrategy::StoredLeadRecord,
    ContactStrategy::RemoteLookup,
    ContactStrategy::LeadFormCreation,
];

impl LeadReconciler {
    /// Return the CRM contact for `user`, creating it when none exists.
    ///
    /// A stored lead record is authoritative and short-circuits every remote
    /// call. Returns `None` when a freshly submitted lead form has not
    /// produced a contact within the polling budget.
    ///
    /// # Errors
    ///
    /// Returns an error when a CRM call or a repository operation fails.
    pub async fn resolve_or_create_contact(
        &self,
        user: &User,
    ) -> SyncResult<Option<CrmContactId>> {
        for strategy in CONTACT_RESOLUTION_CHAIN {
            if let Some(contact_id) = self.run_contact_strategy(strategy, user).await? {
                debug!(
                    user_id = %user.id(),
                    strategy = strategy.as_str(),
                    crm_contact_id = %contact_id,
                    "resolved crm contact"
                );
                return Ok(Some(contact_id));
            }
        }
        Ok(None)
    }

    /// Submit a lead form for `user` and wait for the CRM to expose the
    /// resulting contact, storing the mapping on success.
    ///
    /// # Errors
    ///
    /// Returns an error when the tracker lookup, a CRM call, or the lead
    /// record write fails.
    pub async fn create_contact(&self, user: &User) -> SyncResult<Option<CrmContactId>> {
        let tracker = self
            .trackers
            .find_by_user(&user.id())
            .await
            .map_err(mapping::tracker_error)?;
        let request = LeadFormRequest::for_user(user, tracker.as_ref());

        self.crm
            .create_lead_form(&request)
            .await
            .map_err(mapping::crm_error("submit lead form"))?;
        debug!(
            user_id = %user.id(),
            attributed = tracker.is_some(),
            "submitted crm lead form"
        );

        let Some(contact_id) = self.poll_new_contact(user).await? else {
            error!(
                user_id = %user.id(),
                attempts = self.contact_poll.max_retries + 1,
                "crm contact did not appear after lead form submission"
            );
            return Ok(None);
        };

        self.store_lead_record(user, &contact_id).await?;
        info!(user_id = %user.id(), crm_contact_id = %contact_id, "created crm contact");
        Ok(Some(contact_id))
    }

    async fn run_contact_strategy(
        &self,
        strategy: ContactStrategy,
        user: &User,
    ) -> SyncResult<Option<CrmContactId>> {
        match strategy {
            ContactStrategy::StoredLeadRecord => Ok(self
                .lead_records
                .find_by_user(&user.id())
                .await
                .map_err(mapping::lead_record_error)?
                .map(|record| record.contact_id)),
            ContactStrategy::RemoteLookup => {
                let Some(contact) = self
                    .crm
                    .get_contact(user)
                    .await
                    .map_err(mapping::crm_error("look up contact"))?
                else {
                    return Ok(None);
                };
                self.store_lead_record(user, &contact.id).await?;
                Ok(Some(contact.id))
            }
            ContactStrategy::LeadFormCreation => self.create_contact(user).await,
        }
    }

    async fn poll_new_contact(&self, user: &User) -> SyncResult<Option<CrmContactId>> {
        for retry in self.contact_poll.retries() {
            let delay = self.contact_poll.delay_before(retry);
            if !delay.is_zero() {
                self.sleeper.sleep(delay).await;
            }

            let found = self
                .crm
                .get_contact(user)
                .await
                .map_err(mapping::crm_error("poll new contact"))?;
            if let Some(contact) = found {
                return Ok(Some(contact.id));
            }
            debug!(user_id = %user.id(), attempt = retry + 1, "crm contact not visible yet");
        }
        Ok(None)
    }

    async fn store_lead_record(&self, user: &User, contact_id: &CrmContactId) -> SyncResult<()> {
        let record = LeadRecord {
            user_id: user.id(),
            contact_id: contact_id.clone(),
        };
        self.lead_records
            .upsert(&record)
            .await
            .map_err(mapping::lead_record_error)
    }
}
