//! In-memory repository and directory doubles.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::lock;
use crate::domain::ports::{
    AccountDirectory, AccountDirectoryError, LeadRecordRepository, LeadRecordRepositoryError,
    OrganisationLinkInsert, OrganisationLinkRepository, OrganisationLinkRepositoryError,
    TrackerRepository, TrackerRepositoryError,
};
use crate::domain::{
    CrmCompanyId, CrmContactId, LeadRecord, Organisation, OrganisationId, OrganisationLink,
    Tracker, User, UserId,
};

/// Lead records held in memory, counting writes.
#[derive(Default)]
pub struct InMemoryLeadRecordRepository {
    records: Mutex<BTreeMap<UserId, CrmContactId>>,
    writes: AtomicUsize,
}

impl InMemoryLeadRecordRepository {
    /// Seed a stored record without counting it as a write.
    pub fn with_record(self, user_id: UserId, contact_id: &str) -> Self {
        lock(&self.records, "lead records").insert(user_id, CrmContactId::new(contact_id));
        self
    }

    /// Stored contact for `user_id`.
    pub fn get(&self, user_id: UserId) -> Option<CrmContactId> {
        lock(&self.records, "lead records").get(&user_id).cloned()
    }

    /// Number of upserts observed.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeadRecordRepository for InMemoryLeadRecordRepository {
    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<LeadRecord>, LeadRecordRepositoryError> {
        Ok(self.get(*user_id).map(|contact_id| LeadRecord {
            user_id: *user_id,
            contact_id,
        }))
    }

    async fn upsert(&self, record: &LeadRecord) -> Result<(), LeadRecordRepositoryError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        lock(&self.records, "lead records").insert(record.user_id, record.contact_id.clone());
        Ok(())
    }
}

/// Write-once organisation links held in memory.
#[derive(Default)]
pub struct InMemoryOrganisationLinkRepository {
    links: Mutex<BTreeMap<OrganisationId, CrmCompanyId>>,
    creates: AtomicUsize,
}

impl InMemoryOrganisationLinkRepository {
    /// Seed a stored link without counting it as a write.
    pub fn with_link(self, organisation_id: OrganisationId, company_id: &str) -> Self {
        lock(&self.links, "organisation links")
            .insert(organisation_id, CrmCompanyId::new(company_id));
        self
    }

    /// Stored company for `organisation_id`.
    pub fn get(&self, organisation_id: OrganisationId) -> Option<CrmCompanyId> {
        lock(&self.links, "organisation links")
            .get(&organisation_id)
            .cloned()
    }

    /// Number of create attempts observed.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrganisationLinkRepository for InMemoryOrganisationLinkRepository {
    async fn find_by_organisation(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<OrganisationLink>, OrganisationLinkRepositoryError> {
        Ok(self.get(*organisation_id).map(|company_id| OrganisationLink {
            organisation_id: *organisation_id,
            company_id,
        }))
    }

    async fn create(
        &self,
        link: &OrganisationLink,
    ) -> Result<OrganisationLinkInsert, OrganisationLinkRepositoryError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let mut links = lock(&self.links, "organisation links");
        if let Some(existing) = links.get(&link.organisation_id) {
            return Ok(OrganisationLinkInsert::AlreadyLinked(OrganisationLink {
                organisation_id: link.organisation_id,
                company_id: existing.clone(),
            }));
        }
        links.insert(link.organisation_id, link.company_id.clone());
        Ok(OrganisationLinkInsert::Created)
    }
}

/// Trackers held in memory.
#[derive(Default)]
pub struct InMemoryTrackerRepository {
    trackers: Mutex<BTreeMap<UserId, Tracker>>,
}

impl InMemoryTrackerRepository {
    /// Seed a tracker for `user_id`.
    pub fn with_tracker(self, user_id: UserId, tracker: Tracker) -> Self {
        lock(&self.trackers, "trackers").insert(user_id, tracker);
        self
    }
}

#[async_trait]
impl TrackerRepository for InMemoryTrackerRepository {
    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Tracker>, TrackerRepositoryError> {
        Ok(lock(&self.trackers, "trackers").get(user_id).cloned())
    }
}

/// Users and organisations held in memory.
#[derive(Default)]
pub struct InMemoryAccountDirectory {
    users: Mutex<BTreeMap<UserId, User>>,
    organisations: Mutex<BTreeMap<OrganisationId, Organisation>>,
}

impl InMemoryAccountDirectory {
    /// Seed a user.
    pub fn with_user(self, user: User) -> Self {
        lock(&self.users, "users").insert(user.id(), user);
        self
    }

    /// Seed an organisation.
    pub fn with_organisation(self, organisation: Organisation) -> Self {
        lock(&self.organisations, "organisations").insert(organisation.id(), organisation);
        self
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<User>, AccountDirectoryError> {
        Ok(lock(&self.users, "users").get(user_id).cloned())
    }

    async fn find_organisation(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<Organisation>, AccountDirectoryError> {
        Ok(lock(&self.organisations, "organisations")
            .get(organisation_id)
            .cloned())
    }
}
