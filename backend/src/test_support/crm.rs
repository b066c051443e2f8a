//! Scripted CRM client and sleepers for reconciler tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::lock;
use crate::domain::ports::{
    CompanyUpdate, CrmClient, CrmClientError, CrmCompany, CrmContact, CrmSleeper,
    LeadFormRequest, NewCompany,
};
use crate::domain::{CrmCompanyId, CrmContactId, User};

/// Sleeper that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl CrmSleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Sleeper that records requested durations without waiting.
#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    /// Durations requested so far.
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.0, "sleeper").clone()
    }

    /// Sum of all requested durations.
    pub fn total(&self) -> Duration {
        self.recorded().into_iter().sum()
    }
}

#[async_trait]
impl CrmSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0, "sleeper").push(duration);
    }
}

/// One call observed by [`ScriptedCrmClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrmCall {
    GetContact { email: String },
    CreateLeadForm(LeadFormRequest),
    GetCompanyByDomain { domain: String },
    CreateCompany(NewCompany),
    UpdateCompany {
        company_id: CrmCompanyId,
        update: CompanyUpdate,
    },
    Associate {
        contact_id: CrmContactId,
        company_id: CrmCompanyId,
    },
}

impl CrmCall {
    /// Short label used when asserting call order.
    pub fn label(&self) -> &'static str {
        match self {
            Self::GetContact { .. } => "get_contact",
            Self::CreateLeadForm(_) => "create_lead_form",
            Self::GetCompanyByDomain { .. } => "get_company_by_domain",
            Self::CreateCompany(_) => "create_company",
            Self::UpdateCompany { .. } => "update_company",
            Self::Associate { .. } => "associate_contact_to_company",
        }
    }
}

/// In-process CRM double answering from a script and logging every call.
///
/// Contact lookups pop from a queue and answer `None` once it is empty.
/// Company lookups answer with the configured company for any domain.
pub struct ScriptedCrmClient {
    contact_lookups: Mutex<VecDeque<Option<CrmContactId>>>,
    company: Mutex<Option<CrmCompany>>,
    created_company_id: CrmCompanyId,
    association_error: Mutex<Option<CrmClientError>>,
    calls: Mutex<Vec<CrmCall>>,
}

impl Default for ScriptedCrmClient {
    fn default() -> Self {
        Self {
            contact_lookups: Mutex::new(VecDeque::new()),
            company: Mutex::new(None),
            created_company_id: CrmCompanyId::new("company-created"),
            association_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedCrmClient {
    /// Script successive contact lookup answers.
    pub fn with_contact_lookups(self, answers: Vec<Option<&str>>) -> Self {
        *lock(&self.contact_lookups, "contact lookups") = answers
            .into_iter()
            .map(|answer| answer.map(CrmContactId::new))
            .collect();
        self
    }

    /// Answer company lookups with an existing company.
    pub fn with_company(self, id: &str, name: &str) -> Self {
        *lock(&self.company, "company") =
            Some(CrmCompany::new(CrmCompanyId::new(id)).with_name(name));
        self
    }

    /// Identifier assigned to companies created through this double.
    pub fn with_created_company_id(mut self, id: &str) -> Self {
        self.created_company_id = CrmCompanyId::new(id);
        self
    }

    /// Fail the next association call.
    pub fn failing_association(self, error: CrmClientError) -> Self {
        *lock(&self.association_error, "association error") = Some(error);
        self
    }

    /// Every call observed so far, in order.
    pub fn calls(&self) -> Vec<CrmCall> {
        lock(&self.calls, "calls").clone()
    }

    /// Labels of every call observed so far, in order.
    pub fn call_labels(&self) -> Vec<&'static str> {
        self.calls().iter().map(CrmCall::label).collect()
    }

    fn record(&self, call: CrmCall) {
        lock(&self.calls, "calls").push(call);
    }
}

#[async_trait]
impl CrmClient for ScriptedCrmClient {
    async fn get_contact(&self, user: &User) -> Result<Option<CrmContact>, CrmClientError> {
        self.record(CrmCall::GetContact {
            email: user.email().as_ref().to_owned(),
        });
        let answer = lock(&self.contact_lookups, "contact lookups")
            .pop_front()
            .flatten();
        Ok(answer.map(|id| CrmContact {
            id,
            email: Some(user.email().as_ref().to_owned()),
        }))
    }

    async fn create_lead_form(&self, request: &LeadFormRequest) -> Result<(), CrmClientError> {
        self.record(CrmCall::CreateLeadForm(request.clone()));
        Ok(())
    }

    async fn get_company_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<CrmCompany>, CrmClientError> {
        self.record(CrmCall::GetCompanyByDomain {
            domain: domain.to_owned(),
        });
        Ok(lock(&self.company, "company").clone())
    }

    async fn create_company(&self, company: &NewCompany) -> Result<CrmCompany, CrmClientError> {
        self.record(CrmCall::CreateCompany(company.clone()));
        Ok(CrmCompany {
            id: self.created_company_id.clone(),
            name: Some(company.name.clone()),
            domain: Some(company.domain.clone()),
            active_subscription: company.active_subscription.clone(),
        })
    }

    async fn update_company(
        &self,
        company_id: &CrmCompanyId,
        update: &CompanyUpdate,
    ) -> Result<CrmCompany, CrmClientError> {
        self.record(CrmCall::UpdateCompany {
            company_id: company_id.clone(),
            update: update.clone(),
        });
        Ok(CrmCompany {
            name: update.name.clone(),
            active_subscription: update.active_subscription.clone(),
            ..CrmCompany::new(company_id.clone())
        })
    }

    async fn associate_contact_to_company(
        &self,
        contact_id: &CrmContactId,
        company_id: &CrmCompanyId,
    ) -> Result<(), CrmClientError> {
        self.record(CrmCall::Associate {
            contact_id: contact_id.clone(),
            company_id: company_id.clone(),
        });
        match lock(&self.association_error, "association error").take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
