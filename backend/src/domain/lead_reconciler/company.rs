//! Company resolution keyed by email domain.

use tracing::{debug, info, warn};

use super::{LeadReconciler, mapping};
use crate::domain::ports::{CompanyUpdate, CrmCompany, NewCompany, OrganisationLinkInsert};
use crate::domain::{CrmCompanyId, Organisation, OrganisationLink, SyncResult, User};

impl LeadReconciler {
    /// Return the CRM company for `organisation`, creating and linking it on
    /// first resolution.
    ///
    /// An existing link short-circuits every remote call, including name
    /// reconciliation. Returns `None` when the user's email domain is on the
    /// organisation deny-list.
    ///
    /// # Errors
    ///
    /// Returns an error when a CRM call or a repository operation fails.
    pub async fn resolve_or_create_company(
        &self,
        user: &User,
        organisation: &Organisation,
    ) -> SyncResult<Option<CrmCompanyId>> {
        if let Some(link) = self
            .organisation_links
            .find_by_organisation(&organisation.id())
            .await
            .map_err(mapping::organisation_link_error)?
        {
            return Ok(Some(link.company_id));
        }

        let domain = user.email_domain();
        if self.ignored_organisation_domains.contains(domain) {
            debug!(
                organisation_id = %organisation.id(),
                domain,
                "email domain is excluded from company creation"
            );
            return Ok(None);
        }

        let company = self.find_or_create_company(domain, organisation).await?;
        self.reconcile_company_name(&company, organisation).await?;
        let company_id = self.store_organisation_link(organisation, company.id).await?;
        Ok(Some(company_id))
    }

    async fn find_or_create_company(
        &self,
        domain: &str,
        organisation: &Organisation,
    ) -> SyncResult<CrmCompany> {
        if let Some(company) = self
            .crm
            .get_company_by_domain(domain)
            .await
            .map_err(mapping::crm_error("look up company"))?
        {
            return Ok(company);
        }

        let new_company = NewCompany {
            name: organisation.name().to_owned(),
            domain: domain.to_owned(),
            organisation_id: organisation.id(),
            active_subscription: organisation.subscription().plan().map(str::to_owned),
        };
        let company = self
            .crm
            .create_company(&new_company)
            .await
            .map_err(mapping::crm_error("create company"))?;
        info!(
            organisation_id = %organisation.id(),
            crm_company_id = %company.id,
            domain,
            "created crm company"
        );
        Ok(company)
    }

    async fn reconcile_company_name(
        &self,
        company: &CrmCompany,
        organisation: &Organisation,
    ) -> SyncResult<()> {
        if company.name.as_deref() == Some(organisation.name()) {
            return Ok(());
        }

        self.crm
            .update_company(&company.id, &CompanyUpdate::rename(organisation.name()))
            .await
            .map_err(mapping::crm_error("rename company"))?;
        debug!(
            crm_company_id = %company.id,
            previous = company.name.as_deref().unwrap_or_default(),
            current = organisation.name(),
            "renamed crm company"
        );
        Ok(())
    }

    async fn store_organisation_link(
        &self,
        organisation: &Organisation,
        company_id: CrmCompanyId,
    ) -> SyncResult<CrmCompanyId> {
        let link = OrganisationLink {
            organisation_id: organisation.id(),
            company_id,
        };
        match self
            .organisation_links
            .create(&link)
            .await
            .map_err(mapping::organisation_link_error)?
        {
            OrganisationLinkInsert::Created => Ok(link.company_id),
            OrganisationLinkInsert::AlreadyLinked(existing) => {
                warn!(
                    organisation_id = %organisation.id(),
                    resolved = %link.company_id,
                    stored = %existing.company_id,
                    "organisation was linked concurrently; keeping stored company"
                );
                Ok(existing.company_id)
            }
        }
    }
}
