//! Reqwest-backed HubSpot CRM adapter.
//!
//! This adapter owns transport details only: endpoint construction, bearer
//! authentication, timeout and HTTP error mapping, and JSON decoding into
//! domain records.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{
    EMAIL_PROPERTY, FormSubmissionDto, ObjectDto, PropertiesPayload, SearchRequestDto,
    SearchResponseDto,
};
use crate::domain::ports::{
    CompanyUpdate, CrmClient, CrmClientError, CrmCompany, CrmContact, LeadFormRequest, NewCompany,
};
use crate::domain::{CrmCompanyId, CrmContactId, User};

const DEFAULT_USER_AGENT: &str = "lead-sync/0.1";

/// Connection settings for the HubSpot APIs.
#[derive(Debug, Clone)]
pub struct HubspotHttpConfig {
    /// Base URL of the CRM objects API.
    pub api_base_url: Url,
    /// Base URL of the Forms submission API.
    pub forms_base_url: Url,
    /// Private app access token sent as a bearer credential.
    pub access_token: String,
    /// Portal (account) owning the lead form.
    pub portal_id: String,
    /// Lead form identifier.
    pub form_id: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// HubSpot adapter implementing [`CrmClient`].
pub struct HubspotHttpClient {
    client: Client,
    api_base_url: Url,
    forms_base_url: Url,
    access_token: String,
    portal_id: String,
    form_id: String,
}

impl HubspotHttpClient {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    /// ```rust,ignore
    /// let client = HubspotHttpClient::new(config)?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: HubspotHttpConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            api_base_url: config.api_base_url,
            forms_base_url: config.forms_base_url,
            access_token: config.access_token,
            portal_id: config.portal_id,
            form_id: config.form_id,
        })
    }

    fn api(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, CrmClientError> {
        let url = endpoint(&self.api_base_url, segments)?;
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json"))
    }
}

#[async_trait]
impl CrmClient for HubspotHttpClient {
    async fn get_contact(&self, user: &User) -> Result<Option<CrmContact>, CrmClientError> {
        let request = self
            .api(
                Method::GET,
                &["crm", "v3", "objects", "contacts", user.email().as_ref()],
            )?
            .query(&[("idProperty", EMAIL_PROPERTY), ("properties", EMAIL_PROPERTY)]);

        let (status, body) = send(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        ensure_success(status, &body)?;
        let contact = decode::<ObjectDto>(&body, "contact")?;
        Ok(Some(contact.into_contact()))
    }

    async fn create_lead_form(&self, request: &LeadFormRequest) -> Result<(), CrmClientError> {
        let url = endpoint(
            &self.forms_base_url,
            &[
                "submissions",
                "v3",
                "integration",
                "submit",
                self.portal_id.as_str(),
                self.form_id.as_str(),
            ],
        )?;
        let submission = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&FormSubmissionDto::from(request));

        let (status, body) = send(submission).await?;
        ensure_success(status, &body)
    }

    async fn get_company_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<CrmCompany>, CrmClientError> {
        let request = self
            .api(
                Method::POST,
                &["crm", "v3", "objects", "companies", "search"],
            )?
            .json(&SearchRequestDto::company_by_domain(domain));

        let (status, body) = send(request).await?;
        ensure_success(status, &body)?;
        let search = decode::<SearchResponseDto>(&body, "company search")?;
        Ok(search.results.into_iter().next().map(ObjectDto::into_company))
    }

    async fn create_company(&self, company: &NewCompany) -> Result<CrmCompany, CrmClientError> {
        let request = self
            .api(Method::POST, &["crm", "v3", "objects", "companies"])?
            .json(&PropertiesPayload::new_company(company));

        let (status, body) = send(request).await?;
        ensure_success(status, &body)?;
        Ok(decode::<ObjectDto>(&body, "company")?.into_company())
    }

    async fn update_company(
        &self,
        company_id: &CrmCompanyId,
        update: &CompanyUpdate,
    ) -> Result<CrmCompany, CrmClientError> {
        let request = self
            .api(
                Method::PATCH,
                &["crm", "v3", "objects", "companies", company_id.as_str()],
            )?
            .json(&PropertiesPayload::company_update(update));

        let (status, body) = send(request).await?;
        ensure_success(status, &body)?;
        Ok(decode::<ObjectDto>(&body, "company")?.into_company())
    }

    async fn associate_contact_to_company(
        &self,
        contact_id: &CrmContactId,
        company_id: &CrmCompanyId,
    ) -> Result<(), CrmClientError> {
        let request = self.api(
            Method::PUT,
            &[
                "crm",
                "v4",
                "objects",
                "contacts",
                contact_id.as_str(),
                "associations",
                "default",
                "companies",
                company_id.as_str(),
            ],
        )?;

        let (status, body) = send(request).await?;
        ensure_success(status, &body)
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, CrmClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| CrmClientError::rejected(format!("base URL {base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn send(request: RequestBuilder) -> Result<(StatusCode, Vec<u8>), CrmClientError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    Ok((status, body.to_vec()))
}

fn ensure_success(status: StatusCode, body: &[u8]) -> Result<(), CrmClientError> {
    if status.is_success() {
        return Ok(());
    }
    let error = map_status_error(status, body);
    debug!(status = status.as_u16(), %error, "hubspot request failed");
    Err(error)
}

fn decode<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, CrmClientError> {
    serde_json::from_slice(body).map_err(|error| {
        CrmClientError::decode(format!("invalid HubSpot {what} payload: {error}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> CrmClientError {
    if error.is_timeout() {
        CrmClientError::timeout(error.to_string())
    } else {
        CrmClientError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CrmClientError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CrmClientError::unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => CrmClientError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            CrmClientError::timeout(message)
        }
        _ if status.is_client_error() => CrmClientError::rejected(message),
        _ => CrmClientError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
