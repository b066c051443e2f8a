//! DTOs for HubSpot CRM and Forms payloads.
//!
//! Responses are decoded into these transport DTOs first, then mapped into
//! domain records (`CrmContact`, `CrmCompany`) in one pass. HubSpot returns
//! unset properties as `null`; those are dropped during mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::ports::{CompanyUpdate, CrmCompany, CrmContact, LeadFormRequest, NewCompany};
use crate::domain::{CrmCompanyId, CrmContactId};

pub(super) const EMAIL_PROPERTY: &str = "email";
const COMPANY_NAME_PROPERTY: &str = "name";
pub(super) const DOMAIN_PROPERTY: &str = "domain";
pub(super) const ORGANISATION_ID_PROPERTY: &str = "orgid";
pub(super) const ACTIVE_SUBSCRIPTION_PROPERTY: &str = "active_subscription";
const CONTACT_OBJECT_TYPE_ID: &str = "0-1";

#[derive(Debug, Deserialize)]
pub(super) struct ObjectDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) properties: BTreeMap<String, Option<String>>,
}

impl ObjectDto {
    fn into_properties(self) -> (String, BTreeMap<String, String>) {
        let properties = self
            .properties
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect();
        (self.id, properties)
    }

    pub(super) fn into_contact(self) -> CrmContact {
        let (id, mut properties) = self.into_properties();
        CrmContact {
            id: CrmContactId::new(id),
            email: properties.remove(EMAIL_PROPERTY),
        }
    }

    pub(super) fn into_company(self) -> CrmCompany {
        let (id, mut properties) = self.into_properties();
        CrmCompany {
            id: CrmCompanyId::new(id),
            name: properties.remove(COMPANY_NAME_PROPERTY),
            domain: properties.remove(DOMAIN_PROPERTY),
            active_subscription: properties.remove(ACTIVE_SUBSCRIPTION_PROPERTY),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponseDto {
    #[serde(default)]
    pub(super) results: Vec<ObjectDto>,
}

#[derive(Debug, Serialize)]
pub(super) struct PropertiesPayload {
    pub(super) properties: BTreeMap<String, String>,
}

impl PropertiesPayload {
    pub(super) fn new_company(company: &NewCompany) -> Self {
        let mut properties = BTreeMap::from([
            (COMPANY_NAME_PROPERTY.to_owned(), company.name.clone()),
            (DOMAIN_PROPERTY.to_owned(), company.domain.clone()),
            (
                ORGANISATION_ID_PROPERTY.to_owned(),
                company.organisation_id.to_string(),
            ),
        ]);
        if let Some(plan) = &company.active_subscription {
            properties.insert(ACTIVE_SUBSCRIPTION_PROPERTY.to_owned(), plan.clone());
        }
        Self { properties }
    }

    pub(super) fn company_update(update: &CompanyUpdate) -> Self {
        let properties = [
            (COMPANY_NAME_PROPERTY, &update.name),
            (ACTIVE_SUBSCRIPTION_PROPERTY, &update.active_subscription),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|value| (key.to_owned(), value.clone())))
        .collect();
        Self { properties }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SearchRequestDto {
    filter_groups: Vec<FilterGroupDto>,
    properties: Vec<&'static str>,
    limit: u8,
}

#[derive(Debug, Serialize)]
struct FilterGroupDto {
    filters: Vec<FilterDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterDto {
    property_name: &'static str,
    operator: &'static str,
    value: String,
}

impl SearchRequestDto {
    pub(super) fn company_by_domain(domain: &str) -> Self {
        Self {
            filter_groups: vec![FilterGroupDto {
                filters: vec![FilterDto {
                    property_name: DOMAIN_PROPERTY,
                    operator: "EQ",
                    value: domain.to_owned(),
                }],
            }],
            properties: vec![
                COMPANY_NAME_PROPERTY,
                DOMAIN_PROPERTY,
                ORGANISATION_ID_PROPERTY,
                ACTIVE_SUBSCRIPTION_PROPERTY,
            ],
            limit: 1,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormFieldDto {
    object_type_id: &'static str,
    name: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct FormContextDto {
    hutk: String,
}

#[derive(Debug, Serialize)]
pub(super) struct FormSubmissionDto {
    fields: Vec<FormFieldDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<FormContextDto>,
}

impl From<&LeadFormRequest> for FormSubmissionDto {
    fn from(request: &LeadFormRequest) -> Self {
        let identity = [
            (EMAIL_PROPERTY, &request.email),
            ("firstname", &request.first_name),
            ("lastname", &request.last_name),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value.clone()));
        let campaign = request
            .campaign_fields
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()));

        let fields = identity
            .chain(campaign)
            .map(|(name, value)| FormFieldDto {
                object_type_id: CONTACT_OBJECT_TYPE_ID,
                name,
                value,
            })
            .collect();
        let context = request
            .acquisition_token
            .as_ref()
            .filter(|token| !token.trim().is_empty())
            .map(|token| FormContextDto {
                hutk: token.clone(),
            });

        Self { fields, context }
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for HubSpot payload shapes.

    use super::*;
    use crate::domain::OrganisationId;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn maps_company_and_drops_null_properties() {
        let dto: ObjectDto = serde_json::from_value(json!({
            "id": "512",
            "properties": { "name": "Acme", "domain": "acme.io", "active_subscription": null }
        }))
        .expect("company JSON decodes");

        let company = dto.into_company();
        assert_eq!(company.id, CrmCompanyId::new("512"));
        assert_eq!(company.name.as_deref(), Some("Acme"));
        assert_eq!(company.domain.as_deref(), Some("acme.io"));
        assert!(company.active_subscription.is_none());
    }

    #[rstest]
    fn maps_contact_email() {
        let dto: ObjectDto = serde_json::from_value(json!({
            "id": "101",
            "properties": { "email": "ada@acme.io" }
        }))
        .expect("contact JSON decodes");

        let contact = dto.into_contact();
        assert_eq!(contact.id, CrmContactId::new("101"));
        assert_eq!(contact.email.as_deref(), Some("ada@acme.io"));
    }

    #[rstest]
    #[case::with_plan(Some("growth"), true)]
    #[case::without_plan(None, false)]
    fn new_company_payload_includes_identity(
        #[case] plan: Option<&str>,
        #[case] expect_plan: bool,
    ) {
        let payload = PropertiesPayload::new_company(&NewCompany {
            name: "Acme".to_owned(),
            domain: "acme.io".to_owned(),
            organisation_id: OrganisationId::new(70),
            active_subscription: plan.map(str::to_owned),
        });

        assert_eq!(payload.properties.get("orgid").map(String::as_str), Some("70"));
        assert_eq!(payload.properties.get("domain").map(String::as_str), Some("acme.io"));
        assert_eq!(
            payload.properties.contains_key(ACTIVE_SUBSCRIPTION_PROPERTY),
            expect_plan
        );
    }

    #[rstest]
    fn company_update_sends_only_provided_fields() {
        let payload = PropertiesPayload::company_update(&CompanyUpdate::rename("Acme Ltd"));
        assert_eq!(
            serde_json::to_value(&payload).expect("payload serialises"),
            json!({ "properties": { "name": "Acme Ltd" } })
        );
    }

    #[rstest]
    fn search_filters_on_domain() {
        let value = serde_json::to_value(SearchRequestDto::company_by_domain("acme.io"))
            .expect("search serialises");
        assert_eq!(
            value["filterGroups"][0]["filters"][0],
            json!({ "propertyName": "domain", "operator": "EQ", "value": "acme.io" })
        );
        assert_eq!(value["limit"], json!(1));
    }

    #[rstest]
    fn form_submission_carries_campaign_fields_and_token() {
        let request = LeadFormRequest {
            email: "ada@acme.io".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            acquisition_token: Some("hutk-1".to_owned()),
            campaign_fields: BTreeMap::from([("utm_source".to_owned(), "ads".to_owned())]),
        };

        let value = serde_json::to_value(FormSubmissionDto::from(&request))
            .expect("submission serialises");

        assert_eq!(value["context"], json!({ "hutk": "hutk-1" }));
        let names = value["fields"]
            .as_array()
            .expect("fields array")
            .iter()
            .map(|field| field["name"].as_str().unwrap_or_default().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["email", "firstname", "lastname", "utm_source"]);
    }

    #[rstest]
    fn form_submission_omits_blank_token() {
        let request = LeadFormRequest {
            email: "ada@acme.io".to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            acquisition_token: Some("  ".to_owned()),
            campaign_fields: BTreeMap::new(),
        };

        let value = serde_json::to_value(FormSubmissionDto::from(&request))
            .expect("submission serialises");
        assert!(value.get("context").is_none());
    }
}
