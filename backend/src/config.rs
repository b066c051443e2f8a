//! Lead-sync configuration loaded via OrthoConfig.
//!
//! Values come from `LEAD_SYNC_*` environment variables or configuration
//! files. The environment provider turns `a,b` into a list and digit-only
//! values into numbers, so list and identifier fields accept either shape.
//! Quote a pattern that contains commas to keep it a single string.

use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::{Deserialize, Deserializer};

use crate::domain::{ContactPollPolicy, EligibilityConfig, LeadReconcilerConfig};
use crate::outbound::hubspot::HubspotHttpConfig;

const DEFAULT_HUBSPOT_API_BASE_URL: &str = "https://api.hubapi.com";
const DEFAULT_HUBSPOT_FORMS_BASE_URL: &str = "https://api.hsforms.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors raised when settings required by a command are missing or invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A required value was not configured.
    #[error("missing required setting {key}")]
    Missing { key: &'static str },
    /// A URL value could not be parsed.
    #[error("invalid URL for {key}: {message}")]
    InvalidUrl { key: &'static str, message: String },
}

/// Configuration values for lead tracking and its adapters.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LEAD_SYNC")]
pub struct LeadSyncSettings {
    /// Global tracking switch.
    #[ortho_config(default = false)]
    pub enabled: bool,
    /// Regex rejecting email domains (anchored at the start).
    pub ignore_domains_regex: Option<String>,
    /// Email domains never tracked.
    #[serde(default, deserialize_with = "string_list")]
    pub ignore_domains: Option<Vec<String>>,
    /// Email domains never turned into CRM companies.
    #[serde(default, deserialize_with = "string_list")]
    pub ignore_organisation_domains: Option<Vec<String>>,
    /// HubSpot private app token.
    pub hubspot_access_token: Option<String>,
    /// HubSpot CRM API base URL override.
    pub hubspot_api_base_url: Option<String>,
    /// HubSpot Forms API base URL override.
    pub hubspot_forms_base_url: Option<String>,
    /// HubSpot portal owning the lead form.
    #[serde(default, deserialize_with = "string_or_number")]
    pub hubspot_portal_id: Option<String>,
    /// HubSpot lead form identifier.
    #[serde(default, deserialize_with = "string_or_number")]
    pub hubspot_form_id: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Contact lookups retried after a lead-form submission.
    pub contact_poll_retries: Option<u32>,
    /// Linear delay step between contact lookups, in milliseconds.
    pub contact_poll_step_ms: Option<u64>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
}

impl LeadSyncSettings {
    /// Eligibility rules derived from the settings.
    pub fn eligibility_config(&self) -> EligibilityConfig {
        EligibilityConfig {
            enabled: self.enabled,
            ignore_domains_regex: self.ignore_domains_regex.clone(),
            ignore_domains: self.ignore_domains.clone().unwrap_or_default(),
        }
    }

    /// Reconciler configuration derived from the settings.
    pub fn reconciler_config(&self) -> LeadReconcilerConfig {
        let defaults = ContactPollPolicy::default();
        LeadReconcilerConfig {
            ignore_organisation_domains: self
                .ignore_organisation_domains
                .clone()
                .unwrap_or_default(),
            contact_poll: ContactPollPolicy {
                max_retries: self.contact_poll_retries.unwrap_or(defaults.max_retries),
                delay_step: self
                    .contact_poll_step_ms
                    .map_or(defaults.delay_step, Duration::from_millis),
            },
        }
    }

    /// HubSpot adapter settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the token, portal or form is missing,
    /// or a base URL override does not parse.
    pub fn hubspot_config(&self) -> Result<HubspotHttpConfig, SettingsError> {
        Ok(HubspotHttpConfig {
            api_base_url: parse_url(
                "hubspot_api_base_url",
                self.hubspot_api_base_url.as_deref(),
                DEFAULT_HUBSPOT_API_BASE_URL,
            )?,
            forms_base_url: parse_url(
                "hubspot_forms_base_url",
                self.hubspot_forms_base_url.as_deref(),
                DEFAULT_HUBSPOT_FORMS_BASE_URL,
            )?,
            access_token: required("hubspot_access_token", &self.hubspot_access_token)?,
            portal_id: required("hubspot_portal_id", &self.hubspot_portal_id)?,
            form_id: required("hubspot_form_id", &self.hubspot_form_id)?,
            timeout: Duration::from_secs(
                self.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        })
    }

    /// PostgreSQL connection URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when no URL is configured.
    pub fn database_url(&self) -> Result<String, SettingsError> {
        required("database_url", &self.database_url)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListValue {
    Many(Vec<String>),
    One(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarValue {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<ListValue>::deserialize(deserializer)?;
    Ok(value.map(|value| {
        let items = match value {
            ListValue::Many(items) => items,
            ListValue::One(item) => vec![item],
        };
        items
            .iter()
            .flat_map(|item| item.split(','))
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect()
    }))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<ScalarValue>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        ScalarValue::Text(text) => text,
        ScalarValue::Unsigned(number) => number.to_string(),
        ScalarValue::Signed(number) => number.to_string(),
    }))
}

fn required(key: &'static str, value: &Option<String>) -> Result<String, SettingsError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or(SettingsError::Missing { key })
}

fn parse_url(key: &'static str, value: Option<&str>, default: &str) -> Result<Url, SettingsError> {
    Url::parse(value.unwrap_or(default)).map_err(|error| SettingsError::InvalidUrl {
        key,
        message: error.to_string(),
    })
}
