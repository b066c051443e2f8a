//! Local mappings between host records and CRM records.
//!
//! `LeadRecord` and `OrganisationLink` are the only state this crate writes.
//! Once stored, their CRM identifiers are authoritative: lead records may be
//! refreshed by a later lookup, organisation links are never replaced.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{OrganisationId, UserId};

macro_rules! crm_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an identifier issued by the CRM.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

crm_identifier! {
    /// CRM identifier of a contact (an individual person).
    CrmContactId
}

crm_identifier! {
    /// CRM identifier of a company.
    CrmCompanyId
}

/// Mapping from a user to their CRM contact. At most one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    /// Host user.
    pub user_id: UserId,
    /// CRM contact discovered for the user.
    pub contact_id: CrmContactId,
}

/// Mapping from an organisation to its CRM company. At most one per
/// organisation, never replaced once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationLink {
    /// Host organisation.
    pub organisation_id: OrganisationId,
    /// CRM company the organisation is linked to.
    pub company_id: CrmCompanyId,
}

/// Acquisition metadata captured by the host when the user first arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracker {
    /// Opaque browser token used by the CRM to stitch page views to the
    /// contact.
    pub acquisition_token: Option<String>,
    /// Campaign attribution fields, typically `utm_*` values.
    pub campaign_fields: BTreeMap<String, String>,
}
