//! Organisation and subscription data model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric organisation identifier assigned by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganisationId(i32);

impl OrganisationId {
    /// Wrap a raw identifier.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Access the raw identifier.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for OrganisationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Billing subscription owned by exactly one organisation.
///
/// A blank plan is treated the same as a missing one.
///
/// # Examples
/// ```
/// use lead_sync::domain::{OrganisationId, Subscription};
///
/// let free = Subscription::new(OrganisationId::new(1), Some("  ".to_owned()));
/// assert_eq!(free.plan(), None);
///
/// let paid = Subscription::new(OrganisationId::new(1), Some("scale-up".to_owned()));
/// assert_eq!(paid.plan(), Some("scale-up"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    organisation_id: OrganisationId,
    plan: Option<String>,
}

impl Subscription {
    /// Build a subscription for an organisation.
    pub fn new(organisation_id: OrganisationId, plan: Option<String>) -> Self {
        Self {
            organisation_id,
            plan,
        }
    }

    /// Owning organisation.
    pub fn organisation_id(&self) -> OrganisationId {
        self.organisation_id
    }

    /// Active plan identifier, if one is set.
    pub fn plan(&self) -> Option<&str> {
        self.plan
            .as_deref()
            .map(str::trim)
            .filter(|plan| !plan.is_empty())
    }
}

/// Customer organisation mirrored as a CRM company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    id: OrganisationId,
    name: String,
    subscription: Subscription,
}

impl Organisation {
    /// Build an organisation with a subscription that has no plan.
    pub fn new(id: OrganisationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            subscription: Subscription::new(id, None),
        }
    }

    /// Replace the subscription plan.
    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.subscription = Subscription::new(self.id, Some(plan.into()));
        self
    }

    /// Host identifier.
    pub fn id(&self) -> OrganisationId {
        self.id
    }

    /// Display name; the CRM company name tracks this value.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Owned subscription.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}
