//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use diesel::prelude::*;

use super::schema::{
    crm_leads, crm_organisation_links, lead_trackers, organisation_subscriptions, organisations,
    users,
};

/// Row struct for reading from the crm_leads table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crm_leads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LeadRow {
    pub user_id: i32,
    pub crm_contact_id: String,
}

/// Insertable struct for creating or replacing lead records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crm_leads)]
pub(crate) struct NewLeadRow<'a> {
    pub user_id: i32,
    pub crm_contact_id: &'a str,
}

/// Row struct for reading from the crm_organisation_links table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crm_organisation_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrganisationLinkRow {
    pub organisation_id: i32,
    pub crm_company_id: String,
}

/// Insertable struct for creating organisation links.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crm_organisation_links)]
pub(crate) struct NewOrganisationLinkRow<'a> {
    pub organisation_id: i32,
    pub crm_company_id: &'a str,
}

/// Row struct for reading host users.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Row struct for reading host organisations.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = organisations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrganisationRow {
    pub id: i32,
    pub name: String,
}

/// Row struct for reading host subscriptions.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = organisation_subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SubscriptionRow {
    pub plan: Option<String>,
}

/// Row struct for reading host acquisition trackers.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = lead_trackers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TrackerRow {
    pub hutk: Option<String>,
    pub campaign_fields: serde_json::Value,
}
