//! Diesel table definitions for the PostgreSQL schema.
//!
//! `crm_leads` and `crm_organisation_links` must match the embedded
//! migrations exactly. The remaining tables belong to the host application and
//! only declare the columns this crate reads.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// User to CRM contact mappings.
    ///
    /// `user_id` is unique; upserts replace the contact identifier.
    crm_leads (id) {
        id -> Int4,
        user_id -> Int4,
        /// Contact identifier issued by the CRM.
        crm_contact_id -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Organisation to CRM company mappings. Write-once per organisation.
    crm_organisation_links (id) {
        id -> Int4,
        organisation_id -> Int4,
        /// Company identifier issued by the CRM.
        crm_company_id -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Host user accounts.
    users (id) {
        id -> Int4,
        email -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
    }
}

diesel::table! {
    /// Host organisations.
    organisations (id) {
        id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    /// Host billing subscriptions, one per organisation.
    organisation_subscriptions (organisation_id) {
        organisation_id -> Int4,
        plan -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Host acquisition trackers, at most one per user.
    lead_trackers (user_id) {
        user_id -> Int4,
        /// Browser token recorded at signup.
        hutk -> Nullable<Varchar>,
        /// Campaign attribution fields as a flat JSON object.
        campaign_fields -> Jsonb,
    }
}
