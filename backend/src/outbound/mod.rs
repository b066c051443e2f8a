//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **hubspot**: reqwest-backed `CrmClient` over HubSpot's REST APIs
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod hubspot;
pub mod persistence;
