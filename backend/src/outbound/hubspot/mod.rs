//! HubSpot outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `CrmClient` port
//! over HubSpot's CRM objects and Forms APIs.

mod dto;
mod http_client;

pub use http_client::{HubspotHttpClient, HubspotHttpConfig};
