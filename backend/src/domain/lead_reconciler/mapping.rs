//! Mapping helpers from port failures to domain errors.

use serde_json::json;
use tracing::debug;

use crate::domain::Error;
use crate::domain::ports::{
    CrmClientError, LeadRecordRepositoryError, OrganisationLinkRepositoryError,
    TrackerRepositoryError,
};

pub(super) fn crm_error(operation: &'static str) -> impl FnOnce(CrmClientError) -> Error {
    move |error| {
        debug!(operation, transient = error.is_transient(), %error, "crm call failed");
        let mapped = if error.is_transient() {
            Error::service_unavailable(format!("crm unavailable during {operation}: {error}"))
        } else {
            Error::internal(format!("crm call failed during {operation}: {error}"))
        };
        mapped.with_details(json!({ "operation": operation }))
    }
}

pub(super) fn lead_record_error(error: LeadRecordRepositoryError) -> Error {
    match error {
        LeadRecordRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("lead record repository unavailable: {message}"))
        }
        LeadRecordRepositoryError::Query { message } => {
            Error::internal(format!("lead record repository error: {message}"))
        }
    }
}

pub(super) fn organisation_link_error(error: OrganisationLinkRepositoryError) -> Error {
    match error {
        OrganisationLinkRepositoryError::Connection { message } => Error::service_unavailable(
            format!("organisation link repository unavailable: {message}"),
        ),
        OrganisationLinkRepositoryError::Query { message } => {
            Error::internal(format!("organisation link repository error: {message}"))
        }
    }
}

pub(super) fn tracker_error(error: TrackerRepositoryError) -> Error {
    match error {
        TrackerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("tracker repository unavailable: {message}"))
        }
        TrackerRepositoryError::Query { message } => {
            Error::internal(format!("tracker repository error: {message}"))
        }
    }
}
