//! CRM lead synchronisation library modules.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Tracking entry point re-exported for hosts embedding the reconciler.
pub use domain::LeadReconciler;
