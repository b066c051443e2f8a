//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the lead-sync repository
//! ports backed by PostgreSQL via Diesel with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Database-enforced uniqueness**: one lead per user and one link per
//!   organisation are unique constraints; races resolve in SQL.
//!
//! # Example
//!
//! ```ignore
//! use lead_sync::outbound::persistence::{DbPool, DieselLeadRecordRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/app")).await?;
//! let leads = DieselLeadRecordRepository::new(pool);
//! ```

mod diesel_account_directory;
mod diesel_basic_error_mapping;
mod diesel_lead_record_repository;
mod diesel_organisation_link_repository;
mod diesel_tracker_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_account_directory::DieselAccountDirectory;
pub use diesel_lead_record_repository::DieselLeadRecordRepository;
pub use diesel_organisation_link_repository::DieselOrganisationLinkRepository;
pub use diesel_tracker_repository::DieselTrackerRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
