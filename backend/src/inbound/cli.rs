//! Command-line adapter driving the lead reconciler.
//!
//! Purpose: parse `lead-sync` subcommands, resolve identifiers through the
//! account directory, call the reconciler and render a one-line JSON report.
//! Failures stay domain [`Error`]s and map to sysexits-style exit codes.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{AccountDirectory, AccountDirectoryError, CrmCompany};
use crate::domain::{
    CrmCompanyId, CrmContactId, EligibilityFilter, EmailAddress, Error, ErrorCode,
    LeadReconciler, LeadTrackingOutcome, Organisation, OrganisationId, SyncResult, User, UserId,
};

/// `lead-sync` command arguments.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "lead-sync",
    about = "Synchronise users, organisations and subscriptions with the CRM",
    version
)]
pub struct Cli {
    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported operations.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Resolve contact and company for a user and associate them.
    TrackLead {
        /// Host user identifier.
        #[arg(long = "user-id", value_name = "id")]
        user_id: i32,
        /// Host organisation identifier.
        #[arg(long = "organisation-id", value_name = "id")]
        organisation_id: i32,
    },
    /// Submit a lead form for a user and wait for the contact to appear.
    CreateContact {
        /// Host user identifier.
        #[arg(long = "user-id", value_name = "id")]
        user_id: i32,
    },
    /// Push an organisation's active subscription plan to its company.
    SyncSubscription {
        /// Host organisation identifier.
        #[arg(long = "organisation-id", value_name = "id")]
        organisation_id: i32,
    },
    /// Evaluate the eligibility rules for an email address without I/O.
    CheckEligibility {
        /// Address to evaluate.
        #[arg(long, value_name = "address", value_parser = parse_email)]
        email: EmailAddress,
    },
    /// Apply pending database migrations.
    Migrate,
}

fn parse_email(raw: &str) -> Result<EmailAddress, String> {
    EmailAddress::new(raw).map_err(|error| error.to_string())
}

/// Company fields echoed in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyReport {
    /// CRM identifier.
    pub id: CrmCompanyId,
    /// Display name stored by the CRM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Active subscription plan stored by the CRM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_subscription: Option<String>,
}

impl From<CrmCompany> for CompanyReport {
    fn from(company: CrmCompany) -> Self {
        Self {
            id: company.id,
            name: company.name,
            active_subscription: company.active_subscription,
        }
    }
}

/// One-line JSON report printed on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum CommandReport {
    /// Outcome of `track-lead`.
    TrackLead {
        user_id: UserId,
        organisation_id: OrganisationId,
        outcome: LeadTrackingOutcome,
    },
    /// Outcome of `create-contact`.
    CreateContact {
        user_id: UserId,
        eligible: bool,
        contact_id: Option<CrmContactId>,
    },
    /// Outcome of `sync-subscription`; `None` when nothing was pushed.
    SyncSubscription {
        organisation_id: OrganisationId,
        company: Option<CompanyReport>,
    },
    /// Outcome of `check-eligibility`.
    CheckEligibility {
        email: String,
        domain: String,
        eligible: bool,
    },
    /// Migrations applied by `migrate`.
    Migrate {
        applied: Vec<String>,
    },
}

impl CommandReport {
    /// Render the report as a single JSON line.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|error| {
            json!({ "command": "unknown", "error": error.to_string() }).to_string()
        })
    }
}

/// Reconciler commands that need the CRM and the host directory.
pub struct LeadSyncCommands {
    reconciler: LeadReconciler,
    accounts: Arc<dyn AccountDirectory>,
}

impl LeadSyncCommands {
    /// Bundle the reconciler with the directory used to resolve identifiers.
    pub fn new(reconciler: LeadReconciler, accounts: Arc<dyn AccountDirectory>) -> Self {
        Self {
            reconciler,
            accounts,
        }
    }

    /// Run `track-lead`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown identifiers and propagates reconciler
    /// failures.
    pub async fn track_lead(
        &self,
        user_id: UserId,
        organisation_id: OrganisationId,
    ) -> SyncResult<CommandReport> {
        let user = self.user(user_id).await?;
        let organisation = self.organisation(organisation_id).await?;
        let outcome = self.reconciler.track_lead(&user, &organisation).await?;
        Ok(CommandReport::TrackLead {
            user_id,
            organisation_id,
            outcome,
        })
    }

    /// Run `create-contact`. Ineligible users are reported without I/O.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user and propagates reconciler
    /// failures.
    pub async fn create_contact(&self, user_id: UserId) -> SyncResult<CommandReport> {
        let user = self.user(user_id).await?;
        if !self.reconciler.should_track(&user) {
            return Ok(CommandReport::CreateContact {
                user_id,
                eligible: false,
                contact_id: None,
            });
        }
        let contact_id = self.reconciler.create_contact(&user).await?;
        Ok(CommandReport::CreateContact {
            user_id,
            eligible: true,
            contact_id,
        })
    }

    /// Run `sync-subscription`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown organisation and propagates
    /// reconciler failures.
    pub async fn sync_subscription(
        &self,
        organisation_id: OrganisationId,
    ) -> SyncResult<CommandReport> {
        let organisation = self.organisation(organisation_id).await?;
        let company = self
            .reconciler
            .update_company_active_subscription(organisation.subscription())
            .await?;
        Ok(CommandReport::SyncSubscription {
            organisation_id,
            company: company.map(CompanyReport::from),
        })
    }

    async fn user(&self, user_id: UserId) -> SyncResult<User> {
        self.accounts
            .find_user(&user_id)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} does not exist")))
    }

    async fn organisation(&self, organisation_id: OrganisationId) -> SyncResult<Organisation> {
        self.accounts
            .find_organisation(&organisation_id)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| {
                Error::not_found(format!("organisation {organisation_id} does not exist"))
            })
    }
}

/// Run `check-eligibility` against the configured rules.
pub fn check_eligibility(filter: &EligibilityFilter, email: &EmailAddress) -> CommandReport {
    CommandReport::CheckEligibility {
        email: email.as_ref().to_owned(),
        domain: email.domain().to_owned(),
        eligible: filter.allows_domain(email.domain()),
    }
}

fn map_directory_error(error: AccountDirectoryError) -> Error {
    debug!(%error, "account directory lookup failed");
    match error {
        AccountDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("account directory unavailable: {message}"))
        }
        AccountDirectoryError::Query { message } => {
            Error::internal(format!("account directory error: {message}"))
        }
    }
}

/// Sysexits-style status for a failed command.
pub fn exit_code_for(code: ErrorCode) -> u8 {
    match code {
        ErrorCode::InvalidRequest => 64,
        ErrorCode::NotFound => 66,
        ErrorCode::ServiceUnavailable => 69,
        ErrorCode::InternalError => 70,
    }
}
