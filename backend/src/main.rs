//! `lead-sync` entry-point: loads settings, wires adapters and runs one
//! reconciler command, printing a JSON report.

use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Report, Result};
use ortho_config::OrthoConfig;
use serde_json::json;
use tokio::runtime::Builder;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt};

use lead_sync::config::LeadSyncSettings;
use lead_sync::domain::{
    EligibilityFilter, LeadReconciler, LeadReconcilerPorts, OrganisationId, UserId,
};
use lead_sync::inbound::cli::{
    Cli, Command, CommandReport, LeadSyncCommands, check_eligibility, exit_code_for,
};
use lead_sync::outbound::hubspot::HubspotHttpClient;
use lead_sync::outbound::persistence::{
    DbPool, DieselAccountDirectory, DieselLeadRecordRepository, DieselOrganisationLinkRepository,
    DieselTrackerRepository, PoolConfig, run_pending_migrations,
};

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let settings = LeadSyncSettings::load_from_iter([OsString::from("lead-sync")])
        .map_err(|err| Report::msg(err.to_string()))
        .wrap_err("failed to load lead-sync settings")?;

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build lead-sync runtime")?;
    runtime.block_on(run(cli.command, settings))
}

async fn run(command: Command, settings: LeadSyncSettings) -> Result<ExitCode> {
    let outcome = match command {
        Command::Migrate => {
            let database_url = settings.database_url()?;
            let applied = run_pending_migrations(&database_url).await?;
            Ok(CommandReport::Migrate { applied })
        }
        Command::CheckEligibility { email } => {
            let filter = EligibilityFilter::new(settings.eligibility_config())?;
            Ok(check_eligibility(&filter, &email))
        }
        Command::TrackLead {
            user_id,
            organisation_id,
        } => {
            build_commands(&settings)
                .await?
                .track_lead(UserId::new(user_id), OrganisationId::new(organisation_id))
                .await
        }
        Command::CreateContact { user_id } => {
            build_commands(&settings)
                .await?
                .create_contact(UserId::new(user_id))
                .await
        }
        Command::SyncSubscription { organisation_id } => {
            build_commands(&settings)
                .await?
                .sync_subscription(OrganisationId::new(organisation_id))
                .await
        }
    };

    match outcome {
        Ok(report) => {
            println!("{}", report.to_json_line());
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(code = ?err.code(), message = err.message(), "lead-sync command failed");
            println!("{}", json!({ "error": err }));
            Ok(ExitCode::from(exit_code_for(err.code())))
        }
    }
}

async fn build_commands(settings: &LeadSyncSettings) -> Result<LeadSyncCommands> {
    let pool = DbPool::new(PoolConfig::new(settings.database_url()?))
        .await
        .wrap_err("failed to build database pool")?;
    let crm = HubspotHttpClient::new(settings.hubspot_config()?)
        .wrap_err("failed to build hubspot client")?;
    let eligibility = EligibilityFilter::new(settings.eligibility_config())?;

    let reconciler = LeadReconciler::new(
        LeadReconcilerPorts::new(
            Arc::new(crm),
            Arc::new(DieselLeadRecordRepository::new(pool.clone())),
            Arc::new(DieselOrganisationLinkRepository::new(pool.clone())),
            Arc::new(DieselTrackerRepository::new(pool.clone())),
        ),
        eligibility,
        settings.reconciler_config(),
    );
    Ok(LeadSyncCommands::new(
        reconciler,
        Arc::new(DieselAccountDirectory::new(pool)),
    ))
}
