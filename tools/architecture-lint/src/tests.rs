//! Unit tests for the architecture lint.

use std::path::{Path, PathBuf};

use rstest::rstest;

use super::*;

fn lint_single(file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
    lint_sources(&[LintSource {
        file: PathBuf::from(file),
        contents: contents.to_owned(),
    }])
}

#[rstest]
#[case::inbound_uses_domain(
    "inbound/cli.rs",
    "use crate::domain::UserId; fn run() { let _ = UserId::new(1); }",
    true
)]
#[case::inbound_uses_clap(
    "inbound/cli.rs",
    "use clap::Parser; #[derive(Parser)] struct Cli;",
    true
)]
#[case::inbound_uses_outbound(
    "inbound/cli.rs",
    "use crate::outbound::persistence::DieselAccountDirectory; fn run() {}",
    false
)]
#[case::inbound_uses_named_crate_outbound(
    "inbound/cli.rs",
    "use lead_sync::outbound::persistence::DbPool; fn run() {}",
    false
)]
#[case::inbound_uses_reqwest(
    "inbound/cli.rs",
    "fn run() { let _ = reqwest::Client::new(); }",
    false
)]
#[case::inbound_uses_bb8("inbound/cli.rs", "use bb8::Pool; fn run() {}", false)]
#[case::domain_uses_config(
    "domain/eligibility.rs",
    "use crate::config::AppConfig; fn run() {}",
    false
)]
#[case::domain_variable_named_config(
    "domain/eligibility.rs",
    "fn run(config: u8) -> u8 { config }",
    true
)]
#[case::domain_uses_test_support(
    "domain/lead_reconciler/mod.rs",
    "use crate::test_support::ScriptedCrmClient; fn run() {}",
    false
)]
#[case::ports_sleep_on_tokio(
    "domain/ports/crm_sleeper.rs",
    "async fn nap() { tokio::time::sleep(std::time::Duration::ZERO).await; }",
    true
)]
#[case::reconciler_sleeps_on_tokio(
    "domain/lead_reconciler/contact.rs",
    "async fn nap() { tokio::time::sleep(std::time::Duration::ZERO).await; }",
    false
)]
#[case::reconciler_uses_port_facade(
    "domain/lead_reconciler/company.rs",
    "use crate::domain::ports::{CrmCompany, NewCompany}; fn run() {}",
    true
)]
#[case::reconciler_reaches_port_submodule(
    "domain/lead_reconciler/company.rs",
    "use crate::domain::ports::crm_client::CrmCompany; fn run() {}",
    false
)]
#[case::reconciler_reaches_port_submodule_via_super(
    "domain/lead_reconciler/company.rs",
    "use super::super::ports::crm_client::NewCompany; fn run() {}",
    false
)]
#[case::ports_depend_on_reconciler(
    "domain/ports/crm_client.rs",
    "use super::super::lead_reconciler::LeadReconciler; fn run() {}",
    false
)]
#[case::ports_use_sibling_module(
    "domain/ports/mod.rs",
    "use self::crm_client::CrmCompany; fn run() {}",
    true
)]
#[case::hubspot_uses_reqwest(
    "outbound/hubspot/http_client.rs",
    "use reqwest::Client; fn run() {}",
    true
)]
#[case::hubspot_reaches_persistence(
    "outbound/hubspot/http_client.rs",
    "use super::super::persistence::DbPool; fn run() {}",
    false
)]
#[case::hubspot_uses_diesel(
    "outbound/hubspot/dto.rs",
    "fn run() { let _ = diesel::dsl::now; }",
    false
)]
#[case::persistence_uses_diesel(
    "outbound/persistence/models.rs",
    "use diesel::prelude::*; fn run() {}",
    true
)]
#[case::persistence_reaches_hubspot(
    "outbound/persistence/mod.rs",
    "use crate::outbound::hubspot::HubspotHttpClient; fn run() {}",
    false
)]
#[case::persistence_uses_reqwest(
    "outbound/persistence/pool.rs",
    "use reqwest::Client; fn run() {}",
    false
)]
#[case::outbound_uses_clap(
    "outbound/hubspot/http_client.rs",
    "use clap::Parser; fn run() {}",
    false
)]
fn detects_boundary_violations(#[case] file: &str, #[case] contents: &str, #[case] ok: bool) {
    let result = lint_single(file, contents);
    assert_eq!(result.is_ok(), ok, "result: {result:?}");
}

#[rstest]
#[case::test_module(
    "domain/lead_reconciler/mod.rs",
    "#[cfg(test)] mod tests { use crate::test_support::ScriptedCrmClient; }"
)]
#[case::test_import(
    "inbound/cli.rs",
    "#[cfg(test)] use crate::outbound::persistence::DbPool;"
)]
#[case::test_only_method(
    "outbound/hubspot/dto.rs",
    "struct Dto; impl Dto { #[cfg(test)] fn seed() { let _ = diesel::dsl::now; } }"
)]
fn cfg_test_items_are_ignored(#[case] file: &str, #[case] contents: &str) {
    let result = lint_single(file, contents);
    assert!(result.is_ok(), "result: {result:?}");
}

#[rstest]
#[case("inbound/cli/tests.rs")]
#[case("domain/ports/tests.rs")]
#[case("domain/tests/fixtures.rs")]
fn test_files_are_skipped(#[case] file: &str) {
    let result = lint_single(file, "use crate::test_support::ScriptedCrmClient;");
    assert!(result.is_ok(), "result: {result:?}");
}

#[rstest]
fn files_outside_linted_trees_are_rejected() {
    let result = lint_single("config.rs", "fn thing() {}");

    assert!(matches!(result, Err(ArchitectureLintError::Parse { .. })));
}

#[rstest]
#[case("domain/mod.rs", &["domain"])]
#[case("outbound/hubspot/dto.rs", &["outbound", "hubspot", "dto"])]
#[case("domain/lead_reconciler/mod.rs", &["domain", "lead_reconciler"])]
fn module_paths_follow_the_file_layout(#[case] file: &str, #[case] expected: &[&str]) {
    let module = module_path(Path::new(file)).expect("linted tree");
    assert_eq!(module, expected);
}

#[rstest]
fn one_violation_is_reported_per_rule() {
    let result = lint_single(
        "inbound/cli.rs",
        "use crate::outbound::persistence::DbPool; use crate::outbound::hubspot::HubspotHttpClient;",
    );

    let Err(ArchitectureLintError::Violations(violations)) = result else {
        panic!("expected violations, got: {result:?}");
    };
    assert_eq!(violations.len(), 1, "got: {violations:?}");
    assert_eq!(violations[0].message, "inbound must not depend on crate::outbound");
}
