//! End-to-end reconciliation scenarios through the public crate API.
//!
//! The CRM and the repositories are in-memory doubles from
//! `lead_sync::test_support`, so these tests exercise the full command flow
//! without network or database access.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use lead_sync::domain::{
    ContactPollPolicy, CrmCompanyId, CrmContactId, EligibilityConfig, EligibilityFilter,
    EmailAddress, LeadReconciler, LeadReconcilerConfig, LeadReconcilerPorts,
    LeadReconcilerRuntime, LeadTrackingOutcome, Organisation, OrganisationId, Tracker, User,
    UserId,
};
use lead_sync::inbound::cli::{CommandReport, LeadSyncCommands};
use lead_sync::test_support::crm::{CrmCall, RecordingSleeper, ScriptedCrmClient};
use lead_sync::test_support::repositories::{
    InMemoryAccountDirectory, InMemoryLeadRecordRepository, InMemoryOrganisationLinkRepository,
    InMemoryTrackerRepository,
};
use rstest::{fixture, rstest};

const USER_ID: i32 = 501;
const ORGANISATION_ID: i32 = 77;

#[fixture]
fn user() -> User {
    User::new(
        UserId::new(USER_ID),
        EmailAddress::new("marie@Radium.org").expect("valid email"),
        "Marie",
        "Curie",
    )
}

#[fixture]
fn organisation() -> Organisation {
    Organisation::new(OrganisationId::new(ORGANISATION_ID), "Radium Labs").with_plan("enterprise")
}

struct World {
    crm: Arc<ScriptedCrmClient>,
    lead_records: Arc<InMemoryLeadRecordRepository>,
    organisation_links: Arc<InMemoryOrganisationLinkRepository>,
    sleeper: Arc<RecordingSleeper>,
    commands: LeadSyncCommands,
}

impl World {
    fn new(crm: ScriptedCrmClient, user: User, organisation: Organisation) -> Self {
        Self::with_links(
            crm,
            InMemoryOrganisationLinkRepository::default(),
            user,
            organisation,
        )
    }

    fn with_links(
        crm: ScriptedCrmClient,
        organisation_links: InMemoryOrganisationLinkRepository,
        user: User,
        organisation: Organisation,
    ) -> Self {
        let crm = Arc::new(crm);
        let lead_records = Arc::new(InMemoryLeadRecordRepository::default());
        let organisation_links = Arc::new(organisation_links);
        let sleeper = Arc::new(RecordingSleeper::default());
        let tracker = Tracker {
            acquisition_token: Some("hutk-501".to_owned()),
            campaign_fields: BTreeMap::from([("utm_source".to_owned(), "newsletter".to_owned())]),
        };
        let trackers = InMemoryTrackerRepository::default().with_tracker(user.id(), tracker);

        let eligibility = EligibilityFilter::new(EligibilityConfig {
            enabled: true,
            ignore_domains_regex: Some(r".*\.invalid".to_owned()),
            ignore_domains: vec!["mailinator.com".to_owned()],
        })
        .expect("valid eligibility config");
        let reconciler = LeadReconciler::with_runtime(
            LeadReconcilerPorts::new(
                crm.clone(),
                lead_records.clone(),
                organisation_links.clone(),
                Arc::new(trackers),
            ),
            eligibility,
            LeadReconcilerRuntime {
                sleeper: sleeper.clone(),
            },
            LeadReconcilerConfig {
                ignore_organisation_domains: vec!["gmail.com".to_owned()],
                contact_poll: ContactPollPolicy::default(),
            },
        );
        let accounts = InMemoryAccountDirectory::default()
            .with_user(user)
            .with_organisation(organisation);

        Self {
            crm,
            lead_records,
            organisation_links,
            sleeper,
            commands: LeadSyncCommands::new(reconciler, Arc::new(accounts)),
        }
    }

    async fn track(&self) -> LeadTrackingOutcome {
        let report = self
            .commands
            .track_lead(UserId::new(USER_ID), OrganisationId::new(ORGANISATION_ID))
            .await
            .expect("tracking succeeds");
        match report {
            CommandReport::TrackLead { outcome, .. } => outcome,
            other => panic!("unexpected report {other:?}"),
        }
    }
}

#[rstest]
#[tokio::test]
async fn new_user_is_created_through_lead_form_and_linked(
    user: User,
    organisation: Organisation,
) {
    let crm = ScriptedCrmClient::default()
        .with_contact_lookups(vec![None, None, Some("contact-501")])
        .with_created_company_id("company-77");
    let world = World::new(crm, user, organisation);

    let outcome = world.track().await;

    assert_eq!(
        outcome,
        LeadTrackingOutcome::Associated {
            contact_id: CrmContactId::new("contact-501"),
            company_id: CrmCompanyId::new("company-77"),
        }
    );
    assert_eq!(
        world.crm.call_labels(),
        vec![
            "get_contact",
            "create_lead_form",
            "get_contact",
            "get_contact",
            "get_company_by_domain",
            "create_company",
            "associate_contact_to_company",
        ]
    );
    assert_eq!(world.sleeper.recorded(), vec![Duration::from_millis(500)]);
    assert_eq!(
        world
            .lead_records
            .get(UserId::new(USER_ID))
            .map(|id| id.as_str().to_owned()),
        Some("contact-501".to_owned())
    );
    assert_eq!(
        world
            .organisation_links
            .get(OrganisationId::new(ORGANISATION_ID))
            .map(|id| id.as_str().to_owned()),
        Some("company-77".to_owned())
    );

    let calls = world.crm.calls();
    let Some(CrmCall::CreateLeadForm(request)) = calls.get(1) else {
        panic!("expected lead form submission, got {calls:?}");
    };
    assert_eq!(request.acquisition_token.as_deref(), Some("hutk-501"));
    let Some(CrmCall::CreateCompany(company)) = calls.get(5) else {
        panic!("expected company creation, got {calls:?}");
    };
    assert_eq!(company.domain, "radium.org");
    assert_eq!(company.active_subscription.as_deref(), Some("enterprise"));
}

#[rstest]
#[tokio::test]
async fn second_run_reuses_stored_mappings(user: User, organisation: Organisation) {
    let crm = ScriptedCrmClient::default()
        .with_contact_lookups(vec![Some("contact-501")])
        .with_company("company-77", "Radium Labs");
    let world = World::new(crm, user, organisation);

    let first = world.track().await;
    let first_calls = world.crm.calls().len();
    let second = world.track().await;

    assert_eq!(first, second);
    let second_run: Vec<_> = world.crm.call_labels().split_off(first_calls);
    assert_eq!(second_run, vec!["associate_contact_to_company"]);
    assert_eq!(world.organisation_links.create_count(), 1);
}

#[rstest]
#[tokio::test]
async fn subscription_sync_follows_tracking(user: User, organisation: Organisation) {
    let links = InMemoryOrganisationLinkRepository::default()
        .with_link(OrganisationId::new(ORGANISATION_ID), "company-77");
    let world = World::with_links(ScriptedCrmClient::default(), links, user, organisation);

    let report = world
        .commands
        .sync_subscription(OrganisationId::new(ORGANISATION_ID))
        .await
        .expect("sync succeeds");

    let CommandReport::SyncSubscription {
        company: Some(company),
        ..
    } = report
    else {
        panic!("expected a pushed subscription, got {report:?}");
    };
    assert_eq!(company.id.as_str(), "company-77");
    assert_eq!(world.crm.call_labels(), vec!["update_company"]);
}

#[rstest]
#[tokio::test]
async fn personal_mail_domain_tracks_contact_without_company(organisation: Organisation) {
    let user = User::new(
        UserId::new(USER_ID),
        EmailAddress::new("marie@gmail.com").expect("valid email"),
        "Marie",
        "Curie",
    );
    let crm = ScriptedCrmClient::default().with_contact_lookups(vec![Some("contact-501")]);
    let world = World::new(crm, user, organisation);

    let outcome = world.track().await;

    assert!(matches!(
        outcome,
        LeadTrackingOutcome::CompanyUnresolved { .. }
    ));
    assert_eq!(world.crm.call_labels(), vec!["get_contact"]);
    assert_eq!(world.organisation_links.create_count(), 0);
}

#[rstest]
#[case::regex("marie@lab.invalid")]
#[case::deny_list("marie@mailinator.com")]
#[tokio::test]
async fn ineligible_user_never_reaches_the_crm(organisation: Organisation, #[case] email: &str) {
    let user = User::new(
        UserId::new(USER_ID),
        EmailAddress::new(email).expect("valid email"),
        "Marie",
        "Curie",
    );
    let world = World::new(ScriptedCrmClient::default(), user, organisation);

    let outcome = world.track().await;

    assert_eq!(outcome, LeadTrackingOutcome::Ineligible);
    assert!(world.crm.calls().is_empty());
    assert_eq!(world.lead_records.write_count(), 0);
}
