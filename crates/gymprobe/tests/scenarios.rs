//! End-to-end scenarios against the in-memory Gym System.
//!
//! Every test opens real sessions through the public API: login, page
//! objects, waits and teardown all run exactly as they would against
//! Chromium; only the driver underneath is simulated.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use gymprobe::mock::{MockElement, MockEvent};
use gymprobe::prelude::*;
use gymprobe::{url_path, Accounts, SuccessMarkers};
use proptest::prelude::*;
use std::rc::Rc;
use std::sync::Arc;

fn fast_config() -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.wait.timeout_ms = 500;
    config.wait.poll_interval_ms = 5;
    config.wait.alert_timeout_ms = 60;
    config
}

fn open(config: &HarnessConfig, role: Role) -> Session {
    let driver = GymAppSimulator::from_config(config).unwrap().into_driver();
    Session::open(
        Box::new(driver),
        config,
        Arc::new(config.locator_catalog().unwrap()),
        role,
    )
    .unwrap()
}

fn valid_form(name: &str) -> ActivityForm {
    ActivityForm::named(name)
        .with_kind("Class")
        .with_duration("60 min")
        .with_capacity("20")
        .with_professional("Prof. Carlos")
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn test_admin_creates_crossfit_advanced() {
    let config = fast_config();
    let session = open(&config, Role::Admin);
    let dashboard = session.activity_dashboard();

    dashboard.open_creation_dialog().unwrap();
    dashboard
        .fill_activity_form(&valid_form("Crossfit Advanced"))
        .unwrap();
    dashboard.submit_form().unwrap();

    let alert = dashboard.accept_success_alert().unwrap();
    let message = alert.into_option().expect("success alert");
    assert!(message.to_lowercase().contains("registered"));

    dashboard.wait_for_title("Crossfit Advanced").unwrap();
    assert!(dashboard
        .list_activity_titles()
        .unwrap()
        .contains(&"Crossfit Advanced".to_string()));
    session.close().unwrap();
}

#[test]
fn test_empty_name_keeps_admin_on_dashboard() {
    let config = fast_config();
    let session = open(&config, Role::Admin);
    let dashboard = session.activity_dashboard();

    dashboard.open_creation_dialog().unwrap();
    let form = ActivityForm::named("")
        .with_kind("Workout")
        .with_duration("30 min")
        .with_capacity("5")
        .with_professional("Personal Ana");
    dashboard.fill_activity_form(&form).unwrap();
    dashboard.submit_form().unwrap();

    assert_eq!(dashboard.accept_success_alert().unwrap(), Presence::Absent);
    assert!(url_path(&session.current_url().unwrap()).starts_with("/admin"));
}

#[test]
fn test_search_testclass() {
    let config = fast_config();
    let session = open(&config, Role::Admin);
    let dashboard = session.activity_dashboard();

    dashboard.open_creation_dialog().unwrap();
    dashboard
        .fill_activity_form(&valid_form("testclass Functional"))
        .unwrap();
    dashboard.submit_form().unwrap();
    assert!(dashboard.accept_success_alert().unwrap().is_present());

    dashboard.search_activities("testclass").unwrap();
    let titles = dashboard.list_activity_titles().unwrap();
    assert!(!titles.is_empty());
    assert!(titles.iter().all(|t| t.to_lowercase().contains("testclass")));
}

#[test]
fn test_student_schedules_class() {
    let config = fast_config();
    let session = open(&config, Role::Student);
    let student = session.student_dashboard();

    student.navigate_to_scheduling().unwrap();
    student.select_first_schedulable_item().unwrap();
    student
        .fill_scheduling_form(&SchedulingForm::new("12-20-2025", "14:30"))
        .unwrap();
    student.confirm_scheduling().unwrap();
    assert!(student.accept_alert().unwrap().is_present());
}

#[test]
fn test_student_with_empty_catalog_fails_loudly() {
    let config = fast_config();
    let driver = GymAppSimulator::from_config(&config)
        .unwrap()
        .without_activities()
        .into_driver();
    let session = Session::open(
        Box::new(driver),
        &config,
        Arc::new(config.locator_catalog().unwrap()),
        Role::Student,
    )
    .unwrap();
    let student = session.student_dashboard();

    student.navigate_to_scheduling().unwrap();
    let err = student.select_first_schedulable_item().unwrap_err();
    assert!(matches!(err, ProbeError::ElementIndexOutOfRange { found: 0, .. }));
}

#[test]
fn test_session_drop_quits_browser_after_failure() {
    let config = fast_config();
    let mock = Rc::new(GymAppSimulator::from_config(&config).unwrap().into_driver());
    let outcome = {
        let session = Session::open(
            Box::new(Rc::clone(&mock)),
            &config,
            Arc::new(config.locator_catalog().unwrap()),
            Role::Admin,
        )
        .unwrap();
        session.student_dashboard().navigate_to_scheduling()
    };
    assert!(outcome.unwrap_err().is_timeout());
    assert!(mock.was_called("quit"));
}

#[test]
fn test_description_lands_in_read_only_textarea() {
    let config = fast_config();
    let mock = Rc::new(GymAppSimulator::from_config(&config).unwrap().into_driver());
    let session = Session::open(
        Box::new(Rc::clone(&mock)),
        &config,
        Arc::new(config.locator_catalog().unwrap()),
        Role::Admin,
    )
    .unwrap();
    let dashboard = session.activity_dashboard();

    dashboard.open_creation_dialog().unwrap();
    dashboard
        .fill_activity_form(&valid_form("Aqua Gym").with_description("Low impact"))
        .unwrap();

    let description = Locator::css("textarea[name='description']");
    assert_eq!(
        mock.with_dom(|dom| dom.value_of(&description)).as_deref(),
        Some("Low impact")
    );
}

// ============================================================================
// Scenario assertions
// ============================================================================

fn open_on(config: &HarnessConfig, role: Role, driver: MockDriver) -> Session {
    Session::open(
        Box::new(driver),
        config,
        Arc::new(config.locator_catalog().unwrap()),
        role,
    )
    .unwrap()
}

fn assertion_parts(err: ProbeError) -> (String, String) {
    match err {
        ProbeError::AssertionFailed { expected, actual } => (expected, actual),
        other => panic!("expected an assertion failure, got {other:?}"),
    }
}

#[test]
fn test_negative_path_fails_when_alert_appears() {
    let config = fast_config();
    let session = open(&config, Role::Admin);
    let scenario = NegativePath::new(
        "CT-002",
        "Activity name is required",
        Role::Admin,
        valid_form("Spinning"),
    );

    let (_, actual) = assertion_parts(scenario.run(&session, &config).unwrap_err());
    assert!(actual.contains("registered"), "{actual}");
}

#[test]
fn test_negative_path_fails_on_navigation_within_prefix() {
    let config = fast_config();
    let submit = Locator::css("button[type='submit']");
    let driver = GymAppSimulator::from_config(&config)
        .unwrap()
        .into_driver()
        .with_reaction(move |dom, event| {
            if matches!(event, MockEvent::Clicked(element) if element.locator == submit) {
                dom.set_url("http://localhost:3000/admin/activities/broken");
            }
        });
    let session = open_on(&config, Role::Admin, driver);
    let scenario = NegativePath::new("CT-002", "Activity name is required", Role::Admin, valid_form(""));

    let (expected, actual) = assertion_parts(scenario.run(&session, &config).unwrap_err());
    assert!(expected.contains("unchanged"), "{expected}");
    assert_eq!(actual, "/admin/activities/broken");
}

#[test]
fn test_negative_path_fails_when_leaving_the_dashboard() {
    let config = fast_config();
    let submit = Locator::css("button[type='submit']");
    let driver = GymAppSimulator::from_config(&config)
        .unwrap()
        .into_driver()
        .with_reaction(move |dom, event| {
            if matches!(event, MockEvent::Clicked(element) if element.locator == submit) {
                dom.set_url("http://localhost:3000/error");
            }
        });
    let session = open_on(&config, Role::Admin, driver);
    let scenario = NegativePath::new("CT-002", "Activity name is required", Role::Admin, valid_form(""));

    let (expected, actual) = assertion_parts(scenario.run(&session, &config).unwrap_err());
    assert!(expected.contains("starting with"), "{expected}");
    assert_eq!(actual, "/error");
}

#[test]
fn test_search_fails_when_results_ignore_the_query() {
    let config = fast_config();
    let search = Locator::css(".search-box input");
    let titles = Locator::css(".activity-card h3");
    let driver = GymAppSimulator::from_config(&config)
        .unwrap()
        .into_driver()
        .with_reaction(move |dom, _| {
            if dom.value_of(&search).is_some_and(|query| !query.is_empty()) {
                dom.set_elements(
                    &titles,
                    vec![
                        MockElement::new("Free Weights"),
                        MockElement::new("testclass Functional"),
                    ],
                );
            }
        });
    let session = open_on(&config, Role::Admin, driver);
    let scenario = SearchScenario::new(
        "CT-003",
        "Admin searches activities",
        Role::Admin,
        valid_form("testclass Functional"),
        "testclass",
    );

    let (expected, actual) = assertion_parts(scenario.run(&session, &config).unwrap_err());
    assert!(expected.contains("testclass"), "{expected}");
    assert!(actual.contains("Free Weights"), "{actual}");
}

// ============================================================================
// Suite and runner
// ============================================================================

#[test]
fn test_default_suite_via_runner() {
    let config = fast_config();
    let sim = GymAppSimulator::from_config(&config).unwrap();
    let runner = ScenarioRunner::new(config, SimulatorFactory::new(sim)).unwrap();
    let results = runner.run_suite(&default_suite());
    assert!(results.all_passed(), "{:#?}", results.failures());
    assert_eq!(results.passed_count(), 5);
}

#[test]
fn test_portuguese_build_with_locator_overrides() {
    let yaml = include_str!("../../../config/gym-system.pt-BR.yaml");
    let mut config = HarnessConfig::from_yaml_str(yaml).unwrap();
    config.wait.timeout_ms = 500;
    config.wait.poll_interval_ms = 5;
    config.wait.alert_timeout_ms = 60;
    config.validate().unwrap();

    let catalog = config.locator_catalog().unwrap();
    assert_ne!(catalog, LocatorCatalog::builtin().unwrap());

    // The simulator renders Portuguese locators but keeps English alert texts
    config.success_markers = SuccessMarkers::default();
    let sim = GymAppSimulator::from_config(&config).unwrap();
    let runner = ScenarioRunner::new(config, SimulatorFactory::new(sim)).unwrap();
    let results = runner.run_suite(&default_suite());
    assert!(results.all_passed(), "{:#?}", results.failures());
}

#[test]
fn test_credentials_from_config_reach_login() {
    let mut config = fast_config();
    config.accounts = Accounts::default();
    config.accounts.professional.email = "ana@gym.com".to_string();
    let sim = GymAppSimulator::from_config(&config).unwrap();
    let session = Session::open(
        Box::new(sim.into_driver()),
        &config,
        Arc::new(config.locator_catalog().unwrap()),
        Role::Professional,
    )
    .unwrap();
    assert!(session.activity_dashboard().is_current().unwrap());
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_valid_payload_is_listed(
        name in "[A-Z][a-z]{3,10}( [A-Z][a-z]{2,8})?",
        capacity in 1u32..200,
    ) {
        let config = fast_config();
        let session = open(&config, Role::Admin);
        let dashboard = session.activity_dashboard();

        dashboard.open_creation_dialog().unwrap();
        let form = valid_form(&name).with_capacity(capacity.to_string());
        dashboard.fill_activity_form(&form).unwrap();
        dashboard.submit_form().unwrap();

        let message = dashboard.accept_success_alert().unwrap().into_option();
        prop_assert!(message.is_some_and(|m| m.to_lowercase().contains("registered")));
        dashboard.wait_for_title(&name).unwrap();
        prop_assert!(dashboard.list_activity_titles().unwrap().contains(&name));
    }

    #[test]
    fn prop_empty_name_never_succeeds(
        kind in prop::sample::select(vec!["Class", "Workout"]),
        capacity in 1u32..50,
    ) {
        let config = fast_config();
        let session = open(&config, Role::Admin);
        let dashboard = session.activity_dashboard();
        let before = url_path(&session.current_url().unwrap());

        dashboard.open_creation_dialog().unwrap();
        let form = ActivityForm::named("")
            .with_kind(kind)
            .with_duration("30 min")
            .with_capacity(capacity.to_string())
            .with_professional("Personal Ana");
        dashboard.fill_activity_form(&form).unwrap();
        dashboard.submit_form().unwrap();

        prop_assert_eq!(dashboard.accept_success_alert().unwrap(), Presence::Absent);
        prop_assert_eq!(url_path(&session.current_url().unwrap()), before);
    }

    #[test]
    fn prop_search_only_returns_matches(term in "zq[a-z]{4}") {
        let config = fast_config();
        let session = open(&config, Role::Professional);
        let dashboard = session.activity_dashboard();

        dashboard.open_creation_dialog().unwrap();
        let form = ActivityForm::named(format!("Yoga {term}"))
            .with_kind("Class")
            .with_duration("45")
            .with_capacity("10");
        dashboard.fill_activity_form(&form).unwrap();
        dashboard.submit_form().unwrap();
        prop_assert!(dashboard.accept_success_alert().unwrap().is_present());

        dashboard.search_activities(&term).unwrap();
        let titles = dashboard.list_activity_titles().unwrap();
        prop_assert_eq!(titles.len(), 1);
        prop_assert!(titles.iter().all(|t| t.contains(term.as_str())));
    }

    #[test]
    fn prop_listing_is_idempotent(query in "[a-z]{0,3}") {
        let config = fast_config();
        let session = open(&config, Role::Admin);
        let dashboard = session.activity_dashboard();
        dashboard.search_activities(&query).unwrap();

        let first = dashboard.list_activity_titles().unwrap();
        let second = dashboard.list_activity_titles().unwrap();
        prop_assert_eq!(first, second);
    }
}
