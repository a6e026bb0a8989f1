//! Scenario runner and suite results.
//!
//! The runner owns the full lifecycle of every scenario it executes:
//! launch a driver, open a [`Session`] for the scenario's role, run, close,
//! and record the outcome. One scenario's failure never prevents the next
//! from starting unless fail-fast is requested.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::browser::{launch_browser, BrowserOptions};
use crate::config::{HarnessConfig, Role};
use crate::driver::BrowserDriver;
use crate::mock::GymAppSimulator;
use crate::registry::LocatorCatalog;
use crate::result::{FailureKind, ProbeError, ProbeResult};
use crate::scenario::Scenario;
use crate::session::Session;

/// Launches a fresh driver for each scenario
pub trait DriverFactory {
    /// Launch a driver for a session authenticated as `role`
    ///
    /// # Errors
    ///
    /// Returns an error if no browser could be started.
    fn launch(&self, role: Role) -> ProbeResult<Box<dyn BrowserDriver>>;
}

impl<F> DriverFactory for F
where
    F: Fn(Role) -> ProbeResult<Box<dyn BrowserDriver>>,
{
    fn launch(&self, role: Role) -> ProbeResult<Box<dyn BrowserDriver>> {
        self(role)
    }
}

/// Real Chromium, one process per scenario
#[derive(Debug, Clone)]
pub struct ChromiumFactory {
    options: BrowserOptions,
}

impl ChromiumFactory {
    /// Launch with these options
    #[must_use]
    pub const fn new(options: BrowserOptions) -> Self {
        Self { options }
    }
}

impl DriverFactory for ChromiumFactory {
    fn launch(&self, _role: Role) -> ProbeResult<Box<dyn BrowserDriver>> {
        launch_browser(&self.options)
    }
}

/// In-memory Gym System, fresh state per scenario
#[derive(Debug, Clone)]
pub struct SimulatorFactory {
    simulator: GymAppSimulator,
}

impl SimulatorFactory {
    /// Serve this simulator
    #[must_use]
    pub const fn new(simulator: GymAppSimulator) -> Self {
        Self { simulator }
    }
}

impl DriverFactory for SimulatorFactory {
    fn launch(&self, _role: Role) -> ProbeResult<Box<dyn BrowserDriver>> {
        Ok(Box::new(self.simulator.clone().into_driver()))
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario id
    pub id: String,
    /// Scenario title
    pub title: String,
    /// Role it ran as
    pub role: Role,
    /// Whether it passed
    pub passed: bool,
    /// Failure classification
    pub failure: Option<FailureKind>,
    /// Error message if failed
    pub message: Option<String>,
    /// Wall time including session setup and teardown
    pub duration_ms: u64,
}

impl ScenarioResult {
    /// Create a passing result
    #[must_use]
    pub fn pass(scenario: &dyn Scenario) -> Self {
        Self {
            id: scenario.id().to_string(),
            title: scenario.title().to_string(),
            role: scenario.role(),
            passed: true,
            failure: None,
            message: None,
            duration_ms: 0,
        }
    }

    /// Create a failing result from the error that ended the scenario
    #[must_use]
    pub fn fail(scenario: &dyn Scenario, error: &ProbeError) -> Self {
        Self {
            passed: false,
            failure: Some(error.kind()),
            message: Some(error.to_string()),
            ..Self::pass(scenario)
        }
    }

    /// Set duration
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }
}

/// Results of a suite run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Individual results, in execution order
    pub results: Vec<ScenarioResult>,
    /// Total wall time
    pub duration_ms: u64,
    /// Scenarios selected but not run because of fail-fast
    pub skipped: usize,
}

impl SuiteResults {
    /// Check if all scenarios passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.skipped == 0 && self.results.iter().all(|r| r.passed)
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Scenarios run
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    /// Pretty-printed JSON report
    ///
    /// # Errors
    ///
    /// Returns a JSON error if serialization fails.
    pub fn to_json(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs scenarios, each in its own session
pub struct ScenarioRunner {
    config: HarnessConfig,
    catalog: Arc<LocatorCatalog>,
    factory: Box<dyn DriverFactory>,
    filter: Option<String>,
    fail_fast: bool,
}

impl std::fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("base_url", &self.config.base_url)
            .field("filter", &self.filter)
            .field("fail_fast", &self.fail_fast)
            .finish_non_exhaustive()
    }
}

impl ScenarioRunner {
    /// Create a runner for a validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured locators are invalid.
    pub fn new(config: HarnessConfig, factory: impl DriverFactory + 'static) -> ProbeResult<Self> {
        let catalog = Arc::new(config.locator_catalog()?);
        Ok(Self {
            config,
            catalog,
            factory: Box::new(factory),
            filter: None,
            fail_fast: false,
        })
    }

    /// Only run scenarios whose id or title contains `filter`
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Stop at the first failure
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// The configuration scenarios run against
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Scenarios of `suite` the filter selects, in suite order
    #[must_use]
    pub fn select<'s>(&self, suite: &'s [Box<dyn Scenario>]) -> Vec<&'s dyn Scenario> {
        suite
            .iter()
            .map(|scenario| &**scenario)
            .filter(|s| self.filter.as_deref().map_or(true, |f| s.matches(f)))
            .collect()
    }

    /// Run one scenario in a fresh session
    pub fn run_one(&self, scenario: &dyn Scenario) -> ScenarioResult {
        let start = Instant::now();
        let outcome = self.execute(scenario);
        let elapsed = start.elapsed();

        match outcome {
            Ok(()) => {
                info!(
                    id = scenario.id(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "scenario passed"
                );
                ScenarioResult::pass(scenario).with_duration(elapsed)
            }
            Err(e) => {
                warn!(id = scenario.id(), kind = %e.kind(), error = %e, "scenario failed");
                ScenarioResult::fail(scenario, &e).with_duration(elapsed)
            }
        }
    }

    fn execute(&self, scenario: &dyn Scenario) -> ProbeResult<()> {
        let role = scenario.role();
        let driver = self.factory.launch(role).map_err(|e| match e {
            ProbeError::SessionBootstrap { .. } => e,
            other => ProbeError::bootstrap(format!("browser launch: {other}")),
        })?;
        let session = Session::open(driver, &self.config, Arc::clone(&self.catalog), role)?;
        {
            let _entered = session.span().enter();
            info!(id = scenario.id(), title = scenario.title(), "running scenario");
            scenario.run(&session, &self.config)?;
        }
        session.close()
    }

    /// Run every selected scenario of `suite`
    pub fn run_suite(&self, suite: &[Box<dyn Scenario>]) -> SuiteResults {
        self.run_suite_with(suite, |_| {})
    }

    /// Like [`ScenarioRunner::run_suite`], reporting each result as it lands
    pub fn run_suite_with(
        &self,
        suite: &[Box<dyn Scenario>],
        mut on_result: impl FnMut(&ScenarioResult),
    ) -> SuiteResults {
        let start = Instant::now();
        let selected = self.select(suite);
        let mut results = SuiteResults::default();

        for (position, scenario) in selected.iter().enumerate() {
            let result = self.run_one(*scenario);
            on_result(&result);
            let failed = !result.passed;
            results.results.push(result);
            if failed && self.fail_fast {
                results.skipped = selected.len() - position - 1;
                break;
            }
        }

        results.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            passed = results.passed_count(),
            failed = results.failed_count(),
            skipped = results.skipped,
            "suite finished"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::default_suite;

    fn fast_config() -> HarnessConfig {
        let mut config = HarnessConfig::default();
        config.wait.timeout_ms = 500;
        config.wait.poll_interval_ms = 5;
        config.wait.alert_timeout_ms = 60;
        config
    }

    fn simulated_runner(config: HarnessConfig) -> ScenarioRunner {
        let sim = GymAppSimulator::from_config(&config).unwrap();
        ScenarioRunner::new(config, SimulatorFactory::new(sim)).unwrap()
    }

    mod runner_tests {
        use super::*;

        #[test]
        fn test_default_suite_passes_against_simulator() {
            let runner = simulated_runner(fast_config());
            let results = runner.run_suite(&default_suite());
            assert_eq!(results.total(), 5, "{results:?}");
            assert!(results.all_passed(), "{:?}", results.failures());
        }

        #[test]
        fn test_filter_selects_subset() {
            let runner = simulated_runner(fast_config()).with_filter("CT-STU");
            let suite = default_suite();
            assert_eq!(runner.select(&suite).len(), 1);
            let results = runner.run_suite(&suite);
            assert_eq!(results.total(), 1);
            assert_eq!(results.results[0].role, Role::Student);
        }

        #[test]
        fn test_launch_failure_is_bootstrap() {
            let factory = |_: Role| -> ProbeResult<Box<dyn BrowserDriver>> {
                Err(ProbeError::driver("chromium not found"))
            };
            let runner = ScenarioRunner::new(fast_config(), factory).unwrap();
            let results = runner.run_suite(&default_suite());
            assert_eq!(results.failed_count(), 5);
            assert!(results
                .results
                .iter()
                .all(|r| r.failure == Some(FailureKind::SessionBootstrap)));
        }

        #[test]
        fn test_fail_fast_skips_rest() {
            let mut config = fast_config();
            config.accounts.admin.password = "wrong".to_string();
            let sim = GymAppSimulator::new(
                &config.locator_catalog().unwrap(),
                config.base_url.clone(),
                crate::config::Accounts::default(),
            )
            .unwrap();
            let runner = ScenarioRunner::new(config, SimulatorFactory::new(sim))
                .unwrap()
                .with_fail_fast(true);

            let results = runner.run_suite(&default_suite());
            assert_eq!(results.total(), 1);
            assert_eq!(results.skipped, 4);
            assert!(!results.all_passed());
        }

        #[test]
        fn test_assertion_failure_is_classified() {
            let mut config = fast_config();
            config.success_markers.activity = vec!["saved".to_string()];
            let runner = simulated_runner(config).with_filter("CT-001");
            let results = runner.run_suite(&default_suite());
            assert_eq!(results.results[0].failure, Some(FailureKind::Assertion));
        }
    }

    mod results_tests {
        use super::*;

        #[test]
        fn test_results_serialize() {
            let results = SuiteResults {
                results: vec![ScenarioResult {
                    id: "CT-002".to_string(),
                    title: "Activity name is required".to_string(),
                    role: Role::Admin,
                    passed: false,
                    failure: Some(FailureKind::Assertion),
                    message: Some("Assertion failed: expected no alert, got x".to_string()),
                    duration_ms: 42,
                }],
                duration_ms: 50,
                skipped: 0,
            };
            let json = results.to_json().unwrap();
            assert!(json.contains("\"failure\": \"assertion\""));
            assert!(json.contains("\"role\": \"admin\""));
            let back: SuiteResults = serde_json::from_str(&json).unwrap();
            assert_eq!(back, results);
        }

        #[test]
        fn test_counts() {
            let results = SuiteResults::default();
            assert!(results.all_passed());
            assert_eq!(results.total(), 0);
            assert!(results.failures().is_empty());
        }
    }
}
