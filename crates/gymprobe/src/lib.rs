//! Gymprobe: Page Object UI test harness for the Gym System web application
//!
//! Scenarios (login, activity registration, search, class scheduling) are
//! expressed against page objects; page objects resolve elements through a
//! per-page locator registry and wait on explicit UI conditions before
//! every interaction.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    GYMPROBE Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Page       │    │ Browser    │            │
//! │   │ Runner     │───►│ Objects    │───►│ Driver     │            │
//! │   │ + Session  │    │ + Waits    │    │ (chromium/ │            │
//! │   │            │    │ + Locators │    │  simulator)│            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use gymprobe::prelude::*;
//!
//! let config = HarnessConfig::load(None)?;
//! let runner = ScenarioRunner::new(config.clone(), ChromiumFactory::new(config.browser))?;
//! let results = runner.run_suite(&default_suite());
//! assert!(results.all_passed());
//! ```

#![warn(missing_docs)]

mod browser;
mod config;
mod driver;
mod form;
mod harness;
mod locator;
mod registry;
mod result;
mod session;
mod wait;

/// In-memory driver and Gym System simulator
pub mod mock;

/// Page objects for the login, activity and student screens
pub mod pages;

/// Built-in scenarios and the scenario contract
pub mod scenario;

pub use browser::{launch_browser, BrowserOptions};
#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use config::{
    global, install, Accounts, Credentials, HarnessConfig, Role, SuccessMarkers, WaitSettings,
    DEFAULT_BASE_URL, ENV_PREFIX,
};
pub use driver::{BrowserDriver, ElementRef, ElementState};
pub use form::{ActivityForm, SchedulingForm};
pub use harness::{
    ChromiumFactory, DriverFactory, ScenarioResult, ScenarioRunner, SimulatorFactory,
    SuiteResults,
};
pub use locator::{Locator, Strategy};
pub use registry::{
    elements, LocatorCatalog, LocatorOverrides, LocatorRegistry, PageKind, RegistryBuilder,
};
pub use result::{FailureKind, ProbeError, ProbeResult};
pub use session::Session;
pub use wait::{
    url_path, Condition, Presence, Satisfied, WaitPolicy, DEFAULT_ALERT_TIMEOUT_MS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Everything a suite author needs
pub mod prelude {
    pub use super::mock::{GymAppSimulator, MockDriver, SimulatedActivity};
    pub use super::pages::{ActivityDashboard, LoginPage, Page, StudentDashboard};
    pub use super::scenario::{
        default_suite, NegativePath, PositivePath, Scenario, SearchScenario, StudentScheduling,
    };
    pub use super::{
        ActivityForm, BrowserDriver, BrowserOptions, ChromiumFactory, Condition, DriverFactory,
        FailureKind, HarnessConfig, Locator, LocatorCatalog, Presence, ProbeError, ProbeResult,
        Role, ScenarioRunner, SchedulingForm, Session, SimulatorFactory, SuiteResults,
        WaitPolicy,
    };
}
