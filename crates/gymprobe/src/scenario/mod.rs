//! Scenarios: linear sequences of page operations followed by assertions.
//!
//! A scenario never launches or tears down a browser itself; it receives an
//! authenticated [`Session`] for its [`Scenario::role`] and only drives pages.

mod activity;
mod scheduling;

pub use activity::{NegativePath, PositivePath, SearchScenario};
pub use scheduling::StudentScheduling;

use crate::config::{HarnessConfig, Role, SuccessMarkers};
use crate::form::{ActivityForm, SchedulingForm};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::wait::Presence;

/// An executable test case
pub trait Scenario: std::fmt::Debug {
    /// Short identifier, e.g. `CT-001`
    fn id(&self) -> &str;

    /// One-line description
    fn title(&self) -> &str;

    /// Identity the session must be authenticated as
    fn role(&self) -> Role;

    /// Drive the pages and assert the outcome
    ///
    /// # Errors
    ///
    /// `AssertionFailed` on a wrong outcome; wait and driver errors
    /// propagate unchanged.
    fn run(&self, session: &Session, config: &HarnessConfig) -> ProbeResult<()>;

    /// Whether a `--filter` value selects this scenario (id or title,
    /// case-insensitive substring)
    fn matches(&self, filter: &str) -> bool {
        let filter = filter.to_lowercase();
        self.id().to_lowercase().contains(&filter) || self.title().to_lowercase().contains(&filter)
    }
}

/// Require a success alert containing one of `markers`; returns its text
pub(crate) fn expect_success(alert: Presence<String>, markers: &[String]) -> ProbeResult<String> {
    match alert {
        Presence::Present(text) if SuccessMarkers::matches(markers, &text) => Ok(text),
        Presence::Present(text) => Err(ProbeError::assertion(
            format!("success alert containing one of {markers:?}"),
            format!("alert '{text}'"),
        )),
        Presence::Absent => Err(ProbeError::assertion(
            format!("success alert containing one of {markers:?}"),
            "no alert",
        )),
    }
}

/// Test date and time typed into the scheduling dialog
const SCHEDULE_DATE: &str = "12-20-2025";
const SCHEDULE_TIME: &str = "14:30";

/// The Gym System regression suite
#[must_use]
pub fn default_suite() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(PositivePath::new(
            "CT-001",
            "Admin registers a new activity",
            Role::Admin,
            ActivityForm::named("Crossfit Advanced")
                .with_kind("Class")
                .with_description("High intensity functional training")
                .with_duration("60 min")
                .with_capacity("20")
                .with_professional("Prof. Carlos"),
        )),
        Box::new(NegativePath::new(
            "CT-002",
            "Activity name is required",
            Role::Admin,
            ActivityForm::named("")
                .with_kind("Workout")
                .with_duration("30 min")
                .with_capacity("5")
                .with_professional("Personal Ana"),
        )),
        Box::new(SearchScenario::new(
            "CT-003",
            "Admin searches activities",
            Role::Admin,
            ActivityForm::named("testclass Functional")
                .with_kind("Class")
                .with_duration("45 min")
                .with_capacity("12")
                .with_professional("Prof. Carlos"),
            "testclass",
        )),
        Box::new(PositivePath::new(
            "CT-PROF-001",
            "Professional registers an activity",
            Role::Professional,
            ActivityForm::named("Morning Yoga")
                .with_kind("Class")
                .with_description("Breathing and stretching for all levels")
                .with_duration("60")
                .with_capacity("15"),
        )),
        Box::new(StudentScheduling::new(
            "CT-STU-001",
            "Student schedules a class",
            SchedulingForm::new(SCHEDULE_DATE, SCHEDULE_TIME),
        )),
    ]
}
