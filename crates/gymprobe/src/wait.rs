//! Wait Policy: bounded polling until a UI condition holds.
//!
//! Every interaction in the page objects is preceded by an explicit wait on
//! a [`Condition`]. There are no fixed sleeps anywhere else in the harness;
//! the only suspension point is the poll loop in [`WaitPolicy`].

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::driver::{BrowserDriver, ElementRef, ElementState};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default bound for the success alert after a submission (5 seconds)
pub const DEFAULT_ALERT_TIMEOUT_MS: u64 = 5_000;

/// A UI state the harness can wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// At least one element matches
    Present(Locator),
    /// A matching element is visible
    Visible(Locator),
    /// A matching element is visible and enabled
    Clickable(Locator),
    /// The match set is non-empty; yields every match
    AllPresent(Locator),
    /// A native alert is open
    AlertPresent,
    /// The current URL's path starts with the prefix
    UrlPathPrefix(String),
}

impl Condition {
    /// Human-readable description used in timeout errors and logs
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Present(locator) => format!("element {locator} to be present"),
            Self::Visible(locator) => format!("element {locator} to be visible"),
            Self::Clickable(locator) => format!("element {locator} to be clickable"),
            Self::AllPresent(locator) => format!("at least one element matching {locator}"),
            Self::AlertPresent => "a native alert to open".to_string(),
            Self::UrlPathPrefix(prefix) => format!("URL path to start with '{prefix}'"),
        }
    }

    /// Observe the condition once
    fn check(&self, driver: &dyn BrowserDriver) -> ProbeResult<Option<Satisfied>> {
        match self {
            Self::Present(locator) => first_matching(driver, locator, |_| true),
            Self::Visible(locator) => first_matching(driver, locator, |s| s.visible),
            Self::Clickable(locator) => {
                first_matching(driver, locator, ElementState::is_clickable)
            }
            Self::AllPresent(locator) => {
                let count = driver.find_all(locator)?.len();
                Ok((count > 0).then(|| {
                    Satisfied::Elements(
                        (0..count)
                            .map(|index| ElementRef::new(locator.clone(), index))
                            .collect(),
                    )
                }))
            }
            Self::AlertPresent => Ok(driver.alert_text()?.map(Satisfied::Alert)),
            Self::UrlPathPrefix(prefix) => {
                let url = driver.current_url()?;
                Ok(url_path(&url)
                    .starts_with(prefix.as_str())
                    .then_some(Satisfied::Url(url)))
            }
        }
    }
}

fn first_matching(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    pred: fn(&ElementState) -> bool,
) -> ProbeResult<Option<Satisfied>> {
    let states = driver.find_all(locator)?;
    Ok(states
        .iter()
        .position(pred)
        .map(|index| Satisfied::Element(ElementRef::new(locator.clone(), index))))
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description())
    }
}

/// What a satisfied condition yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Satisfied {
    /// A single element
    Element(ElementRef),
    /// Every matching element, in document order
    Elements(Vec<ElementRef>),
    /// Text of the open alert
    Alert(String),
    /// The current URL
    Url(String),
}

impl Satisfied {
    /// The element, if this is a single-element result
    #[must_use]
    pub fn into_element(self) -> Option<ElementRef> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// The elements, if this is a multi-element result
    #[must_use]
    pub fn into_elements(self) -> Option<Vec<ElementRef>> {
        match self {
            Self::Elements(elements) => Some(elements),
            _ => None,
        }
    }

    /// The alert text, if this is an alert result
    #[must_use]
    pub fn into_alert(self) -> Option<String> {
        match self {
            Self::Alert(text) => Some(text),
            _ => None,
        }
    }
}

/// Explicit present/absent outcome, used where absence is expected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence<T> {
    /// The awaited thing showed up
    Present(T),
    /// The bound elapsed without it
    Absent,
}

impl<T> Presence<T> {
    /// Whether the value is present
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Convert to an `Option`
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Map the present value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Presence<U> {
        match self {
            Self::Present(value) => Presence::Present(f(value)),
            Self::Absent => Presence::Absent,
        }
    }
}

impl<T> From<Option<T>> for Presence<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

/// Bounded polling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitPolicy {
    /// Create a policy
    #[must_use]
    pub const fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Create a policy from millisecond values
    #[must_use]
    pub const fn from_millis(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_interval_ms),
        )
    }

    /// Same policy with a different timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Same policy with a different poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Timeout bound
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait for a condition using the policy's timeout
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if the condition never holds; driver errors
    /// propagate immediately.
    pub fn await_condition(
        &self,
        driver: &dyn BrowserDriver,
        condition: &Condition,
    ) -> ProbeResult<Satisfied> {
        self.await_condition_within(driver, condition, self.timeout)
    }

    /// Wait for a condition with a per-call timeout
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if the condition never holds within `timeout`.
    pub fn await_condition_within(
        &self,
        driver: &dyn BrowserDriver,
        condition: &Condition,
        timeout: Duration,
    ) -> ProbeResult<Satisfied> {
        let description = condition.description();
        self.poll(&description, timeout, || condition.check(driver))?
            .ok_or_else(|| ProbeError::WaitTimeout {
                condition: description,
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    /// Wait for a condition whose absence is an acceptable outcome
    ///
    /// # Errors
    ///
    /// Only driver errors; a timeout yields `Presence::Absent`.
    pub fn try_await_optional(
        &self,
        driver: &dyn BrowserDriver,
        condition: &Condition,
        timeout: Duration,
    ) -> ProbeResult<Presence<Satisfied>> {
        self.poll(&condition.description(), timeout, || condition.check(driver))
            .map(Presence::from)
    }

    /// Wait until `probe` yields a value, using the policy's timeout.
    ///
    /// For page-specific states the [`Condition`] set does not cover.
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` carrying `description`; probe errors propagate.
    pub fn await_until<T>(
        &self,
        description: &str,
        probe: impl FnMut() -> ProbeResult<Option<T>>,
    ) -> ProbeResult<T> {
        self.poll(description, self.timeout, probe)?
            .ok_or_else(|| ProbeError::WaitTimeout {
                condition: description.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })
    }

    /// Wait for the first visible match of a locator
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if no match becomes visible.
    pub fn await_visible(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
    ) -> ProbeResult<ElementRef> {
        self.await_element(driver, Condition::Visible(locator.clone()))
    }

    /// Wait for the first clickable match of a locator
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if no match becomes clickable.
    pub fn await_clickable(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
    ) -> ProbeResult<ElementRef> {
        self.await_element(driver, Condition::Clickable(locator.clone()))
    }

    /// Wait for the first match of a locator to exist
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if nothing matches.
    pub fn await_present(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
    ) -> ProbeResult<ElementRef> {
        self.await_element(driver, Condition::Present(locator.clone()))
    }

    /// Wait until a locator matches at least one element; returns every match
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if nothing matches.
    pub fn await_all_present(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
    ) -> ProbeResult<Vec<ElementRef>> {
        let condition = Condition::AllPresent(locator.clone());
        let satisfied = self.await_condition(driver, &condition)?;
        satisfied
            .into_elements()
            .ok_or_else(|| ProbeError::driver(format!("unexpected result for {condition}")))
    }

    fn await_element(
        &self,
        driver: &dyn BrowserDriver,
        condition: Condition,
    ) -> ProbeResult<ElementRef> {
        let satisfied = self.await_condition(driver, &condition)?;
        satisfied
            .into_element()
            .ok_or_else(|| ProbeError::driver(format!("unexpected result for {condition}")))
    }

    /// Poll until the probe yields or `timeout` elapses.
    ///
    /// The probe always runs at least once, and once more at the deadline.
    fn poll<T>(
        &self,
        description: &str,
        timeout: Duration,
        mut probe: impl FnMut() -> ProbeResult<Option<T>>,
    ) -> ProbeResult<Option<T>> {
        let start = Instant::now();

        loop {
            if let Some(value) = probe()? {
                debug!(
                    condition = description,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "condition satisfied"
                );
                return Ok(Some(value));
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                debug!(
                    condition = description,
                    timeout_ms = timeout.as_millis() as u64,
                    "condition not met"
                );
                return Ok(None);
            }
            std::thread::sleep(self.poll_interval.min(timeout - elapsed));
        }
    }
}

/// Path component of a URL; the input itself if it does not parse
#[must_use]
pub fn url_path(url: &str) -> String {
    url::Url::parse(url).map_or_else(|_| url.to_string(), |parsed| parsed.path().to_string())
}
