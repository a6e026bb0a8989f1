//! Page objects for the Gym System screens.
//!
//! Each page borrows the session's driver and its locator registry and owns
//! a [`WaitPolicy`]. Pages expose intention-level operations only; locators
//! never leak out of this module.

mod dashboard;
mod login;
mod student;

pub use dashboard::ActivityDashboard;
pub use login::LoginPage;
pub use student::StudentDashboard;

use std::time::Duration;
use tracing::{debug, warn};

use crate::driver::{BrowserDriver, ElementRef};
use crate::locator::Locator;
use crate::registry::{LocatorRegistry, PageKind};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{url_path, Condition, Presence, WaitPolicy};

/// A screen of the application
pub trait Page {
    /// Which page this is
    fn kind(&self) -> PageKind;

    /// URL path prefix the application shows this page under
    fn url_prefix(&self) -> &str;

    /// Shared driver/registry/wait handle
    fn base(&self) -> &PageBase<'_>;

    /// Page name for logs
    fn page_name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Whether the browser currently shows this page
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    fn is_current(&self) -> ProbeResult<bool> {
        let url = self.base().driver().current_url()?;
        Ok(url_path(&url).starts_with(self.url_prefix()))
    }
}

/// What every page object holds
#[derive(Debug, Clone, Copy)]
pub struct PageBase<'a> {
    driver: &'a dyn BrowserDriver,
    registry: &'a LocatorRegistry,
    wait: WaitPolicy,
}

impl<'a> PageBase<'a> {
    /// Bind a driver and a registry
    #[must_use]
    pub fn new(
        driver: &'a dyn BrowserDriver,
        registry: &'a LocatorRegistry,
        wait: WaitPolicy,
    ) -> Self {
        Self {
            driver,
            registry,
            wait,
        }
    }

    /// Same handle with a different wait policy
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// The driver
    #[must_use]
    pub fn driver(&self) -> &'a dyn BrowserDriver {
        self.driver
    }

    /// The wait policy
    #[must_use]
    pub const fn wait(&self) -> &WaitPolicy {
        &self.wait
    }

    /// Look up a locator by element name
    ///
    /// # Errors
    ///
    /// Returns `UnknownLocator` for names the registry lacks.
    pub fn locator(&self, name: &str) -> ProbeResult<&'a Locator> {
        self.registry.get(name)
    }

    /// Wait for a named element to be visible
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if it never shows.
    pub fn visible(&self, name: &str) -> ProbeResult<ElementRef> {
        self.wait.await_visible(self.driver, self.locator(name)?)
    }

    /// Wait for a named element to be clickable
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if it never becomes clickable.
    pub fn clickable(&self, name: &str) -> ProbeResult<ElementRef> {
        self.wait.await_clickable(self.driver, self.locator(name)?)
    }

    /// Wait for a named element to be clickable, then click it
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` or the driver's click error.
    pub fn click(&self, name: &str) -> ProbeResult<()> {
        let element = self.clickable(name)?;
        debug!(page = %self.registry.page(), element = name, "click");
        self.driver.click(&element)
    }

    /// Replace a control's value.
    ///
    /// Clears first, then types. A control that rejects the clear gets the
    /// whole value assigned directly and is never typed into. Empty values
    /// only clear.
    ///
    /// # Errors
    ///
    /// Propagates driver errors other than the rejected clear.
    pub fn fill(&self, element: &ElementRef, value: &str) -> ProbeResult<()> {
        match self.driver.clear(element) {
            Ok(()) => {}
            Err(ProbeError::InteractionRejected { reason, .. }) => {
                warn!(%element, %reason, "clear rejected, assigning value directly");
                return self.driver.set_value(element, value);
            }
            Err(e) => return Err(e),
        }
        if !value.is_empty() {
            self.driver.send_keys(element, value)?;
        }
        Ok(())
    }

    /// Wait for a named control to be visible, then fill it
    ///
    /// # Errors
    ///
    /// See [`PageBase::visible`] and [`PageBase::fill`].
    pub fn fill_named(&self, name: &str, value: &str) -> ProbeResult<()> {
        let element = self.visible(name)?;
        debug!(page = %self.registry.page(), element = name, "fill");
        self.fill(&element, value)
    }

    /// Text of every current match of a named element, in document order
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub fn texts(&self, name: &str) -> ProbeResult<Vec<String>> {
        Ok(self
            .driver
            .find_all(self.locator(name)?)?
            .into_iter()
            .map(|state| state.text)
            .collect())
    }

    /// Wait up to `timeout` for a native alert; capture and accept it
    ///
    /// # Errors
    ///
    /// Only driver errors; no alert yields `Presence::Absent`.
    pub fn accept_alert_within(&self, timeout: Duration) -> ProbeResult<Presence<String>> {
        let presence = self
            .wait
            .try_await_optional(self.driver, &Condition::AlertPresent, timeout)?
            .map(|satisfied| satisfied.into_alert());

        match presence {
            Presence::Present(Some(text)) => {
                self.driver.accept_alert()?;
                debug!(alert = %text, "accepted alert");
                Ok(Presence::Present(text))
            }
            Presence::Present(None) | Presence::Absent => {
                debug!(timeout_ms = timeout.as_millis() as u64, "no alert");
                Ok(Presence::Absent)
            }
        }
    }
}
