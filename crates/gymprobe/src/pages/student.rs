use std::time::Duration;
use tracing::{debug, info};

use super::{Page, PageBase};
use crate::driver::ElementRef;
use crate::form::SchedulingForm;
use crate::registry::elements::student::{
    CONFIRM, DATE_INPUT, MODAL_TITLE, SCHEDULE_BUTTONS, SCHEDULE_LINK, TIME_INPUT,
};
use crate::registry::PageKind;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{Condition, Presence, DEFAULT_ALERT_TIMEOUT_MS};

/// Student home with the class scheduling flow
#[derive(Debug, Clone, Copy)]
pub struct StudentDashboard<'a> {
    base: PageBase<'a>,
    home_path: &'a str,
    alert_timeout: Duration,
}

impl<'a> StudentDashboard<'a> {
    /// Bind the student dashboard served under `home_path`
    #[must_use]
    pub const fn new(base: PageBase<'a>, home_path: &'a str) -> Self {
        Self {
            base,
            home_path,
            alert_timeout: Duration::from_millis(DEFAULT_ALERT_TIMEOUT_MS),
        }
    }

    /// Bound for the confirmation alert
    #[must_use]
    pub const fn with_alert_timeout(mut self, timeout: Duration) -> Self {
        self.alert_timeout = timeout;
        self
    }

    /// Open the list of schedulable classes
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if the link never becomes clickable.
    pub fn navigate_to_scheduling(&self) -> ProbeResult<()> {
        info!("opening class scheduling");
        self.base.click(SCHEDULE_LINK)
    }

    /// Pick the first class offering a "Schedule" button
    ///
    /// # Errors
    ///
    /// Returns `ElementIndexOutOfRange` when no class can be scheduled.
    pub fn select_first_schedulable_item(&self) -> ProbeResult<()> {
        self.select_schedulable_item(0)
    }

    /// Pick the `index`-th schedulable class, in document order.
    ///
    /// Waits up to the page's timeout for the list to populate; an empty or
    /// short list is an error, never a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns `ElementIndexOutOfRange` when fewer than `index + 1` buttons
    /// render, `WaitTimeout` if the chosen one never becomes clickable.
    pub fn select_schedulable_item(&self, index: usize) -> ProbeResult<()> {
        let locator = self.base.locator(SCHEDULE_BUTTONS)?;
        let wait = self.base.wait();
        let buttons = wait
            .try_await_optional(
                self.base.driver(),
                &Condition::AllPresent(locator.clone()),
                wait.timeout(),
            )?
            .into_option()
            .and_then(|satisfied| satisfied.into_elements())
            .unwrap_or_default();

        if index >= buttons.len() {
            return Err(ProbeError::ElementIndexOutOfRange {
                target: locator.to_string(),
                index,
                found: buttons.len(),
            });
        }

        let element = ElementRef::new(locator.clone(), index);
        let driver = self.base.driver();
        wait.await_until(&format!("element {element} to be clickable"), || {
            Ok(driver
                .find_all(locator)?
                .get(index)
                .is_some_and(|state| state.is_clickable())
                .then_some(()))
        })?;
        debug!(%element, found = buttons.len(), "selecting class");
        driver.click(&element)
    }

    /// Fill date and time once the confirmation dialog shows
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if the dialog never opens.
    pub fn fill_scheduling_form(&self, form: &SchedulingForm) -> ProbeResult<()> {
        self.base.visible(MODAL_TITLE)?;
        self.base.fill_named(DATE_INPUT, &form.date)?;
        self.base.fill_named(TIME_INPUT, &form.time)
    }

    /// Click the dialog's confirm control
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if it is not clickable.
    pub fn confirm_scheduling(&self) -> ProbeResult<()> {
        self.base.click(CONFIRM)
    }

    /// Capture and accept the confirmation alert if one opens in time
    ///
    /// # Errors
    ///
    /// Only driver errors.
    pub fn accept_alert(&self) -> ProbeResult<Presence<String>> {
        self.base.accept_alert_within(self.alert_timeout)
    }
}

impl Page for StudentDashboard<'_> {
    fn kind(&self) -> PageKind {
        PageKind::StudentDashboard
    }

    fn url_prefix(&self) -> &str {
        self.home_path
    }

    fn base(&self) -> &PageBase<'_> {
        &self.base
    }
}
