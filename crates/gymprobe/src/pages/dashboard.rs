use std::time::Duration;
use tracing::{debug, info};

use super::{Page, PageBase};
use crate::form::ActivityForm;
use crate::registry::elements::dashboard::{
    ACTIVITY_TITLES, FORM_NAME, FORM_SUBMIT, NEW_ACTIVITY, SEARCH_BOX,
};
use crate::registry::PageKind;
use crate::result::ProbeResult;
use crate::wait::{Presence, DEFAULT_ALERT_TIMEOUT_MS};

/// Activity dashboard shared by the admin and professional roles.
///
/// Both roles see the same catalog, creation dialog and search box; they
/// differ in home path and in whether the dialog asks for a professional.
#[derive(Debug, Clone, Copy)]
pub struct ActivityDashboard<'a> {
    base: PageBase<'a>,
    home_path: &'a str,
    alert_timeout: Duration,
}

impl<'a> ActivityDashboard<'a> {
    /// Bind the dashboard served under `home_path`
    #[must_use]
    pub const fn new(base: PageBase<'a>, home_path: &'a str) -> Self {
        Self {
            base,
            home_path,
            alert_timeout: Duration::from_millis(DEFAULT_ALERT_TIMEOUT_MS),
        }
    }

    /// Bound for the success alert after a submission
    #[must_use]
    pub const fn with_alert_timeout(mut self, timeout: Duration) -> Self {
        self.alert_timeout = timeout;
        self
    }

    /// Open the "new activity" dialog
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if the trigger never becomes clickable.
    pub fn open_creation_dialog(&self) -> ProbeResult<()> {
        self.base.click(NEW_ACTIVITY)
    }

    /// Write every present field of `form` into the open dialog
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if the dialog never shows, or a driver error.
    pub fn fill_activity_form(&self, form: &ActivityForm) -> ProbeResult<()> {
        self.base.visible(FORM_NAME)?;
        for (element, value) in form.fields() {
            self.base.fill_named(element, value)?;
        }
        debug!(name = %form.name, "activity form filled");
        Ok(())
    }

    /// Click the dialog's submit control
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if it is not clickable.
    pub fn submit_form(&self) -> ProbeResult<()> {
        self.base.click(FORM_SUBMIT)
    }

    /// Type `term` into the search box
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if the search box never shows.
    pub fn search_activities(&self, term: &str) -> ProbeResult<()> {
        info!(term, "searching activities");
        self.base.fill_named(SEARCH_BOX, term)
    }

    /// Titles of the rendered activity cards, in document order
    ///
    /// # Errors
    ///
    /// Propagates driver errors. An empty list is not an error.
    pub fn list_activity_titles(&self) -> ProbeResult<Vec<String>> {
        self.base.texts(ACTIVITY_TITLES)
    }

    /// Wait until the listed titles satisfy `settled`; returns them
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` carrying `description` if they never do.
    pub fn await_titles(
        &self,
        description: &str,
        settled: impl Fn(&[String]) -> bool,
    ) -> ProbeResult<Vec<String>> {
        self.base.wait().await_until(description, || {
            let titles = self.list_activity_titles()?;
            Ok(settled(&titles).then_some(titles))
        })
    }

    /// Capture and accept the success alert if one opens in time
    ///
    /// # Errors
    ///
    /// Only driver errors.
    pub fn accept_success_alert(&self) -> ProbeResult<Presence<String>> {
        self.base.accept_alert_within(self.alert_timeout)
    }

    /// Wait until a visible card is titled `name`
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if the card never renders.
    pub fn wait_for_title(&self, name: &str) -> ProbeResult<()> {
        let locator = self.base.locator(ACTIVITY_TITLES)?;
        let driver = self.base.driver();
        let description = format!("activity titled '{name}' to be listed");
        self.base.wait().await_until(&description, || {
            Ok(driver
                .find_all(locator)?
                .iter()
                .any(|state| state.visible && state.text.trim() == name)
                .then_some(()))
        })
    }
}

impl Page for ActivityDashboard<'_> {
    fn kind(&self) -> PageKind {
        PageKind::ActivityDashboard
    }

    fn url_prefix(&self) -> &str {
        self.home_path
    }

    fn base(&self) -> &PageBase<'_> {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Accounts, Role};
    use crate::driver::BrowserDriver;
    use crate::mock::{GymAppSimulator, MockDriver};
    use crate::pages::LoginPage;
    use crate::registry::LocatorCatalog;
    use crate::wait::WaitPolicy;

    const WAIT: WaitPolicy = WaitPolicy::from_millis(500, 5);

    fn logged_in(role: Role) -> (LocatorCatalog, MockDriver) {
        let catalog = LocatorCatalog::builtin().unwrap();
        let accounts = Accounts::default();
        let driver = GymAppSimulator::new(&catalog, "http://localhost:3000", accounts.clone())
            .unwrap()
            .into_driver();
        driver.navigate("http://localhost:3000").unwrap();
        let credentials = accounts.get(role);
        LoginPage::new(PageBase::new(&driver, catalog.registry(PageKind::Login), WAIT))
            .authenticate(&credentials.email, &credentials.password)
            .unwrap();
        (catalog, driver)
    }

    fn dashboard<'a>(
        catalog: &'a LocatorCatalog,
        driver: &'a MockDriver,
        home_path: &'a str,
    ) -> ActivityDashboard<'a> {
        let registry = catalog.registry(PageKind::ActivityDashboard);
        ActivityDashboard::new(PageBase::new(driver, registry, WAIT), home_path)
            .with_alert_timeout(Duration::from_millis(50))
    }

    fn crossfit() -> ActivityForm {
        ActivityForm::named("Crossfit Advanced")
            .with_kind("Class")
            .with_description("High intensity")
            .with_duration("60 min")
            .with_capacity("20")
            .with_professional("Prof. Carlos")
    }

    mod creation_tests {
        use super::*;

        #[test]
        fn test_admin_creates_activity() {
            let (catalog, driver) = logged_in(Role::Admin);
            let page = dashboard(&catalog, &driver, "/admin");
            assert!(page.is_current().unwrap());

            page.open_creation_dialog().unwrap();
            page.fill_activity_form(&crossfit()).unwrap();
            page.submit_form().unwrap();

            assert_eq!(
                page.accept_success_alert().unwrap(),
                Presence::Present("New activity registered!".to_string())
            );
            page.wait_for_title("Crossfit Advanced").unwrap();
            assert!(page
                .list_activity_titles()
                .unwrap()
                .contains(&"Crossfit Advanced".to_string()));
        }

        #[test]
        fn test_empty_name_yields_no_alert() {
            let (catalog, driver) = logged_in(Role::Admin);
            let page = dashboard(&catalog, &driver, "/admin");
            page.open_creation_dialog().unwrap();
            let form = ActivityForm {
                name: String::new(),
                ..crossfit()
            };
            page.fill_activity_form(&form).unwrap();
            page.submit_form().unwrap();

            assert_eq!(page.accept_success_alert().unwrap(), Presence::Absent);
            assert!(page.is_current().unwrap());
        }

        #[test]
        fn test_fill_without_dialog_times_out() {
            let (catalog, driver) = logged_in(Role::Admin);
            let page = dashboard(&catalog, &driver, "/admin");
            let err = page.fill_activity_form(&crossfit()).unwrap_err();
            assert!(err.is_timeout());
        }

        #[test]
        fn test_professional_dialog_delayed_render() {
            let catalog = LocatorCatalog::builtin().unwrap();
            let accounts = Accounts::default();
            let driver = GymAppSimulator::new(&catalog, "http://localhost:3000", accounts.clone())
                .unwrap()
                .with_render_delay(Duration::from_millis(30))
                .into_driver();
            driver.navigate("http://localhost:3000").unwrap();
            let professional = accounts.get(Role::Professional);
            LoginPage::new(PageBase::new(&driver, catalog.registry(PageKind::Login), WAIT))
                .authenticate(&professional.email, &professional.password)
                .unwrap();

            let page = dashboard(&catalog, &driver, "/professional");
            page.open_creation_dialog().unwrap();
            let form = ActivityForm::named("Morning Yoga")
                .with_kind("Class")
                .with_description("Breathing and stretching")
                .with_duration("60")
                .with_capacity("15");
            page.fill_activity_form(&form).unwrap();
            page.submit_form().unwrap();

            let alert = page.accept_success_alert().unwrap().into_option().unwrap();
            assert!(alert.contains("Morning Yoga"));
            page.wait_for_title("Morning Yoga").unwrap();
        }
    }

    mod search_tests {
        use super::*;

        #[test]
        fn test_search_filters_titles() {
            let (catalog, driver) = logged_in(Role::Admin);
            let page = dashboard(&catalog, &driver, "/admin");
            assert_eq!(page.list_activity_titles().unwrap().len(), 4);

            page.search_activities("PILATES").unwrap();
            assert_eq!(page.list_activity_titles().unwrap(), vec!["Pilates Mat"]);
        }

        #[test]
        fn test_search_without_match_is_empty() {
            let (catalog, driver) = logged_in(Role::Professional);
            let page = dashboard(&catalog, &driver, "/professional");
            page.search_activities("no such activity").unwrap();
            assert!(page.list_activity_titles().unwrap().is_empty());
        }

        #[test]
        fn test_listing_is_idempotent() {
            let (catalog, driver) = logged_in(Role::Admin);
            let page = dashboard(&catalog, &driver, "/admin");
            let first = page.list_activity_titles().unwrap();
            assert_eq!(page.list_activity_titles().unwrap(), first);
        }

        #[test]
        fn test_wait_for_missing_title_times_out() {
            let (catalog, driver) = logged_in(Role::Admin);
            let page = dashboard(&catalog, &driver, "/admin")
                .with_alert_timeout(Duration::from_millis(10));
            let page = ActivityDashboard {
                base: page.base.with_wait(WaitPolicy::from_millis(30, 5)),
                ..page
            };
            let err = page.wait_for_title("Aqua Aerobics").unwrap_err();
            assert!(err.to_string().contains("Aqua Aerobics"));
        }
    }
}
