//! Session lifecycle: one browser, one base URL, one authenticated role.
//!
//! [`Session::open`] navigates to the application and logs in; the browser
//! is quit when the session is closed or dropped, whichever comes first, so
//! a failing or panicking scenario never leaks a browser process.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Span};
use uuid::Uuid;

use crate::config::{Credentials, HarnessConfig, Role};
use crate::driver::BrowserDriver;
use crate::pages::{ActivityDashboard, LoginPage, PageBase, StudentDashboard};
use crate::registry::{LocatorCatalog, PageKind};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{Condition, WaitPolicy};

/// A live, authenticated browser session
pub struct Session {
    id: Uuid,
    role: Role,
    credentials: Credentials,
    base_url: String,
    wait: WaitPolicy,
    alert_timeout: Duration,
    catalog: Arc<LocatorCatalog>,
    driver: Box<dyn BrowserDriver>,
    closed: bool,
    span: Span,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("base_url", &self.base_url)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Take ownership of `driver`, open the application and log in as `role`.
    ///
    /// Succeeds once the browser lands on the role's home path.
    ///
    /// # Errors
    ///
    /// Returns `SessionBootstrap` if navigation or login fails; the driver
    /// has been quit by then.
    pub fn open(
        driver: Box<dyn BrowserDriver>,
        config: &HarnessConfig,
        catalog: Arc<LocatorCatalog>,
        role: Role,
    ) -> ProbeResult<Self> {
        let id = Uuid::new_v4();
        let span = info_span!("session", id = %id, role = %role);
        let session = Self {
            id,
            role,
            credentials: config.accounts.get(role).clone(),
            base_url: config.base_url.clone(),
            wait: config.wait.policy(),
            alert_timeout: config.wait.alert_timeout(),
            catalog,
            driver,
            closed: false,
            span,
        };
        session
            .bootstrap()
            .map_err(|e| ProbeError::bootstrap(format!("{role} session: {e}")))?;
        Ok(session)
    }

    fn bootstrap(&self) -> ProbeResult<()> {
        let _entered = self.span.enter();
        info!(base_url = %self.base_url, "opening session");
        self.driver.navigate(&self.base_url)?;
        self.login_page()
            .authenticate(&self.credentials.email, &self.credentials.password)?;
        let landed = self.wait.await_condition(
            self.driver.as_ref(),
            &Condition::UrlPathPrefix(self.credentials.home_path.clone()),
        )?;
        info!(url = ?landed, "logged in");
        Ok(())
    }

    /// Session id used in log spans
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Authenticated role
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Path the role lands on after login
    #[must_use]
    pub fn home_path(&self) -> &str {
        &self.credentials.home_path
    }

    /// Wait policy handed to every page
    #[must_use]
    pub const fn wait(&self) -> WaitPolicy {
        self.wait
    }

    /// Span that scenario steps should run under
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// The underlying driver
    #[must_use]
    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    /// URL the browser currently shows
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub fn current_url(&self) -> ProbeResult<String> {
        self.driver.current_url()
    }

    fn page_base(&self, page: PageKind) -> PageBase<'_> {
        PageBase::new(self.driver.as_ref(), self.catalog.registry(page), self.wait)
    }

    /// Login page
    #[must_use]
    pub fn login_page(&self) -> LoginPage<'_> {
        LoginPage::new(self.page_base(PageKind::Login))
    }

    /// Admin or professional dashboard, bound to this role's home path
    #[must_use]
    pub fn activity_dashboard(&self) -> ActivityDashboard<'_> {
        ActivityDashboard::new(
            self.page_base(PageKind::ActivityDashboard),
            &self.credentials.home_path,
        )
        .with_alert_timeout(self.alert_timeout)
    }

    /// Student dashboard, bound to this role's home path
    #[must_use]
    pub fn student_dashboard(&self) -> StudentDashboard<'_> {
        StudentDashboard::new(
            self.page_base(PageKind::StudentDashboard),
            &self.credentials.home_path,
        )
        .with_alert_timeout(self.alert_timeout)
    }

    /// Quit the browser now
    ///
    /// # Errors
    ///
    /// Returns the driver's error; the session counts as closed either way.
    pub fn close(mut self) -> ProbeResult<()> {
        self.closed = true;
        let _entered = self.span.enter();
        info!("closing session");
        self.driver.quit()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _entered = self.span.enter();
        if let Err(e) = self.driver.quit() {
            warn!(error = %e, "browser teardown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{GymAppSimulator, MockDriver};
    use crate::pages::Page;
    use crate::result::FailureKind;
    use std::rc::Rc;

    fn config() -> HarnessConfig {
        let mut config = HarnessConfig::default();
        config.wait.timeout_ms = 300;
        config.wait.poll_interval_ms = 5;
        config.wait.alert_timeout_ms = 50;
        config
    }

    fn simulated(config: &HarnessConfig) -> Box<dyn BrowserDriver> {
        Box::new(GymAppSimulator::from_config(config).unwrap().into_driver())
    }

    fn catalog(config: &HarnessConfig) -> Arc<LocatorCatalog> {
        Arc::new(config.locator_catalog().unwrap())
    }

    mod open_tests {
        use super::*;

        #[test]
        fn test_open_lands_on_role_home() {
            let config = config();
            for role in Role::ALL {
                let session =
                    Session::open(simulated(&config), &config, catalog(&config), role).unwrap();
                assert_eq!(session.role(), role);
                assert_eq!(
                    session.current_url().unwrap(),
                    config.url_for(&config.accounts.get(role).home_path)
                );
                session.close().unwrap();
            }
        }

        #[test]
        fn test_wrong_password_is_bootstrap_failure() {
            let mut config = config();
            let sim = GymAppSimulator::from_config(&config).unwrap();
            config.accounts.admin.password = "not-the-password".to_string();

            let err = Session::open(
                Box::new(sim.into_driver()),
                &config,
                catalog(&config),
                Role::Admin,
            )
            .unwrap_err();
            assert_eq!(err.kind(), FailureKind::SessionBootstrap);
            assert!(err.to_string().contains("admin"));
        }

        #[test]
        fn test_pages_bind_home_path() {
            let config = config();
            let session =
                Session::open(simulated(&config), &config, catalog(&config), Role::Professional)
                    .unwrap();
            let dashboard = session.activity_dashboard();
            assert_eq!(dashboard.url_prefix(), "/professional");
            assert!(dashboard.is_current().unwrap());
        }
    }

    mod teardown_tests {
        use super::*;

        #[test]
        fn test_drop_quits_browser() {
            let config = config();
            let mock = Rc::new(GymAppSimulator::from_config(&config).unwrap().into_driver());
            {
                let _session = Session::open(
                    Box::new(Rc::clone(&mock)),
                    &config,
                    catalog(&config),
                    Role::Student,
                )
                .unwrap();
            }
            assert!(mock.was_called("quit"));
            assert!(mock.with_dom(|dom| dom.is_closed()));
        }

        #[test]
        fn test_failed_bootstrap_still_quits() {
            let config = config();
            let mock = Rc::new(MockDriver::new());
            let result = Session::open(
                Box::new(Rc::clone(&mock)),
                &config,
                catalog(&config),
                Role::Admin,
            );
            assert!(result.is_err());
            assert!(mock.was_called("quit"));
        }

        #[test]
        fn test_close_quits_once() {
            let config = config();
            let mock = Rc::new(GymAppSimulator::from_config(&config).unwrap().into_driver());
            let session = Session::open(
                Box::new(Rc::clone(&mock)),
                &config,
                catalog(&config),
                Role::Admin,
            )
            .unwrap();
            session.close().unwrap();
            let quits = mock.history().iter().filter(|c| *c == "quit").count();
            assert_eq!(quits, 1);
        }
    }
}
