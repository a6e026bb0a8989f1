use tracing::info;

use super::{expect_success, Scenario};
use crate::config::{HarnessConfig, Role};
use crate::form::ActivityForm;
use crate::pages::{ActivityDashboard, Page};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::wait::{url_path, Presence};

/// Open the dialog, fill it and submit
fn submit(dashboard: &ActivityDashboard<'_>, form: &ActivityForm) -> ProbeResult<()> {
    dashboard.open_creation_dialog()?;
    dashboard.fill_activity_form(form)?;
    dashboard.submit_form()
}

/// Wait for a card titled `name`, reporting a timeout as a missing listing
fn expect_listed(dashboard: &ActivityDashboard<'_>, name: &str) -> ProbeResult<()> {
    match dashboard.wait_for_title(name) {
        Err(e) if e.is_timeout() => Err(ProbeError::assertion(
            format!("'{name}' among the listed activities"),
            format!("{:?}", dashboard.list_activity_titles()?),
        )),
        other => other,
    }
}

/// Register an activity and expect the success alert and a new card
#[derive(Debug, Clone)]
pub struct PositivePath {
    id: String,
    title: String,
    role: Role,
    form: ActivityForm,
}

impl PositivePath {
    /// Create the scenario
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        role: Role,
        form: ActivityForm,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            role,
            form,
        }
    }
}

impl Scenario for PositivePath {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn role(&self) -> Role {
        self.role
    }

    fn run(&self, session: &Session, config: &HarnessConfig) -> ProbeResult<()> {
        let dashboard = session.activity_dashboard();
        submit(&dashboard, &self.form)?;

        let alert = dashboard.accept_success_alert()?;
        let message = expect_success(alert, &config.success_markers.activity)?;
        info!(%message, "activity registered");

        expect_listed(&dashboard, &self.form.name)
    }
}

/// Submit an invalid form and expect no success alert and the URL path
/// left exactly as it was before the attempt
#[derive(Debug, Clone)]
pub struct NegativePath {
    id: String,
    title: String,
    role: Role,
    form: ActivityForm,
}

impl NegativePath {
    /// Create the scenario
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        role: Role,
        form: ActivityForm,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            role,
            form,
        }
    }
}

impl Scenario for NegativePath {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn role(&self) -> Role {
        self.role
    }

    fn run(&self, session: &Session, _config: &HarnessConfig) -> ProbeResult<()> {
        let dashboard = session.activity_dashboard();
        let before = url_path(&session.current_url()?);
        submit(&dashboard, &self.form)?;

        if let Presence::Present(text) = dashboard.accept_success_alert()? {
            return Err(ProbeError::assertion("no alert", format!("alert '{text}'")));
        }
        let after = url_path(&session.current_url()?);
        if !dashboard.is_current()? {
            return Err(ProbeError::assertion(
                format!("URL path starting with '{}'", dashboard.url_prefix()),
                after,
            ));
        }
        if after != before {
            return Err(ProbeError::assertion(
                format!("URL path '{before}' unchanged"),
                after,
            ));
        }
        Ok(())
    }
}

/// Register an activity carrying `term`, search for it, and expect every
/// listed title to contain the term
#[derive(Debug, Clone)]
pub struct SearchScenario {
    id: String,
    title: String,
    role: Role,
    seed: ActivityForm,
    term: String,
}

impl SearchScenario {
    /// Create the scenario; `seed` is registered first so the search has a hit
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        role: Role,
        seed: ActivityForm,
        term: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            role,
            seed,
            term: term.into(),
        }
    }
}

impl Scenario for SearchScenario {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn role(&self) -> Role {
        self.role
    }

    fn run(&self, session: &Session, config: &HarnessConfig) -> ProbeResult<()> {
        let dashboard = session.activity_dashboard();
        submit(&dashboard, &self.seed)?;
        expect_success(
            dashboard.accept_success_alert()?,
            &config.success_markers.activity,
        )?;
        expect_listed(&dashboard, &self.seed.name)?;

        dashboard.search_activities(&self.term)?;
        let term = self.term.to_lowercase();
        let filtered = |titles: &[String]| {
            !titles.is_empty() && titles.iter().all(|t| t.to_lowercase().contains(&term))
        };
        match dashboard.await_titles(&format!("titles filtered by '{}'", self.term), filtered) {
            Ok(titles) => {
                info!(term = %self.term, hits = titles.len(), "search filtered");
                Ok(())
            }
            Err(e) if e.is_timeout() => Err(ProbeError::assertion(
                format!("only titles containing '{}'", self.term),
                format!("{:?}", dashboard.list_activity_titles()?),
            )),
            Err(e) => Err(e),
        }
    }
}
