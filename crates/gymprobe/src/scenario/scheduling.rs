use tracing::info;

use super::{expect_success, Scenario};
use crate::config::{HarnessConfig, Role};
use crate::form::SchedulingForm;
use crate::result::ProbeResult;
use crate::session::Session;

/// Book the first class with free seats and expect the confirmation alert
#[derive(Debug, Clone)]
pub struct StudentScheduling {
    id: String,
    title: String,
    form: SchedulingForm,
}

impl StudentScheduling {
    /// Create the scenario
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, form: SchedulingForm) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            form,
        }
    }
}

impl Scenario for StudentScheduling {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn role(&self) -> Role {
        Role::Student
    }

    fn run(&self, session: &Session, config: &HarnessConfig) -> ProbeResult<()> {
        let dashboard = session.student_dashboard();
        dashboard.navigate_to_scheduling()?;
        dashboard.select_first_schedulable_item()?;
        dashboard.fill_scheduling_form(&self.form)?;
        dashboard.confirm_scheduling()?;

        let message = expect_success(
            dashboard.accept_alert()?,
            &config.success_markers.scheduling,
        )?;
        info!(%message, date = %self.form.date, time = %self.form.time, "class scheduled");
        Ok(())
    }
}
