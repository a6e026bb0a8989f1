//! In-memory rendition of the Gym System web application.
//!
//! Renders the login screen, the activity dashboards (admin and
//! professional) and the student scheduling flow into a [`MockDom`], using
//! the same locators the page objects use. Behavior follows the
//! application contract:
//!
//! - login routes each role to its home path
//! - the creation dialog blocks submission while a required field is empty
//! - successful submissions raise a native alert and render a new card
//! - the search box filters cards live, case-insensitively
//! - scheduling lists one "Schedule" button per activity with free seats

use std::cell::RefCell;
use std::time::Duration;
use tracing::debug;

use super::{MockDom, MockDriver, MockElement, MockEvent};
use crate::config::{Accounts, HarnessConfig, Role};
use crate::locator::Locator;
use crate::registry::elements::{dashboard, login, student};
use crate::registry::{LocatorCatalog, PageKind};
use crate::result::ProbeResult;

/// Options offered by the activity type select
pub const ACTIVITY_TYPES: [&str; 2] = ["Class", "Workout"];

/// Display name of the logged-in professional
const PROFESSIONAL_NAME: &str = "Prof. Carlos";

/// An activity card in the simulated catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedActivity {
    /// Card title
    pub name: String,
    /// "Class" or "Workout"
    pub kind: String,
    /// Responsible professional
    pub professional: String,
    /// Seats
    pub capacity: u32,
    /// Seats taken
    pub enrolled: u32,
}

impl SimulatedActivity {
    /// Create an activity with no enrollments
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        professional: impl Into<String>,
        capacity: u32,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            professional: professional.into(),
            capacity,
            enrolled: 0,
        }
    }

    /// No seats left
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.enrolled >= self.capacity
    }

    fn matches(&self, query: &str, by_professional: bool) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || (by_professional && self.professional.to_lowercase().contains(&query))
    }
}

fn seed_activities() -> Vec<SimulatedActivity> {
    vec![
        SimulatedActivity::new("Free Weights", "Workout", "Prof. Carlos", 30),
        SimulatedActivity::new("Pilates Mat", "Class", "Prof. Ana", 12),
        SimulatedActivity::new("Crossfit", "Class", "Prof. Carlos", 20),
        SimulatedActivity::new("Zumba", "Class", "Prof. Zen", 25),
    ]
}

/// Builder for a [`MockDriver`] that behaves like the Gym System
#[derive(Debug, Clone)]
pub struct GymAppSimulator {
    ui: Ui,
    base_url: String,
    accounts: Accounts,
    activities: Vec<SimulatedActivity>,
    render_delay: Duration,
}

impl GymAppSimulator {
    /// Simulator for the given locators, address and accounts
    ///
    /// # Errors
    ///
    /// Returns `UnknownLocator` if the catalog lacks an element the
    /// application renders.
    pub fn new(
        catalog: &LocatorCatalog,
        base_url: impl Into<String>,
        accounts: Accounts,
    ) -> ProbeResult<Self> {
        Ok(Self {
            ui: Ui::resolve(catalog)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            accounts,
            activities: seed_activities(),
            render_delay: Duration::ZERO,
        })
    }

    /// Simulator matching a harness configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured locators are invalid.
    pub fn from_config(config: &HarnessConfig) -> ProbeResult<Self> {
        Self::new(
            &config.locator_catalog()?,
            config.base_url.clone(),
            config.accounts.clone(),
        )
    }

    /// Replace the seeded catalog
    #[must_use]
    pub fn with_activities(mut self, activities: Vec<SimulatedActivity>) -> Self {
        self.activities = activities;
        self
    }

    /// Start with an empty catalog
    #[must_use]
    pub fn without_activities(self) -> Self {
        self.with_activities(Vec::new())
    }

    /// Delay before dialogs and freshly rendered cards become visible
    #[must_use]
    pub const fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    /// Build the driver
    #[must_use]
    pub fn into_driver(self) -> MockDriver {
        let app = RefCell::new(App {
            sim: self,
            user: None,
            creating: false,
            query: String::new(),
            browsing: false,
            booking: None,
        });
        let driver = MockDriver::new().with_reaction(move |dom, event| {
            app.borrow_mut().handle(dom, event);
        });
        driver.with_dom(|dom| dom.set_url("about:blank"));
        driver
    }
}

/// Locators the application renders, resolved once
#[derive(Debug, Clone)]
struct Ui {
    email: Locator,
    password: Locator,
    login_submit: Locator,
    new_activity: Locator,
    search_box: Locator,
    titles: Locator,
    form_name: Locator,
    form_type: Locator,
    form_description: Locator,
    form_duration: Locator,
    form_capacity: Locator,
    form_professional: Locator,
    form_submit: Locator,
    schedule_link: Locator,
    schedule_buttons: Locator,
    modal_title: Locator,
    date_input: Locator,
    time_input: Locator,
    confirm: Locator,
}

impl Ui {
    fn resolve(catalog: &LocatorCatalog) -> ProbeResult<Self> {
        let login_page = catalog.registry(PageKind::Login);
        let board = catalog.registry(PageKind::ActivityDashboard);
        let student_page = catalog.registry(PageKind::StudentDashboard);
        Ok(Self {
            email: login_page.get(login::EMAIL)?.clone(),
            password: login_page.get(login::PASSWORD)?.clone(),
            login_submit: login_page.get(login::SUBMIT)?.clone(),
            new_activity: board.get(dashboard::NEW_ACTIVITY)?.clone(),
            search_box: board.get(dashboard::SEARCH_BOX)?.clone(),
            titles: board.get(dashboard::ACTIVITY_TITLES)?.clone(),
            form_name: board.get(dashboard::FORM_NAME)?.clone(),
            form_type: board.get(dashboard::FORM_TYPE)?.clone(),
            form_description: board.get(dashboard::FORM_DESCRIPTION)?.clone(),
            form_duration: board.get(dashboard::FORM_DURATION)?.clone(),
            form_capacity: board.get(dashboard::FORM_CAPACITY)?.clone(),
            form_professional: board.get(dashboard::FORM_PROFESSIONAL)?.clone(),
            form_submit: board.get(dashboard::FORM_SUBMIT)?.clone(),
            schedule_link: student_page.get(student::SCHEDULE_LINK)?.clone(),
            schedule_buttons: student_page.get(student::SCHEDULE_BUTTONS)?.clone(),
            modal_title: student_page.get(student::MODAL_TITLE)?.clone(),
            date_input: student_page.get(student::DATE_INPUT)?.clone(),
            time_input: student_page.get(student::TIME_INPUT)?.clone(),
            confirm: student_page.get(student::CONFIRM)?.clone(),
        })
    }

    fn form_fields(&self) -> [&Locator; 6] {
        [
            &self.form_name,
            &self.form_type,
            &self.form_description,
            &self.form_duration,
            &self.form_capacity,
            &self.form_professional,
        ]
    }
}

/// Render `elements` under a locator; composites render as the candidate
/// at `variant` (or the first one).
fn paint(dom: &mut MockDom, locator: &Locator, variant: usize, elements: Vec<MockElement>) {
    let candidates = locator.candidates();
    let target = candidates
        .get(variant)
        .or_else(|| candidates.first())
        .map(|c| (*c).clone());
    dom.remove(locator);
    if let Some(target) = target {
        dom.set_elements(&target, elements);
    }
}

/// Render a control unless it is already on screen (keeps typed values)
fn ensure(dom: &mut MockDom, locator: &Locator, element: MockElement) {
    if dom.elements(locator).is_empty() {
        paint(dom, locator, 0, vec![element]);
    }
}

fn filled(dom: &MockDom, locator: &Locator) -> Option<String> {
    dom.value_of(locator)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Clickable controls with behavior attached
#[derive(Debug, Clone, Copy)]
enum Target {
    LoginSubmit,
    NewActivity,
    FormSubmit,
    ScheduleLink,
    ScheduleButton,
    Confirm,
}

/// Live application state behind the reaction
#[derive(Debug)]
struct App {
    sim: GymAppSimulator,
    user: Option<Role>,
    creating: bool,
    query: String,
    browsing: bool,
    booking: Option<usize>,
}

impl App {
    fn handle(&mut self, dom: &mut MockDom, event: &MockEvent) {
        match event {
            MockEvent::Navigated(_) => {
                self.creating = false;
                self.browsing = false;
                self.booking = None;
                self.query.clear();
                if let Some(role) = self.user {
                    dom.set_url(self.home_url(role));
                }
                self.render(dom, false);
            }
            MockEvent::Clicked(element) => match self.classify(&element.locator) {
                Some(Target::LoginSubmit) => self.login(dom),
                Some(Target::NewActivity) => {
                    self.creating = true;
                    self.render(dom, true);
                }
                Some(Target::FormSubmit) => self.submit_activity(dom),
                Some(Target::ScheduleLink) => {
                    self.browsing = true;
                    self.render(dom, true);
                }
                Some(Target::ScheduleButton) => {
                    self.booking = self.bookable().get(element.index).copied();
                    self.render(dom, true);
                }
                Some(Target::Confirm) => self.confirm_booking(dom),
                None => {}
            },
            MockEvent::Cleared(element)
            | MockEvent::ValueSet(element)
            | MockEvent::KeysSent(element, _) => {
                if element.locator == self.sim.ui.search_box {
                    self.query = dom.value_of(&self.sim.ui.search_box).unwrap_or_default();
                    self.render_titles(dom, false);
                }
            }
            MockEvent::AlertAccepted(_) => {}
        }
    }

    fn classify(&self, locator: &Locator) -> Option<Target> {
        let ui = &self.sim.ui;
        [
            (&ui.login_submit, Target::LoginSubmit),
            (&ui.new_activity, Target::NewActivity),
            (&ui.form_submit, Target::FormSubmit),
            (&ui.schedule_link, Target::ScheduleLink),
            (&ui.schedule_buttons, Target::ScheduleButton),
            (&ui.confirm, Target::Confirm),
        ]
        .into_iter()
        .find(|(candidate, _)| *candidate == locator)
        .map(|(_, target)| target)
    }

    fn home_url(&self, role: Role) -> String {
        format!("{}{}", self.sim.base_url, self.sim.accounts.get(role).home_path)
    }

    fn login(&mut self, dom: &mut MockDom) {
        let email = dom.value_of(&self.sim.ui.email).unwrap_or_default();
        let password = dom.value_of(&self.sim.ui.password).unwrap_or_default();
        let role = Role::ALL.into_iter().find(|role| {
            let credentials = self.sim.accounts.get(*role);
            credentials.email == email && credentials.password == password
        });

        match role {
            Some(role) => {
                debug!(%role, "simulated login");
                self.user = Some(role);
                dom.set_url(self.home_url(role));
                self.render(dom, false);
            }
            None => debug!(%email, "simulated login rejected"),
        }
    }

    fn submit_activity(&mut self, dom: &mut MockDom) {
        let Some(role) = self.user else { return };
        let ui = &self.sim.ui;

        // Required fields block submission like the browser's form validation
        let (Some(name), Some(kind), Some(_duration), Some(capacity)) = (
            filled(dom, &ui.form_name),
            filled(dom, &ui.form_type),
            filled(dom, &ui.form_duration),
            filled(dom, &ui.form_capacity),
        ) else {
            return;
        };
        let Ok(capacity) = capacity.parse::<u32>() else { return };
        let professional = match role {
            Role::Admin => match filled(dom, &ui.form_professional) {
                Some(professional) => professional,
                None => return,
            },
            _ => PROFESSIONAL_NAME.to_string(),
        };

        let message = match role {
            Role::Admin => "New activity registered!".to_string(),
            _ => format!("Activity \"{name}\" registered successfully!"),
        };
        debug!(%name, "simulated activity registered");
        self.sim
            .activities
            .push(SimulatedActivity::new(name, kind, professional, capacity));
        self.creating = false;
        self.render(dom, true);
        dom.open_alert(message);
    }

    fn confirm_booking(&mut self, dom: &mut MockDom) {
        let Some(index) = self.booking else { return };
        let ui = &self.sim.ui;
        if filled(dom, &ui.date_input).is_none() || filled(dom, &ui.time_input).is_none() {
            return;
        }
        if let Some(activity) = self.sim.activities.get_mut(index) {
            activity.enrolled += 1;
        }
        self.booking = None;
        self.render(dom, false);
        dom.open_alert("Class scheduled successfully!");
    }

    /// Indices of activities with free seats, in display order
    fn bookable(&self) -> Vec<usize> {
        self.sim
            .activities
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_full())
            .map(|(i, _)| i)
            .collect()
    }

    fn reveal(&self, element: MockElement, delayed: bool) -> MockElement {
        if delayed && !self.sim.render_delay.is_zero() {
            element.appearing_after(self.sim.render_delay)
        } else {
            element
        }
    }

    fn element(&self, text: &str, delayed: bool) -> MockElement {
        self.reveal(MockElement::new(text), delayed)
    }

    fn render(&self, dom: &mut MockDom, delayed: bool) {
        let ui = &self.sim.ui;
        match self.user {
            None => {
                self.clear_dashboard(dom);
                self.clear_student(dom);
                ensure(dom, &ui.email, MockElement::input(""));
                ensure(dom, &ui.password, MockElement::input(""));
                paint(dom, &ui.login_submit, 0, vec![MockElement::new("Login")]);
            }
            Some(Role::Student) => {
                self.clear_login(dom);
                self.clear_dashboard(dom);
                self.render_student(dom, delayed);
            }
            Some(role) => {
                self.clear_login(dom);
                self.clear_student(dom);
                self.render_dashboard(dom, role, delayed);
            }
        }
    }

    fn render_dashboard(&self, dom: &mut MockDom, role: Role, delayed: bool) {
        let ui = &self.sim.ui;
        // Admins get a button, professionals a link
        let variant = usize::from(role == Role::Admin);
        let trigger = MockElement::new("+ New Activity");
        let trigger = if self.creating { trigger.disabled() } else { trigger };
        paint(dom, &ui.new_activity, variant, vec![trigger]);
        ensure(dom, &ui.search_box, MockElement::input(""));

        if self.creating {
            let shown = |element: MockElement| self.reveal(element, delayed);
            ensure(dom, &ui.form_name, shown(MockElement::input("")));
            ensure(dom, &ui.form_type, shown(MockElement::select(ACTIVITY_TYPES)));
            ensure(
                dom,
                &ui.form_description,
                shown(MockElement::input("").read_only()),
            );
            ensure(dom, &ui.form_duration, shown(MockElement::input("")));
            ensure(dom, &ui.form_capacity, shown(MockElement::input("")));
            if role == Role::Admin {
                ensure(dom, &ui.form_professional, shown(MockElement::input("")));
            }
            paint(dom, &ui.form_submit, 0, vec![shown(MockElement::new("Save"))]);
        } else {
            for field in ui.form_fields() {
                dom.remove(field);
            }
            dom.remove(&ui.form_submit);
        }

        self.render_titles(dom, delayed);
    }

    fn render_titles(&self, dom: &mut MockDom, delayed: bool) {
        let by_professional = self.user == Some(Role::Admin);
        let titles = self
            .sim
            .activities
            .iter()
            .filter(|a| a.matches(&self.query, by_professional))
            .map(|a| self.element(&a.name, delayed))
            .collect();
        paint(dom, &self.sim.ui.titles, 0, titles);
    }

    fn render_student(&self, dom: &mut MockDom, delayed: bool) {
        let ui = &self.sim.ui;
        paint(dom, &ui.schedule_link, 0, vec![MockElement::new("Schedule Class")]);

        if self.browsing {
            let buttons = self
                .bookable()
                .iter()
                .map(|_| self.element("Schedule", delayed))
                .collect();
            paint(dom, &ui.schedule_buttons, 0, buttons);
        } else {
            dom.remove(&ui.schedule_buttons);
        }

        match self.booking {
            Some(_) => {
                paint(
                    dom,
                    &ui.modal_title,
                    0,
                    vec![self.element("Confirm Scheduling", delayed)],
                );
                ensure(dom, &ui.date_input, MockElement::input(""));
                ensure(dom, &ui.time_input, MockElement::input(""));
                paint(dom, &ui.confirm, 0, vec![MockElement::new("Confirm")]);
            }
            None => {
                for locator in [&ui.modal_title, &ui.date_input, &ui.time_input, &ui.confirm] {
                    dom.remove(locator);
                }
            }
        }
    }

    fn clear_login(&self, dom: &mut MockDom) {
        let ui = &self.sim.ui;
        for locator in [&ui.email, &ui.password, &ui.login_submit] {
            dom.remove(locator);
        }
    }

    fn clear_dashboard(&self, dom: &mut MockDom) {
        let ui = &self.sim.ui;
        for locator in [&ui.new_activity, &ui.search_box, &ui.titles, &ui.form_submit] {
            dom.remove(locator);
        }
        for field in ui.form_fields() {
            dom.remove(field);
        }
    }

    fn clear_student(&self, dom: &mut MockDom) {
        let ui = &self.sim.ui;
        for locator in [
            &ui.schedule_link,
            &ui.schedule_buttons,
            &ui.modal_title,
            &ui.date_input,
            &ui.time_input,
            &ui.confirm,
        ] {
            dom.remove(locator);
        }
    }
}
