//! Locator registries: per-page maps from semantic element names to locators.
//!
//! Registries are built once (built-in set plus configured overrides),
//! validated on build, and read-only afterwards. Page objects only ever see
//! element names; the registry decides how each element is found.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};

/// Logical pages of the application under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Login form
    Login,
    /// Activity dashboard shared by admins and professionals
    ActivityDashboard,
    /// Student dashboard with the scheduling flow
    StudentDashboard,
}

impl PageKind {
    /// All pages
    pub const ALL: [Self; 3] = [Self::Login, Self::ActivityDashboard, Self::StudentDashboard];

    /// Configuration key for this page
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::ActivityDashboard => "activity_dashboard",
            Self::StudentDashboard => "student_dashboard",
        }
    }
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element names, grouped by page
#[allow(missing_docs)]
pub mod elements {
    /// Login page elements
    pub mod login {
        pub const EMAIL: &str = "email";
        pub const PASSWORD: &str = "password";
        pub const SUBMIT: &str = "submit";
    }

    /// Activity dashboard elements
    pub mod dashboard {
        pub const NEW_ACTIVITY: &str = "new_activity";
        pub const SEARCH_BOX: &str = "search_box";
        pub const ACTIVITY_TITLES: &str = "activity_titles";
        pub const FORM_NAME: &str = "form_name";
        pub const FORM_TYPE: &str = "form_type";
        pub const FORM_DESCRIPTION: &str = "form_description";
        pub const FORM_DURATION: &str = "form_duration";
        pub const FORM_CAPACITY: &str = "form_capacity";
        pub const FORM_PROFESSIONAL: &str = "form_professional";
        pub const FORM_SUBMIT: &str = "form_submit";
    }

    /// Student dashboard elements
    pub mod student {
        pub const SCHEDULE_LINK: &str = "schedule_link";
        pub const SCHEDULE_BUTTONS: &str = "schedule_buttons";
        pub const MODAL_TITLE: &str = "modal_title";
        pub const DATE_INPUT: &str = "date_input";
        pub const TIME_INPUT: &str = "time_input";
        pub const CONFIRM: &str = "confirm";
    }
}

/// Locator overrides keyed by page, then element name
pub type LocatorOverrides = BTreeMap<PageKind, BTreeMap<String, Locator>>;

/// Read-only name → locator map for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorRegistry {
    page: PageKind,
    entries: BTreeMap<String, Locator>,
}

impl LocatorRegistry {
    /// Start building a registry for a page
    #[must_use]
    pub fn builder(page: PageKind) -> RegistryBuilder {
        RegistryBuilder::new(page)
    }

    /// Built-in registry for a page (English application build)
    ///
    /// # Errors
    ///
    /// Never fails for the shipped locator set; the `Result` is kept so the
    /// built-in set goes through the same validation as configured ones.
    pub fn builtin(page: PageKind) -> ProbeResult<Self> {
        builtin_builder(page).build()
    }

    /// Page this registry describes
    #[must_use]
    pub const fn page(&self) -> PageKind {
        self.page
    }

    /// Look up a locator by element name
    ///
    /// # Errors
    ///
    /// Returns `UnknownLocator` if the page has no such element.
    pub fn get(&self, name: &str) -> ProbeResult<&Locator> {
        self.entries.get(name).ok_or_else(|| ProbeError::UnknownLocator {
            page: self.page.to_string(),
            name: name.to_string(),
        })
    }

    /// Element names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Number of registered elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (name, locator) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Locator)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Builder for locator registries
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    page: PageKind,
    entries: BTreeMap<String, Locator>,
}

impl RegistryBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new(page: PageKind) -> Self {
        Self {
            page,
            entries: BTreeMap::new(),
        }
    }

    /// Add (or replace) a locator
    #[must_use]
    pub fn with_locator(mut self, name: impl Into<String>, locator: Locator) -> Self {
        let _ = self.entries.insert(name.into(), locator);
        self
    }

    /// Replace existing locators with overrides.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an override names an element the
    /// page does not have.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, Locator>) -> ProbeResult<Self> {
        for (name, locator) in overrides {
            match self.entries.get_mut(name) {
                Some(slot) => *slot = locator.clone(),
                None => {
                    return Err(ProbeError::config(format!(
                        "locator override '{}.{name}' does not match any element of that page",
                        self.page
                    )))
                }
            }
        }
        Ok(self)
    }

    /// Validate every locator and build the registry
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocator` for the first locator that fails validation.
    pub fn build(self) -> ProbeResult<LocatorRegistry> {
        for locator in self.entries.values() {
            locator.validate()?;
        }
        Ok(LocatorRegistry {
            page: self.page,
            entries: self.entries,
        })
    }
}

fn builtin_builder(page: PageKind) -> RegistryBuilder {
    use elements::{dashboard, login, student};

    let builder = RegistryBuilder::new(page);
    match page {
        PageKind::Login => builder
            .with_locator(login::EMAIL, Locator::id("email"))
            .with_locator(login::PASSWORD, Locator::id("password"))
            .with_locator(login::SUBMIT, Locator::class("login-button")),
        PageKind::ActivityDashboard => builder
            .with_locator(
                dashboard::NEW_ACTIVITY,
                Locator::any_of([
                    Locator::xpath("//a[contains(., 'New Activity')]"),
                    Locator::xpath("//button[contains(., 'New Activity')]"),
                ]),
            )
            .with_locator(dashboard::SEARCH_BOX, Locator::css(".search-box input"))
            .with_locator(dashboard::ACTIVITY_TITLES, Locator::css(".activity-card h3"))
            .with_locator(dashboard::FORM_NAME, Locator::name("name"))
            .with_locator(dashboard::FORM_TYPE, Locator::name("type"))
            .with_locator(
                dashboard::FORM_DESCRIPTION,
                Locator::css("textarea[name='description']"),
            )
            .with_locator(dashboard::FORM_DURATION, Locator::name("duration"))
            .with_locator(dashboard::FORM_CAPACITY, Locator::name("capacity"))
            .with_locator(dashboard::FORM_PROFESSIONAL, Locator::name("professional"))
            .with_locator(dashboard::FORM_SUBMIT, Locator::css("button[type='submit']")),
        PageKind::StudentDashboard => builder
            .with_locator(
                student::SCHEDULE_LINK,
                Locator::xpath("//a[contains(text(), 'Schedule Class')]"),
            )
            .with_locator(
                student::SCHEDULE_BUTTONS,
                Locator::xpath("//button[normalize-space(.)='Schedule']"),
            )
            .with_locator(
                student::MODAL_TITLE,
                Locator::any_of([
                    Locator::xpath("//h2[contains(., 'Confirm Scheduling')]"),
                    Locator::xpath("//div[contains(., 'Confirm Scheduling')]"),
                ]),
            )
            .with_locator(
                student::DATE_INPUT,
                Locator::xpath("//label[contains(., 'Date')]/following::input[1]"),
            )
            .with_locator(
                student::TIME_INPUT,
                Locator::xpath("//label[contains(., 'Time')]/following::input[1]"),
            )
            .with_locator(
                student::CONFIRM,
                Locator::xpath("//button[contains(., 'Confirm')]"),
            ),
    }
}

/// The registries of every page, built together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorCatalog {
    login: LocatorRegistry,
    dashboard: LocatorRegistry,
    student: LocatorRegistry,
}

impl LocatorCatalog {
    /// Built-in locators for every page
    ///
    /// # Errors
    ///
    /// See [`LocatorRegistry::builtin`].
    pub fn builtin() -> ProbeResult<Self> {
        Self::with_overrides(&LocatorOverrides::new())
    }

    /// Built-in locators with per-application-version overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error if an override targets an unknown element or a
    /// resulting locator is invalid.
    pub fn with_overrides(overrides: &LocatorOverrides) -> ProbeResult<Self> {
        let build = |page: PageKind| -> ProbeResult<LocatorRegistry> {
            let builder = builtin_builder(page);
            let builder = match overrides.get(&page) {
                Some(page_overrides) => builder.with_overrides(page_overrides)?,
                None => builder,
            };
            builder.build()
        };

        Ok(Self {
            login: build(PageKind::Login)?,
            dashboard: build(PageKind::ActivityDashboard)?,
            student: build(PageKind::StudentDashboard)?,
        })
    }

    /// Registry for a page
    #[must_use]
    pub const fn registry(&self, page: PageKind) -> &LocatorRegistry {
        match page {
            PageKind::Login => &self.login,
            PageKind::ActivityDashboard => &self.dashboard,
            PageKind::StudentDashboard => &self.student,
        }
    }

    /// Shorthand for `registry(page).get(name)`
    ///
    /// # Errors
    ///
    /// Returns `UnknownLocator` if the page has no such element.
    pub fn locator(&self, page: PageKind, name: &str) -> ProbeResult<&Locator> {
        self.registry(page).get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elements::{dashboard, login, student};

    mod registry_tests {
        use super::*;

        #[test]
        fn test_builtin_registries_validate() {
            for page in PageKind::ALL {
                let registry = LocatorRegistry::builtin(page).unwrap();
                assert_eq!(registry.page(), page);
                assert!(!registry.is_empty());
            }
        }

        #[test]
        fn test_builtin_login_locators() {
            let registry = LocatorRegistry::builtin(PageKind::Login).unwrap();
            assert_eq!(registry.get(login::EMAIL).unwrap(), &Locator::id("email"));
            assert_eq!(
                registry.get(login::SUBMIT).unwrap(),
                &Locator::class("login-button")
            );
            assert_eq!(registry.names(), vec!["email", "password", "submit"]);
        }

        #[test]
        fn test_new_activity_is_composite() {
            let registry = LocatorRegistry::builtin(PageKind::ActivityDashboard).unwrap();
            let locator = registry.get(dashboard::NEW_ACTIVITY).unwrap();
            assert_eq!(locator.candidates().len(), 2);
        }

        #[test]
        fn test_unknown_name() {
            let registry = LocatorRegistry::builtin(PageKind::StudentDashboard).unwrap();
            let err = registry.get("logout").unwrap_err();
            assert!(matches!(err, ProbeError::UnknownLocator { .. }));
            assert!(err.to_string().contains("student_dashboard"));
        }

        #[test]
        fn test_builder_rejects_invalid_locator() {
            let result = LocatorRegistry::builder(PageKind::Login)
                .with_locator("email", Locator::id("has space"))
                .build();
            assert!(matches!(result, Err(ProbeError::InvalidLocator { .. })));
        }
    }

    mod catalog_tests {
        use super::*;

        #[test]
        fn test_builtin_catalog() {
            let catalog = LocatorCatalog::builtin().unwrap();
            assert_eq!(
                catalog
                    .locator(PageKind::StudentDashboard, student::CONFIRM)
                    .unwrap(),
                &Locator::xpath("//button[contains(., 'Confirm')]")
            );
        }

        #[test]
        fn test_overrides_replace_builtin() {
            let mut page = BTreeMap::new();
            page.insert(
                dashboard::SEARCH_BOX.to_string(),
                Locator::css("#search"),
            );
            let mut overrides = LocatorOverrides::new();
            overrides.insert(PageKind::ActivityDashboard, page);

            let catalog = LocatorCatalog::with_overrides(&overrides).unwrap();
            assert_eq!(
                catalog
                    .locator(PageKind::ActivityDashboard, dashboard::SEARCH_BOX)
                    .unwrap(),
                &Locator::css("#search")
            );
            assert_eq!(
                catalog
                    .locator(PageKind::ActivityDashboard, dashboard::FORM_NAME)
                    .unwrap(),
                &Locator::name("name")
            );
        }

        #[test]
        fn test_override_of_unknown_element_is_config_error() {
            let mut page = BTreeMap::new();
            page.insert("serach_box".to_string(), Locator::css("#search"));
            let mut overrides = LocatorOverrides::new();
            overrides.insert(PageKind::ActivityDashboard, page);

            let err = LocatorCatalog::with_overrides(&overrides).unwrap_err();
            assert!(matches!(err, ProbeError::Config { .. }));
            assert!(err.to_string().contains("serach_box"));
        }

        #[test]
        fn test_invalid_override_is_rejected() {
            let mut page = BTreeMap::new();
            page.insert(login::EMAIL.to_string(), Locator::xpath("input"));
            let mut overrides = LocatorOverrides::new();
            overrides.insert(PageKind::Login, page);

            assert!(matches!(
                LocatorCatalog::with_overrides(&overrides),
                Err(ProbeError::InvalidLocator { .. })
            ));
        }

        #[test]
        fn test_overrides_from_yaml() {
            let yaml = "student_dashboard:\n  schedule_link:\n    xpath: \"//a[contains(text(), 'Agendar Aula')]\"\n";
            let overrides: LocatorOverrides = serde_yaml_ng::from_str(yaml).unwrap();
            let catalog = LocatorCatalog::with_overrides(&overrides).unwrap();
            assert_eq!(
                catalog
                    .locator(PageKind::StudentDashboard, student::SCHEDULE_LINK)
                    .unwrap()
                    .value(),
                Some("//a[contains(text(), 'Agendar Aula')]")
            );
        }
    }
}
