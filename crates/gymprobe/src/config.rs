//! Harness configuration.
//!
//! Loaded once at startup from YAML, overlaid with `GYMPROBE_*` environment
//! variables, validated, then installed process-wide. Nothing mutates it
//! after [`install`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

use crate::browser::BrowserOptions;
use crate::registry::{LocatorCatalog, LocatorOverrides};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{
    WaitPolicy, DEFAULT_ALERT_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Default address of the application under test
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "GYMPROBE";

/// Authenticated identity a scenario runs as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Books classes
    Student,
    /// Manages every activity
    Admin,
    /// Offers their own activities
    Professional,
}

impl Role {
    /// All roles
    pub const ALL: [Self; 3] = [Self::Student, Self::Admin, Self::Professional];

    /// Lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
            Self::Professional => "professional",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Login credentials and the page the application lands on afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email
    pub email: String,
    /// Login password
    pub password: String,
    /// Path of the role's home screen, e.g. `/admin`
    pub home_path: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        home_path: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            home_path: home_path.into(),
        }
    }
}

/// One account per role.
///
/// In configuration files every field is optional; gaps take the role's
/// default account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AccountsFile")]
pub struct Accounts {
    /// Student account
    pub student: Credentials,
    /// Administrator account
    pub admin: Credentials,
    /// Professional account
    pub professional: Credentials,
}

impl Default for Accounts {
    fn default() -> Self {
        Self {
            student: Credentials::new("joao@teste.com", "senha123", "/dashboard"),
            admin: Credentials::new("admin@gym.com", "admin", "/admin"),
            professional: Credentials::new("carlos@gym.com", "senha123", "/professional"),
        }
    }
}

impl Accounts {
    /// Credentials for a role
    #[must_use]
    pub const fn get(&self, role: Role) -> &Credentials {
        match role {
            Role::Student => &self.student,
            Role::Admin => &self.admin,
            Role::Professional => &self.professional,
        }
    }

    fn get_mut(&mut self, role: Role) -> &mut Credentials {
        match role {
            Role::Student => &mut self.student,
            Role::Admin => &mut self.admin,
            Role::Professional => &mut self.professional,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CredentialsFile {
    email: Option<String>,
    password: Option<String>,
    home_path: Option<String>,
}

impl CredentialsFile {
    fn or(self, defaults: Credentials) -> Credentials {
        Credentials {
            email: self.email.unwrap_or(defaults.email),
            password: self.password.unwrap_or(defaults.password),
            home_path: self.home_path.unwrap_or(defaults.home_path),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AccountsFile {
    student: CredentialsFile,
    admin: CredentialsFile,
    professional: CredentialsFile,
}

impl From<AccountsFile> for Accounts {
    fn from(file: AccountsFile) -> Self {
        let defaults = Self::default();
        Self {
            student: file.student.or(defaults.student),
            admin: file.admin.or(defaults.admin),
            professional: file.professional.or(defaults.professional),
        }
    }
}

/// Wait bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    /// Default wait timeout
    pub timeout_ms: u64,
    /// Poll interval
    pub poll_interval_ms: u64,
    /// Bound for success alerts
    pub alert_timeout_ms: u64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            alert_timeout_ms: DEFAULT_ALERT_TIMEOUT_MS,
        }
    }
}

impl WaitSettings {
    /// Wait policy for page objects
    #[must_use]
    pub const fn policy(&self) -> WaitPolicy {
        WaitPolicy::from_millis(self.timeout_ms, self.poll_interval_ms)
    }

    /// Bound for success alerts
    #[must_use]
    pub const fn alert_timeout(&self) -> Duration {
        Duration::from_millis(self.alert_timeout_ms)
    }
}

/// Substrings that identify a success alert (matched case-insensitively)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuccessMarkers {
    /// After registering an activity
    pub activity: Vec<String>,
    /// After scheduling a class
    pub scheduling: Vec<String>,
}

impl Default for SuccessMarkers {
    fn default() -> Self {
        Self {
            activity: vec!["registered".to_string()],
            scheduling: vec!["scheduled".to_string(), "success".to_string()],
        }
    }
}

impl SuccessMarkers {
    /// Whether `message` contains one of `markers`, ignoring case
    #[must_use]
    pub fn matches(markers: &[String], message: &str) -> bool {
        let message = message.to_lowercase();
        markers
            .iter()
            .any(|marker| message.contains(&marker.to_lowercase()))
    }
}

/// Complete harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Application root URL
    pub base_url: String,
    /// Wait bounds
    pub wait: WaitSettings,
    /// Browser launch options
    pub browser: BrowserOptions,
    /// Accounts per role
    pub accounts: Accounts,
    /// Success alert markers
    pub success_markers: SuccessMarkers,
    /// Locator overrides for a specific application build
    pub locators: LocatorOverrides,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            wait: WaitSettings::default(),
            browser: BrowserOptions::default(),
            accounts: Accounts::default(),
            success_markers: SuccessMarkers::default(),
            locators: LocatorOverrides::new(),
        }
    }
}

impl HarnessConfig {
    /// Parse a YAML document
    ///
    /// # Errors
    ///
    /// Returns a YAML error if the document does not match the schema.
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read and parse a YAML file
    ///
    /// # Errors
    ///
    /// Returns an I/O or YAML error.
    pub fn from_yaml_file(path: &Path) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded configuration file");
        Self::from_yaml_str(&text)
    }

    /// File (or defaults), then process environment, then validation
    ///
    /// # Errors
    ///
    /// Returns the first load, override or validation error.
    pub fn load(path: Option<&Path>) -> ProbeResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GYMPROBE_*` overrides read through `lookup`
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unparsable boolean values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ProbeResult<()> {
        if let Some(url) = lookup(&format!("{ENV_PREFIX}_BASE_URL")) {
            self.base_url = url;
        }
        for role in Role::ALL {
            let upper = role.as_str().to_uppercase();
            let credentials = self.accounts.get_mut(role);
            if let Some(email) = lookup(&format!("{ENV_PREFIX}_{upper}_EMAIL")) {
                credentials.email = email;
            }
            if let Some(password) = lookup(&format!("{ENV_PREFIX}_{upper}_PASSWORD")) {
                credentials.password = password;
            }
        }
        if let Some(raw) = lookup(&format!("{ENV_PREFIX}_HEADLESS")) {
            self.browser.headless = parse_bool(&raw).ok_or_else(|| {
                ProbeError::config(format!("{ENV_PREFIX}_HEADLESS must be a boolean, got '{raw}'"))
            })?;
        }
        if let Some(path) = lookup(&format!("{ENV_PREFIX}_CHROMIUM_PATH")) {
            self.browser.chromium_path = Some(path.into());
        }
        Ok(())
    }

    /// Check internal consistency
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self) -> ProbeResult<()> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| ProbeError::config(format!("base_url '{}': {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProbeError::config(format!(
                "base_url must be http(s), got '{}'",
                self.base_url
            )));
        }

        if self.wait.timeout_ms == 0 || self.wait.alert_timeout_ms == 0 {
            return Err(ProbeError::config("wait timeouts must be positive"));
        }
        if self.wait.poll_interval_ms == 0 || self.wait.poll_interval_ms > self.wait.timeout_ms {
            return Err(ProbeError::config(
                "wait.poll_interval_ms must be positive and not exceed wait.timeout_ms",
            ));
        }

        for role in Role::ALL {
            let credentials = self.accounts.get(role);
            if credentials.email.trim().is_empty() {
                return Err(ProbeError::config(format!("accounts.{role}.email is empty")));
            }
            if !credentials.home_path.starts_with('/') {
                return Err(ProbeError::config(format!(
                    "accounts.{role}.home_path must start with '/'"
                )));
            }
        }

        if self.success_markers.activity.is_empty() || self.success_markers.scheduling.is_empty() {
            return Err(ProbeError::config("success markers must not be empty"));
        }

        let _ = self.locator_catalog()?;
        Ok(())
    }

    /// Locator catalog with this configuration's overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error if an override is unknown or invalid.
    pub fn locator_catalog(&self) -> ProbeResult<LocatorCatalog> {
        LocatorCatalog::with_overrides(&self.locators)
    }

    /// Absolute URL for a path under the base URL
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Serialize back to YAML
    ///
    /// # Errors
    ///
    /// Returns a YAML error if serialization fails.
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

static GLOBAL: OnceLock<HarnessConfig> = OnceLock::new();

/// Install the process-wide configuration
///
/// # Errors
///
/// Returns a configuration error if a configuration was already installed.
pub fn install(config: HarnessConfig) -> ProbeResult<&'static HarnessConfig> {
    GLOBAL
        .set(config)
        .map_err(|_| ProbeError::config("configuration is already installed"))?;
    global().ok_or_else(|| ProbeError::config("configuration is not installed"))
}

/// The installed configuration, if any
#[must_use]
pub fn global() -> Option<&'static HarnessConfig> {
    GLOBAL.get()
}
