use tracing::info;

use super::{Page, PageBase};
use crate::registry::elements::login::{EMAIL, PASSWORD, SUBMIT};
use crate::registry::PageKind;
use crate::result::ProbeResult;

/// The login form
#[derive(Debug, Clone, Copy)]
pub struct LoginPage<'a> {
    base: PageBase<'a>,
}

impl<'a> LoginPage<'a> {
    /// Bind the login page
    #[must_use]
    pub const fn new(base: PageBase<'a>) -> Self {
        Self { base }
    }

    /// Fill email and password and submit.
    ///
    /// Does not check the outcome; callers wait for the landing page.
    ///
    /// # Errors
    ///
    /// Returns `WaitTimeout` if the form never shows, or a driver error.
    pub fn authenticate(&self, identity: &str, secret: &str) -> ProbeResult<()> {
        info!(identity, "logging in");
        self.base.fill_named(EMAIL, identity)?;
        self.base.fill_named(PASSWORD, secret)?;
        self.base.click(SUBMIT)
    }
}

impl Page for LoginPage<'_> {
    fn kind(&self) -> PageKind {
        PageKind::Login
    }

    fn url_prefix(&self) -> &str {
        "/"
    }

    fn base(&self) -> &PageBase<'_> {
        &self.base
    }

    /// Shown while a visible email field is rendered; every path starts
    /// with the root prefix, so the URL alone cannot tell.
    fn is_current(&self) -> ProbeResult<bool> {
        let fields = self.base.driver().find_all(self.base.locator(EMAIL)?)?;
        Ok(fields.iter().any(|field| field.visible))
    }
}
