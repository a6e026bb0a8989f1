//! BrowserDriver - the seam between page objects and a browser.
//!
//! Page objects and waits only talk to [`BrowserDriver`]. Two implementations
//! ship with the crate:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  BrowserDriver (synchronous trait)                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────┐   ┌──────────────────────────┐  │
//! │  │  ChromiumDriver         │   │  MockDriver              │  │
//! │  │  (feature = "browser")  │   │  + GymAppSimulator       │  │
//! │  │  CDP via chromiumoxide  │   │  in-memory DOM           │  │
//! │  └─────────────────────────┘   └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Elements are addressed by `(locator, index)` and re-resolved on every
//! call, so a re-render between lookup and interaction is harmless.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::locator::Locator;
use crate::result::ProbeResult;

/// Reference to the `index`-th match of a locator, in document order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    /// Locator the element was found with
    pub locator: Locator,
    /// Position among the locator's matches
    pub index: usize,
}

impl ElementRef {
    /// Create an element reference
    #[must_use]
    pub const fn new(locator: Locator, index: usize) -> Self {
        Self { locator, index }
    }

    /// First match of a locator
    #[must_use]
    pub const fn first(locator: Locator) -> Self {
        Self::new(locator, 0)
    }
}

impl std::fmt::Display for ElementRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.index == 0 {
            write!(f, "{}", self.locator)
        } else {
            write!(f, "{}[{}]", self.locator, self.index)
        }
    }
}

/// Snapshot of an element's observable state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Rendered text content
    pub text: String,
    /// Current value for form controls (empty otherwise)
    pub value: String,
    /// Rendered with a non-empty box and not hidden
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
}

impl ElementState {
    /// Visible and enabled
    #[must_use]
    pub const fn is_clickable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// Synchronous browser control used by pages, waits and sessions.
///
/// Implementations must not block waiting for UI state: every call observes
/// or acts once and returns. Polling belongs to [`crate::wait::WaitPolicy`].
pub trait BrowserDriver: std::fmt::Debug {
    /// Load a URL in the current tab
    fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// URL of the current document
    fn current_url(&self) -> ProbeResult<String>;

    /// State of every match of `locator`, in document order
    fn find_all(&self, locator: &Locator) -> ProbeResult<Vec<ElementState>>;

    /// Click an element
    fn click(&self, element: &ElementRef) -> ProbeResult<()>;

    /// Clear an editable control.
    ///
    /// Returns `InteractionRejected` when the control refuses a direct clear.
    fn clear(&self, element: &ElementRef) -> ProbeResult<()>;

    /// Assign a control's value directly and notify the page of the change
    fn set_value(&self, element: &ElementRef, value: &str) -> ProbeResult<()>;

    /// Type text into a control (selects the matching option for selects)
    fn send_keys(&self, element: &ElementRef, text: &str) -> ProbeResult<()>;

    /// Message of the open native alert, if any
    fn alert_text(&self) -> ProbeResult<Option<String>>;

    /// Accept the open native alert
    fn accept_alert(&self) -> ProbeResult<()>;

    /// Close the browser. Must be safe to call more than once.
    fn quit(&self) -> ProbeResult<()>;
}

/// Shared drivers forward every call; lets a caller keep a handle to a
/// driver it hands to a [`crate::session::Session`].
impl<D: BrowserDriver + ?Sized> BrowserDriver for Rc<D> {
    fn navigate(&self, url: &str) -> ProbeResult<()> {
        (**self).navigate(url)
    }

    fn current_url(&self) -> ProbeResult<String> {
        (**self).current_url()
    }

    fn find_all(&self, locator: &Locator) -> ProbeResult<Vec<ElementState>> {
        (**self).find_all(locator)
    }

    fn click(&self, element: &ElementRef) -> ProbeResult<()> {
        (**self).click(element)
    }

    fn clear(&self, element: &ElementRef) -> ProbeResult<()> {
        (**self).clear(element)
    }

    fn set_value(&self, element: &ElementRef, value: &str) -> ProbeResult<()> {
        (**self).set_value(element, value)
    }

    fn send_keys(&self, element: &ElementRef, text: &str) -> ProbeResult<()> {
        (**self).send_keys(element, text)
    }

    fn alert_text(&self) -> ProbeResult<Option<String>> {
        (**self).alert_text()
    }

    fn accept_alert(&self) -> ProbeResult<()> {
        (**self).accept_alert()
    }

    fn quit(&self) -> ProbeResult<()> {
        (**self).quit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ref_display() {
        let first = ElementRef::first(Locator::css(".activity-card h3"));
        assert_eq!(first.to_string(), "css=.activity-card h3");

        let third = ElementRef::new(Locator::xpath("//button"), 2);
        assert_eq!(third.to_string(), "xpath=//button[2]");
    }

    #[test]
    fn test_clickable_requires_visible_and_enabled() {
        let mut state = ElementState {
            text: "Schedule".to_string(),
            value: String::new(),
            visible: true,
            enabled: true,
        };
        assert!(state.is_clickable());
        state.enabled = false;
        assert!(!state.is_clickable());
        state.enabled = true;
        state.visible = false;
        assert!(!state.is_clickable());
    }
}
