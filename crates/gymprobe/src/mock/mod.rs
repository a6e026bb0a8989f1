//! In-memory browser for testing page objects without Chromium.
//!
//! [`MockDriver`] implements [`BrowserDriver`] over a [`MockDom`]: a map from
//! locators to the elements they match. Scripted behavior is attached as
//! reactions that run after each driver event and may rewrite the DOM,
//! which is how [`GymAppSimulator`] renders the application.
//!
//! Composite locators resolve in candidate order (see [`MockDom::elements`]);
//! the Chromium driver returns document order instead.
//!
//! ```rust,ignore
//! let driver = MockDriver::new().with_reaction(|dom, event| {
//!     if let MockEvent::Clicked(_) = event {
//!         dom.open_alert("saved");
//!     }
//! });
//! ```

mod gym_app;

pub use gym_app::{GymAppSimulator, SimulatedActivity};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::driver::{BrowserDriver, ElementRef, ElementState};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};

/// A scripted element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Text content
    pub text: String,
    /// Control value
    pub value: String,
    /// Rendered visible
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Accepts a direct clear
    pub clearable: bool,
    /// Accepts typed text
    pub typable: bool,
    /// Reported hidden until this instant
    pub visible_after: Option<Instant>,
    /// Allowed values when the control is a select
    pub options: Option<Vec<String>>,
}

impl MockElement {
    /// Visible, enabled element with text content
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: String::new(),
            visible: true,
            enabled: true,
            clearable: true,
            typable: true,
            visible_after: None,
            options: None,
        }
    }

    /// Visible, enabled form control with a value
    #[must_use]
    pub fn input(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::new("")
        }
    }

    /// Select control with no option chosen
    #[must_use]
    pub fn select(options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            options: Some(options.into_iter().map(Into::into).collect()),
            clearable: false,
            ..Self::new("")
        }
    }

    fn accepts(&self, value: &str) -> bool {
        self.options
            .as_ref()
            .map_or(true, |options| value.is_empty() || options.iter().any(|o| o == value))
    }

    /// Mark hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Reject direct clears
    #[must_use]
    pub fn non_clearable(mut self) -> Self {
        self.clearable = false;
        self
    }

    /// Reject both clears and typing; only direct value assignment lands
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.clearable = false;
        self.typable = false;
        self
    }

    /// Stay hidden for `delay` from now
    #[must_use]
    pub fn appearing_after(mut self, delay: Duration) -> Self {
        self.visible_after = Some(Instant::now() + delay);
        self
    }

    fn state(&self) -> ElementState {
        let rendered = self.visible_after.map_or(true, |at| Instant::now() >= at);
        ElementState {
            text: self.text.clone(),
            value: self.value.clone(),
            visible: self.visible && rendered,
            enabled: self.enabled,
        }
    }
}

/// Mutable document state behind a [`MockDriver`]
#[derive(Debug, Clone, Default)]
pub struct MockDom {
    url: String,
    elements: BTreeMap<String, Vec<MockElement>>,
    alert: Option<String>,
    closed: bool,
}

impl MockDom {
    /// Current URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Set the current URL
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Replace the matches of a simple locator
    pub fn set_elements(&mut self, locator: &Locator, elements: Vec<MockElement>) {
        let _ = self.elements.insert(locator.to_string(), elements);
    }

    /// Remove every match of a locator (all candidates for composites)
    pub fn remove(&mut self, locator: &Locator) {
        for candidate in locator.candidates() {
            let _ = self.elements.remove(&candidate.to_string());
        }
    }

    /// Matches of a locator.
    ///
    /// Composites list the matches of each candidate in candidate order,
    /// not document order: the mock has no document positions, so tests
    /// that index into a composite rely on the order candidates are given.
    #[must_use]
    pub fn elements(&self, locator: &Locator) -> Vec<&MockElement> {
        locator
            .candidates()
            .into_iter()
            .filter_map(|candidate| self.elements.get(&candidate.to_string()))
            .flatten()
            .collect()
    }

    /// Mutable access to a referenced element
    pub fn element_mut(&mut self, element: &ElementRef) -> Option<&mut MockElement> {
        let mut remaining = element.index;
        for candidate in element.locator.candidates() {
            let key = candidate.to_string();
            let len = self.elements.get(&key).map_or(0, Vec::len);
            if remaining < len {
                return self.elements.get_mut(&key).and_then(|v| v.get_mut(remaining));
            }
            remaining -= len;
        }
        None
    }

    /// Value of the first match of a locator
    #[must_use]
    pub fn value_of(&self, locator: &Locator) -> Option<String> {
        self.elements(locator).first().map(|e| e.value.clone())
    }

    /// Open a native alert
    pub fn open_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
    }

    /// Text of the open alert
    #[must_use]
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Whether the browser was closed
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Driver events delivered to reactions after the DOM was updated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    /// `navigate` completed
    Navigated(String),
    /// An element was clicked
    Clicked(ElementRef),
    /// A control was cleared
    Cleared(ElementRef),
    /// A control's value was assigned
    ValueSet(ElementRef),
    /// Text was typed into a control
    KeysSent(ElementRef, String),
    /// The alert with this text was accepted
    AlertAccepted(String),
}

type Reaction = Box<dyn Fn(&mut MockDom, &MockEvent)>;

/// Mock browser driver for unit and integration tests
#[derive(Default)]
pub struct MockDriver {
    dom: RefCell<MockDom>,
    reactions: Vec<Reaction>,
    call_history: RefCell<Vec<String>>,
}

impl std::fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDriver")
            .field("dom", &self.dom)
            .field("reactions", &self.reactions.len())
            .field("call_history", &self.call_history)
            .finish()
    }
}

impl MockDriver {
    /// Create a driver over an empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reaction run after every event
    #[must_use]
    pub fn with_reaction(mut self, reaction: impl Fn(&mut MockDom, &MockEvent) + 'static) -> Self {
        self.reactions.push(Box::new(reaction));
        self
    }

    /// Inspect or script the document directly
    pub fn with_dom<R>(&self, f: impl FnOnce(&mut MockDom) -> R) -> R {
        f(&mut *self.dom.borrow_mut())
    }

    /// Recorded calls, e.g. `"click css=button"`
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.call_history.borrow().clone()
    }

    /// Check if a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history
            .borrow()
            .iter()
            .any(|c| c.starts_with(method))
    }

    fn record(&self, call: String) {
        self.call_history.borrow_mut().push(call);
    }

    fn emit(&self, event: &MockEvent) {
        let mut dom = self.dom.borrow_mut();
        for reaction in &self.reactions {
            reaction(&mut *dom, event);
        }
    }

    /// Fail if the session is closed or an alert blocks the page
    fn ensure_interactive(&self) -> ProbeResult<()> {
        let dom = self.dom.borrow();
        if dom.closed {
            return Err(ProbeError::driver("session is closed"));
        }
        match &dom.alert {
            Some(text) => Err(ProbeError::driver(format!("unexpected alert open: {text}"))),
            None => Ok(()),
        }
    }

    fn with_element<R>(
        &self,
        element: &ElementRef,
        f: impl FnOnce(&mut MockElement) -> ProbeResult<R>,
    ) -> ProbeResult<R> {
        self.ensure_interactive()?;
        let mut dom = self.dom.borrow_mut();
        let target = dom
            .element_mut(element)
            .ok_or_else(|| ProbeError::driver(format!("no element matches {element}")))?;
        f(target)
    }
}

fn rejected(element: &ElementRef, reason: &str) -> ProbeError {
    ProbeError::InteractionRejected {
        target: element.to_string(),
        reason: reason.to_string(),
    }
}

impl BrowserDriver for MockDriver {
    fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.record(format!("navigate {url}"));
        if self.dom.borrow().closed {
            return Err(ProbeError::driver("session is closed"));
        }
        self.dom.borrow_mut().url = url.to_string();
        self.emit(&MockEvent::Navigated(url.to_string()));
        Ok(())
    }

    fn current_url(&self) -> ProbeResult<String> {
        let dom = self.dom.borrow();
        if dom.closed {
            return Err(ProbeError::driver("session is closed"));
        }
        Ok(dom.url.clone())
    }

    fn find_all(&self, locator: &Locator) -> ProbeResult<Vec<ElementState>> {
        self.ensure_interactive()?;
        Ok(self
            .dom
            .borrow()
            .elements(locator)
            .into_iter()
            .map(MockElement::state)
            .collect())
    }

    fn click(&self, element: &ElementRef) -> ProbeResult<()> {
        self.record(format!("click {element}"));
        self.with_element(element, |target| {
            let state = target.state();
            if !state.visible {
                return Err(rejected(element, "element is not visible"));
            }
            if !state.enabled {
                return Err(rejected(element, "element is disabled"));
            }
            Ok(())
        })?;
        self.emit(&MockEvent::Clicked(element.clone()));
        Ok(())
    }

    fn clear(&self, element: &ElementRef) -> ProbeResult<()> {
        self.record(format!("clear {element}"));
        self.with_element(element, |target| {
            if !target.clearable {
                return Err(rejected(element, "control does not accept a direct clear"));
            }
            target.value.clear();
            Ok(())
        })?;
        self.emit(&MockEvent::Cleared(element.clone()));
        Ok(())
    }

    fn set_value(&self, element: &ElementRef, value: &str) -> ProbeResult<()> {
        self.record(format!("set_value {element}"));
        self.with_element(element, |target| {
            if !target.accepts(value) {
                return Err(rejected(element, "select has no such option"));
            }
            target.value = value.to_string();
            Ok(())
        })?;
        self.emit(&MockEvent::ValueSet(element.clone()));
        Ok(())
    }

    fn send_keys(&self, element: &ElementRef, text: &str) -> ProbeResult<()> {
        self.record(format!("send_keys {element}"));
        self.with_element(element, |target| {
            if !target.state().enabled {
                return Err(rejected(element, "element is disabled"));
            }
            if !target.typable {
                // Like a readOnly control: focus succeeds, the text goes nowhere
                return Ok(());
            }
            if target.options.is_some() {
                if !target.accepts(text) {
                    return Err(rejected(element, "select has no such option"));
                }
                target.value = text.to_string();
            } else {
                target.value.push_str(text);
            }
            Ok(())
        })?;
        self.emit(&MockEvent::KeysSent(element.clone(), text.to_string()));
        Ok(())
    }

    fn alert_text(&self) -> ProbeResult<Option<String>> {
        let dom = self.dom.borrow();
        if dom.closed {
            return Err(ProbeError::driver("session is closed"));
        }
        Ok(dom.alert.clone())
    }

    fn accept_alert(&self) -> ProbeResult<()> {
        self.record("accept_alert".to_string());
        let text = self
            .dom
            .borrow_mut()
            .alert
            .take()
            .ok_or_else(|| ProbeError::driver("no alert is open"))?;
        self.emit(&MockEvent::AlertAccepted(text));
        Ok(())
    }

    fn quit(&self) -> ProbeResult<()> {
        self.record("quit".to_string());
        self.dom.borrow_mut().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod dom_tests {
        use super::*;

        #[test]
        fn test_composite_resolves_across_candidates() {
            let link = Locator::xpath("//a[contains(., 'New Activity')]");
            let button = Locator::xpath("//button[contains(., 'New Activity')]");
            let any = Locator::any_of([link.clone(), button.clone()]);

            let mut dom = MockDom::default();
            dom.set_elements(&button, vec![MockElement::new("New Activity")]);
            assert_eq!(dom.elements(&any).len(), 1);

            dom.set_elements(&link, vec![MockElement::new("+ New Activity")]);
            let second = ElementRef::new(any, 1);
            assert_eq!(dom.element_mut(&second).unwrap().text, "New Activity");
        }

        #[test]
        fn test_composite_matches_follow_candidate_order() {
            let heading = Locator::xpath("//h2[contains(., 'Confirm Scheduling')]");
            let panel = Locator::xpath("//div[contains(., 'Confirm Scheduling')]");
            let mut dom = MockDom::default();
            dom.set_elements(&panel, vec![MockElement::new("panel")]);
            dom.set_elements(&heading, vec![MockElement::new("heading")]);

            let forward = Locator::any_of([heading.clone(), panel.clone()]);
            let texts: Vec<_> = dom.elements(&forward).iter().map(|e| e.text.clone()).collect();
            assert_eq!(texts, ["heading", "panel"]);

            let reversed = Locator::any_of([panel, heading]);
            let texts: Vec<_> = dom.elements(&reversed).iter().map(|e| e.text.clone()).collect();
            assert_eq!(texts, ["panel", "heading"]);
            assert_eq!(dom.element_mut(&ElementRef::new(reversed, 0)).unwrap().text, "panel");
        }

        #[test]
        fn test_remove_composite() {
            let a = Locator::css("h2");
            let b = Locator::css("div.title");
            let mut dom = MockDom::default();
            dom.set_elements(&a, vec![MockElement::new("x")]);
            dom.set_elements(&b, vec![MockElement::new("y")]);
            dom.remove(&Locator::any_of([a.clone(), b]));
            assert!(dom.elements(&a).is_empty());
        }
    }

    mod driver_tests {
        use super::*;

        fn field() -> Locator {
            Locator::name("name")
        }

        #[test]
        fn test_send_keys_appends_and_clear_empties() {
            let driver = MockDriver::new();
            driver.with_dom(|dom| dom.set_elements(&field(), vec![MockElement::input("old")]));
            let element = ElementRef::first(field());

            driver.clear(&element).unwrap();
            driver.send_keys(&element, "Crossfit").unwrap();
            assert_eq!(driver.find_all(&field()).unwrap()[0].value, "Crossfit");
            assert!(driver.was_called("clear"));
            assert!(driver.was_called("send_keys"));
        }

        #[test]
        fn test_clear_rejected_for_non_clearable() {
            let driver = MockDriver::new();
            driver.with_dom(|dom| {
                dom.set_elements(&field(), vec![MockElement::input("text").non_clearable()]);
            });
            let element = ElementRef::first(field());

            let err = driver.clear(&element).unwrap_err();
            assert!(matches!(err, ProbeError::InteractionRejected { .. }));

            driver.set_value(&element, "").unwrap();
            assert_eq!(driver.find_all(&field()).unwrap()[0].value, "");
        }

        #[test]
        fn test_read_only_ignores_typing_but_takes_assignment() {
            let driver = MockDriver::new();
            driver.with_dom(|dom| {
                dom.set_elements(&field(), vec![MockElement::input("locked").read_only()]);
            });
            let element = ElementRef::first(field());

            assert!(matches!(
                driver.clear(&element),
                Err(ProbeError::InteractionRejected { .. })
            ));
            driver.send_keys(&element, "typed").unwrap();
            assert_eq!(driver.find_all(&field()).unwrap()[0].value, "locked");

            driver.set_value(&element, "assigned").unwrap();
            assert_eq!(driver.find_all(&field()).unwrap()[0].value, "assigned");
        }

        #[test]
        fn test_select_picks_option() {
            let kind = Locator::name("type");
            let driver = MockDriver::new();
            driver.with_dom(|dom| dom.set_elements(&kind, vec![MockElement::select(["Class", "Workout"])]));
            let element = ElementRef::first(kind.clone());

            assert!(driver.clear(&element).is_err());
            driver.send_keys(&element, "Workout").unwrap();
            driver.send_keys(&element, "Class").unwrap();
            assert_eq!(driver.find_all(&kind).unwrap()[0].value, "Class");
            assert!(matches!(
                driver.send_keys(&element, "Dance"),
                Err(ProbeError::InteractionRejected { .. })
            ));
        }

        #[test]
        fn test_click_hidden_is_rejected() {
            let driver = MockDriver::new();
            driver.with_dom(|dom| dom.set_elements(&field(), vec![MockElement::new("x").hidden()]));
            let err = driver.click(&ElementRef::first(field())).unwrap_err();
            assert!(err.to_string().contains("not visible"));
        }

        #[test]
        fn test_missing_element_is_driver_error() {
            let driver = MockDriver::new();
            let err = driver.click(&ElementRef::first(field())).unwrap_err();
            assert!(matches!(err, ProbeError::Driver { .. }));
        }

        #[test]
        fn test_open_alert_blocks_interaction() {
            let driver = MockDriver::new();
            driver.with_dom(|dom| dom.open_alert("Class scheduled successfully!"));
            assert!(driver.find_all(&field()).is_err());
            assert_eq!(
                driver.alert_text().unwrap().as_deref(),
                Some("Class scheduled successfully!")
            );
            driver.accept_alert().unwrap();
            assert!(driver.find_all(&field()).is_ok());
            assert!(driver.accept_alert().is_err());
        }

        #[test]
        fn test_reactions_see_events() {
            let button = Locator::css("button[type='submit']");
            let driver = MockDriver::new().with_reaction(|dom, event| {
                if let MockEvent::Clicked(_) = event {
                    dom.open_alert("saved");
                }
            });
            driver.with_dom(|dom| dom.set_elements(&button, vec![MockElement::new("Save")]));

            driver.click(&ElementRef::first(button)).unwrap();
            assert_eq!(driver.alert_text().unwrap().as_deref(), Some("saved"));
        }

        #[test]
        fn test_quit_is_idempotent_and_closes() {
            let driver = MockDriver::new();
            driver.quit().unwrap();
            driver.quit().unwrap();
            assert!(driver.with_dom(|dom| dom.is_closed()));
            assert!(driver.navigate("http://localhost:3000").is_err());
            assert_eq!(
                driver.history().iter().filter(|c| *c == "quit").count(),
                2
            );
        }
    }
}
