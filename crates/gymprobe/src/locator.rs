//! Locator abstraction for element selection.
//!
//! A locator is a (strategy, value) pair, or a composite `AnyOf` that matches
//! the union of several candidate locators. Composites cover elements that
//! the application renders in more than one way, e.g. a "New Activity"
//! control that is a link on one screen and a button on another.
//!
//! Locators are plain data: they are validated once when a registry is built
//! and rendered to a JavaScript query for drivers that evaluate in the page.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::result::{ProbeError, ProbeResult};

/// How a locator value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `id` attribute
    Id,
    /// `name` attribute
    Name,
    /// CSS selector
    Css,
    /// XPath expression
    #[serde(rename = "xpath")]
    XPath,
    /// Single class name
    Class,
}

impl Strategy {
    /// Short name used in descriptions and lookup keys
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Class => "class",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locator for finding elements in the rendered document.
///
/// Serialized in configuration files as a single-key map, e.g.
/// `{ css: ".search-box input" }` or `{ any_of: [{ xpath: "..." }, ...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// Match by `id` attribute
    Id(String),
    /// Match by `name` attribute
    Name(String),
    /// Match by CSS selector
    Css(String),
    /// Match by XPath expression
    #[serde(rename = "xpath")]
    XPath(String),
    /// Match by a single class name
    Class(String),
    /// Logical OR over candidate locators, results in document order
    AnyOf(Vec<Locator>),
}

impl Locator {
    /// Create an id locator
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    /// Create a name locator
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::Name(value.into())
    }

    /// Create a CSS locator
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::XPath(value.into())
    }

    /// Create a class-name locator
    #[must_use]
    pub fn class(value: impl Into<String>) -> Self {
        Self::Class(value.into())
    }

    /// Create a composite locator matching any of the candidates
    #[must_use]
    pub fn any_of(candidates: impl IntoIterator<Item = Locator>) -> Self {
        Self::AnyOf(candidates.into_iter().collect())
    }

    /// Strategy of a simple locator (`None` for composites)
    #[must_use]
    pub const fn strategy(&self) -> Option<Strategy> {
        match self {
            Self::Id(_) => Some(Strategy::Id),
            Self::Name(_) => Some(Strategy::Name),
            Self::Css(_) => Some(Strategy::Css),
            Self::XPath(_) => Some(Strategy::XPath),
            Self::Class(_) => Some(Strategy::Class),
            Self::AnyOf(_) => None,
        }
    }

    /// Value of a simple locator (`None` for composites)
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Id(v) | Self::Name(v) | Self::Css(v) | Self::XPath(v) | Self::Class(v) => {
                Some(v)
            }
            Self::AnyOf(_) => None,
        }
    }

    /// Simple locators this one is made of, in candidate order
    #[must_use]
    pub fn candidates(&self) -> Vec<&Locator> {
        match self {
            Self::AnyOf(inner) => inner.iter().flat_map(Locator::candidates).collect(),
            simple => vec![simple],
        }
    }

    /// Check that the value is syntactically valid for its strategy
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocator` naming the offending candidate.
    pub fn validate(&self) -> ProbeResult<()> {
        match self {
            Self::AnyOf(inner) => {
                if inner.is_empty() {
                    return Err(invalid("any_of", "[]", "composite has no candidates"));
                }
                inner.iter().try_for_each(Locator::validate)
            }
            Self::Id(v) => {
                if is_valid_id(v) {
                    Ok(())
                } else {
                    Err(invalid("id", v, "must be non-empty without whitespace"))
                }
            }
            Self::Name(v) => {
                if v.trim().is_empty() {
                    Err(invalid("name", v, "must be non-empty"))
                } else {
                    Ok(())
                }
            }
            Self::Class(v) => {
                if is_valid_class(v) {
                    Ok(())
                } else {
                    Err(invalid(
                        "class",
                        v,
                        "must be a single class name (no dots, no whitespace)",
                    ))
                }
            }
            Self::Css(v) => {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    return Err(invalid("css", v, "must be non-empty"));
                }
                if trimmed.starts_with(['>', '+', '~', ',']) {
                    return Err(invalid("css", v, "cannot start with a combinator"));
                }
                check_balanced(v).map_err(|reason| invalid("css", v, &reason))
            }
            Self::XPath(v) => {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    return Err(invalid("xpath", v, "must be non-empty"));
                }
                if !trimmed.starts_with(['/', '.', '(']) {
                    return Err(invalid("xpath", v, "must start with '/', '.' or '('"));
                }
                check_balanced(v).map_err(|reason| invalid("xpath", v, &reason))
            }
        }
    }

    /// JavaScript expression evaluating to an array of matching elements
    /// in document order.
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Id(v) => format!("[document.getElementById({})].filter(Boolean)", js(v)),
            Self::Name(v) => format!("Array.from(document.getElementsByName({}))", js(v)),
            Self::Css(v) => format!("Array.from(document.querySelectorAll({}))", js(v)),
            Self::Class(v) => {
                format!("Array.from(document.getElementsByClassName({}))", js(v))
            }
            Self::XPath(v) => format!(
                "(() => {{ const r = document.evaluate({}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 return Array.from({{ length: r.snapshotLength }}, (_, i) => r.snapshotItem(i)); }})()",
                js(v)
            ),
            Self::AnyOf(inner) => {
                let parts: Vec<String> = inner.iter().map(Locator::to_query).collect();
                format!(
                    "Array.from(new Set([{}].flat())).sort((a, b) => \
                     a === b ? 0 : (a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING ? -1 : 1))",
                    parts.join(", ")
                )
            }
        }
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("({}).length", self.to_query())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnyOf(inner) => {
                f.write_str("any_of[")?;
                for (i, candidate) in inner.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{candidate}")?;
                }
                f.write_str("]")
            }
            simple => {
                let strategy = simple.strategy().map_or("?", |s| s.as_str());
                write!(f, "{strategy}={}", simple.value().unwrap_or_default())
            }
        }
    }
}

static ID_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
static CLASS_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn pattern_matches(cell: &'static OnceLock<Option<Regex>>, pattern: &str, value: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

fn is_valid_id(value: &str) -> bool {
    pattern_matches(&ID_PATTERN, r"^\S+$", value)
}

fn is_valid_class(value: &str) -> bool {
    pattern_matches(&CLASS_PATTERN, r"^-?[_a-zA-Z][_a-zA-Z0-9-]*$", value)
}

fn invalid(strategy: &str, value: &str, reason: &str) -> ProbeError {
    ProbeError::InvalidLocator {
        strategy: strategy.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Quote-aware bracket balance check shared by CSS and XPath.
fn check_balanced(expr: &str) -> Result<(), String> {
    let mut stack = Vec::new();
    let mut quote: Option<char> = None;

    for c in expr.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' => stack.push(c),
            ')' | ']' => {
                let open = if c == ')' { '(' } else { '[' };
                if stack.pop() != Some(open) {
                    return Err(format!("unbalanced '{c}'"));
                }
            }
            _ => {}
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if let Some(open) = stack.pop() {
        return Err(format!("unclosed '{open}'"));
    }
    Ok(())
}

fn js(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
