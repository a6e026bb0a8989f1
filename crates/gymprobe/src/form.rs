//! Form payloads written by the page objects.

use serde::{Deserialize, Serialize};

use crate::registry::elements::dashboard;

/// Activity creation form.
///
/// `name` is always written (possibly empty, which is how the required-field
/// validation is exercised). Optional fields that are `None` are left
/// untouched on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityForm {
    /// Activity name
    pub name: String,
    /// Activity type, e.g. "Class"
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Duration, free text as the form accepts it ("60", "45 min")
    pub duration: Option<String>,
    /// Maximum participants
    pub capacity: Option<String>,
    /// Responsible professional (admin form only)
    pub professional: Option<String>,
}

impl ActivityForm {
    /// Form with only a name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the type
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the duration
    #[must_use]
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    /// Set the capacity
    #[must_use]
    pub fn with_capacity(mut self, capacity: impl Into<String>) -> Self {
        self.capacity = Some(capacity.into());
        self
    }

    /// Set the professional
    #[must_use]
    pub fn with_professional(mut self, professional: impl Into<String>) -> Self {
        self.professional = Some(professional.into());
        self
    }

    /// Fields to write, as (element name, value), in form order
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![(dashboard::FORM_NAME, self.name.as_str())];
        let optional = [
            (dashboard::FORM_TYPE, &self.kind),
            (dashboard::FORM_DESCRIPTION, &self.description),
            (dashboard::FORM_DURATION, &self.duration),
            (dashboard::FORM_CAPACITY, &self.capacity),
            (dashboard::FORM_PROFESSIONAL, &self.professional),
        ];
        fields.extend(
            optional
                .into_iter()
                .filter_map(|(element, value)| value.as_deref().map(|v| (element, v))),
        );
        fields
    }

    /// Whether the name is present, the precondition for a successful submission
    #[must_use]
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Class scheduling form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingForm {
    /// Date as typed into the date control
    pub date: String,
    /// Time as typed into the time control
    pub time: String,
}

impl SchedulingForm {
    /// Create a scheduling payload
    #[must_use]
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }
}
