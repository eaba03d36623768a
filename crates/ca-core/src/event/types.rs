//! Event types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Event category (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Meeting,
    Focus,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Work,
        Category::Personal,
        Category::Meeting,
        Category::Focus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Meeting => "meeting",
            Category::Focus => "focus",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the known categories
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Exact lowercase match, same as the serde representation
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Opaque event identifier, assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raised when event fields are missing or empty
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing or empty fields: {}", .missing.join(", "))]
pub struct InvalidEvent {
    pub missing: Vec<&'static str>,
}

/// The user-visible part of an event. Every text field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEventFields")]
pub struct EventFields {
    title: String,
    time: String,
    duration: String,
    category: Category,
}

impl EventFields {
    pub fn new(
        title: impl Into<String>,
        time: impl Into<String>,
        duration: impl Into<String>,
        category: Category,
    ) -> Result<Self, InvalidEvent> {
        let title = title.into();
        let time = time.into();
        let duration = duration.into();

        let missing: Vec<&'static str> = [
            ("title", &title),
            ("time", &time),
            ("duration", &duration),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(InvalidEvent { missing });
        }

        Ok(Self {
            title,
            time,
            duration,
            category,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

#[derive(Deserialize)]
struct RawEventFields {
    title: String,
    time: String,
    duration: String,
    category: Category,
}

impl TryFrom<RawEventFields> for EventFields {
    type Error = InvalidEvent;

    fn try_from(raw: RawEventFields) -> Result<Self, Self::Error> {
        EventFields::new(raw.title, raw.time, raw.duration, raw.category)
    }
}

/// A scheduled calendar item owned by an `EventStore`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(flatten)]
    pub fields: EventFields,
}

impl Event {
    pub fn new(id: impl Into<EventId>, fields: EventFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}
