//! Calendar events: model, extraction from assistant text, and storage
//!
//! Assistant replies are scanned by [`extract`]; successful results are
//! handed to an [`EventStore`] through [`ingest_reply`], which applies the
//! display-boundary policy: extraction failures are logged and never block
//! the reply itself.

mod extractor;
mod store;
mod types;

pub use extractor::{EVENT_MARKER, ExtractedEvent, ExtractionError, extract};
pub use store::{EventStore, StoreChange, SubscriptionId};
pub use types::{Category, Event, EventFields, EventId, InvalidEvent, UnknownCategory};

use tracing::{debug, info, warn};

/// How an assistant reply should be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    /// No embedded event; show the text unchanged
    Plain(String),
    /// An event was found; show its narrative and a structured summary
    Scheduled(ExtractedEvent),
}

impl AssistantReply {
    /// Text to display alongside any structured summary
    pub fn display_text(&self) -> String {
        match self {
            AssistantReply::Plain(text) => text.clone(),
            AssistantReply::Scheduled(extracted) => extracted.narrative(),
        }
    }
}

/// Classify a completed reply for display.
///
/// Replies whose event block cannot be parsed are shown as plain text.
pub fn render_reply(text: &str) -> AssistantReply {
    match extract(text) {
        Ok(extracted) => AssistantReply::Scheduled(extracted),
        Err(_) => AssistantReply::Plain(text.to_string()),
    }
}

/// Extract an event from a completed reply and add it to the store.
///
/// Returns the stored event, or `None` when the reply carried no usable event.
pub fn ingest_reply(store: &mut EventStore, text: &str) -> Option<Event> {
    match extract(text) {
        Ok(extracted) => {
            let event = store.add(extracted.fields);
            info!(
                "Event added from assistant reply: {} at {} ({}, {})",
                event.fields.title(),
                event.fields.time(),
                event.fields.duration(),
                event.fields.category()
            );
            Some(event)
        }
        Err(ExtractionError::NoMarker) => {
            debug!("Assistant reply has no event marker");
            None
        }
        Err(e) => {
            warn!("Failed to extract event from assistant reply: {}", e);
            None
        }
    }
}
