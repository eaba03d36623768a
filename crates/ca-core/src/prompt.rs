//! Assistant instructions
//!
//! The system prompt tells the model which categories exist and the exact
//! `Event scheduled:` grammar that [`crate::event::extract`] understands.

use chrono::NaiveDate;

use crate::event::{Category, EVENT_MARKER, Event};

/// Render the system prompt for the current schedule
pub fn system_prompt(events: &[Event], today: NaiveDate) -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>();

    let mut prompt = String::new();
    prompt.push_str(
        "You are a smart schedule assistant that helps users manage their schedule efficiently.\n\
         Your capabilities include:\n\
         1. Creating new events with specified time, duration, and category\n\
         2. Listing upcoming events\n\
         3. Modifying existing events\n\
         4. Providing schedule recommendations\n\n",
    );

    prompt.push_str("When creating events:\n");
    prompt.push_str("- Extract time, duration, and category from user requests\n");
    prompt.push_str(&format!(
        "- Categories available: {}\n",
        categories.join(", ")
    ));
    prompt.push_str("- Validate time slots for conflicts with the current schedule\n\n");

    prompt.push_str(&format!(
        "When a user requests to create an event, respond with:\n\
         \"{}\" followed by a JSON object containing:\n\
         {{\n  \"title\": \"Event title\",\n  \"time\": \"HH:MM AM/PM\",\n  \"duration\": \"Xh\",\n  \"category\": \"{}\"\n}}\n\n",
        EVENT_MARKER,
        categories.join("|")
    ));

    prompt.push_str(
        "Always maintain a professional yet friendly tone. \
         If you don't understand a request, ask for clarification.\n\n\
         Format your responses clearly with event details structured for easy reading.\n\n",
    );

    prompt.push_str(&format!("Today is {}.\n\n", today.format("%A, %B %-d, %Y")));

    prompt.push_str("Current Schedule:\n");
    if events.is_empty() {
        prompt.push_str("No events scheduled.");
    } else {
        let lines = events
            .iter()
            .map(|event| {
                format!(
                    "- {} at {} ({}, {})",
                    event.fields.title(),
                    event.fields.time(),
                    event.fields.duration(),
                    event.fields.category()
                )
            })
            .collect::<Vec<_>>();
        prompt.push_str(&lines.join("\n"));
    }

    prompt
}
