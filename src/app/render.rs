use crate::core::chat::SUGGESTED_QUESTIONS;
use crate::domain::model::{ChatMessage, ChatRole, PlantInfo, SearchResult, SimilarPlant};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// "just now", "5m ago", "3h ago", or the calendar date for anything older.
pub fn format_relative(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes / 60 < 24 {
        format!("{}h ago", minutes / 60)
    } else {
        timestamp.format("%Y-%m-%d").to_string()
    }
}

fn render_similar(out: &mut String, similar: &[SimilarPlant]) {
    if similar.is_empty() {
        return;
    }
    let _ = writeln!(out, "\nSimilar Plants 🌿");
    for plant in similar {
        let _ = writeln!(out, "  • {} ({})", plant.name, plant.image);
    }
}

/// Data URLs are summarised as their MIME type and size instead of printing the base64.
fn describe_image(image: &str) -> String {
    match image
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
    {
        Some((mime, data)) => format!("uploaded {} ({} bytes)", mime, data.len() / 4 * 3),
        None => image.to_string(),
    }
}

pub fn render_plant_info(info: &PlantInfo) -> String {
    let mut out = String::new();
    if let Some(image) = &info.image {
        let _ = writeln!(out, "🖼  {}", describe_image(image));
    }
    let _ = writeln!(out, "{}", info.name);
    let _ = writeln!(out, "{}", "=".repeat(info.name.chars().count().max(1)));
    let _ = writeln!(out, "{}", info.description);
    let _ = writeln!(out, "\nCare Instructions 🌱");
    for instruction in &info.care_instructions {
        let _ = writeln!(out, "  - {}", instruction);
    }
    render_similar(&mut out, &info.similar_plants);
    out
}

pub fn render_message(message: &ChatMessage, now: DateTime<Utc>) -> String {
    let speaker = match (message.role, message.error) {
        (ChatRole::User, _) => "🧑 You",
        (ChatRole::Assistant, false) => "🌱 Assistant",
        (ChatRole::Assistant, true) => "⚠️ Assistant",
    };
    format!(
        "{} · {}\n{}\n",
        speaker,
        format_relative(message.timestamp, now),
        message.content
    )
}

pub fn render_transcript(messages: &[ChatMessage], now: DateTime<Utc>) -> String {
    if messages.is_empty() {
        return "Start a conversation about your plant 🌱\n".to_string();
    }
    messages
        .iter()
        .map(|m| render_message(m, now))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_suggestions() -> String {
    let mut out = String::from("Try asking:\n");
    for (idx, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
        let _ = writeln!(out, "  {}. 💡 {}", idx + 1, question);
    }
    out
}

pub fn render_search_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No plants found for '{}'.\n", query);
    }

    let mut out = String::new();
    for (idx, result) in results.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}. {}", idx + 1, result.name);
        let _ = writeln!(out, "   {}", result.description);
        let _ = writeln!(out, "   🖼  {}", result.image);
        for tip in &result.care_instructions {
            let _ = writeln!(out, "   - {}", tip);
        }
        if !result.similar_plants.is_empty() {
            let names: Vec<&str> = result.similar_plants.iter().map(|p| p.name.as_str()).collect();
            let _ = writeln!(out, "   Similar: {}", names.join(", "));
        }
    }
    out
}
