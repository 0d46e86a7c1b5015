//! Core data structures for the little-notes application.
//!
//! This module contains the primary types used throughout the application:
//! the [`Note`] record, checklist [`TodoItem`]s, and the typed creation and
//! partial-update inputs.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::NoteError;

/// How a reminder should surface once its time arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderType {
    Popup,
    Badge,
}

impl FromStr for ReminderType {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popup" => Ok(ReminderType::Popup),
            "badge" => Ok(ReminderType::Badge),
            other => Err(NoteError::InvalidFormat {
                message: format!("Unknown reminder type: {}. Must be popup or badge", other),
            }),
        }
    }
}

/// A single checklist entry inside a note authored in todo mode.
///
/// `children` exists in the persisted layout but is never populated or
/// traversed; it is kept so old blobs round-trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub indent: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TodoItem>>,
}

/// Maximum checklist nesting depth.
pub const MAX_TODO_INDENT: u8 = 3;

impl TodoItem {
    pub fn new(id: String, text: String) -> Self {
        TodoItem {
            id,
            text,
            completed: false,
            indent: 0,
            children: None,
        }
    }

    /// Shifts the item one indent level in or out, clamped to 0..=3.
    pub fn shift_indent(&mut self, deeper: bool) {
        self.indent = if deeper {
            (self.indent + 1).min(MAX_TODO_INDENT)
        } else {
            self.indent.saturating_sub(1)
        };
    }
}

/// Represents a single note in our system.
///
/// Field names serialize in camelCase with dates as ISO-8601 strings, which
/// is the persisted blob layout; every optional field tolerates absence so
/// blobs from older versions load with defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique-ish identifier: the creation time in milliseconds as a string.
    /// Two notes created within the same millisecond share an id.
    pub id: String,
    /// Free text; may embed `#tag` tokens, markdown syntax or a rendered
    /// checklist.
    pub content: String,
    /// Tags for organization. Concatenation of explicitly chosen tags and
    /// hashtags extracted from the content; duplicates are possible.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional image attachment as a self-contained data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Optional drawing attachment as a self-contained data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing: Option<String>,
    /// Optional audio attachment as a self-contained data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Transcribed text for the audio attachment, stored as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    /// When the note is considered expired. Purely informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// When to remind; always earlier than the expiration it derives from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_type: Option<ReminderType>,
    /// When the note was created. Immutable after creation.
    pub created_at: DateTime<Utc>,
    /// Last modification time, refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_pinned: bool,
    /// Checklist items when the note is authored in todo mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todos: Option<Vec<TodoItem>>,
}

/// Creation input: everything the user supplies, minus id and timestamps.
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub content: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub drawing: Option<String>,
    pub audio: Option<String>,
    pub transcription: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub reminder_time: Option<DateTime<Utc>>,
    pub reminder_type: Option<ReminderType>,
    pub is_pinned: bool,
    pub todos: Option<Vec<TodoItem>>,
}

/// Typed partial update for a note.
///
/// Outer `Some` means the field is part of the update; for clearable
/// optionals the inner `None` clears the stored value. Attachments have no
/// separate lifecycle, so clearing is the same as overwriting.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<Option<String>>,
    pub drawing: Option<Option<String>>,
    pub audio: Option<Option<String>>,
    pub transcription: Option<Option<String>>,
    pub expiration_date: Option<Option<DateTime<Utc>>>,
    pub reminder_time: Option<Option<DateTime<Utc>>>,
    pub reminder_type: Option<Option<ReminderType>>,
    pub is_pinned: Option<bool>,
    pub todos: Option<Option<Vec<TodoItem>>>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.tags.is_none()
            && self.image.is_none()
            && self.drawing.is_none()
            && self.audio.is_none()
            && self.transcription.is_none()
            && self.expiration_date.is_none()
            && self.reminder_time.is_none()
            && self.reminder_type.is_none()
            && self.is_pinned.is_none()
            && self.todos.is_none()
    }
}

impl Note {
    /// Builds a new note from a draft at the given creation instant.
    ///
    /// The id is the string form of `now` in milliseconds. No uniqueness
    /// check is performed against existing notes.
    pub fn from_draft(draft: NoteDraft, now: DateTime<Utc>) -> Self {
        Note {
            id: now.timestamp_millis().to_string(),
            content: draft.content,
            tags: draft.tags,
            image: draft.image,
            drawing: draft.drawing,
            audio: draft.audio,
            transcription: draft.transcription,
            expiration_date: draft.expiration_date,
            reminder_time: draft.reminder_time,
            reminder_type: draft.reminder_type,
            created_at: now,
            updated_at: now,
            is_pinned: draft.is_pinned,
            todos: draft.todos,
        }
    }

    /// Merges a partial update into the note and refreshes `updated_at`.
    /// `id` and `created_at` are never touched.
    pub fn apply(&mut self, update: NoteUpdate, now: DateTime<Utc>) {
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(image) = update.image {
            self.image = image;
        }
        if let Some(drawing) = update.drawing {
            self.drawing = drawing;
        }
        if let Some(audio) = update.audio {
            self.audio = audio;
        }
        if let Some(transcription) = update.transcription {
            self.transcription = transcription;
        }
        if let Some(expiration_date) = update.expiration_date {
            self.expiration_date = expiration_date;
        }
        if let Some(reminder_time) = update.reminder_time {
            self.reminder_time = reminder_time;
        }
        if let Some(reminder_type) = update.reminder_type {
            self.reminder_type = reminder_type;
        }
        if let Some(is_pinned) = update.is_pinned {
            self.is_pinned = is_pinned;
        }
        if let Some(todos) = update.todos {
            self.todos = todos;
        }
        self.updated_at = now;
    }

    /// Case-insensitive substring match against the content or any tag.
    /// A blank query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.content.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }

    /// True when the note carries at least one of the given tags (exact
    /// match). An empty filter matches everything.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.is_empty() || tags.iter().any(|t| self.tags.contains(t))
    }
}

fn hashtag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Word characters plus the CJK unified range, mirroring the stored
    // content's hashtag syntax.
    RE.get_or_init(|| {
        Regex::new("#[0-9A-Za-z_\u{4e00}-\u{9fa5}]+").expect("hashtag pattern is valid")
    })
}

/// Extracts `#tag` tokens from free text, without the leading `#`.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    hashtag_regex()
        .find_iter(text)
        .map(|m| m.as_str()[1..].to_string())
        .collect()
}

/// Renders a checklist to markdown text, the irreversible transform applied
/// when the user switches a todo-mode note back to free text. Nested
/// `children` are not traversed.
pub fn todos_to_markdown(todos: &[TodoItem]) -> String {
    let completed = todos.iter().filter(|t| t.completed).count();
    let mut markdown = format!("# 清单 ({}/{})\n\n", completed, todos.len());

    for item in todos {
        let indent = "  ".repeat(item.indent.min(MAX_TODO_INDENT) as usize);
        let checkbox = if item.completed { "[x]" } else { "[ ]" };
        if item.completed {
            markdown.push_str(&format!("{}- {} ~~{}~~\n", indent, checkbox, item.text));
        } else {
            markdown.push_str(&format!("{}- {} {}\n", indent, checkbox, item.text));
        }
    }

    markdown
}
