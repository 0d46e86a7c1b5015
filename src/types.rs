//! Shared type aliases and the CLI command surface.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::NoteError;

/// A specialized Result type for little-notes operations.
pub type Result<T> = std::result::Result<T, NoteError>;

/// Available subcommands for the little-notes application
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new note
    Create {
        /// Content of the note; #tags inside are picked up automatically
        #[clap(short, long)]
        content: Option<String>,

        /// Open content in editor before saving
        #[clap(short, long)]
        edit: bool,

        /// Path to a file containing the note's content
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Tags to associate with the note (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,

        /// Expiration: a preset (1h, 3h, 1d, 3d, 1w, 1mo, 3mo) or a datetime
        /// like "2026-09-15 18:00"
        #[clap(long)]
        expires: Option<String>,

        /// Reminder ahead of the expiration: 5m, 15m, 30m, 1h, 3h or 1d
        #[clap(long, requires = "expires")]
        remind: Option<String>,

        /// Reminder delivery: popup or badge
        #[clap(long, requires = "remind", default_value = "popup")]
        remind_type: String,

        /// Pin the note on creation
        #[clap(short, long)]
        pin: bool,

        /// Add a checklist item instead of free text (repeatable; leading
        /// pairs of spaces set the indent level)
        #[clap(long, conflicts_with_all = ["content", "file", "edit"])]
        todo: Vec<String>,
    },

    /// List notes with optional filtering
    List(ListArgs),

    /// View a note by ID
    View {
        /// ID of the note to view
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit an existing note
    Edit(EditArgs),

    /// Delete one or more notes by ID
    Delete {
        /// IDs of the notes to delete
        #[clap(required = true)]
        ids: Vec<String>,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Pin or unpin a note
    Pin {
        /// ID of the note to toggle
        id: String,
    },

    /// Search notes by content or tags
    Search {
        /// Search query text
        query: String,

        /// Narrow to notes carrying at least one of these tags
        /// (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,

        /// Rank results by fuzzy match quality instead of stored order
        #[clap(long)]
        fuzzy: bool,

        /// Limit the number of search results (0 for no limit)
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// List every tag in use
    Tags,

    /// Show the expiration countdown for a note
    Countdown {
        /// ID of the note
        id: String,

        /// Refresh every second until the note expires or Ctrl-C
        #[clap(short, long)]
        watch: bool,
    },

    /// Export all notes and settings to a bundle file
    Export {
        /// Path for the bundle (default little-notes-backup.json)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a previously exported bundle, overwriting current data
    Import {
        /// Path to the bundle file
        bundle_file: PathBuf,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Show or change settings and theme
    Settings(SettingsArgs),

    /// Delete all stored notes and settings
    ClearData {
        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}

/// Options for the list command
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Filter notes by tag (repeatable; notes matching any are shown)
    #[clap(short, long)]
    pub tag: Vec<String>,

    /// Filter by substring of content or tags
    #[clap(short, long)]
    pub search: Option<String>,

    /// Only show notes in an urgency bucket: expired, urgent or warning
    #[clap(long)]
    pub due: Option<String>,

    /// Sort order within pin groups: created (newest first) or expiration
    /// (soonest first)
    #[clap(long, default_value = "created")]
    pub sort: String,

    /// Limit the number of notes returned (0 for no limit)
    #[clap(short = 'n', long, default_value_t = 10)]
    pub limit: usize,

    /// Format output as JSON
    #[clap(short, long)]
    pub json: bool,

    /// Only show note IDs and a one-line preview
    #[clap(short, long)]
    pub brief: bool,
}

/// Options for the edit command
#[derive(Debug, Args)]
pub struct EditArgs {
    /// ID of the note to edit
    pub id: String,

    /// New content for the note
    #[clap(short, long)]
    pub content: Option<String>,

    /// Open content in editor before saving
    #[clap(short, long)]
    pub edit: bool,

    /// Path to a file containing the new note content
    #[clap(short, long)]
    pub file: Option<PathBuf>,

    /// Tags to add (comma-separated)
    #[clap(short, long)]
    pub add_tags: Option<String>,

    /// Tags to remove (comma-separated)
    #[clap(short, long)]
    pub remove_tags: Option<String>,

    /// New expiration: a preset or a datetime
    #[clap(long)]
    pub expires: Option<String>,

    /// Remove the expiration (and any reminder derived from it)
    #[clap(long, conflicts_with = "expires")]
    pub clear_expiration: bool,

    /// New reminder ahead of the expiration: 5m, 15m, 30m, 1h, 3h or 1d
    #[clap(long)]
    pub remind: Option<String>,

    /// Convert the note's checklist to markdown text (irreversible)
    #[clap(long)]
    pub to_text: bool,

    /// Remove any image, drawing, audio and transcription attachments
    #[clap(long)]
    pub clear_attachments: bool,
}

/// Options for the settings command
#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Set the font size
    #[clap(long)]
    pub font_size: Option<u32>,

    /// Set the font family
    #[clap(long)]
    pub font_family: Option<String>,

    /// Set the font weight
    #[clap(long)]
    pub font_weight: Option<String>,

    /// Enable or disable auto-save (true/false)
    #[clap(long)]
    pub auto_save: Option<bool>,

    /// Set the theme id
    #[clap(long)]
    pub theme: Option<String>,

    /// Reset all settings and the theme to defaults
    #[clap(long)]
    pub reset: bool,

    /// Format output as JSON
    #[clap(short, long)]
    pub json: bool,
}
