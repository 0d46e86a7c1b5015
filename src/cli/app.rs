//! CLI module for the little-notes application
//!
//! This module handles the command-line interface for interacting with the
//! note store.

use std::{
    fs::{read_to_string, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process::Command,
    str::FromStr,
    thread,
    time::Duration,
};

use chrono::Utc;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use log::info;
use shell_words::split;
use tempfile::Builder;

use crate::{
    arrange_for_display, confirm, extract_hashtags, parse_expiration_spec, parse_reminder_spec,
    parse_tags, time_status, todos_to_markdown, Commands, Config, EditArgs, ExportBundle,
    ListArgs, Note, NoteDraft, NoteError, NoteFilter, NoteStore, NoteUpdate, ReminderType, Result,
    SettingsArgs, SortOrder, StorageBackend, TimeBucket, TimeStatus, TodoItem, MAX_TODO_INDENT,
};

const DEFAULT_BUNDLE_FILE: &str = "little-notes-backup.json";

/// CLI application handler - processes CLI commands and interfaces with the
/// note store
pub struct App<B: StorageBackend> {
    /// The note store
    store: NoteStore<B>,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl<B: StorageBackend> App<B> {
    /// Create a new CLI application with the given store and config
    pub fn new(store: NoteStore<B>, config: Config, verbose: bool) -> Self {
        Self {
            store,
            config,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Create {
                content,
                edit,
                file,
                tags,
                expires,
                remind,
                remind_type,
                pin,
                todo,
            } => self.handle_create(
                content, edit, file, tags, expires, remind, remind_type, pin, todo,
            ),

            Commands::List(options) => self.handle_list(options),

            Commands::View { id, json } => self.handle_view(&id, json),

            Commands::Edit(options) => self.handle_edit(options),

            Commands::Delete { ids, force } => self.handle_delete(&ids, force),

            Commands::Pin { id } => self.handle_pin(&id),

            Commands::Search {
                query,
                tags,
                fuzzy,
                limit,
                json,
            } => self.handle_search(&query, tags, fuzzy, limit, json),

            Commands::Tags => self.handle_tags(),

            Commands::Countdown { id, watch } => self.handle_countdown(&id, watch),

            Commands::Export { output } => self.handle_export(output),

            Commands::Import { bundle_file, force } => self.handle_import(&bundle_file, force),

            Commands::Settings(options) => self.handle_settings(options),

            Commands::ClearData { force } => self.handle_clear_data(force),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_create(
        &self,
        content: Option<String>,
        edit: bool,
        file: Option<PathBuf>,
        tags: Option<String>,
        expires: Option<String>,
        remind: Option<String>,
        remind_type: String,
        pin: bool,
        todo: Vec<String>,
    ) -> Result<()> {
        let todos = parse_todo_items(&todo);

        // Get content based on the provided options
        let note_content = match (content, file) {
            (Some(c), _) => c,
            (_, Some(file_path)) => self.read_content_from_file(&file_path)?,
            (None, None) => {
                if edit {
                    self.open_editor_with_content("")?
                } else if todos.is_some() {
                    String::new()
                } else {
                    return Err(NoteError::ApplicationError {
                        message: "Provide note content with --content, --file, --edit or --todo"
                            .to_string(),
                    });
                }
            }
        };

        // Explicit tags plus hashtags found in the content, deduplicated
        let mut parsed_tags = parse_tags(tags);
        for tag in extract_hashtags(&note_content) {
            if !parsed_tags.contains(&tag) {
                parsed_tags.push(tag);
            }
        }

        let now = Utc::now();
        let expiration_date = expires
            .map(|spec| parse_expiration_spec(&spec, now))
            .transpose()?;

        let (reminder_time, reminder_type) = match (remind, expiration_date) {
            (Some(spec), Some(expiration)) => (
                Some(parse_reminder_spec(&spec, expiration)?),
                Some(ReminderType::from_str(&remind_type)?),
            ),
            _ => (None, None),
        };

        let note = self.store.create(NoteDraft {
            content: note_content,
            tags: parsed_tags,
            expiration_date,
            reminder_time,
            reminder_type,
            is_pinned: pin,
            todos,
            ..NoteDraft::default()
        })?;

        println!("Note created with ID: {}", note.id);
        if let Some(status) = time_status(&note) {
            println!("Expires in: {}", status.detailed_text);
        }
        Ok(())
    }

    fn handle_list(&self, options: ListArgs) -> Result<()> {
        let order = SortOrder::parse(&options.sort).ok_or_else(|| NoteError::InvalidFormat {
            message: format!(
                "Invalid sort order: {}. Must be created or expiration",
                options.sort
            ),
        })?;
        let bucket = options
            .due
            .as_deref()
            .map(|d| {
                TimeBucket::parse(d).ok_or_else(|| NoteError::InvalidFormat {
                    message: format!("Invalid bucket: {}. Must be expired, urgent or warning", d),
                })
            })
            .transpose()?;

        let filter = NoteFilter {
            query: options.search.unwrap_or_default(),
            tags: options.tag,
            bucket,
        };

        let now = Utc::now();
        let mut notes: Vec<Note> = self
            .store
            .list()
            .into_iter()
            .filter(|n| filter.matches_at(n, now))
            .collect();

        arrange_for_display(&mut notes, order);

        if options.limit > 0 && notes.len() > options.limit {
            notes.truncate(options.limit);
        }

        if options.json {
            self.display_notes_json(&notes)?;
        } else if options.brief {
            self.display_notes_brief(&notes);
        } else {
            self.display_notes_text(&notes, false)?;
        }
        Ok(())
    }

    fn handle_view(&self, id: &str, json: bool) -> Result<()> {
        let note = self.store.get(id).ok_or_else(|| NoteError::NoteNotFound {
            id: id.to_string(),
        })?;

        if json {
            println!("{}", serde_json::to_string_pretty(&note)?);
        } else {
            self.display_notes_text(std::slice::from_ref(&note), true)?;
        }
        Ok(())
    }

    fn handle_edit(&self, options: EditArgs) -> Result<()> {
        // Validate input - check for conflicting options
        if options.content.is_some() && options.file.is_some() {
            return Err(NoteError::ApplicationError {
                message: "Cannot specify both --content and --file options".to_string(),
            });
        }
        if options.content.is_some() && options.edit {
            return Err(NoteError::ApplicationError {
                message: "Cannot specify both --content and --edit options".to_string(),
            });
        }
        if options.file.is_some() && options.edit {
            return Err(NoteError::ApplicationError {
                message: "Cannot specify both --file and --edit options".to_string(),
            });
        }
        if options.to_text && (options.content.is_some() || options.file.is_some() || options.edit)
        {
            return Err(NoteError::ApplicationError {
                message: "Cannot combine --to-text with other content options".to_string(),
            });
        }

        let note = self
            .store
            .get(&options.id)
            .ok_or_else(|| NoteError::NoteNotFound {
                id: options.id.clone(),
            })?;

        let mut update = NoteUpdate::default();

        // Handle content updates
        if let Some(new_content) = options.content {
            update.content = Some(new_content);
        } else if let Some(file_path) = options.file {
            update.content = Some(self.read_content_from_file(&file_path)?);
        } else if options.edit {
            update.content = Some(self.open_editor_with_content(&note.content)?);
        } else if options.to_text {
            // One-way conversion: the checklist becomes markdown text
            let todos = note.todos.as_deref().ok_or_else(|| NoteError::ApplicationError {
                message: format!("Note {} has no checklist to convert", note.id),
            })?;
            update.content = Some(todos_to_markdown(todos));
            update.todos = Some(None);
        }

        if options.clear_attachments {
            update.image = Some(None);
            update.drawing = Some(None);
            update.audio = Some(None);
            update.transcription = Some(None);
        }

        // Handle tag updates, starting from the stored tags plus any
        // hashtags in the new content
        if options.add_tags.is_some() || options.remove_tags.is_some() || update.content.is_some() {
            let mut tags = note.tags.clone();

            if let Some(content) = &update.content {
                for tag in extract_hashtags(content) {
                    if !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
            }
            for tag in parse_tags(options.add_tags) {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
            let remove = parse_tags(options.remove_tags);
            tags.retain(|tag| !remove.contains(tag));

            update.tags = Some(tags);
        }

        // Handle expiration and reminder updates
        if options.clear_expiration {
            update.expiration_date = Some(None);
            update.reminder_time = Some(None);
            update.reminder_type = Some(None);
        } else if let Some(spec) = options.expires {
            let expiration = parse_expiration_spec(&spec, Utc::now())?;
            update.expiration_date = Some(Some(expiration));
            if let Some(remind) = &options.remind {
                update.reminder_time = Some(Some(parse_reminder_spec(remind, expiration)?));
                update.reminder_type = Some(Some(
                    note.reminder_type.unwrap_or(ReminderType::Popup),
                ));
            } else if note.reminder_time.is_some() {
                // The old reminder was relative to the old expiration
                update.reminder_time = Some(None);
                update.reminder_type = Some(None);
            }
        } else if let Some(remind) = options.remind {
            let expiration =
                note.expiration_date
                    .ok_or_else(|| NoteError::ApplicationError {
                        message: "Cannot set a reminder on a note without an expiration"
                            .to_string(),
                    })?;
            update.reminder_time = Some(Some(parse_reminder_spec(&remind, expiration)?));
            update.reminder_type = Some(Some(
                note.reminder_type.unwrap_or(ReminderType::Popup),
            ));
        }

        if update.is_empty() {
            println!("Nothing to update.");
            return Ok(());
        }

        self.store.update(&options.id, update)?;
        println!("Note {} updated successfully", options.id);
        Ok(())
    }

    fn handle_delete(&self, ids: &[String], force: bool) -> Result<()> {
        // Verify the notes exist and show them before prompting
        let notes: Vec<Note> = ids.iter().filter_map(|id| self.store.get(id)).collect();
        if notes.is_empty() {
            return Err(NoteError::NoteNotFound {
                id: ids.join(", "),
            });
        }

        if !force {
            println!("You are about to delete the following note(s):");
            for note in &notes {
                println!(
                    "  {} | {} | {}",
                    note.id,
                    note.created_at.format("%Y-%m-%d %H:%M"),
                    content_preview(&note.content, 60)
                );
            }
            println!("\nThis action cannot be undone!");
            if !confirm("Are you sure you want to delete?")? {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        let removed = self.store.delete_many(ids)?;
        println!(
            "Deleted {} note{}.",
            removed,
            if removed == 1 { "" } else { "s" }
        );
        Ok(())
    }

    fn handle_pin(&self, id: &str) -> Result<()> {
        let note = self
            .store
            .toggle_pin(id)?
            .ok_or_else(|| NoteError::NoteNotFound {
                id: id.to_string(),
            })?;

        println!(
            "Note {} is now {}.",
            note.id,
            if note.is_pinned { "pinned" } else { "unpinned" }
        );
        Ok(())
    }

    fn handle_search(
        &self,
        query: &str,
        tags: Option<String>,
        fuzzy: bool,
        limit: usize,
        json: bool,
    ) -> Result<()> {
        let tags = parse_tags(tags);
        let mut results = self.store.search(query, &tags);

        if fuzzy && !query.is_empty() {
            // Rerank the substring hits by fuzzy match quality against the
            // content, best first
            let matcher = SkimMatcherV2::default();
            let mut scored: Vec<(i64, Note)> = results
                .into_iter()
                .map(|note| {
                    let score = matcher.fuzzy_match(&note.content, query).unwrap_or(0);
                    (score, note)
                })
                .collect();
            scored.sort_by(|a, b| b.0.cmp(&a.0));
            results = scored.into_iter().map(|(_, note)| note).collect();
        }

        // Apply limit if specified (0 means no limit)
        if limit > 0 && results.len() > limit {
            results.truncate(limit);
        }

        if json {
            self.display_notes_json(&results)?;
        } else if results.is_empty() {
            println!("No notes found matching query: \"{}\"", query);
        } else {
            self.display_notes_text(&results, false)?;
        }
        Ok(())
    }

    fn handle_tags(&self) -> Result<()> {
        let tags = self.store.all_tags();
        if tags.is_empty() {
            println!("No tags in use.");
            return Ok(());
        }
        for tag in tags {
            println!("#{}", tag);
        }
        Ok(())
    }

    fn handle_countdown(&self, id: &str, watch: bool) -> Result<()> {
        let note = self.store.get(id).ok_or_else(|| NoteError::NoteNotFound {
            id: id.to_string(),
        })?;

        let Some(mut status) = time_status(&note) else {
            println!("Note {} has no expiration date.", id);
            return Ok(());
        };

        if !watch {
            println!("{}", styled_countdown(&status));
            return Ok(());
        }

        loop {
            println!("{}", styled_countdown(&status));
            if status.is_expired {
                break;
            }
            thread::sleep(Duration::from_secs(1));
            status = match time_status(&note) {
                Some(s) => s,
                None => break,
            };
        }
        Ok(())
    }

    fn handle_export(&self, output: Option<PathBuf>) -> Result<()> {
        let path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_BUNDLE_FILE));
        let bundle = self.store.export_bundle();
        let json = serde_json::to_string_pretty(&bundle)?;
        std::fs::write(&path, json)?;

        let note_count = bundle
            .notes
            .as_ref()
            .and_then(|n| n.as_array().map(|a| a.len()))
            .unwrap_or(0);
        println!(
            "Exported {} note{} to {}",
            note_count,
            if note_count == 1 { "" } else { "s" },
            path.display()
        );
        Ok(())
    }

    fn handle_import(&self, bundle_file: &Path, force: bool) -> Result<()> {
        let raw = read_to_string(bundle_file)?;
        let bundle: ExportBundle =
            serde_json::from_str(&raw).map_err(|e| NoteError::InvalidFormat {
                message: format!("Invalid bundle file {}: {}", bundle_file.display(), e),
            })?;

        if !force {
            println!(
                "Importing {} (exported {}) will overwrite your current data.",
                bundle_file.display(),
                bundle.export_date.format("%Y-%m-%d %H:%M")
            );
            if !confirm("Continue?")? {
                println!("Import cancelled.");
                return Ok(());
            }
        }

        let summary = self.store.import_bundle(&bundle)?;
        if !summary.applied_any() {
            println!("Bundle contained no importable sections.");
            return Ok(());
        }

        let mut applied = Vec::new();
        if summary.notes {
            applied.push("notes");
        }
        if summary.settings {
            applied.push("settings");
        }
        if summary.backgrounds {
            applied.push("backgrounds");
        }
        if summary.theme {
            applied.push("theme");
        }
        println!("Imported: {}", applied.join(", "));
        Ok(())
    }

    fn handle_settings(&self, options: SettingsArgs) -> Result<()> {
        if options.reset {
            self.store.reset_settings()?;
            println!("Settings reset to defaults.");
        }

        let mut settings = self.store.user_settings();
        let mut changed = false;

        if let Some(font_size) = options.font_size {
            settings.font_size = font_size;
            changed = true;
        }
        if let Some(font_family) = options.font_family {
            settings.font_family = font_family;
            changed = true;
        }
        if let Some(font_weight) = options.font_weight {
            settings.font_weight = font_weight;
            changed = true;
        }
        if let Some(auto_save) = options.auto_save {
            settings.auto_save = auto_save;
            changed = true;
        }

        if changed {
            self.store.save_user_settings(&settings)?;
            info!("Settings updated");
        }
        if let Some(theme) = options.theme {
            self.store.set_theme(&theme)?;
            info!("Theme set to {}", theme);
        }

        if options.json {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        } else {
            println!("auto-save:   {}", settings.auto_save);
            println!("font size:   {}", settings.font_size);
            println!("font family: {}", settings.font_family);
            println!("font weight: {}", settings.font_weight);
            println!(
                "theme:       {}",
                self.store.theme().unwrap_or_else(|| "default".to_string())
            );
        }
        Ok(())
    }

    fn handle_clear_data(&self, force: bool) -> Result<()> {
        if !force {
            let count = self.store.list().len();
            println!(
                "This will permanently delete {} note{} and all settings.",
                count,
                if count == 1 { "" } else { "s" }
            );
            if !confirm("Are you sure?")? {
                println!("Cancelled.");
                return Ok(());
            }
        }

        self.store.clear_all()?;
        println!("All data cleared.");
        Ok(())
    }

    // Helper function for reading content from file
    fn read_content_from_file(&self, file_path: &Path) -> Result<String> {
        if !file_path.exists() {
            return Err(NoteError::ApplicationError {
                message: format!("File not found: {}", file_path.display()),
            });
        }
        if !file_path.is_file() {
            return Err(NoteError::ApplicationError {
                message: format!("Not a file: {}", file_path.display()),
            });
        }
        read_to_string(file_path).map_err(NoteError::Io)
    }

    // Helper function to open editor with existing content
    fn open_editor_with_content(&self, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        self.write_editor_template(&temp_path, existing_content)?;

        let editor_cmd = self.config.get_editor_command();
        info!("Opening editor to write note content. Save and exit when done...");
        self.launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(process_editor_content(content))
    }

    fn write_editor_template(&self, path: &Path, existing_content: &str) -> Result<()> {
        let mut file = OpenOptions::new().write(true).open(path)?;

        writeln!(file, "<!-- ")?;
        writeln!(
            file,
            "Write your note content below. Use #tags to tag the note."
        )?;
        writeln!(
            file,
            "Lines that start with <!-- and end with --> are comments and will be ignored."
        )?;
        writeln!(file, "Save and exit the editor when you're done.")?;
        writeln!(file, "-->")?;
        if !existing_content.is_empty() {
            writeln!(file, "{}", existing_content)?;
        }

        Ok(())
    }

    fn launch_editor(&self, editor_cmd: &str, file_path: &Path) -> Result<()> {
        let path_str = file_path.to_string_lossy();

        // Handle shell-like command parsing
        let args = split(editor_cmd).map_err(|e| NoteError::EditorError {
            message: format!("Failed to parse editor command: {}", e),
        })?;

        if args.is_empty() {
            return Err(NoteError::EditorError {
                message: "Empty editor command".to_string(),
            });
        }

        // First word is the program name, rest are arguments
        let mut command = Command::new(&args[0]);
        if args.len() > 1 {
            command.args(&args[1..]);
        }
        command.arg(path_str.as_ref());

        let status = command.status()?;
        if !status.success() {
            return Err(NoteError::EditorError {
                message: "Editor exited with non-zero status".to_string(),
            });
        }

        Ok(())
    }

    /// Display notes in JSON format
    fn display_notes_json(&self, notes: &[Note]) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(notes)?);
        Ok(())
    }

    /// Display note IDs with a one-line preview
    fn display_notes_brief(&self, notes: &[Note]) {
        for note in notes {
            let pin = if note.is_pinned { "* " } else { "  " };
            println!("{}{} | {}", pin, note.id, content_preview(&note.content, 60));
        }
    }

    /// Display notes in text format
    fn display_notes_text(&self, notes: &[Note], detailed: bool) -> Result<()> {
        if notes.is_empty() {
            println!("No notes found matching the criteria.");
            return Ok(());
        }

        // Use terminal width for formatting if available
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }

            let created_at = note.created_at.format("%Y-%m-%d %H:%M");
            let pin = if note.is_pinned {
                format!(" {}", console::style("[pinned]").yellow())
            } else {
                String::new()
            };
            println!("ID: {} | Created: {}{}", note.id, created_at, pin);

            if !note.tags.is_empty() {
                let tags = note
                    .tags
                    .iter()
                    .map(|tag| format!("#{}", tag))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("Tags: {}", console::style(tags).cyan());
            }

            if let Some(status) = time_status(note) {
                println!("Expires: {}", styled_countdown(&status));
            }

            if detailed {
                if let Some(todos) = &note.todos {
                    println!("\n{}", todos_to_markdown(todos));
                } else {
                    println!("\n{}", note.content);
                }
                if let Some(reminder) = note.reminder_time {
                    println!("\nReminder: {}", reminder.format("%Y-%m-%d %H:%M"));
                }
            } else {
                let preview = content_preview(&note.content, 100);
                if !preview.is_empty() {
                    println!("\n{}", preview);
                }
            }

            if self.verbose {
                println!("Updated: {}", note.updated_at.format("%Y-%m-%d %H:%M"));
            }
        }

        println!(
            "\nFound {} note{}",
            notes.len(),
            if notes.len() == 1 { "" } else { "s" }
        );

        Ok(())
    }
}

fn styled_countdown(status: &TimeStatus) -> String {
    if status.is_expired {
        console::style(&status.text).red().to_string()
    } else if status.is_urgent {
        console::style(&status.detailed_text).red().to_string()
    } else if status.is_warning {
        console::style(&status.detailed_text).yellow().to_string()
    } else {
        status.detailed_text.clone()
    }
}

/// Builds checklist items from --todo arguments. Each pair of leading
/// spaces is one indent level, clamped like the interactive editor.
fn parse_todo_items(items: &[String]) -> Option<Vec<TodoItem>> {
    if items.is_empty() {
        return None;
    }

    let todos = items
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let text = raw.trim_start();
            let leading = raw.len() - text.len();
            let indent = (leading / 2).min(MAX_TODO_INDENT as usize) as u8;
            let mut item = TodoItem::new((i + 1).to_string(), text.to_string());
            item.indent = indent;
            item
        })
        .collect();
    Some(todos)
}

fn process_editor_content(content: String) -> String {
    // Remove HTML comments from content
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with("<!--") && !line.trim_end().ends_with("-->"))
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Generate a content preview for displaying brief notes
fn content_preview(content: &str, max_len: usize) -> String {
    // Get first non-empty line
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}
