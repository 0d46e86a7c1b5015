//! The note repository.
//!
//! All notes live in a single serialized array under one storage key; every
//! mutation is a synchronous read-modify-write of the whole blob. Two
//! concurrent writers therefore race with last-writer-wins semantics, which
//! is an accepted limitation of the storage model.
//!
//! Failure semantics are asymmetric on purpose: reads degrade to an empty
//! result (absent key, unavailable backend, corrupt JSON are all logged and
//! swallowed) while mutations propagate backend errors to the caller.

use chrono::Utc;
use log::{debug, error, info, warn};

use crate::{Note, NoteDraft, NoteUpdate, StorageBackend, NOTES_KEY, Result};

/// Manages storage and retrieval of notes over an injected backend.
pub struct NoteStore<B: StorageBackend> {
    pub(crate) backend: B,
}

impl<B: StorageBackend> NoteStore<B> {
    pub fn new(backend: B) -> Self {
        NoteStore { backend }
    }

    /// Access to the underlying backend, mostly for transfer operations.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Loads every note in canonical (stored) order.
    ///
    /// Never fails: an unavailable backend or a corrupt blob yields an empty
    /// list with the error logged.
    pub fn list(&self) -> Vec<Note> {
        match self.backend.read(NOTES_KEY) {
            Ok(Some(raw)) => parse_notes(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Note storage unavailable for read, returning empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Point lookup by id, first match wins.
    pub fn get(&self, id: &str) -> Option<Note> {
        self.list().into_iter().find(|n| n.id == id)
    }

    /// Blob load for a mutation: backend failures raise, but a corrupt blob
    /// still degrades to empty (matching the read path) so a damaged store
    /// can be written over rather than bricking every mutation.
    fn load_for_update(&self) -> Result<Vec<Note>> {
        Ok(self.backend.read(NOTES_KEY)?.map_or_else(Vec::new, |raw| parse_notes(&raw)))
    }

    fn persist(&self, notes: &[Note]) -> Result<()> {
        let raw = serde_json::to_string(notes)?;
        self.backend.write(NOTES_KEY, &raw)
    }

    /// Creates a note from the draft and prepends it to the stored list.
    ///
    /// The id is the current time in milliseconds; a same-millisecond
    /// collision is possible and deliberately not checked for.
    pub fn create(&self, draft: NoteDraft) -> Result<Note> {
        let note = Note::from_draft(draft, Utc::now());

        let mut notes = self.load_for_update()?;
        notes.insert(0, note.clone());
        self.persist(&notes)?;

        info!("Created note {}", note.id);
        Ok(note)
    }

    /// Applies a partial update to the first note matching `id`.
    /// Returns `Ok(None)` when no note matches.
    pub fn update(&self, id: &str, update: NoteUpdate) -> Result<Option<Note>> {
        let mut notes = self.load_for_update()?;

        let Some(pos) = notes.iter().position(|n| n.id == id) else {
            warn!("Cannot update note {}: not found", id);
            return Ok(None);
        };

        notes[pos].apply(update, Utc::now());
        let updated = notes[pos].clone();
        self.persist(&notes)?;

        info!("Updated note {}", id);
        Ok(Some(updated))
    }

    /// Removes the note with the given id; returns whether anything was
    /// removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut notes = self.load_for_update()?;
        let before = notes.len();
        notes.retain(|n| n.id != id);

        if notes.len() == before {
            debug!("Delete of {} was a no-op", id);
            return Ok(false);
        }

        self.persist(&notes)?;
        info!("Deleted note {}", id);
        Ok(true)
    }

    /// Removes every note whose id appears in `ids`; returns the number
    /// removed. The blob is only rewritten when something actually changed.
    pub fn delete_many(&self, ids: &[String]) -> Result<usize> {
        let mut notes = self.load_for_update()?;
        let before = notes.len();
        notes.retain(|n| !ids.contains(&n.id));
        let removed = before - notes.len();

        if removed > 0 {
            self.persist(&notes)?;
            info!("Deleted {} notes", removed);
        }
        Ok(removed)
    }

    /// Flips the pin flag and destructively reorders the canonical array:
    /// a newly pinned note moves to the front; an unpinned note is
    /// reinserted at the end of the pinned block (before the first unpinned
    /// record). Returns `Ok(None)` when no note matches.
    pub fn toggle_pin(&self, id: &str) -> Result<Option<Note>> {
        let mut notes = self.load_for_update()?;

        let Some(pos) = notes.iter().position(|n| n.id == id) else {
            warn!("Cannot toggle pin on note {}: not found", id);
            return Ok(None);
        };

        let mut note = notes.remove(pos);
        note.is_pinned = !note.is_pinned;
        note.updated_at = Utc::now();

        if note.is_pinned {
            notes.insert(0, note.clone());
        } else {
            match notes.iter().position(|n| !n.is_pinned) {
                Some(first_unpinned) => notes.insert(first_unpinned, note.clone()),
                None => notes.push(note.clone()),
            }
        }

        self.persist(&notes)?;
        info!(
            "Note {} is now {}",
            id,
            if note.is_pinned { "pinned" } else { "unpinned" }
        );
        Ok(Some(note))
    }

    /// Case-insensitive substring search over content and tags, optionally
    /// narrowed to notes carrying at least one of `tags`. Both filters AND
    /// together; within `tags` the semantics are OR.
    pub fn search(&self, query: &str, tags: &[String]) -> Vec<Note> {
        self.list()
            .into_iter()
            .filter(|n| n.matches_query(query) && n.has_any_tag(tags))
            .collect()
    }

    /// Every distinct tag across all notes, lexicographically sorted.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .list()
            .into_iter()
            .flat_map(|n| n.tags)
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

fn parse_notes(raw: &str) -> Vec<Note> {
    match serde_json::from_str(raw) {
        Ok(notes) => notes,
        Err(e) => {
            error!("Corrupt note blob, treating as empty: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryBackend, NoteError, ReminderType};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    /// Backend that fails every call, standing in for the
    /// storage-unavailable execution context.
    struct DownBackend;

    impl StorageBackend for DownBackend {
        fn read(&self, _key: &str) -> Result<Option<String>> {
            Err(NoteError::StorageUnavailable {
                message: "no storage in this context".to_string(),
            })
        }
        fn write(&self, _key: &str, _value: &str) -> Result<()> {
            Err(NoteError::StorageUnavailable {
                message: "no storage in this context".to_string(),
            })
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(NoteError::StorageUnavailable {
                message: "no storage in this context".to_string(),
            })
        }
    }

    fn ts(offset_secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).unwrap()
    }

    fn note(id: &str, content: &str, tags: &[&str], pinned: bool, created_offset: i64) -> Note {
        let created = ts(created_offset);
        Note {
            id: id.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            image: None,
            drawing: None,
            audio: None,
            transcription: None,
            expiration_date: None,
            reminder_time: None,
            reminder_type: None,
            created_at: created,
            updated_at: created,
            is_pinned: pinned,
            todos: None,
        }
    }

    fn store_with(notes: Vec<Note>) -> NoteStore<MemoryBackend> {
        let store = NoteStore::new(MemoryBackend::new());
        store.persist(&notes).unwrap();
        store
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn list_is_empty_without_a_blob() {
        let store = NoteStore::new(MemoryBackend::new());
        assert!(store.list().is_empty());
    }

    #[test]
    fn list_swallows_corrupt_blob() {
        let store = NoteStore::new(MemoryBackend::new());
        store.backend.write(NOTES_KEY, "{not json").unwrap();
        assert!(store.list().is_empty());
    }

    #[test]
    fn reads_degrade_but_writes_fail_loud_when_storage_is_down() {
        let store = NoteStore::new(DownBackend);

        assert!(store.list().is_empty());
        assert!(store.search("anything", &[]).is_empty());
        assert!(store.all_tags().is_empty());

        let err = store.create(NoteDraft::default()).unwrap_err();
        assert!(matches!(err, NoteError::StorageUnavailable { .. }));
        let err = store.delete("1").unwrap_err();
        assert!(matches!(err, NoteError::StorageUnavailable { .. }));
    }

    #[test]
    fn create_prepends_and_round_trips_all_fields() {
        let store = NoteStore::new(MemoryBackend::new());
        store
            .create(NoteDraft {
                content: "first".to_string(),
                ..NoteDraft::default()
            })
            .unwrap();

        let expiration = Utc::now() + Duration::days(3);
        let created = store
            .create(NoteDraft {
                content: "记得带上相机 #摄影".to_string(),
                tags: vec!["生活".to_string(), "摄影".to_string()],
                image: Some("data:image/png;base64,QUJD".to_string()),
                transcription: Some("模拟的语音转文字".to_string()),
                expiration_date: Some(expiration),
                reminder_time: Some(expiration - Duration::hours(1)),
                reminder_type: Some(ReminderType::Popup),
                ..NoteDraft::default()
            })
            .unwrap();

        let listed = store.list();
        assert_eq!(listed.len(), 2);
        // Newest first.
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0], created);
        assert_eq!(listed[0].tags, vec!["生活", "摄影"]);
        assert_eq!(listed[0].reminder_type, Some(ReminderType::Popup));
        // Dates survive the ISO round trip to the millisecond.
        assert_eq!(
            listed[0].expiration_date.unwrap().timestamp_millis(),
            expiration.timestamp_millis()
        );
    }

    #[test]
    fn update_merges_and_reports_not_found() {
        let store = store_with(vec![note("1", "old", &["a"], false, 0)]);

        let updated = store
            .update(
                "1",
                NoteUpdate {
                    content: Some("new".to_string()),
                    ..NoteUpdate::default()
                },
            )
            .unwrap()
            .expect("note exists");
        assert_eq!(updated.content, "new");
        assert_eq!(updated.tags, vec!["a"]);
        assert!(updated.updated_at > updated.created_at);
        assert_eq!(store.get("1").unwrap().content, "new");

        assert!(store.update("missing", NoteUpdate::default()).unwrap().is_none());
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let store = store_with(vec![note("1", "a", &[], false, 0)]);
        assert!(store.delete("1").unwrap());
        assert!(!store.delete("1").unwrap());
        assert!(store.list().is_empty());
    }

    #[test]
    fn delete_many_counts_only_existing_ids() {
        let store = store_with(vec![
            note("1", "a", &[], false, 0),
            note("2", "b", &[], false, 1),
            note("3", "c", &[], false, 2),
        ]);

        let removed = store
            .delete_many(&["2".to_string(), "missing".to_string()])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(ids(&store.list()), vec!["1", "3"]);

        // Nothing matches, nothing persisted.
        let removed = store.delete_many(&["nope".to_string()]).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(ids(&store.list()), vec!["1", "3"]);
    }

    #[test]
    fn toggle_pin_moves_note_to_front_and_back_of_pinned_block() {
        let store = store_with(vec![
            note("1", "a", &[], false, 3),
            note("2", "b", &[], false, 2),
            note("3", "c", &[], false, 1),
        ]);

        // Pinning 3 moves it to the front of the canonical array.
        let pinned = store.toggle_pin("3").unwrap().unwrap();
        assert!(pinned.is_pinned);
        assert_eq!(ids(&store.list()), vec!["3", "1", "2"]);

        store.toggle_pin("2").unwrap();
        assert_eq!(ids(&store.list()), vec!["2", "3", "1"]);

        // Unpinning 2 reinserts it at the end of the pinned block, i.e.
        // right before the first unpinned note.
        let unpinned = store.toggle_pin("2").unwrap().unwrap();
        assert!(!unpinned.is_pinned);
        assert_eq!(ids(&store.list()), vec!["3", "2", "1"]);
    }

    #[test]
    fn toggle_pin_twice_restores_state_and_relative_order() {
        let store = store_with(vec![
            note("1", "a", &[], true, 4),
            note("2", "b", &[], false, 3),
            note("3", "c", &[], false, 2),
        ]);

        store.toggle_pin("3").unwrap();
        store.toggle_pin("3").unwrap();

        let notes = store.list();
        assert!(!store.get("3").unwrap().is_pinned);
        // Pinned block leads, relative order among unpinned preserved.
        assert_eq!(ids(&notes), vec!["1", "3", "2"]);
        assert!(notes[0].is_pinned);
    }

    #[test]
    fn unpinning_when_all_others_are_pinned_appends() {
        let store = store_with(vec![
            note("1", "a", &[], true, 2),
            note("2", "b", &[], true, 1),
        ]);

        store.toggle_pin("1").unwrap();
        assert_eq!(ids(&store.list()), vec!["2", "1"]);
    }

    #[test]
    fn toggle_pin_on_missing_id_is_none() {
        let store = store_with(vec![note("1", "a", &[], false, 0)]);
        assert!(store.toggle_pin("missing").unwrap().is_none());
    }

    #[test]
    fn search_matches_content_and_tags_case_insensitively() {
        let store = store_with(vec![
            note("1", "Need to finish work report", &["办公"], false, 0),
            note("2", "周末去爬山", &["工作"], false, 1),
            note("3", "买菜清单", &["生活"], false, 2),
        ]);

        // Mixed case still matches the content substring.
        let hits = store.search("WORK", &[]);
        assert_eq!(ids(&hits), vec!["1"]);

        // Blank query with a tag filter returns only tagged notes.
        let hits = store.search("", &["工作".to_string()]);
        assert_eq!(ids(&hits), vec!["2"]);

        // Tag filter is OR within tags, AND with the query.
        let hits = store.search("", &["工作".to_string(), "生活".to_string()]);
        assert_eq!(ids(&hits), vec!["2", "3"]);
        let hits = store.search("爬山", &["工作".to_string(), "生活".to_string()]);
        assert_eq!(ids(&hits), vec!["2"]);
    }

    #[test]
    fn search_query_also_matches_tag_substrings() {
        let store = store_with(vec![
            note("1", "mentions work in text", &[], false, 0),
            note("2", "无关内容", &["work-life"], false, 1),
        ]);

        let hits = store.search("work", &[]);
        assert_eq!(ids(&hits), vec!["1", "2"]);
    }

    #[test]
    fn all_tags_is_sorted_and_deduplicated() {
        let store = store_with(vec![
            note("1", "", &["工作", "咖啡"], false, 0),
            note("2", "", &["工作", "生活"], false, 1),
        ]);

        assert_eq!(store.all_tags(), vec!["咖啡", "工作", "生活"]);
    }
}
