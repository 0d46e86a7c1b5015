//! Display ordering and filtering for note lists.
//!
//! Pinned notes always come first; within each pin group the selected sort
//! order applies. Both passes are stable, so notes that compare equal keep
//! their stored order.

use chrono::{DateTime, Utc};

use crate::timestatus::time_status_at;
use crate::Note;

/// How notes are ordered within their pin group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest creation time first.
    #[default]
    CreatedDesc,
    /// Soonest expiration first; notes without an expiration sort last.
    ExpirationAsc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" | "newest" => Some(SortOrder::CreatedDesc),
            "expiration" | "expires" => Some(SortOrder::ExpirationAsc),
            _ => None,
        }
    }
}

/// Sorts notes by the given order, ignoring pin state.
pub fn sort_notes(notes: &mut [Note], order: SortOrder) {
    match order {
        SortOrder::CreatedDesc => {
            notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        SortOrder::ExpirationAsc => {
            // None compares equal to None and after Some, so unexpiring
            // notes trail in their stored order.
            notes.sort_by(|a, b| match (a.expiration_date, b.expiration_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
        }
    }
}

/// Moves pinned notes to the front without disturbing relative order.
pub fn pin_partition(notes: &mut [Note]) {
    notes.sort_by_key(|n| !n.is_pinned);
}

/// Applies the full display policy: sort within the whole list, then float
/// pinned notes to the top.
pub fn arrange_for_display(notes: &mut [Note], order: SortOrder) {
    sort_notes(notes, order);
    pin_partition(notes);
}

/// Urgency buckets a list can be narrowed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Expired,
    Urgent,
    Warning,
}

impl TimeBucket {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "expired" => Some(TimeBucket::Expired),
            "urgent" => Some(TimeBucket::Urgent),
            "warning" => Some(TimeBucket::Warning),
            _ => None,
        }
    }

    /// True when the note falls in this bucket at the given instant. Notes
    /// without an expiration never match any bucket.
    pub fn contains_at(&self, note: &Note, now: DateTime<Utc>) -> bool {
        match time_status_at(note, now) {
            Some(status) => match self {
                TimeBucket::Expired => status.is_expired,
                TimeBucket::Urgent => status.is_urgent,
                TimeBucket::Warning => status.is_warning,
            },
            None => false,
        }
    }
}

/// Combined list filter. Conditions are ANDed; an empty filter matches all.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub query: String,
    pub tags: Vec<String>,
    pub bucket: Option<TimeBucket>,
}

impl NoteFilter {
    pub fn matches_at(&self, note: &Note, now: DateTime<Utc>) -> bool {
        note.matches_query(&self.query)
            && note.has_any_tag(&self.tags)
            && self
                .bucket
                .map_or(true, |bucket| bucket.contains_at(note, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteDraft;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap()
    }

    fn note(id: &str, created: DateTime<Utc>, pinned: bool) -> Note {
        let mut n = Note::from_draft(NoteDraft::default(), created);
        n.id = id.to_string();
        n.is_pinned = pinned;
        n
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn pinned_notes_lead_regardless_of_age() {
        let t = now();
        // A is unpinned but newer; B is pinned and older.
        let mut notes = vec![
            note("a", t, false),
            note("b", t - Duration::hours(1), true),
        ];

        arrange_for_display(&mut notes, SortOrder::CreatedDesc);
        assert_eq!(ids(&notes), vec!["b", "a"]);
    }

    #[test]
    fn created_desc_orders_newest_first_within_groups() {
        let t = now();
        let mut notes = vec![
            note("old-pin", t - Duration::days(3), true),
            note("new", t, false),
            note("new-pin", t - Duration::days(1), true),
            note("old", t - Duration::days(2), false),
        ];

        arrange_for_display(&mut notes, SortOrder::CreatedDesc);
        assert_eq!(ids(&notes), vec!["new-pin", "old-pin", "new", "old"]);
    }

    #[test]
    fn expiration_asc_puts_unexpiring_notes_last() {
        let t = now();
        let mut soon = note("soon", t, false);
        soon.expiration_date = Some(t + Duration::hours(1));
        let mut later = note("later", t, false);
        later.expiration_date = Some(t + Duration::days(2));
        let never_a = note("never-a", t - Duration::hours(2), false);
        let never_b = note("never-b", t - Duration::hours(1), false);

        let mut notes = vec![never_a, later, never_b, soon];
        sort_notes(&mut notes, SortOrder::ExpirationAsc);
        // The two unexpiring notes keep their stored relative order.
        assert_eq!(ids(&notes), vec!["soon", "later", "never-a", "never-b"]);
    }

    #[test]
    fn buckets_classify_by_remaining_time() {
        let t = now();
        let mut expired = note("e", t, false);
        expired.expiration_date = Some(t - Duration::minutes(1));
        let mut urgent = note("u", t, false);
        urgent.expiration_date = Some(t + Duration::hours(5));
        let mut warning = note("w", t, false);
        warning.expiration_date = Some(t + Duration::days(2));
        let plain = note("p", t, false);

        assert!(TimeBucket::Expired.contains_at(&expired, t));
        assert!(!TimeBucket::Expired.contains_at(&urgent, t));
        assert!(TimeBucket::Urgent.contains_at(&urgent, t));
        assert!(TimeBucket::Warning.contains_at(&warning, t));
        assert!(!TimeBucket::Warning.contains_at(&plain, t));
        assert!(!TimeBucket::Urgent.contains_at(&plain, t));
    }

    #[test]
    fn filter_conditions_are_anded() {
        let t = now();
        let mut n = note("n", t, false);
        n.content = "买牛奶 #购物".to_string();
        n.tags = vec!["购物".to_string()];
        n.expiration_date = Some(t + Duration::hours(2));

        let filter = NoteFilter {
            query: "牛奶".to_string(),
            tags: vec!["购物".to_string()],
            bucket: Some(TimeBucket::Urgent),
        };
        assert!(filter.matches_at(&n, t));

        let mismatched_tag = NoteFilter {
            tags: vec!["工作".to_string()],
            ..filter.clone()
        };
        assert!(!mismatched_tag.matches_at(&n, t));

        let wrong_bucket = NoteFilter {
            bucket: Some(TimeBucket::Expired),
            ..filter
        };
        assert!(!wrong_bucket.matches_at(&n, t));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let n = note("n", now(), false);
        assert!(NoteFilter::default().matches_at(&n, now()));
    }
}
