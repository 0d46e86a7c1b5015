//! Expiration countdown and urgency classification.
//!
//! [`time_status`] is a pure function meant to be re-evaluated on a
//! one-second cadence while a note with an expiration is on screen; the
//! caller owns the timer and must stop it when the note leaves view.

use chrono::{DateTime, Duration, Months, Utc};

use crate::{Note, NoteError, Result};

const SECOND_MS: i64 = 1000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Fixed display text for an expired note.
pub const EXPIRED_TEXT: &str = "已过期";

/// Derived countdown state for a note with an expiration date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeStatus {
    pub is_expired: bool,
    /// Less than a full day remaining, or exactly one day.
    pub is_urgent: bool,
    /// Between one and three days remaining.
    pub is_warning: bool,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    /// Short countdown, e.g. `2天3时` or `5:30`.
    pub text: String,
    /// Long countdown, e.g. `2天 3时 15分 10秒`.
    pub detailed_text: String,
}

/// Computes the time status of a note against the current wall clock.
/// Returns `None` when the note has no expiration.
pub fn time_status(note: &Note) -> Option<TimeStatus> {
    time_status_at(note, Utc::now())
}

/// Clock-injected variant of [`time_status`].
///
/// The remaining time is treated as a flat millisecond count broken down by
/// successive integer division; it is not calendar-aware even when the
/// expiration itself was derived from a calendar-month preset.
pub fn time_status_at(note: &Note, now: DateTime<Utc>) -> Option<TimeStatus> {
    let expiration = note.expiration_date?;
    let remaining = expiration.signed_duration_since(now).num_milliseconds();

    if remaining <= 0 {
        return Some(TimeStatus {
            is_expired: true,
            is_urgent: false,
            is_warning: false,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            text: EXPIRED_TEXT.to_string(),
            detailed_text: EXPIRED_TEXT.to_string(),
        });
    }

    let days = remaining / DAY_MS;
    let hours = (remaining % DAY_MS) / HOUR_MS;
    let minutes = (remaining % HOUR_MS) / MINUTE_MS;
    let seconds = (remaining % MINUTE_MS) / SECOND_MS;

    // Anything under a full day is urgent; one day still counts as urgent,
    // up to three days is a warning.
    let (is_urgent, is_warning) = if days > 0 {
        if days <= 1 {
            (true, false)
        } else if days <= 3 {
            (false, true)
        } else {
            (false, false)
        }
    } else {
        (true, false)
    };

    let (text, detailed_text) = if days > 0 {
        (
            format!("{}天{}时", days, hours),
            format!("{}天 {}时 {}分 {}秒", days, hours, minutes, seconds),
        )
    } else if hours > 0 {
        (
            format!("{}时{}分", hours, minutes),
            format!("{}时 {}分 {}秒", hours, minutes, seconds),
        )
    } else if minutes > 0 {
        (
            format!("{}:{:02}", minutes, seconds),
            format!("{}分 {}秒", minutes, seconds),
        )
    } else {
        (format!("0:{:02}", seconds), format!("{}秒", seconds))
    };

    Some(TimeStatus {
        is_expired: false,
        is_urgent,
        is_warning,
        days,
        hours,
        minutes,
        seconds,
        text,
        detailed_text,
    })
}

/// Expiration presets offered at note creation time.
///
/// Hour/day/week presets are flat offsets; month presets advance the
/// calendar month (so "1个月" from Jan 31 lands on the last day of
/// February, not 30 flat days later).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationPreset {
    OneHour,
    ThreeHours,
    OneDay,
    ThreeDays,
    OneWeek,
    OneMonth,
    ThreeMonths,
}

impl ExpirationPreset {
    pub const ALL: [ExpirationPreset; 7] = [
        ExpirationPreset::OneHour,
        ExpirationPreset::ThreeHours,
        ExpirationPreset::OneDay,
        ExpirationPreset::ThreeDays,
        ExpirationPreset::OneWeek,
        ExpirationPreset::OneMonth,
        ExpirationPreset::ThreeMonths,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExpirationPreset::OneHour => "1小时",
            ExpirationPreset::ThreeHours => "3小时",
            ExpirationPreset::OneDay => "1天",
            ExpirationPreset::ThreeDays => "3天",
            ExpirationPreset::OneWeek => "1周",
            ExpirationPreset::OneMonth => "1个月",
            ExpirationPreset::ThreeMonths => "3个月",
        }
    }

    /// ASCII alias accepted on the command line.
    pub fn alias(&self) -> &'static str {
        match self {
            ExpirationPreset::OneHour => "1h",
            ExpirationPreset::ThreeHours => "3h",
            ExpirationPreset::OneDay => "1d",
            ExpirationPreset::ThreeDays => "3d",
            ExpirationPreset::OneWeek => "1w",
            ExpirationPreset::OneMonth => "1mo",
            ExpirationPreset::ThreeMonths => "3mo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.label() == s || p.alias() == s)
    }

    /// Expiration date this preset yields when applied at `now`.
    pub fn expiration_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ExpirationPreset::OneHour => now + Duration::hours(1),
            ExpirationPreset::ThreeHours => now + Duration::hours(3),
            ExpirationPreset::OneDay => now + Duration::days(1),
            ExpirationPreset::ThreeDays => now + Duration::days(3),
            ExpirationPreset::OneWeek => now + Duration::weeks(1),
            ExpirationPreset::OneMonth => now.checked_add_months(Months::new(1)).unwrap_or(now),
            ExpirationPreset::ThreeMonths => now.checked_add_months(Months::new(3)).unwrap_or(now),
        }
    }
}

/// Reminder presets, all expressed relative to the expiration date. The
/// reminder is recomputed whenever the expiration changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderPreset {
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    ThreeHours,
    OneDay,
}

impl ReminderPreset {
    pub const ALL: [ReminderPreset; 6] = [
        ReminderPreset::FiveMinutes,
        ReminderPreset::FifteenMinutes,
        ReminderPreset::ThirtyMinutes,
        ReminderPreset::OneHour,
        ReminderPreset::ThreeHours,
        ReminderPreset::OneDay,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReminderPreset::FiveMinutes => "5分钟前",
            ReminderPreset::FifteenMinutes => "15分钟前",
            ReminderPreset::ThirtyMinutes => "30分钟前",
            ReminderPreset::OneHour => "1小时前",
            ReminderPreset::ThreeHours => "3小时前",
            ReminderPreset::OneDay => "1天前",
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            ReminderPreset::FiveMinutes => "5m",
            ReminderPreset::FifteenMinutes => "15m",
            ReminderPreset::ThirtyMinutes => "30m",
            ReminderPreset::OneHour => "1h",
            ReminderPreset::ThreeHours => "3h",
            ReminderPreset::OneDay => "1d",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.label() == s || p.alias() == s)
    }

    pub fn reminder_from(&self, expiration: DateTime<Utc>) -> DateTime<Utc> {
        let offset = match self {
            ReminderPreset::FiveMinutes => Duration::minutes(5),
            ReminderPreset::FifteenMinutes => Duration::minutes(15),
            ReminderPreset::ThirtyMinutes => Duration::minutes(30),
            ReminderPreset::OneHour => Duration::hours(1),
            ReminderPreset::ThreeHours => Duration::hours(3),
            ReminderPreset::OneDay => Duration::days(1),
        };
        expiration - offset
    }
}

/// Parses an `--expires` argument: a preset label/alias or an explicit
/// datetime (`2026-09-15 18:00` or RFC 3339).
pub fn parse_expiration_spec(spec: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if let Some(preset) = ExpirationPreset::parse(spec) {
        return Ok(preset.expiration_from(now));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(spec) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(spec, "%Y-%m-%d %H:%M") {
        return Ok(naive.and_utc());
    }
    Err(NoteError::InvalidFormat {
        message: format!(
            "Unrecognized expiration {:?}. Use a preset ({}) or a datetime like 2026-09-15 18:00",
            spec,
            ExpirationPreset::ALL
                .iter()
                .map(|p| p.alias())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}

/// Parses a `--remind` argument into a concrete reminder time relative to
/// the expiration date.
pub fn parse_reminder_spec(spec: &str, expiration: DateTime<Utc>) -> Result<DateTime<Utc>> {
    match ReminderPreset::parse(spec) {
        Some(preset) => Ok(preset.reminder_from(expiration)),
        None => Err(NoteError::InvalidFormat {
            message: format!(
                "Unrecognized reminder {:?}. Use one of: {}",
                spec,
                ReminderPreset::ALL
                    .iter()
                    .map(|p| p.alias())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }),
    }
}
