// src/status.rs

//! Prescription and appointment status derivation.
//!
//! Every function here is pure: the caller passes `now` explicitly, so the
//! same `(record, now)` pair always yields the same result.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A prescription at or under this many days remaining is "expiring".
pub const EXPIRING_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("invalid calendar date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("invalid date-time (expected ISO 8601): {0}")]
    InvalidDateTime(String),
}

/// Anything with an expiry date the status rules can read.
pub trait Expires {
    fn end_date(&self) -> NaiveDate;
}

impl Expires for NaiveDate {
    fn end_date(&self) -> NaiveDate {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    Active,
    Expiring,
    Expired,
}

impl PrescriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PrescriptionStatus::Active => "active",
            PrescriptionStatus::Expiring => "expiring",
            PrescriptionStatus::Expired => "expired",
        }
    }

    /// Parses a list filter value. `"all"` is handled by the caller.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PrescriptionStatus::Active),
            "expiring" => Some(PrescriptionStatus::Expiring),
            "expired" => Some(PrescriptionStatus::Expired),
            _ => None,
        }
    }
}

/// Whole days from `now` until midnight UTC of `end_date`.
///
/// The millisecond difference is rounded up to whole days, so a part day
/// left counts as a full one. The single exception is a difference under a
/// day in the past, which reports `-1` rather than `0`: once `end_date` has
/// passed the count is always negative. Zero only occurs when `now` is
/// exactly midnight of `end_date`.
pub fn days_remaining(end_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let end = end_date.and_time(chrono::NaiveTime::MIN).and_utc();
    let diff_ms = (end - now).num_milliseconds();

    if diff_ms >= 0 {
        (diff_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    } else if diff_ms > -MILLIS_PER_DAY {
        -1
    } else {
        // truncation toward zero is the ceiling for negatives
        diff_ms / MILLIS_PER_DAY
    }
}

fn classify(days: i64) -> PrescriptionStatus {
    if days < 0 {
        PrescriptionStatus::Expired
    } else if days <= EXPIRING_WINDOW_DAYS {
        PrescriptionStatus::Expiring
    } else {
        PrescriptionStatus::Active
    }
}

pub fn prescription_status<P: Expires + ?Sized>(p: &P, now: DateTime<Utc>) -> PrescriptionStatus {
    classify(days_remaining(p.end_date(), now))
}

fn label_for(status: PrescriptionStatus, days: i64) -> String {
    match status {
        PrescriptionStatus::Active => "Active".to_string(),
        PrescriptionStatus::Expiring => format!("{days} days left"),
        PrescriptionStatus::Expired => "Expired".to_string(),
    }
}

fn style_for(status: PrescriptionStatus) -> &'static str {
    match status {
        PrescriptionStatus::Active => "status-active",
        PrescriptionStatus::Expiring => "expiring-warning",
        PrescriptionStatus::Expired => "status-expired",
    }
}

pub fn status_label<P: Expires + ?Sized>(p: &P, now: DateTime<Utc>) -> String {
    let days = days_remaining(p.end_date(), now);
    label_for(classify(days), days)
}

pub fn status_style_key<P: Expires + ?Sized>(p: &P, now: DateTime<Utc>) -> &'static str {
    style_for(prescription_status(p, now))
}

/// Banner text shown while a prescription is expiring but not yet due today.
pub fn renewal_notice<P: Expires + ?Sized>(p: &P, now: DateTime<Utc>) -> Option<String> {
    let days = days_remaining(p.end_date(), now);
    (classify(days) == PrescriptionStatus::Expiring && days > 0)
        .then(|| format!("Expires in {days} days - Consider renewal"))
}

/// Stored appointment status. Assigned by the caller, never derived from time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

pub fn appointment_style_key(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Scheduled => "status-scheduled",
        AppointmentStatus::Completed => "status-completed",
        AppointmentStatus::Cancelled => "status-cancelled",
    }
}

/// Everything a prescription card needs to render its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    /// `active`, `expiring`, `expired`, or `unknown` when the date could not be read.
    pub status: &'static str,
    pub label: String,
    pub style_key: &'static str,
    pub days_remaining: Option<i64>,
}

impl StatusBadge {
    pub fn derive<P: Expires + ?Sized>(p: &P, now: DateTime<Utc>) -> Self {
        let days = days_remaining(p.end_date(), now);
        let status = classify(days);
        StatusBadge {
            status: status.as_str(),
            label: label_for(status, days),
            style_key: style_for(status),
            days_remaining: Some(days),
        }
    }

    pub fn unknown() -> Self {
        StatusBadge {
            status: "unknown",
            label: "Unknown".to_string(),
            style_key: "status-unknown",
            days_remaining: None,
        }
    }

    /// Derives from an unvalidated date string, rendering `unknown` instead of failing.
    pub fn from_raw(end_date: &str, now: DateTime<Utc>) -> Self {
        match parse_calendar_date(end_date) {
            Ok(date) => StatusBadge::derive(&date, now),
            Err(e) => {
                tracing::debug!("status badge fallback: {e}");
                StatusBadge::unknown()
            }
        }
    }
}

pub fn parse_calendar_date(s: &str) -> Result<NaiveDate, StatusError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| StatusError::InvalidDate(s.to_string()))
}

fn parse_naive_date_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Accepts `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DDTHH:MM`, or RFC 3339. Naive
/// values are taken as UTC; an RFC 3339 offset is applied, so the result is
/// always the UTC instant that gets stored.
pub fn parse_appointment_date_time(s: &str) -> Result<NaiveDateTime, StatusError> {
    let s = s.trim();
    parse_naive_date_time(s)
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .ok_or_else(|| StatusError::InvalidDateTime(s.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentDateTime {
    pub date: String,
    pub time: String,
}

impl From<NaiveDateTime> for AppointmentDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        AppointmentDateTime {
            // en-US: "Mon, Jan 15, 2024" and "10:00 AM"
            date: dt.format("%a, %b %-d, %Y").to_string(),
            time: dt.format("%I:%M %p").to_string(),
        }
    }
}

/// Display parts for an appointment timestamp. An RFC 3339 offset is kept:
/// the time shown is the wall time as written.
pub fn format_appointment_date_time(iso: &str) -> Result<AppointmentDateTime, StatusError> {
    let s = iso.trim();
    parse_naive_date_time(s)
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
        .map(AppointmentDateTime::from)
        .ok_or_else(|| StatusError::InvalidDateTime(s.to_string()))
}
