//! Overtime requests and the time window they cover.
//!
//! An [`OvertimeWindow`] is the `start_time`/`end_time`/`hours_worked` triple an
//! employee declares. The window may run past midnight (`end_time` earlier than
//! `start_time`), in which case it wraps into the next day.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RegularHours;

/// Lifecycle status of an overtime request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OvertimeStatus {
    /// Awaiting review; the only editable state.
    Pending,
    /// Approved; counts towards payroll.
    Approved,
    /// Rejected by a reviewer.
    Rejected,
    /// Withdrawn.
    Cancelled,
}

/// Serde helpers for `HH:MM` clock times.
///
/// Accepts `HH:MM` and `HH:MM:SS` on input, always writes `HH:MM`.
pub mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    /// Parses `HH:MM` or `HH:MM:SS`.
    pub fn parse(value: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(value, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid time `{}`, expected HH:MM", raw))
        })
    }

    /// Same as the parent module for `Option<NaiveTime>` fields.
    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => super::serialize(time, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid time `{}`, expected HH:MM", raw))
                }),
                None => Ok(None),
            }
        }
    }
}

/// A declared overtime span.
///
/// # Example
///
/// ```
/// use payroll_engine::models::OvertimeWindow;
/// use chrono::NaiveTime;
/// use rust_decimal::Decimal;
///
/// let window = OvertimeWindow {
///     start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
///     end_time: NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
///     hours_worked: Decimal::from(3),
/// };
///
/// assert!(window.is_overnight());
/// assert_eq!(window.span_hours(), Decimal::from(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeWindow {
    /// Clock time the overtime started.
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    /// Clock time the overtime ended.
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
    /// Declared hours.
    pub hours_worked: Decimal,
}

impl OvertimeWindow {
    /// True when the window crosses midnight. An end equal to the start
    /// means a full day.
    pub fn is_overnight(&self) -> bool {
        self.end_time <= self.start_time
    }

    /// Wall-clock length of the window in hours, wrapping past midnight.
    pub fn span_hours(&self) -> Decimal {
        let start = minutes_of_day(self.start_time);
        let mut end = minutes_of_day(self.end_time);
        if end <= start {
            end += 24 * 60;
        }
        Decimal::from(end - start) / Decimal::from(60)
    }

    /// True when the declared hours match the span within `tolerance`.
    pub fn hours_match_span(&self, tolerance: Decimal) -> bool {
        (self.span_hours() - self.hours_worked).abs() <= tolerance
    }

    /// True when the window stays clear of regular working hours.
    ///
    /// A same-day window must end at or before the regular start, or begin at
    /// or after the regular end. An overnight window must begin at or after the
    /// regular end and finish at or before the next regular start.
    pub fn is_outside(&self, regular: &RegularHours) -> bool {
        if self.is_overnight() {
            self.start_time >= regular.end && self.end_time <= regular.start
        } else {
            self.end_time <= regular.start || self.start_time >= regular.end
        }
    }
}

fn minutes_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// An overtime request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overtime {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee who worked the overtime.
    pub employee_id: Uuid,
    /// The period containing `date`.
    pub attendance_period_id: Uuid,
    /// The day the overtime was worked.
    pub date: NaiveDate,
    /// Declared span.
    #[serde(flatten)]
    pub window: OvertimeWindow,
    /// Why the overtime was needed.
    pub reason: String,
    /// Optional detail.
    pub description: Option<String>,
    /// Review status.
    pub status: OvertimeStatus,
    /// Reviewer who approved the request.
    pub approved_by: Option<Uuid>,
    /// When the request was approved.
    pub approved_at: Option<NaiveDateTime>,
    /// When the request was rejected or cancelled.
    pub cancelled_at: Option<NaiveDateTime>,
    /// Who submitted the request.
    pub created_by: Uuid,
    /// Who last changed the request.
    pub updated_by: Option<Uuid>,
    /// Creation time.
    pub created_at: NaiveDateTime,
    /// Last change time.
    pub updated_at: NaiveDateTime,
}

impl Overtime {
    /// True while the request may still be edited or deleted.
    pub fn is_pending(&self) -> bool {
        self.status == OvertimeStatus::Pending
    }
}
