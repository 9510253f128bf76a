use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

/// UTC offset of the clinic, used to turn stored instants into calendar days.
///
/// Streaks and "answered today" checks compare year/month/day in this offset and ignore the
/// time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarZone {
    offset: FixedOffset,
}

impl CalendarZone {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Offsets outside of +/- 23:59 are rejected.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn start_of_day(&self, day: NaiveDate) -> Option<DateTime<Utc>> {
        day.and_time(NaiveTime::MIN)
            .and_local_timezone(self.offset)
            .single()
            .map(|local| local.with_timezone(&Utc))
    }

    /// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight in this zone).
    pub fn parse_timestamp(&self, raw: &str) -> Option<DateTime<Utc>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.with_timezone(&Utc));
        }

        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|day| self.start_of_day(day))
    }
}

impl Default for CalendarZone {
    fn default() -> Self {
        Self::utc()
    }
}
