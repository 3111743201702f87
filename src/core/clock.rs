use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// School-local calendar used for due-date evaluation.
///
/// All timestamps are stored as UTC; only "is this tranche overdue today"
/// depends on the school's offset, because a due date is a local calendar day.
#[derive(Debug, Clone, Copy)]
pub struct SchoolClock {
    offset: FixedOffset,
}

impl SchoolClock {
    /// Build a clock from a whole-hour UTC offset (e.g. 0 for Dakar, 1 for Douala)
    pub fn from_utc_offset_hours(hours: i32) -> Option<Self> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Convert a UTC timestamp to the school's local time
    pub fn to_local(&self, utc_time: DateTime<Utc>) -> DateTime<FixedOffset> {
        utc_time.with_timezone(&self.offset)
    }

    /// Local calendar day for a UTC instant
    pub fn local_date(&self, utc_time: DateTime<Utc>) -> NaiveDate {
        self.to_local(utc_time).date_naive()
    }

    /// Today's date at the school
    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }
}

impl Default for SchoolClock {
    fn default() -> Self {
        Self::utc()
    }
}
