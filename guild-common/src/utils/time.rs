use chrono::{DateTime, NaiveDate, Utc};

/// Current wall-clock time in UTC.
///
/// Sales, history items and audit entries are all stamped with this.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Calendar day (UTC) of a timestamp, used by the history date filters.
pub fn day_of(ts: &DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}
