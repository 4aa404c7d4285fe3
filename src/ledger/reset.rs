//! Daily reset of the "today" earnings counter.

use chrono::{DateTime, Local, Utc};

/// True when `last_active` and `now` fall on different local calendar days
/// (year/month/day, not a rolling 24-hour window).
pub fn crossed_calendar_day(last_active: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    last_active.with_timezone(&Local).date_naive() != now.with_timezone(&Local).date_naive()
}
