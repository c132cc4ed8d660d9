//! Current month calculation

use chrono::{Datelike, NaiveDate};

/// 1-based month of a chit on `today`, or `None` before the start date or
/// after the last month.
///
/// Only calendar months count: crossing a month boundary advances the month
/// regardless of the day, so a chit starting on the 31st is in month 2 on
/// the 1st of the following month.
pub fn current_month(start_date: NaiveDate, duration_months: i32, today: NaiveDate) -> Option<i32> {
    if today < start_date {
        return None;
    }

    let elapsed = (today.year() - start_date.year()) * 12
        + (today.month() as i32 - start_date.month() as i32)
        + 1;

    if elapsed < 1 || elapsed > duration_months {
        return None;
    }
    Some(elapsed)
}
