use time::{Date, Month};

///
/// Calendar helpers for the `yyyyMMdd` date format used at the boundary and
/// in stored bookkeeping fields.
///

/// Parse an 8-digit `yyyyMMdd` string into a calendar-checked [`Date`].
///
/// Returns `None` for anything that is not exactly eight ASCII digits or
/// does not name a real calendar day (month 13, Feb 30, and so on).
#[must_use]
pub fn parse_yyyymmdd(raw: &str) -> Option<Date> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: i32 = raw[0..4].parse().ok()?;
    let month: u8 = raw[4..6].parse().ok()?;
    let day: u8 = raw[6..8].parse().ok()?;

    let month = Month::try_from(month).ok()?;

    Date::from_calendar_date(year, month, day).ok()
}

/// Render a [`Date`] as its `yyyyMMdd` integer form (e.g. `20231010`).
#[must_use]
pub fn as_number(date: Date) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(u8::from(date.month())) * 100 + i64::from(date.day())
}
