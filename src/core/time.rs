use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Parse a wall-clock timestamp label.
///
/// Accepts `YYYY-MM-DD HH:MM[:SS]` and `YYYY/MM/DD HH:MM[:SS]` surrounded by optional whitespace.
/// The year has exactly four digits; month, day and hour may be written with a single digit;
/// minutes and seconds always have two.
#[must_use]
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let (date, time) = text.trim().split_once(char::is_whitespace)?;

    let mut date = date.split(['-', '/']);
    let year = i32::try_from(number(date.next()?, 4..=4)?).ok()?;
    let month = number(date.next()?, 1..=2)?;
    let day = number(date.next()?, 1..=2)?;
    if date.next().is_some() {
        return None;
    }

    let mut time = time.trim_start().split(':');
    let hour = number(time.next()?, 1..=2)?;
    let minute = number(time.next()?, 2..=2)?;
    let second = time.next().map_or(Some(0), |second| number(second, 2..=2))?;
    if time.next().is_some() {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

/// Unsigned decimal with the number of digits in the range.
fn number(digits: &str, n_digits: std::ops::RangeInclusive<usize>) -> Option<u32> {
    if n_digits.contains(&digits.len()) && digits.bytes().all(|byte| byte.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

/// Render a timestamp in the short `YYYY/M/D H:MM` form used for window bounds.
#[must_use]
pub fn format_label(timestamp: NaiveDateTime) -> String {
    format!(
        "{}/{}/{} {}:{:02}",
        timestamp.year(),
        timestamp.month(),
        timestamp.day(),
        timestamp.hour(),
        timestamp.minute(),
    )
}

#[cfg(test)]
pub(crate) fn at(text: &str) -> NaiveDateTime {
    parse_datetime(text).unwrap()
}
