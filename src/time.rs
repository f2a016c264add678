//! Time-string parsing and the formatter's `sec`/`utc`/`lcl` rendering
//! modes.
//!
//! `parse_time` is a pure function: it recognizes four textual forms and
//! returns seconds-since-epoch, trying absolute, then relative, then
//! canonical, then ctime, in that order (the order the grammars were
//! tried in the system this crate's time handling is modeled on).

use chrono::{Datelike, Local, TimeZone, Timelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ABSOLUTE: Regex = Regex::new(r"(?i)^[0-9]+[s]?$").unwrap();
    static ref RELATIVE: Regex = Regex::new(r"(?i)^[+-][0-9]+[smhdw]?$").unwrap();
    static ref CANONICAL: Regex =
        Regex::new(r"(?i)^([0-9]{4})\.([0-9]{1,2})\.([0-9]{1,2})\s+([0-9]{1,2}):([0-9]{2}):([0-9]{2})\s+UTC$")
            .unwrap();
    static ref CTIME: Regex =
        Regex::new(r"(?i)^([a-z]{3})\s+([0-9]{1,2})\s+([0-9]{1,2}):([0-9]{2}):([0-9]{2})$").unwrap();
}

/// Last-letter-of-month-abbreviation lookup, disambiguated by the second
/// letter when two months share a last letter (`jan`/`jun`, `mar`/`apr`).
fn month_num(abbrev: &str) -> Option<u32> {
    let bytes = abbrev.as_bytes();
    if bytes.len() != 3 {
        return None;
    }
    let second = bytes[1].to_ascii_lowercase();
    let last = bytes[2].to_ascii_lowercase();

    let candidate = match last {
        b'n' => if second == b'a' { 0 } else { 5 },  // jan / jun
        b'b' => 1,                                   // feb
        b'r' => if second == b'a' { 2 } else { 3 },  // mar / apr
        b'y' => 4,                                    // may
        b'l' => 6,                                    // jul
        b'g' => 7,                                    // aug
        b'p' => 8,                                    // sep
        b't' => 9,                                    // oct
        b'v' => 10,                                   // nov
        b'c' => 11,                                   // dec
        _ => return None,
    };
    Some(candidate)
}

/// Parses a time string in one of the four accepted forms, returning
/// seconds since the epoch.
pub fn parse_time(s: &str) -> Option<i64> {
    let trimmed = s.trim();

    if ABSOLUTE.is_match(trimmed) {
        let digits = trimmed.trim_end_matches(['s', 'S']);
        return digits.parse().ok();
    }

    if RELATIVE.is_match(trimmed) {
        let (sign, rest) = trimmed.split_at(1);
        let sign: i64 = if sign == "-" { -1 } else { 1 };
        let (digits, factor) = match rest.chars().last() {
            Some(c @ ('s' | 'S')) => (&rest[..rest.len() - c.len_utf8()], 1),
            Some(c @ ('m' | 'M')) => (&rest[..rest.len() - c.len_utf8()], 60),
            Some(c @ ('h' | 'H')) => (&rest[..rest.len() - c.len_utf8()], 3600),
            Some(c @ ('d' | 'D')) => (&rest[..rest.len() - c.len_utf8()], 86_400),
            Some(c @ ('w' | 'W')) => (&rest[..rest.len() - c.len_utf8()], 604_800),
            _ => (rest, 1),
        };
        let magnitude: i64 = digits.parse().ok()?;
        return Some(Utc::now().timestamp() + sign * magnitude * factor);
    }

    if let Some(caps) = CANONICAL.captures(trimmed) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let hour: u32 = caps[4].parse().ok()?;
        let minute: u32 = caps[5].parse().ok()?;
        let second: u32 = caps[6].parse().ok()?;
        return Utc
            .with_ymd_and_hms(year, month, day, hour, minute, second)
            .single()
            .map(|dt| dt.timestamp());
    }

    if let Some(caps) = CTIME.captures(trimmed) {
        let month = month_num(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let hour: u32 = caps[3].parse().ok()?;
        let minute: u32 = caps[4].parse().ok()?;
        let second: u32 = caps[5].parse().ok()?;
        let year = Local::now().year();
        // The source builds this field in local time, not UTC, despite
        // deriving the year from a UTC wall clock read; preserved here.
        return Local
            .with_ymd_and_hms(year, month + 1, day, hour, minute, second)
            .single()
            .map(|dt| dt.timestamp());
    }

    None
}

/// Renders seconds-since-epoch as `YYYY.MM.DD HH:MM:SS UTC`.
pub fn format_utc(secs: i64) -> String {
    match Utc.timestamp_opt(secs, 0).single() {
        Some(dt) => format!(
            "{:04}.{:02}.{:02} {:02}:{:02}:{:02} UTC",
            dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), dt.second()
        ),
        None => "0".to_string(),
    }
}

/// Renders seconds-since-epoch as ctime-style local time, truncated to the
/// first 19 characters (drops the trailing year).
pub fn format_lcl(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.format("%a %b %e %H:%M:%S").to_string(),
        None => "0".to_string(),
    }
}
