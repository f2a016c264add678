//! Severity levels, numbered 0 (most severe) through 7 (least severe).

use libc::c_int;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

/// A log severity level, `Emergency` (0) through `Debug` (7).
///
/// These are the eight levels defined by [POSIX `syslog`][syslog] and carried
/// into ASL unchanged. An integer outside `0..=7` has no `Level`
/// representation; [`Level::clamp`] is how out-of-range integers (as
/// described in the data model's "anything outside clamps to the range"
/// rule) are brought back in bounds.
///
/// [syslog]: https://pubs.opengroup.org/onlinepubs/9699919799/functions/syslog.html
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Level {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Level {
    /// All eight levels, `Emergency` first.
    pub const ALL: [Level; 8] = [
        Level::Emergency,
        Level::Alert,
        Level::Critical,
        Level::Error,
        Level::Warning,
        Level::Notice,
        Level::Info,
        Level::Debug,
    ];

    /// The level's numeric value, `0..=7`.
    pub fn as_u8(self) -> u8 {
        match self {
            Level::Emergency => 0,
            Level::Alert => 1,
            Level::Critical => 2,
            Level::Error => 3,
            Level::Warning => 4,
            Level::Notice => 5,
            Level::Info => 6,
            Level::Debug => 7,
        }
    }

    /// The English name used by the record store's `Level` normalization
    /// and the `std` formatter's `<LEVELNAME>` clause.
    pub fn std_name(self) -> &'static str {
        match self {
            Level::Emergency => "Emergency",
            Level::Alert => "Alert",
            Level::Critical => "Critical",
            Level::Error => "Error",
            Level::Warning => "Warning",
            Level::Notice => "Notice",
            Level::Info => "Info",
            Level::Debug => "Debug",
        }
    }

    /// Builds a `Level` from an integer, clamping out-of-range values to the
    /// nearest end of `0..=7` rather than failing.
    pub fn clamp(value: i64) -> Level {
        let v = value.clamp(0, 7);
        Level::from_u8(v as u8).expect("clamped value is always in range")
    }

    /// Builds a `Level` from an exact `0..=7` value, or `None` if out of
    /// range.
    pub fn from_u8(value: u8) -> Option<Level> {
        Level::ALL.into_iter().find(|l| l.as_u8() == value)
    }

    /// The severity mask bit for this level (`1 << level`).
    pub fn mask_bit(self) -> u32 {
        1u32 << self.as_u8()
    }

    /// A mask admitting every level from `Emergency` up to and including
    /// `self` ("mask up to level L" in the data model).
    pub fn mask_upto(self) -> u32 {
        (1u32 << (self.as_u8() + 1)) - 1
    }

    /// Converts to the matching `libc::LOG_*` constant.
    pub fn to_raw(self) -> c_int {
        match self {
            Level::Emergency => libc::LOG_EMERG,
            Level::Alert => libc::LOG_ALERT,
            Level::Critical => libc::LOG_CRIT,
            Level::Error => libc::LOG_ERR,
            Level::Warning => libc::LOG_WARNING,
            Level::Notice => libc::LOG_NOTICE,
            Level::Info => libc::LOG_INFO,
            Level::Debug => libc::LOG_DEBUG,
        }
    }

    /// Converts a `libc::LOG_*` numeric constant into a `Level`, if valid.
    pub fn from_raw(value: c_int) -> Option<Level> {
        match value {
            libc::LOG_EMERG => Some(Level::Emergency),
            libc::LOG_ALERT => Some(Level::Alert),
            libc::LOG_CRIT => Some(Level::Critical),
            libc::LOG_ERR => Some(Level::Error),
            libc::LOG_WARNING => Some(Level::Warning),
            libc::LOG_NOTICE => Some(Level::Notice),
            libc::LOG_INFO => Some(Level::Info),
            libc::LOG_DEBUG => Some(Level::Debug),
            _ => None,
        }
    }
}

impl Default for Level {
    /// The filter pipeline's default mask is "up to `Notice`" (§4.F).
    fn default() -> Self {
        Level::Notice
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_u8().cmp(&other.as_u8())
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Error produced when a string isn't a recognized level name or digit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LevelParseError(String);

impl Display for LevelParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} is not a valid ASL level", self.0)
    }
}

impl Error for LevelParseError {}

impl FromStr for Level {
    type Err = LevelParseError;

    /// Accepts a single decimal digit `'0'..='7'` or one of the English
    /// names (`Emergency`, `Alert`, `Critical`, `Error`, `Warning`,
    /// `Notice`, `Info`, `Debug`), case-insensitively, per the record
    /// store's `Level` normalization rule.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 1 {
            if let Some(d) = s.chars().next().and_then(|c| c.to_digit(10)) {
                if d <= 7 {
                    return Ok(Level::from_u8(d as u8).unwrap());
                }
            }
        }

        for level in Level::ALL {
            if level.std_name().eq_ignore_ascii_case(s) {
                return Ok(level);
            }
        }

        Err(LevelParseError(s.to_string()))
    }
}
