//! Subtitle timing lines.
//!
//! A cue's timing line looks like `00:00:01,000 --> 00:00:02,500`. The
//! functions here pull the start and end timestamps out of such a line and
//! convert them to [`Duration`]s.
//!
//! # Example
//!
//! ```
//! use subgif::timestamp::{parse_end, parse_start, parse_time_range};
//!
//! let line = "00:00:01,000 --> 00:00:02,000";
//! assert_eq!(parse_start(line), Some("00:00:01,000"));
//! assert_eq!(parse_end(line), Some("00:00:02,000"));
//!
//! let range = parse_time_range(line).unwrap();
//! assert_eq!(range.duration().as_millis(), 1000);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::SubgifError;

const TIMESTAMP: &str = r"\d+:\d{2}:\d{2}[,.]\d{1,3}";

static START_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"({TIMESTAMP})\s*-->")).expect("valid start pattern"));

static END_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"-->\s*({TIMESTAMP})")).expect("valid end pattern"));

/// Return the timestamp immediately preceding `-->` in `line`, if any.
pub fn parse_start(line: &str) -> Option<&str> {
    START_PATTERN
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Return the timestamp immediately following `-->` in `line`, if any.
pub fn parse_end(line: &str) -> Option<&str> {
    END_PATTERN
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// `true` when `line` has a timestamp on each side of `-->`.
///
/// Caption text that merely contains an arrow is not a timing line.
pub fn is_timing_line(line: &str) -> bool {
    parse_start(line).is_some() && parse_end(line).is_some()
}

/// Parse both ends of a timing line.
///
/// Returns `None` when either timestamp is missing. The range is not checked
/// for `start < end`; that is left to the clip extractor, which reports it.
pub fn parse_time_range(line: &str) -> Option<TimeRange> {
    let start = parse_start(line)?.parse().ok()?;
    let end = parse_end(line)?.parse().ok()?;
    Some(TimeRange { start, end })
}

/// A subtitle timestamp (`HH:MM:SS,mmm`).
///
/// Components are not range checked: `00:99:00,000` is 99 minutes. A `.`
/// fraction separator (WebVTT style) is accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Duration);

impl Timestamp {
    /// Build a timestamp from an offset into the video.
    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    /// Offset from the start of the video.
    pub fn as_duration(self) -> Duration {
        self.0
    }
}

impl FromStr for Timestamp {
    type Err = SubgifError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || SubgifError::ParseError(value.to_string());

        let trimmed = value.trim();
        let (clock, fraction) = trimmed
            .split_once([',', '.'])
            .ok_or_else(malformed)?;

        let mut parts = clock.split(':');
        let (Some(hours), Some(minutes), Some(seconds), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        let hours: u64 = hours.parse().map_err(|_| malformed())?;
        let minutes: u64 = minutes.parse().map_err(|_| malformed())?;
        let seconds: u64 = seconds.parse().map_err(|_| malformed())?;

        if fraction.is_empty()
            || fraction.len() > 3
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }
        // "5" is 500 ms, "05" is 50 ms.
        let millis: u64 = format!("{fraction:0<3}").parse().map_err(|_| malformed())?;

        let total_seconds = hours
            .checked_mul(3600)
            .and_then(|total| total.checked_add(minutes.checked_mul(60)?))
            .and_then(|total| total.checked_add(seconds))
            .ok_or_else(malformed)?;
        Duration::from_secs(total_seconds)
            .checked_add(Duration::from_millis(millis))
            .map(Self)
            .ok_or_else(malformed)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let total_secs = self.0.as_secs();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        let millis = self.0.subsec_millis();
        write!(f, "{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
    }
}

/// The start and end of one cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// When the cue appears.
    pub start: Timestamp,
    /// When the cue disappears.
    pub end: Timestamp,
}

impl TimeRange {
    /// Length of the range, zero when `end` does not follow `start`.
    pub fn duration(&self) -> Duration {
        self.end.as_duration().saturating_sub(self.start.as_duration())
    }

    /// `true` when `start` strictly precedes `end`.
    pub fn is_ordered(&self) -> bool {
        self.start < self.end
    }
}
