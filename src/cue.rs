//! Subtitle cues.
//!
//! [`parse_cues`] splits a subtitle file into [`Cue`] blocks. Blocks are
//! normally separated by blank lines, but files that run cues together
//! without blank lines are split at each new timing line as well. Every block
//! gets an index, including blocks without a usable timing line, so the
//! index of a cue never depends on whether its neighbours are well formed.
//!
//! # Example
//!
//! ```
//! use subgif::cue::parse_cues;
//!
//! let srt = "1\n00:00:01,000 --> 00:00:02,000\n<i>Hello</i>\nthere\n\n\
//!            2\n00:00:03,000 --> 00:00:04,000\nAgain\n";
//! let cues = parse_cues(srt);
//! assert_eq!(cues.len(), 2);
//! assert_eq!(cues[0].caption_lines()[0].text, "Hello");
//! assert_eq!(cues[1].index, 1);
//! ```

use crate::timestamp::{TimeRange, is_timing_line, parse_time_range};

/// One subtitle entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Zero-based position of the block in the subtitle file.
    pub index: usize,
    /// The whole block as it appeared in the file.
    pub block: String,
    /// The caption portion of the block, markup retained.
    pub text: String,
    /// Parsed timing, `None` when either timestamp is missing or malformed.
    pub timing: Option<TimeRange>,
}

/// One visual line of caption text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionLine {
    /// Line text with markup removed.
    pub text: String,
    /// Position of the line within its cue, counting from the top.
    pub line_index: usize,
}

impl Cue {
    /// Build a cue from the lines of one block.
    fn from_lines(index: usize, lines: &[&str]) -> Self {
        let timing_position = lines.iter().position(|line| is_timing_line(line));

        let (timing, text) = match timing_position {
            Some(position) => (
                parse_time_range(lines[position]),
                lines[position + 1..].join("\n"),
            ),
            None => (None, String::new()),
        };

        Self {
            index,
            block: lines.join("\n"),
            text,
            timing,
        }
    }

    /// The caption split into display lines, markup stripped.
    ///
    /// Blank lines are dropped, so a cue whose text is empty after stripping
    /// yields no lines.
    pub fn caption_lines(&self) -> Vec<CaptionLine> {
        caption_lines(&self.text)
    }
}

/// Split caption text into display lines with markup removed.
pub fn caption_lines(text: &str) -> Vec<CaptionLine> {
    strip_markup(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(line_index, line)| CaptionLine {
            text: line.to_string(),
            line_index,
        })
        .collect()
}

/// Split a subtitle file into cue blocks.
pub fn parse_cues(content: &str) -> Vec<Cue> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }

        // A second timing line inside one block starts a new cue. A bare
        // counter line just before it belongs to the new cue.
        if is_timing_line(line) && current.iter().any(|l| is_timing_line(l)) {
            let carried = match current.last() {
                Some(last) if is_counter_line(last) => current.pop(),
                _ => None,
            };
            blocks.push(std::mem::take(&mut current));
            current.extend(carried);
        }

        current.push(line);
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
        .iter()
        .enumerate()
        .map(|(index, lines)| Cue::from_lines(index, lines))
        .collect()
}

/// Remove HTML-like tags (`<i>`, `<font color=..>`) and ASS override blocks
/// (`{\an8}`), and turn ASS `\N` breaks into newlines.
pub fn strip_markup(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut closing: Option<char> = None;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match closing {
            Some(end) if c == end => closing = None,
            Some(_) => {}
            None if c == '<' => closing = Some('>'),
            None if c == '{' && chars.peek() == Some(&'\\') => closing = Some('}'),
            None => result.push(c),
        }
    }

    result.replace("\\N", "\n").replace("\\n", "\n")
}

fn is_counter_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit())
}
