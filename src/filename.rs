//! Output file naming.
//!
//! Every cue's output path is `<output_dir>/<index:06>-<slug>.<ext>`. The
//! zero-padded index keeps directory listings in cue order and is the only
//! part relied on for uniqueness; the slug is for people browsing the folder.
//! The same inputs always give the same path, which is what makes the path
//! usable as the skip-if-exists cache key.

use std::path::{Path, PathBuf};

use crate::cue::strip_markup;

/// Longest slug kept in a file name, in bytes.
pub const MAX_SLUG_LENGTH: usize = 64;

/// Turn caption text into a file-name-safe slug.
///
/// Markup is stripped, whitespace becomes a separator, every character
/// outside `[A-Za-z0-9]` is dropped, and separator runs collapse into a
/// single `-`. Case is preserved unless `lowercase` is set.
pub fn slugify(text: &str, lowercase: bool) -> String {
    let plain = strip_markup(text);

    let words: Vec<String> = plain
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect();

    let mut slug = String::new();
    for word in &words {
        let extra = if slug.is_empty() { 0 } else { 1 };
        if slug.len() + extra + word.len() > MAX_SLUG_LENGTH {
            if slug.is_empty() {
                slug.push_str(&word[..MAX_SLUG_LENGTH]);
            }
            break;
        }
        if extra == 1 {
            slug.push('-');
        }
        slug.push_str(word);
    }

    if lowercase {
        slug.make_ascii_lowercase();
    }
    slug
}

/// File name (no directory) for a cue.
///
/// # Example
///
/// ```
/// use subgif::filename::output_file_name;
///
/// assert_eq!(output_file_name(1, "<b>Subtitle</b>", false, "gif"), "000001-Subtitle.gif");
/// assert_eq!(output_file_name(7, "...", false, "gif"), "000007.gif");
/// ```
pub fn output_file_name(index: usize, text: &str, lowercase: bool, extension: &str) -> String {
    let slug = slugify(text, lowercase);
    if slug.is_empty() {
        format!("{index:06}.{extension}")
    } else {
        format!("{index:06}-{slug}.{extension}")
    }
}

/// Full output path for a cue.
pub fn output_path(
    output_dir: &Path,
    index: usize,
    text: &str,
    lowercase: bool,
    extension: &str,
) -> PathBuf {
    output_dir.join(output_file_name(index, text, lowercase, extension))
}
