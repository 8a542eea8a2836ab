//! Timing lines, cue splitting and output naming.

use std::path::Path;
use std::time::Duration;

use subgif::cue::strip_markup;
use subgif::filename::MAX_SLUG_LENGTH;
use subgif::timestamp::is_timing_line;
use subgif::{
    PipelineConfig, Timestamp, output_file_name, output_path, parse_cues, parse_end, parse_start,
    parse_time_range, slugify,
};

// ── Timing lines ───────────────────────────────────────────────────

#[test]
fn start_and_end_from_timing_line() {
    let line = "00:00:01,000 --> 00:00:02,000";
    assert_eq!(parse_start(line), Some("00:00:01,000"));
    assert_eq!(parse_end(line), Some("00:00:02,000"));
}

#[test]
fn no_arrow_means_no_timestamps() {
    let line = "00:00:01,000 00:00:02,000";
    assert_eq!(parse_start(line), None);
    assert_eq!(parse_end(line), None);
    assert!(parse_time_range(line).is_none());
}

#[test]
fn whitespace_around_arrow_is_ignored() {
    let line = "  00:00:01,000-->   00:00:02,250  X1:100 X2:200";
    assert_eq!(parse_start(line), Some("00:00:01,000"));
    assert_eq!(parse_end(line), Some("00:00:02,250"));
}

#[test]
fn out_of_range_components_are_accepted() {
    let range = parse_time_range("99:99:99,999 --> 999:00:00,000").unwrap();
    assert_eq!(
        range.start.as_duration(),
        Duration::from_secs(99 * 3600 + 99 * 60 + 99) + Duration::from_millis(999)
    );
    assert!(range.is_ordered());
}

#[test]
fn reversed_range_still_parses() {
    let range = parse_time_range("00:00:05,000 --> 00:00:02,000").unwrap();
    assert!(!range.is_ordered());
    assert_eq!(range.duration(), Duration::ZERO);
}

#[test]
fn overflowing_hours_are_rejected() {
    let line = "9999999999999999:00:00,000 --> 9999999999999999:00:01,000";
    assert!(parse_time_range(line).is_none());
    assert!("9999999999999999:00:00,000".parse::<Timestamp>().is_err());
}

#[test]
fn short_fraction_is_left_aligned() {
    let ts: Timestamp = "00:00:01,5".parse().unwrap();
    assert_eq!(ts.as_duration(), Duration::from_millis(1500));
    let ts: Timestamp = "00:00:01,05".parse().unwrap();
    assert_eq!(ts.as_duration(), Duration::from_millis(1050));
}

#[test]
fn incomplete_timestamps_are_rejected() {
    assert!("00:00:01".parse::<Timestamp>().is_err());
    assert!("00:01,000".parse::<Timestamp>().is_err());
    assert!("00:00:01,abc".parse::<Timestamp>().is_err());
}

#[test]
fn arrow_alone_is_not_a_timing_line() {
    assert!(is_timing_line("00:00:01,000 --> 00:00:02,000"));
    assert!(!is_timing_line("Go left --> now"));
    assert!(!is_timing_line("-->"));
}

#[test]
fn timestamp_display_round_trips() {
    let ts: Timestamp = "01:02:03,045".parse().unwrap();
    assert_eq!(ts.to_string(), "01:02:03,045");
    let vtt: Timestamp = "00:00:10.5".parse().unwrap();
    assert_eq!(vtt.to_string(), "00:00:10,500");
}

// ── Cue splitting ──────────────────────────────────────────────────

#[test]
fn blocks_split_on_blank_lines() {
    let srt = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nFirst\r\n\r\n\
               2\r\n00:00:03,000 --> 00:00:04,000\r\nSecond\r\nline\r\n";
    let cues = parse_cues(srt);

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].index, 0);
    assert_eq!(cues[0].text, "First");
    assert_eq!(cues[1].index, 1);
    assert_eq!(cues[1].text, "Second\nline");
    assert_eq!(
        cues[1].timing.unwrap().start.as_duration(),
        Duration::from_secs(3)
    );
}

#[test]
fn cues_without_blank_lines_are_split() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nFirst\n2\n00:00:03,000 --> 00:00:04,000\nSecond\n";
    let cues = parse_cues(srt);

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].text, "First");
    assert_eq!(cues[1].block, "2\n00:00:03,000 --> 00:00:04,000\nSecond");
}

#[test]
fn malformed_block_keeps_its_index() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nA\n\n\
               garbage without timing\n\n\
               3\n00:00:05,000 --> 00:00:06,000\nC\n";
    let cues = parse_cues(srt);

    assert_eq!(cues.len(), 3);
    assert!(cues[1].timing.is_none());
    assert_eq!(cues[2].index, 2);
    assert!(cues[2].timing.is_some());
}

#[test]
fn arrow_in_caption_stays_in_its_cue() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nGo left --> now\n\n\
               2\n00:00:03,000 --> 00:00:04,000\nNext\n";
    let cues = parse_cues(srt);

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].index, 0);
    assert_eq!(cues[0].text, "Go left --> now");
    assert!(cues[0].timing.is_some());
    assert_eq!(cues[1].index, 1);
    assert_eq!(cues[1].text, "Next");
}

#[test]
fn overflowing_timing_line_leaves_cue_unparsed() {
    let srt = "1\n9999999999999999:00:00,000 --> 9999999999999999:00:01,000\nHuge\n\n\
               2\n00:00:03,000 --> 00:00:04,000\nFine\n";
    let cues = parse_cues(srt);

    assert_eq!(cues.len(), 2);
    assert!(cues[0].timing.is_none());
    assert_eq!(cues[1].index, 1);
    assert!(cues[1].timing.is_some());
}

#[test]
fn caption_lines_drop_markup_and_blanks() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\n<i>Top</i>\n{\\an8}  \n<b>Bottom</b>\n";
    let lines = parse_cues(srt)[0].caption_lines();

    let texts: Vec<&str> = lines.iter().map(|line| line.text.as_str()).collect();
    assert_eq!(texts, vec!["Top", "Bottom"]);
    assert_eq!(lines[1].line_index, 1);
}

#[test]
fn markup_stripping() {
    assert_eq!(strip_markup("<font color=\"#fff\">Hi</font>"), "Hi");
    assert_eq!(strip_markup("a < b"), "a ");
    assert_eq!(strip_markup("<b>Bold</b> {\\an8}top"), "Bold top");
    assert_eq!(strip_markup("one\\Ntwo"), "one\ntwo");
    assert_eq!(strip_markup("{not a tag}"), "{not a tag}");
}

// ── Output names ───────────────────────────────────────────────────

#[test]
fn file_name_for_tagged_caption() {
    assert_eq!(
        output_path(Path::new("gifs"), 1, "<b>Subtitle</b>", false, "gif"),
        Path::new("gifs/000001-Subtitle.gif")
    );
}

#[test]
fn file_name_is_deterministic() {
    let first = output_file_name(42, "Well, <i>hello</i> there!", false, "gif");
    let second = output_file_name(42, "Well, <i>hello</i> there!", false, "gif");
    assert_eq!(first, second);
    assert_eq!(first, "000042-Well-hello-there.gif");
}

#[test]
fn slug_drops_punctuation_and_collapses_separators() {
    assert_eq!(slugify("  Don't   stop -- me now!  ", false), "Dont-stop-me-now");
    assert_eq!(slugify("Café au lait", false), "Caf-au-lait");
    assert_eq!(slugify("Mixed CASE", true), "mixed-case");
}

#[test]
fn empty_slug_leaves_just_the_index() {
    assert_eq!(output_file_name(3, "♪ ♪", false, "gif"), "000003.gif");
    assert_eq!(output_file_name(3, "", false, "gif"), "000003.gif");
}

#[test]
fn long_slug_is_capped_on_a_word_boundary() {
    let text = "word ".repeat(40);
    let slug = slugify(&text, false);
    assert!(slug.len() <= MAX_SLUG_LENGTH);
    assert!(slug.ends_with("word"));
}

#[test]
fn index_padding_sorts_in_cue_order() {
    let mut names: Vec<String> = [10, 2, 100_000, 1]
        .iter()
        .map(|&index| output_file_name(index, "x", false, "gif"))
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["000001-x.gif", "000002-x.gif", "000010-x.gif", "100000-x.gif"]
    );
}

#[test]
fn config_builds_paths_under_output_dir() {
    let config = PipelineConfig::new().with_output_dir("out");
    assert_eq!(
        config.output_path_for(7, "<i>Hi</i>"),
        Path::new("out/000007-Hi.gif")
    );
    let lower = PipelineConfig::new()
        .with_output_dir("out")
        .with_lowercase_slugs(true);
    assert_eq!(
        lower.output_path_for(7, "<i>Hi</i>"),
        Path::new("out/000007-hi.gif")
    );
}
