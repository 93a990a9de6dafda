//! Whitespace clean-up for text handed over by document decoders.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref EXCESS_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Normalize line breaks and collapse redundant whitespace.
///
/// Runs of spaces and tabs become one space, every line is trimmed, and at
/// most one blank line is kept between paragraphs.
pub fn clean_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");

    let lines: Vec<String> = normalized
        .split('\n')
        .map(|line| HORIZONTAL_SPACE.replace_all(line, " ").trim().to_string())
        .collect();

    EXCESS_NEWLINES
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
