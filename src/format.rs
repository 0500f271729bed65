//! Lightweight formatting of assistant text for both chat surfaces.
//!
//! Only two constructs are recognised: `**bold**` spans and lines starting
//! with `* `, which are shown as `•` bullets. Everything else is literal.

use std::sync::LazyLock;

use colored::Colorize;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

static BOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*(.*?)\*\*").unwrap_or_else(|_| unreachable!("bold pattern is valid"))
});

/// A run of text within one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Bold(String),
}

/// Replaces a leading `* ` (after indentation) with `• `.
pub fn bulletize(line: &str) -> String {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix("* ") {
        Some(rest) => {
            let indent = &line[..line.len() - trimmed.len()];
            format!("{}• {}", indent, rest)
        }
        None => line.to_string(),
    }
}

/// Splits one line into plain and bold segments. Unclosed `**` stays literal.
pub fn split_bold(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in BOLD.captures_iter(line) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Plain(line[last..whole.start()].to_string()));
        }
        segments.push(Segment::Bold(inner.as_str().to_string()));
        last = whole.end();
    }
    if last < line.len() {
        segments.push(Segment::Plain(line[last..].to_string()));
    }
    segments
}

/// Formats `text` into segmented lines, bullets applied.
pub fn format_lines(text: &str) -> Vec<Vec<Segment>> {
    text.lines().map(|line| split_bold(&bulletize(line))).collect()
}

/// Ratatui lines for the TUI message pane.
pub fn styled_lines(text: &str, base: Style) -> Vec<Line<'static>> {
    format_lines(text)
        .into_iter()
        .map(|segments| {
            Line::from(
                segments
                    .into_iter()
                    .map(|segment| match segment {
                        Segment::Plain(s) => Span::styled(s, base),
                        Segment::Bold(s) => Span::styled(s, base.add_modifier(Modifier::BOLD)),
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

/// ANSI-formatted text for the plain shell.
pub fn render_plain(text: &str) -> String {
    format_lines(text)
        .into_iter()
        .map(|segments| {
            segments
                .into_iter()
                .map(|segment| match segment {
                    Segment::Plain(s) => s,
                    Segment::Bold(s) => s.bold().to_string(),
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
