//! TUI drawing logic for perch.
//!
//! Renders the two-pane layout: a message history area on top that follows
//! new output, and an auto-growing input box on the bottom.

use ratatui::layout::{Constraint, Layout, Position};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use super::App;
use crate::bridge::Sender;
use crate::format::styled_lines;

fn sender_color(sender: Sender) -> Color {
    match sender {
        Sender::Assistant => Color::Rgb(0x57, 0xA6, 0xFF),
        Sender::User => Color::Rgb(0x34, 0xD3, 0x99),
        Sender::System => Color::Yellow,
    }
}

/// Builds the history pane content.
fn history_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in &app.messages {
        let tag_style = Style::default()
            .fg(sender_color(msg.sender))
            .add_modifier(Modifier::BOLD);
        lines.push(Line::from(Span::styled(
            format!("{}:", msg.sender.label()),
            tag_style,
        )));
        let body_style = match msg.sender {
            Sender::System => Style::default().fg(Color::Yellow),
            _ => Style::default(),
        };
        lines.extend(styled_lines(&msg.text, body_style));
        lines.push(Line::from(""));
    }

    if app.thinking {
        let spinner = crate::constants::SPINNER_FRAMES[app.spinner_frame];
        lines.push(Line::from(Span::styled(
            format!("{} AI is thinking…", spinner),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

/// Rows the lines occupy once wrapped to `width` columns.
fn wrapped_height(lines: &[Line<'_>], width: usize) -> usize {
    lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum()
}

/// Draws the TUI frame with message history and input box.
///
/// The cursor is placed at the end of the current input text.
pub fn draw(f: &mut Frame, app: &App) {
    let inner_width = f.area().width.saturating_sub(2).max(1) as usize;
    let input_chars = app.input.chars().count();

    let visual_lines = if app.input.is_empty() {
        1
    } else {
        input_chars.div_ceil(inner_width).max(1)
    };

    // Cap at 40% of terminal height to protect the message area
    let max_input_height = (f.area().height as usize * 2 / 5).max(3);
    let input_height = (visual_lines + 2).min(max_input_height) as u16;

    let [messages_area, input_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(input_height)]).areas(f.area());

    // --- Message history pane ---
    let lines = history_lines(app);
    let view_height = messages_area.height.saturating_sub(2) as usize;
    let content_height = wrapped_height(&lines, inner_width);
    let bottom = content_height.saturating_sub(view_height);
    let top = bottom.saturating_sub(app.scroll_offset as usize);

    let messages_widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" perch "))
        .wrap(Wrap { trim: false })
        .scroll((top.min(u16::MAX as usize) as u16, 0));
    f.render_widget(messages_widget, messages_area);

    // --- Input box ---
    let title = if app.thinking {
        " > (waiting for reply) "
    } else {
        " > Enter send · Ctrl+R reset · Esc quit "
    };
    let input_widget = Paragraph::new(app.input.as_str())
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(input_widget, input_area);

    let iw = (input_area.width.saturating_sub(2)).max(1) as usize;
    let cursor_x = input_area.x + 1 + (input_chars % iw) as u16;
    let cursor_y = input_area.y + 1 + (input_chars / iw) as u16;
    f.set_cursor_position(Position::new(cursor_x, cursor_y));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::OutboundEvent;

    #[test]
    fn test_history_tags_and_spinner() {
        let mut app = App::new("Hello!");
        app.apply_event(OutboundEvent::Message {
            sender: Sender::User,
            text: "hi".into(),
        });
        app.thinking = true;
        let lines = history_lines(&app);
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(text[0], "AI:");
        assert_eq!(text[1], "Hello!");
        assert_eq!(text[3], "You:");
        assert!(text.last().unwrap().ends_with("AI is thinking…"));
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("abcdefghij"), Line::from("")];
        assert_eq!(wrapped_height(&lines, 4), 3 + 1);
    }
}
