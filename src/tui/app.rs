//! TUI application state for perch.
//!
//! Holds the displayed chat lines, the input buffer, the scroll position and
//! whether a turn is in flight. The state only changes through key handling
//! and [`OutboundEvent`]s drained from the agent.

use crate::bridge::{OutboundEvent, Sender};

/// One message shown in the history pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub sender: Sender,
    pub text: String,
}

pub struct App {
    pub messages: Vec<ChatLine>,
    pub input: String,
    /// Lines scrolled up from the bottom of the history; 0 follows new output.
    pub scroll_offset: u16,
    /// A turn is running; input is not sent until it finishes.
    pub thinking: bool,
    pub spinner_frame: usize,
    pub should_quit: bool,
    greeting: String,
}

impl App {
    /// Creates the state with the greeting already shown.
    pub fn new(greeting: impl Into<String>) -> Self {
        let mut app = Self {
            messages: Vec::new(),
            input: String::new(),
            scroll_offset: 0,
            thinking: false,
            spinner_frame: 0,
            should_quit: false,
            greeting: greeting.into(),
        };
        app.greet();
        app
    }

    fn greet(&mut self) {
        self.messages.push(ChatLine {
            sender: Sender::Assistant,
            text: self.greeting.clone(),
        });
    }

    /// Takes the input for sending.
    ///
    /// Returns `None`, leaving the buffer alone, while a turn is running.
    /// Blank input is discarded.
    pub fn submit_input(&mut self) -> Option<String> {
        if self.thinking {
            return None;
        }
        let text = std::mem::take(&mut self.input);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.thinking = true;
        self.scroll_offset = 0;
        Some(text.to_string())
    }

    /// Applies one event from the agent.
    pub fn apply_event(&mut self, event: OutboundEvent) {
        match event {
            OutboundEvent::Message { sender, text } => {
                if sender != Sender::User {
                    self.thinking = false;
                }
                self.messages.push(ChatLine { sender, text });
                self.scroll_offset = 0;
            }
            OutboundEvent::Exit => self.should_quit = true,
        }
    }

    /// Clears the display and shows the greeting again.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.input.clear();
        self.scroll_offset = 0;
        self.thinking = false;
        self.greet();
    }

    /// The agent thread has stopped; nothing more will arrive.
    pub fn agent_gone(&mut self) {
        self.thinking = false;
        self.should_quit = true;
    }

    pub fn tick_spinner(&mut self) {
        if self.thinking {
            self.spinner_frame = (self.spinner_frame + 1) % crate::constants::SPINNER_FRAMES.len();
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(sender: Sender, text: &str) -> OutboundEvent {
        OutboundEvent::Message {
            sender,
            text: text.into(),
        }
    }

    #[test]
    fn test_opens_with_greeting() {
        let app = App::new("Hello!");
        assert_eq!(
            app.messages,
            vec![ChatLine {
                sender: Sender::Assistant,
                text: "Hello!".into()
            }]
        );
        assert!(!app.thinking);
    }

    #[test]
    fn test_submit_trims_and_blocks_while_thinking() {
        let mut app = App::new("Hello!");
        app.input = "   ".into();
        assert_eq!(app.submit_input(), None);

        app.input = "  list my files  ".into();
        assert_eq!(app.submit_input().as_deref(), Some("list my files"));
        assert!(app.thinking);
        assert!(app.input.is_empty());

        app.input = "another".into();
        assert_eq!(app.submit_input(), None);
        assert_eq!(app.input, "another");
    }

    #[test]
    fn test_reply_clears_thinking() {
        let mut app = App::new("Hello!");
        app.input = "hi".into();
        app.submit_input();

        app.apply_event(event(Sender::User, "hi"));
        assert!(app.thinking);
        app.apply_event(event(Sender::Assistant, "hey"));
        assert!(!app.thinking);
        assert_eq!(app.messages.len(), 3);
    }

    #[test]
    fn test_system_notice_clears_thinking() {
        let mut app = App::new("Hello!");
        app.thinking = true;
        app.apply_event(event(Sender::System, "Sorry, something went wrong: boom"));
        assert!(!app.thinking);
    }

    #[test]
    fn test_exit_event_quits() {
        let mut app = App::new("Hello!");
        app.apply_event(OutboundEvent::Exit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_reset_regreets() {
        let mut app = App::new("Hello!");
        app.apply_event(event(Sender::User, "hi"));
        app.apply_event(event(Sender::Assistant, "hey"));
        app.reset();
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].text, "Hello!");
    }
}
