//! Terminal UI for perch.
//!
//! The default chat surface. The event loop runs on [`tokio::select!`] over a
//! ~60 fps render tick, a poll tick that drains the agent's outbound events,
//! and crossterm's async [`EventStream`]. It never waits on the agent.

mod app;
mod ui;

pub use app::App;
pub use ui::draw;

use std::io::{self, Stdout};

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::bridge::{ControlSignal, UiEndpoint};
use crate::constants::FRAME_INTERVAL_MS;

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Launches the TUI and runs it until the user quits or the agent stops.
///
/// Enters raw mode and the alternate screen, and restores the terminal on
/// the way out even when the loop fails.
pub async fn run_tui(ui: UiEndpoint, greeting: &str, poll: Duration) -> Result<()> {
    // --- Terminal setup ---
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, ui, App::new(greeting), poll).await;

    // --- Terminal teardown ---
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}

async fn event_loop(
    terminal: &mut Term,
    mut ui: UiEndpoint,
    mut app: App,
    poll: Duration,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut frame = interval(Duration::from_millis(FRAME_INTERVAL_MS));
    let mut drain = interval(poll);
    drain.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !app.should_quit {
        tokio::select! {
            _ = frame.tick() => {
                app.tick_spinner();
                terminal.draw(|f| draw(f, &app))?;
            }
            _ = drain.tick() => {
                let drained = ui.drain();
                for event in drained.events {
                    app.apply_event(event);
                }
                if drained.agent_gone {
                    tracing::info!("agent stopped; closing ui");
                    app.agent_gone();
                }
            }
            event = events.next() => {
                match event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        handle_key(&mut app, &ui, key);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "terminal event stream failed");
                        ui.send(ControlSignal::Exit);
                        break;
                    }
                    None => {
                        ui.send(ControlSignal::Exit);
                        break;
                    }
                    _ => {} // mouse and resize are picked up by the next frame
                }
            }
        }
    }

    terminal.draw(|f| draw(f, &app))?;
    Ok(())
}

/// Processes a single key event.
fn handle_key(app: &mut App, ui: &UiEndpoint, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => quit(app, ui),
        KeyCode::Esc => quit(app, ui),
        KeyCode::Char('r') if ctrl => {
            if app.thinking {
                return;
            }
            app.reset();
            ui.send(ControlSignal::Reset);
        }
        KeyCode::Enter => {
            if let Some(text) = app.submit_input() {
                if !ui.send(ControlSignal::Continue(text)) {
                    app.agent_gone();
                }
            }
        }
        KeyCode::Char(c) if !ctrl => app.input.push(c),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        _ => {}
    }
}

fn quit(app: &mut App, ui: &UiEndpoint) {
    ui.send(ControlSignal::Exit);
    app.should_quit = true;
}
