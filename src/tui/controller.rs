use crate::agents::HostEvent;
use crate::protocol::Decision;
use crate::tui::app::{AppState, InputAction, Scene};
use crate::tui::ui;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

/// Draw, read keys and pump round events until the user quits.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut AppState,
    events: &Receiver<HostEvent>,
    decisions: &Sender<Decision>,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    let mut round_alive = true;
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(app, key.code, decisions) {
                    break;
                }
            }
        }

        while round_alive {
            match events.try_recv() {
                Ok(ev) => app.handle_event(ev),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => round_alive = false,
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
    Ok(())
}

/// Returns true when the app should exit.
fn handle_key(app: &mut AppState, code: KeyCode, decisions: &Sender<Decision>) -> bool {
    if matches!(code, KeyCode::Char('?')) {
        let _ = app.handle_input(InputAction::ToggleHelp);
        return false;
    }
    if matches!(code, KeyCode::Char('h') | KeyCode::Char('H')) {
        let _ = app.handle_input(InputAction::ToggleHistory);
        return false;
    }
    if app.help_open() {
        if matches!(code, KeyCode::Esc) {
            let _ = app.handle_input(InputAction::ToggleHelp);
        }
        return false;
    }
    if app.history_open() {
        match code {
            KeyCode::Up => {
                let _ = app.handle_input(InputAction::HistoryUp);
            }
            KeyCode::Down => {
                let _ = app.handle_input(InputAction::HistoryDown);
            }
            KeyCode::Esc => {
                let _ = app.handle_input(InputAction::ToggleHistory);
            }
            _ => {}
        }
        return false;
    }
    if matches!(code, KeyCode::Char('q') | KeyCode::Char('Q')) {
        return true;
    }
    if app.scene == Scene::Summary {
        return matches!(code, KeyCode::Enter | KeyCode::Esc);
    }

    let action = match code {
        KeyCode::Left => InputAction::CursorLeft,
        KeyCode::Right => InputAction::CursorRight,
        KeyCode::Char(' ') => InputAction::ToggleSelect,
        KeyCode::Char('t') | KeyCode::Char('T') => InputAction::TrumpNext,
        KeyCode::Char('p') | KeyCode::Char('P') => InputAction::Pass,
        KeyCode::Char('o') | KeyCode::Char('O') => InputAction::GoOut,
        KeyCode::Char('+') | KeyCode::Char('=') => InputAction::AmountInc,
        KeyCode::Char('-') | KeyCode::Char('_') => InputAction::AmountDec,
        KeyCode::Backspace => InputAction::AmountBackspace,
        KeyCode::Enter => InputAction::Confirm,
        KeyCode::Char(c) if c.is_ascii_digit() => InputAction::AmountDigit(c as u8 - b'0'),
        _ => return false,
    };
    if let Some(decision) = app.handle_input(action) {
        // The round thread is gone if this fails; the finished event says why.
        let _ = decisions.send(decision);
    }
    false
}
