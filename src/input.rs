use crate::direction::Direction;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Logical actions produced from raw key events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Direction(Direction),
    /// Start a session, or stop the running one
    StartStop,
    ToggleRandom,
    /// Move the catalog cursor
    NextEntry,
    PrevEntry,
    /// Add or remove the entry under the cursor from practice
    ToggleEntry,
    /// Close the evaluation report
    Dismiss,
    Quit,
}

/// Map a key press to a command. Repeats and releases are dropped, so a held
/// key counts once.
pub fn command_for_key(key: &KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => {
            Some(Command::Direction(Direction::Up))
        }
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
            Some(Command::Direction(Direction::Down))
        }
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
            Some(Command::Direction(Direction::Left))
        }
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
            Some(Command::Direction(Direction::Right))
        }
        KeyCode::Enter | KeyCode::Char(' ') => Some(Command::StartStop),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::ToggleRandom),
        KeyCode::Tab => Some(Command::NextEntry),
        KeyCode::BackTab => Some(Command::PrevEntry),
        KeyCode::Char('x') | KeyCode::Char('X') => Some(Command::ToggleEntry),
        KeyCode::Esc => Some(Command::Dismiss),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
        _ => None,
    }
}
