//! Key bindings: arrows or hjkl for the cursor, number keys for the item tray.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    /// Tap the cell under the cursor, or confirm in a menu.
    Tap,
    /// Tray slot, zero-based.
    Item(usize),
    Pause,
    Quit,
    Restart,
    None,
}

pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Tap,
        KeyCode::Char(c @ '1'..='9') => Action::Item(c as usize - '1' as usize),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_and_vim_keys_agree() {
        assert_eq!(key_to_action(key(KeyCode::Up)), key_to_action(key(KeyCode::Char('k'))));
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::Left);
        assert_eq!(key_to_action(key(KeyCode::Char('l'))), Action::Right);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Tap);
    }

    #[test]
    fn digits_pick_tray_slots() {
        assert_eq!(key_to_action(key(KeyCode::Char('1'))), Action::Item(0));
        assert_eq!(key_to_action(key(KeyCode::Char('9'))), Action::Item(8));
        assert_eq!(key_to_action(key(KeyCode::Char('0'))), Action::None);
    }

    #[test]
    fn control_chords_are_ignored() {
        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl_q), Action::None);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
    }
}
