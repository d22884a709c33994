//! Normalized key representation and the decoder that produces it.
//!
//! The original C implementation hand-parses raw bytes into a packed
//! integer, with separate branches for Windows extended-key sequences and
//! Unix VT100/xterm CSI/SS3 escapes. `crossterm::event::read()` already
//! performs that platform-specific byte-level decoding for us (it is the
//! same blocking, synchronous API the reference codebase uses in its own
//! key-press reader), so the decoder below only has to fold crossterm's
//! `KeyEvent` into the tagged [`Key`] the dispatcher expects, and apply the
//! two normalization tables the spec calls out: the ESC\u{2192}ALT fold and
//! the synonym key-mapping table.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::ReadlineError;

/// A key normalized out of whichever encoding the terminal used to send it.
///
/// Two `Key` values are equal iff they denote the same abstract action,
/// which is the property the dispatch table relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A plain, unmodified printable byte.
    Char(u8),
    /// A control-modified byte, e.g. `Ctrl('a')` for Ctrl-A.
    Ctrl(u8),
    /// An ALT-modified byte, produced either by a terminal that reports ALT
    /// directly or by folding an `ESC`-prefixed key (see [`fold_esc_to_alt`]).
    Alt(u8),
    /// Function key `F(1)` through `F(4)`.
    F(u8),
    /// A named key with no raw byte, after synonym folding.
    Named(NamedKey),
}

/// Canonical named keys after the synonym-folding table has been applied.
///
/// For example xterm's `ESC[H` and the SS3 `EscOH` both arrive from
/// crossterm as [`KeyCode::Home`], so there is only one `Home` variant here;
/// the folding happened inside crossterm itself before we ever see it. The
/// remaining fold this module performs is the ESC\u{2192}ALT one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Delete,
    Backspace,
    Insert,
    PageUp,
    PageDown,
    Tab,
    Enter,
    CtrlLeft,
    CtrlRight,
    CtrlUp,
    CtrlDown,
    AltLeft,
    AltRight,
    CtrlDelete,
    AltDelete,
    CtrlBackspace,
    AltBackspace,
    /// Ctrl-^, the debug-echo toggle.
    CtrlCaret,
}

/// Reads one normalized key, blocking until it is available.
///
/// `is_esc` is set iff the key arrived via an `ESC` prefix (either a
/// genuine VT escape sequence collapsed by crossterm into a single event,
/// or a manual `ESC`-then-byte sequence this function folded itself); the
/// dispatcher uses it to suppress printable-character insertion for
/// sequences that turned out not to carry one.
///
/// A standalone press of the Escape key with nothing following blocks here
/// exactly as it does in the original: there is no dispatch binding for a
/// bare ESC, only for ESC-as-prefix, so the read simply waits for the next
/// key and folds it.
pub fn read_key() -> Result<(Key, bool), ReadlineError> {
    let key_event = read_key_event()?;
    decode(key_event)
}

fn read_key_event() -> Result<KeyEvent, ReadlineError> {
    loop {
        match event::read()? {
            Event::Key(key_event) => {
                // Crossterm reports both press and release on platforms
                // that distinguish them; only presses (and the repeat
                // variant windows/unix terminals send for held keys) drive
                // the dispatcher.
                if key_event.kind == KeyEventKind::Release {
                    continue;
                }
                return Ok(key_event);
            }
            Event::Resize(..) | Event::FocusGained | Event::FocusLost | Event::Mouse(..) | Event::Paste(..) => {
                continue;
            }
        }
    }
}

fn decode(key_event: KeyEvent) -> Result<(Key, bool), ReadlineError> {
    if key_event.code == KeyCode::Esc {
        let (inner, _) = read_key()?;
        return Ok((fold_esc_to_alt(inner), true));
    }
    Ok((decode_plain(key_event), false))
}

fn decode_plain(key_event: KeyEvent) -> Key {
    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key_event.modifiers.contains(KeyModifiers::ALT);

    match key_event.code {
        KeyCode::Char(c) if ctrl && (c == '^' || c == '6') => Key::Named(NamedKey::CtrlCaret),
        KeyCode::Char(c) if ctrl => Key::Ctrl(c as u8),
        KeyCode::Char(c) if alt => Key::Alt(c as u8),
        KeyCode::Char(c) => Key::Char(c as u8),

        KeyCode::Backspace if ctrl => Key::Named(NamedKey::CtrlBackspace),
        KeyCode::Backspace if alt => Key::Named(NamedKey::AltBackspace),
        KeyCode::Backspace => Key::Named(NamedKey::Backspace),

        KeyCode::Delete if ctrl => Key::Named(NamedKey::CtrlDelete),
        KeyCode::Delete if alt => Key::Named(NamedKey::AltDelete),
        KeyCode::Delete => Key::Named(NamedKey::Delete),

        KeyCode::Left if ctrl => Key::Named(NamedKey::CtrlLeft),
        KeyCode::Left if alt => Key::Named(NamedKey::AltLeft),
        KeyCode::Left => Key::Named(NamedKey::Left),

        KeyCode::Right if ctrl => Key::Named(NamedKey::CtrlRight),
        KeyCode::Right if alt => Key::Named(NamedKey::AltRight),
        KeyCode::Right => Key::Named(NamedKey::Right),

        KeyCode::Up if ctrl => Key::Named(NamedKey::CtrlUp),
        KeyCode::Up => Key::Named(NamedKey::Up),

        KeyCode::Down if ctrl => Key::Named(NamedKey::CtrlDown),
        KeyCode::Down => Key::Named(NamedKey::Down),

        KeyCode::Home => Key::Named(NamedKey::Home),
        KeyCode::End => Key::Named(NamedKey::End),
        KeyCode::Insert => Key::Named(NamedKey::Insert),
        KeyCode::PageUp => Key::Named(NamedKey::PageUp),
        KeyCode::PageDown => Key::Named(NamedKey::PageDown),
        KeyCode::Tab => Key::Named(NamedKey::Tab),
        KeyCode::Enter => Key::Named(NamedKey::Enter),
        KeyCode::F(n) => Key::F(n),

        // Anything else (media keys, modifier-only events crossterm
        // sometimes surfaces, etc.) is not bound to any action; it
        // reaches the dispatcher's default arm and is silently ignored,
        // matching the spec's "unknown sequences are ignored if not
        // printable" rule.
        _ => Key::Ctrl(0),
    }
}

/// Folds a key that arrived via an `ESC` prefix onto its ALT-modified
/// equivalent, so a terminal that won't forward a real ALT modifier can
/// still be driven by typing `ESC` then the key.
///
/// The fold is idempotent: folding an already-ALT key (reached via
/// `ESC ESC key`, i.e. the user typed Escape twice) returns it unchanged.
fn fold_esc_to_alt(key: Key) -> Key {
    match key {
        Key::Char(c) | Key::Ctrl(c) => Key::Alt(c),
        Key::Alt(c) => Key::Alt(c),
        Key::F(n) => Key::F(n),
        Key::Named(named) => Key::Named(fold_named_to_alt(named)),
    }
}

fn fold_named_to_alt(named: NamedKey) -> NamedKey {
    use NamedKey::{AltBackspace, AltDelete, AltLeft, AltRight, Backspace, Delete, Left, Right};
    match named {
        Left => AltLeft,
        Right => AltRight,
        Delete => AltDelete,
        Backspace => AltBackspace,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn plain_char_decodes_unmodified() {
        let key = decode_plain(key_event(KeyCode::Char('a'), KeyModifiers::NONE));
        assert_eq!(key, Key::Char(b'a'));
    }

    #[test]
    fn ctrl_char_decodes_to_ctrl_variant() {
        let key = decode_plain(key_event(KeyCode::Char('b'), KeyModifiers::CONTROL));
        assert_eq!(key, Key::Ctrl(b'b'));
    }

    #[test]
    fn esc_fold_matches_native_alt() {
        // Invariant 6: ESC-prefix sequences must produce the same Key as
        // the corresponding ALT variant.
        let native_alt = decode_plain(key_event(KeyCode::Char('f'), KeyModifiers::ALT));
        let via_esc_fold = fold_esc_to_alt(decode_plain(key_event(KeyCode::Char('f'), KeyModifiers::NONE)));
        assert_eq!(native_alt, via_esc_fold);
    }

    #[test]
    fn esc_fold_on_named_delete_matches_alt_delete() {
        let native_alt_delete = Key::Named(NamedKey::AltDelete);
        let via_esc_fold = fold_esc_to_alt(Key::Named(NamedKey::Delete));
        assert_eq!(native_alt_delete, via_esc_fold);
    }

    #[test]
    fn esc_fold_is_idempotent_for_double_escape() {
        let once = fold_esc_to_alt(Key::Named(NamedKey::Left));
        let twice = fold_esc_to_alt(once);
        assert_eq!(once, twice);
    }

    #[test]
    fn ctrl_caret_recognized_from_ctrl_6() {
        let key = decode_plain(key_event(KeyCode::Char('6'), KeyModifiers::CONTROL));
        assert_eq!(key, Key::Named(NamedKey::CtrlCaret));
    }
}
