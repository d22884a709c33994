//! Terminal I/O adapter: raw-mode acquisition, screen size, and the
//! low-level write primitives the refresh algorithm is built from.
//!
//! Raw-mode entry/exit, blocking key reads and screen-size queries are all
//! implemented on top of `crossterm`, mirroring the reference codebase's own
//! synchronous key-press reader rather than hand-rolling `termios`/console
//! API calls per platform.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossterm::terminal;

use crate::error::ReadlineError;

const DEGRADED_TERMS: [&str; 3] = ["dumb", "cons25", "emacs"];

/// True iff standard input is a terminal and `TERM` is not one of the
/// known-degraded values. When false the caller should fall back to
/// [`read_line_degraded`].
#[must_use]
pub fn is_tty() -> bool {
    if !io::stdin().is_terminal() {
        return false;
    }
    match std::env::var("TERM") {
        Ok(term) => !DEGRADED_TERMS.contains(&term.as_str()),
        Err(_) => true,
    }
}

/// Returns `(rows, cols)`, falling back to `(24, 80)` if either dimension
/// crossterm reports is `<= 1` (common when running under a non-interactive
/// harness that still claims to be a tty).
pub fn screen_size() -> Result<(u16, u16), ReadlineError> {
    let (cols, rows) = terminal::size()?;
    Ok(if rows <= 1 || cols <= 1 { (24, 80) } else { (rows, cols) })
}

/// Nesting depth of outstanding [`RawModeGuard`]s. The interactive history
/// search recurses into a second `read_line` (and so a second
/// `RawModeGuard::acquire`) while the outer one is still suspended on its
/// own blocking read; `crossterm::terminal::disable_raw_mode` is not
/// reference-counted, so without this counter the inner guard's drop would
/// put the terminal back into cooked mode while the outer loop still
/// expects raw/no-echo input.
static RAW_MODE_DEPTH: AtomicUsize = AtomicUsize::new(0);

/// RAII guard around `crossterm::terminal::enable_raw_mode`. Reentrant:
/// only the outermost acquire actually enables raw mode, and only the
/// outermost drop restores cooked mode, so nested `read_line` calls (the
/// history-search sub-prompts) don't fight over the terminal mode. Restores
/// cooked mode unconditionally once the nesting unwinds to zero, so a panic
/// or early return from anywhere inside a `read_line` call cannot leave the
/// terminal in raw/unechoed mode.
#[must_use = "dropping this immediately restores the terminal to cooked mode"]
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn acquire() -> Result<Self, ReadlineError> {
        if RAW_MODE_DEPTH.fetch_add(1, Ordering::SeqCst) == 0 {
            if let Err(err) = terminal::enable_raw_mode() {
                RAW_MODE_DEPTH.fetch_sub(1, Ordering::SeqCst);
                return Err(err.into());
            }
        }
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Only the outermost guard's drop actually restores cooked mode;
        // best-effort otherwise, since if the terminal is already gone
        // there is nothing sensible to do with the error, and panicking
        // inside a Drop impl would abort on top of whatever is already
        // unwinding.
        if RAW_MODE_DEPTH.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Flushes stdout. The editor calls this before every blocking key read so
/// that prompts and partial redraws are never left sitting in a buffer.
pub fn flush_output() -> Result<(), ReadlineError> {
    io::stdout().flush()?;
    Ok(())
}

/// Writes `text` to stdout without a trailing newline.
pub fn write_raw(text: &str) -> Result<(), ReadlineError> {
    io::stdout().write_all(text.as_bytes())?;
    Ok(())
}

/// Emits the leading `" \b"` (space, backspace) sequence used at specific
/// call sites to force a terminal to flush a deferred soft-wrap redraw
/// before the next newline. See the design notes for which call sites use
/// this and which (e.g. Ctrl-L's screen clear) deliberately do not.
pub fn write_wrap_flush() -> Result<(), ReadlineError> {
    write_raw(" \u{8}")
}

/// Clears the screen and homes the cursor (Ctrl-L). Unlike
/// [`write_wrap_flush`] this does not use relative motion, since a full
/// clear makes the prior cursor position irrelevant.
pub fn clear_screen() -> Result<(), ReadlineError> {
    use crossterm::{cursor, terminal as term_cmd, QueueableCommand};
    let mut stdout = io::stdout();
    stdout.queue(term_cmd::Clear(term_cmd::ClearType::All))?;
    stdout.queue(cursor::MoveTo(0, 0))?;
    stdout.flush()?;
    Ok(())
}

/// Reads one full line from stdin using ordinary buffered/canonical input,
/// stripping a trailing `\r\n` or `\n`. Used for degraded mode: no prompt,
/// no history, no completion. Returns `None` on EOF.
pub fn read_line_degraded() -> Result<Option<String>, ReadlineError> {
    let mut line = String::new();
    let bytes_read = io::stdin().read_line(&mut line)?;
    if bytes_read == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_terms_list_matches_spec() {
        assert_eq!(DEGRADED_TERMS, ["dumb", "cons25", "emacs"]);
    }
}
