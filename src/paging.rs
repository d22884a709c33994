//! Paging controller: counts emitted screen lines against terminal height
//! and prompts the user to continue once the screen fills.

use std::io::Write;

use crate::error::ReadlineError;
use crate::key::Key;

const CONTINUE_PROMPT: &str = "*** Press <Space> or <Enter> to continue . . .";

/// Tracks how many screen rows have been printed since the last reset.
#[derive(Debug)]
pub struct Pager {
    printed_lines: u16,
    rows: u16,
}

impl Pager {
    #[must_use]
    pub fn new(rows: u16) -> Self { Self { printed_lines: 0, rows } }

    pub fn reset(&mut self) { self.printed_lines = 0; }

    /// Accounts for a just-printed line of `line_len` bytes against `cols`
    /// columns, prompting and blocking for a key if the screen is now
    /// full. Returns `Ok(true)` iff the user pressed anything other than
    /// Space or Enter (abort the remaining output).
    pub fn check<W: Write>(&mut self, line_len: usize, cols: u16, out: &mut W) -> Result<bool, ReadlineError> {
        self.check_with_reader(line_len, cols, out, crate::key::read_key)
    }

    /// Same as [`Self::check`] but with an injectable key reader, so tests
    /// can drive paging without a real terminal.
    pub fn check_with_reader<W, F>(
        &mut self,
        line_len: usize,
        cols: u16,
        out: &mut W,
        mut read_key: F,
    ) -> Result<bool, ReadlineError>
    where
        W: Write,
        F: FnMut() -> Result<(Key, bool), ReadlineError>,
    {
        let cols = cols.max(1);
        let rows_used = u16::try_from(line_len.div_ceil(cols as usize)).unwrap_or(u16::MAX).max(1);
        self.printed_lines = self.printed_lines.saturating_add(rows_used);

        if self.rows < 2 || self.printed_lines < self.rows - 1 {
            return Ok(false);
        }

        out.write_all(CONTINUE_PROMPT.as_bytes())?;
        out.flush()?;
        let (key, _) = read_key()?;
        // Erase the prompt.
        out.write_all(b"\r")?;
        for _ in 0..CONTINUE_PROMPT.len() {
            out.write_all(b" ")?;
        }
        out.write_all(b"\r")?;
        out.flush()?;

        self.reset();
        let continues = matches!(key, Key::Char(b' ') | Key::Named(crate::key::NamedKey::Enter));
        Ok(!continues)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn check_does_not_prompt_before_screen_fills() {
        let mut pager = Pager::new(24);
        let mut out = Vec::new();
        let aborted = pager
            .check_with_reader(10, 80, &mut out, || unreachable!("should not read a key yet"))
            .unwrap();
        assert!(!aborted);
        assert!(out.is_empty());
    }

    #[test]
    fn check_prompts_once_screen_fills_and_continues_on_enter() {
        let mut pager = Pager::new(2);
        let mut out = Vec::new();
        let aborted = pager
            .check_with_reader(80, 80, &mut out, || Ok((Key::Named(crate::key::NamedKey::Enter), false)))
            .unwrap();
        assert!(!aborted);
        assert_eq!(pager.printed_lines, 0, "reset after continuing");
    }

    #[test]
    fn check_aborts_on_any_other_key() {
        let mut pager = Pager::new(2);
        let mut out = Vec::new();
        let aborted = pager
            .check_with_reader(80, 80, &mut out, || Ok((Key::Char(b'q'), false)))
            .unwrap();
        assert!(aborted);
    }
}
