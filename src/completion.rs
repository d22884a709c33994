//! Tab-completion interface: a host-supplied callback fills a
//! [`Completions`] object for the current buffer prefix.

use std::io::Write;

use crate::error::ReadlineError;
use crate::paging::Pager;

/// Maximum number of completion candidates a single callback invocation
/// may add.
pub const CAPACITY_C: usize = 256;
const WORD_MAX: usize = 64;
const HELP_MAX: usize = 128;
const HINTS_MAX: usize = 128;

/// One candidate completion: a word and optional one-line help text.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub word: String,
    pub help: Option<String>,
}

/// The object a completion callback fills in. Allocated fresh for each TAB
/// invocation and discarded once the dispatcher has acted on it.
#[derive(Debug, Default)]
pub struct Completions {
    candidates: Vec<Candidate>,
    hints: Option<String>,
}

impl Completions {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Adds one candidate, silently dropping it if the list is already at
    /// capacity or the word is empty; `word`/`help` are truncated to their
    /// respective maximum lengths.
    pub fn add(&mut self, word: &str, help: Option<&str>) {
        if word.is_empty() || self.candidates.len() >= CAPACITY_C {
            return;
        }
        let word: String = word.chars().take(WORD_MAX).collect();
        let help = help.map(|h| h.chars().take(HELP_MAX).collect());
        self.candidates.push(Candidate { word, help });
    }

    /// Sets the shared syntax hint line, truncated to `HINTS_MAX` bytes.
    pub fn set_hints(&mut self, hints: &str) {
        self.hints = Some(hints.chars().take(HINTS_MAX).collect());
    }

    #[must_use]
    pub fn candidates(&self) -> &[Candidate] { &self.candidates }

    #[must_use]
    pub fn hints(&self) -> Option<&str> { self.hints.as_deref() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.candidates.is_empty() && self.hints.is_none() }

    /// True iff exactly one candidate was added (the case that triggers an
    /// in-place word replacement rather than a printed list).
    #[must_use]
    pub fn single_candidate(&self) -> Option<&Candidate> {
        if self.candidates.len() == 1 { self.candidates.first() } else { None }
    }

    /// Renders the candidate list (and hints, if any) the way the
    /// dispatcher does when more than one candidate came back: one per
    /// line if any candidate carries help text, otherwise a multi-column
    /// list sized to the screen width.
    pub fn render<W: Write>(&self, out: &mut W, cols: u16, pager: &mut Pager) -> Result<(), ReadlineError> {
        if let Some(hints) = &self.hints {
            writeln!(out, "{hints}\r")?;
        }
        if self.candidates.is_empty() {
            return Ok(());
        }
        let has_help = self.candidates.iter().any(|c| c.help.is_some());
        if has_help {
            for candidate in &self.candidates {
                let line = match &candidate.help {
                    Some(help) => format!("{:<20} {help}\r\n", candidate.word),
                    None => format!("{}\r\n", candidate.word),
                };
                out.write_all(line.as_bytes())?;
                if pager.check(line.len().saturating_sub(2), cols, out)? {
                    break;
                }
            }
        } else {
            let word_width = self.candidates.iter().map(|c| c.word.len()).max().unwrap_or(1);
            let column_width = word_width + 4;
            let columns = ((cols as usize + 4) / column_width).max(1);
            for chunk in self.candidates.chunks(columns) {
                let mut line = String::new();
                for candidate in chunk {
                    line.push_str(&format!("{:<width$}", candidate.word, width = column_width));
                }
                line.push_str("\r\n");
                out.write_all(line.as_bytes())?;
                if pager.check(line.len().saturating_sub(2), cols, out)? {
                    break;
                }
            }
        }
        Ok(())
    }
}

/// A registered completion callback: given the current buffer contents, it
/// fills in the provided [`Completions`].
pub type CompletionCallback = Box<dyn FnMut(&str, &mut Completions) + Send>;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn add_respects_capacity() {
        let mut completions = Completions::new();
        for i in 0..(CAPACITY_C + 10) {
            completions.add(&format!("word{i}"), None);
        }
        assert_eq!(completions.candidates().len(), CAPACITY_C);
    }

    #[test]
    fn single_candidate_only_when_exactly_one() {
        let mut completions = Completions::new();
        completions.add("select", None);
        assert!(completions.single_candidate().is_some());
        completions.add("second", None);
        assert!(completions.single_candidate().is_none());
    }

    #[test]
    fn word_and_help_truncated_to_limits() {
        let mut completions = Completions::new();
        let long_word = "x".repeat(WORD_MAX + 20);
        let long_help = "y".repeat(HELP_MAX + 20);
        completions.add(&long_word, Some(&long_help));
        let candidate = &completions.candidates()[0];
        assert_eq!(candidate.word.len(), WORD_MAX);
        assert_eq!(candidate.help.as_ref().unwrap().len(), HELP_MAX);
    }
}
