//! Fixed-capacity history ring, pattern-filtered dump, and interactive
//! search support.
//!
//! The ring is sized the way the original C implementation sizes its
//! static history array: `CAPACITY_H` (256) slots of at most `LINE_MAX_H`
//! (1024) bytes each. This rewrite uses an owned `String` per slot instead
//! of a fixed byte array, since Rust has no need to preallocate the storage
//! to get the bounded-capacity behavior the spec actually cares about
//! (entries longer than `LINE_MAX_H` are truncated on push, matching the
//! original's bound).

use std::io::{self, Write};

use crate::paging::Pager;

/// Number of history slots kept.
pub const CAPACITY_H: usize = 256;
/// Maximum length, in bytes, of a single stored history line.
pub const LINE_MAX_H: usize = 1024;

/// One token of a parsed pattern filter.
#[derive(Debug, Clone)]
struct PatternToken {
    text: String,
    negative: bool,
}

/// A parsed pattern filter: space-separated tokens, case-insensitive,
/// `-`-prefixed tokens are negative (excluding) substring matches, and a
/// token may be `"quoted"` to contain spaces.
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    tokens: Vec<PatternToken>,
}

impl PatternFilter {
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut tokens = Vec::new();
        let mut chars = input.chars().peekable();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }
            let negative = if c == '-' {
                chars.next();
                true
            } else {
                false
            };
            let mut text = String::new();
            if chars.peek() == Some(&'"') {
                chars.next();
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                    text.push(c);
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    text.push(c);
                    chars.next();
                }
            }
            if !text.is_empty() {
                tokens.push(PatternToken { text: text.to_lowercase(), negative });
            }
        }
        Self { tokens }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.tokens.is_empty() }

    /// A line matches iff it contains every positive token as a substring
    /// and contains no negative token. Testable Property 4 (monotone
    /// filtering) falls directly out of this being a plain conjunction.
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.tokens.iter().all(|token| {
            let contains = lower.contains(&token.text);
            if token.negative { !contains } else { contains }
        })
    }
}

/// The history ring itself.
#[derive(Debug)]
pub struct History {
    slots: Vec<Option<String>>,
    next_id: u64,
    line_capacity: usize,
}

impl History {
    #[must_use]
    pub fn new() -> Self { Self::with_capacity(CAPACITY_H, LINE_MAX_H) }

    #[must_use]
    pub fn with_capacity(capacity: usize, line_capacity: usize) -> Self {
        Self { slots: vec![None; capacity], next_id: 0, line_capacity }
    }

    #[must_use]
    pub fn capacity(&self) -> usize { self.slots.len() }

    #[must_use]
    pub fn next_id(&self) -> u64 { self.next_id }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.slots.iter().all(Option::is_none) }

    #[must_use]
    pub fn count(&self) -> usize { self.slots.iter().filter(|s| s.is_some()).count() }

    fn slot_index(&self, abs_id: u64) -> usize {
        usize::try_from(abs_id % self.capacity() as u64).unwrap_or(0)
    }

    /// Returns the entry at absolute id `abs_id`, if that slot is live
    /// *and* `abs_id` still falls within the ring's current live window
    /// `[next_id - capacity, next_id)`. An id that has been overwritten by
    /// wraparound maps to the same slot index as its replacement, so the
    /// window check is required to avoid returning that aliased, stale
    /// entry as if it were still `abs_id`'s own content.
    #[must_use]
    pub fn get(&self, abs_id: u64) -> Option<&str> {
        let oldest = self.next_id.saturating_sub(self.capacity() as u64);
        if abs_id < oldest || abs_id >= self.next_id {
            return None;
        }
        self.slots[self.slot_index(abs_id)].as_deref()
    }

    /// Appends `line`, truncating to `line_capacity` bytes. No-op if
    /// `line` is empty, is the literal command `"history"`, or equals the
    /// most recently pushed entry (Testable Property 3).
    pub fn push(&mut self, line: &str) {
        if line.is_empty() || line == "history" {
            return;
        }
        if self.next_id > 0 {
            let previous = self.get(self.next_id - 1);
            if previous == Some(line) {
                return;
            }
        }
        let truncated: String = line.chars().take(self.line_capacity).collect();
        let index = self.slot_index(self.next_id);
        self.slots[index] = Some(truncated);
        self.next_id += 1;
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.next_id = 0;
    }

    /// All live entries, oldest first, with their absolute ids, filtered
    /// by `pattern` (an empty filter matches everything).
    #[must_use]
    pub fn matching_entries(&self, pattern: &PatternFilter) -> Vec<(u64, &str)> {
        let capacity = self.capacity() as u64;
        let oldest = self.next_id.saturating_sub(capacity);
        (oldest..self.next_id)
            .filter_map(|id| self.get(id).map(|line| (id, line)))
            .filter(|(_, line)| pattern.matches(line))
            .collect()
    }

    /// Prints matching entries (oldest first), 1-based display ids if
    /// `with_ids`, applying paging. Returns `true` if the user aborted
    /// mid-page.
    pub fn dump<W: Write>(
        &self,
        out: &mut W,
        with_ids: bool,
        pattern: &PatternFilter,
        pager: &mut Pager,
        screen_cols: u16,
    ) -> Result<bool, crate::error::ReadlineError> {
        for (display_id, (_, line)) in self.matching_entries(pattern).into_iter().enumerate() {
            let rendered = if with_ids { format!("{:4}  {line}\r\n", display_id + 1) } else { format!("{line}\r\n") };
            out.write_all(rendered.as_bytes())?;
            if pager.check(rendered.len().saturating_sub(2), screen_cols, out)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Maps a 1-based display id (as shown by [`Self::dump`] with
    /// `with_ids`) back to an absolute history id, for interactive search
    /// selection. Returns `None` for an out-of-range id.
    #[must_use]
    pub fn select_nth(&self, pattern: &PatternFilter, display_id: usize) -> Option<u64> {
        if display_id == 0 {
            return None;
        }
        self.matching_entries(pattern).get(display_id - 1).map(|(id, _)| *id)
    }

    /// Saves history to `path`, oldest first, one entry per line,
    /// truncating the file and (on Unix) setting mode 0600.
    pub fn save(&self, path: &std::path::Path) -> io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        let capacity = self.capacity() as u64;
        let oldest = self.next_id.saturating_sub(capacity);
        for id in oldest..self.next_id {
            if let Some(line) = self.get(id) {
                writeln!(file, "{line}")?;
            }
        }
        Ok(())
    }

    /// Loads history from `path`, one entry per line, stripping CR/LF,
    /// oldest first. Existing entries are not cleared first; loaded lines
    /// go through the same dedup-on-push rule as any other push.
    pub fn load(&mut self, path: &std::path::Path) -> io::Result<()> {
        let contents = std::fs::read_to_string(path)?;
        for line in contents.lines() {
            self.push(line);
        }
        Ok(())
    }
}

impl Default for History {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn push_then_get_roundtrips() {
        let mut history = History::with_capacity(4, 64);
        history.push("one");
        history.push("two");
        assert_eq!(history.get(0), Some("one"));
        assert_eq!(history.get(1), Some("two"));
    }

    #[test]
    fn push_dedups_against_immediate_prior() {
        let mut history = History::with_capacity(4, 64);
        history.push("a");
        history.push("a");
        assert_eq!(history.count(), 1);
    }

    #[test]
    fn push_allows_non_adjacent_repeat() {
        let mut history = History::with_capacity(4, 64);
        history.push("a");
        history.push("b");
        history.push("a");
        assert_eq!(history.count(), 3);
    }

    #[test]
    fn push_rejects_empty_and_literal_history() {
        let mut history = History::with_capacity(4, 64);
        history.push("");
        history.push("history");
        assert_eq!(history.count(), 0);
    }

    #[test]
    fn ring_wraps_and_drops_oldest() {
        let mut history = History::with_capacity(2, 64);
        history.push("a");
        history.push("b");
        history.push("c");
        assert_eq!(history.get(0), None);
        assert_eq!(history.get(1), Some("b"));
        assert_eq!(history.get(2), Some("c"));
    }

    #[test]
    fn clear_resets_everything() {
        let mut history = History::with_capacity(4, 64);
        history.push("a");
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.next_id(), 0);
    }

    #[test]
    fn pattern_filter_positive_and_negative_tokens() {
        let filter = PatternFilter::parse("foo -bar");
        assert!(filter.matches("a foo line"));
        assert!(!filter.matches("a foo bar line"));
        assert!(!filter.matches("no match here"));
    }

    #[test]
    fn pattern_filter_quoted_token_with_space() {
        let filter = PatternFilter::parse("\"hi there\"");
        assert!(filter.matches("say hi there now"));
        assert!(!filter.matches("say hi, there, now"));
    }

    #[test]
    fn pattern_filter_monotone_adding_positive_token_shrinks_matches() {
        let mut history = History::with_capacity(8, 64);
        history.push("alpha beta");
        history.push("alpha gamma");
        let loose = PatternFilter::parse("alpha");
        let tight = PatternFilter::parse("alpha beta");
        assert!(history.matching_entries(&tight).len() <= history.matching_entries(&loose).len());
    }

    #[test]
    fn select_nth_maps_display_id_to_absolute_id() {
        let mut history = History::with_capacity(8, 64);
        history.push("a");
        history.push("b");
        history.push("c");
        let filter = PatternFilter::default();
        assert_eq!(history.select_nth(&filter, 2), Some(1));
        assert_eq!(history.select_nth(&filter, 0), None);
        assert_eq!(history.select_nth(&filter, 99), None);
    }

    #[test]
    fn save_then_load_roundtrips_oldest_first() {
        let mut history = History::with_capacity(8, 64);
        history.push("one");
        history.push("two");
        history.push("three");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        history.save(&path).unwrap();

        let mut loaded = History::with_capacity(8, 64);
        loaded.load(&path).unwrap();
        assert_eq!(loaded.get(0), Some("one"));
        assert_eq!(loaded.get(1), Some("two"));
        assert_eq!(loaded.get(2), Some("three"));
        assert_eq!(loaded.count(), 3);
    }

    #[test]
    fn load_strips_crlf_and_dedups_adjacent_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        std::fs::write(&path, "alpha\r\nalpha\r\nbeta\n").unwrap();

        let mut history = History::with_capacity(8, 64);
        history.load(&path).unwrap();
        assert_eq!(history.get(0), Some("alpha"));
        assert_eq!(history.get(1), Some("beta"));
        assert_eq!(history.count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn save_sets_mode_0600_on_unix() {
        use std::os::unix::fs::PermissionsExt;

        let mut history = History::with_capacity(8, 64);
        history.push("secret command");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        history.save(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
