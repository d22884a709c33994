//! The edit buffer and its one screen-refresh primitive.
//!
//! Every editing action in the dispatcher mutates [`Line`]'s bytes and then
//! calls [`Line::refresh`]; nothing else ever writes to the terminal's edit
//! area. That keeps the invariant that what the user sees is always
//! `prompt + buffer[0..num]` with the cursor at `pos`, true at every
//! suspension point between keys (Testable Property 2).
//!
//! Cursor motion is relative only: backspace bytes move the cursor left,
//! never an absolute-position escape sequence. A conforming terminal
//! interprets backspace as cursor-left across a soft line wrap, which is
//! what lets a line longer than one row wrap without this module tracking
//! row/column itself.
//!
//! Contract between the mutating methods and [`Line::refresh`]: `pos` and
//! `num` always describe what is currently *on screen*. A mutating method
//! (`insert_at_cursor`, `remove_range`, `replace_range`, `clear`,
//! `set_contents`) changes the byte contents (and so `raw_len()`) but
//! deliberately leaves `pos`/`num` untouched, because `refresh` needs the
//! pre-mutation `pos`/`num` to compute how much of the old screen content
//! to erase. Callers mutate, read `raw_len()` to learn the new length, and
//! then call `refresh(new_pos, new_num)`, which is what finally advances
//! `pos`/`num` to match.

use std::io::{self, Write};

/// A mutable line buffer of bounded capacity with a cursor index.
///
/// Invariant: `0 <= pos <= num <= capacity`, true at every point except
/// mid-way through a single mutate-then-refresh pair (see module docs).
#[derive(Debug)]
pub struct Line {
    buf: Vec<u8>,
    pos: usize,
    num: usize,
    capacity: usize,
}

impl Line {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity), pos: 0, num: 0, capacity }
    }

    #[must_use]
    pub fn with_seed(capacity: usize, seed: &str) -> Self {
        let mut line = Self::new(capacity);
        let bytes = seed.as_bytes();
        let take = bytes.len().min(capacity);
        line.buf.extend_from_slice(&bytes[..take]);
        line.num = take;
        line.pos = take;
        line
    }

    #[must_use]
    pub fn capacity(&self) -> usize { self.capacity }

    /// Cursor index as last rendered to the screen.
    #[must_use]
    pub fn pos(&self) -> usize { self.pos }

    /// Buffer length as last rendered to the screen.
    #[must_use]
    pub fn num(&self) -> usize { self.num }

    /// True current length of the byte buffer. Equal to `num()` except in
    /// the window between a mutating call and the following `refresh`.
    #[must_use]
    pub fn raw_len(&self) -> usize { self.buf.len() }

    #[must_use]
    pub fn bytes(&self) -> &[u8] { &self.buf[..self.num.min(self.buf.len())] }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // The dispatcher only ever inserts ASCII-range printable bytes
        // (see the Default dispatch arm), so this is always valid UTF-8.
        std::str::from_utf8(self.bytes()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.num == 0 }

    #[must_use]
    pub fn byte_at(&self, index: usize) -> Option<u8> { self.buf.get(index).copied() }

    /// Room left for insertion without exceeding `capacity`, relative to
    /// the on-screen length.
    #[must_use]
    pub fn remaining(&self) -> usize { self.capacity.saturating_sub(self.num) }

    /// Replaces the buffer contents wholesale (used by history navigation
    /// and the Alt-R revert action). Does not touch `pos`/`num`; the
    /// caller reads [`Self::raw_len`] and calls [`Self::refresh`].
    pub fn set_contents(&mut self, contents: &str) {
        let bytes = contents.as_bytes();
        let take = bytes.len().min(self.capacity);
        self.buf.clear();
        self.buf.extend_from_slice(&bytes[..take]);
    }

    /// Empties the buffer. Does not touch `pos`/`num`; the caller follows
    /// with `refresh(out, 0, 0)`.
    pub fn clear(&mut self) { self.buf.clear(); }

    /// Inserts `bytes` at the on-screen cursor, truncating silently if it
    /// would overflow capacity (overflow-ignored error kind, never
    /// surfaced). Returns the number of bytes actually inserted; the
    /// caller computes `new_pos = pos() + inserted`, `new_num = raw_len()`.
    pub fn insert_at_cursor(&mut self, bytes: &[u8]) -> usize {
        let room = self.remaining();
        let take = bytes.len().min(room);
        if take == 0 {
            return 0;
        }
        let pos = self.pos;
        let num = self.num;
        self.buf.resize(num + take, 0);
        self.buf.copy_within(pos..num, pos + take);
        self.buf[pos..pos + take].copy_from_slice(&bytes[..take]);
        take
    }

    /// Removes `count` bytes starting at `from` (both relative to the
    /// on-screen length), shifting the tail down. Returns the removed
    /// bytes (used to fill the clipboard on cut). Does not touch
    /// `pos`/`num`.
    pub fn remove_range(&mut self, from: usize, count: usize) -> Vec<u8> {
        let from = from.min(self.num);
        let count = count.min(self.num - from);
        let removed = self.buf[from..from + count].to_vec();
        self.buf.copy_within(from + count..self.num, from);
        self.buf.truncate(self.num - count);
        removed
    }

    pub fn set_pos(&mut self, pos: usize) { self.pos = pos.min(self.num); }

    pub fn set_byte(&mut self, index: usize, value: u8) { self.buf[index] = value; }

    /// Replaces `buf[start..end]` (relative to the on-screen length) with
    /// `replacement`, truncating `replacement` silently if the growth
    /// would overflow capacity. Does not touch `pos`/`num`.
    pub fn replace_range(&mut self, start: usize, end: usize, replacement: &[u8]) {
        let start = start.min(self.num);
        let end = end.clamp(start, self.num);
        let removed_len = end - start;
        let room = self.capacity.saturating_sub(self.num - removed_len);
        let take = replacement.len().min(room);
        if take >= removed_len {
            let grow = take - removed_len;
            self.buf.resize(self.num + grow, 0);
            self.buf.copy_within(end..self.num, end + grow);
        } else {
            let shrink = removed_len - take;
            self.buf.copy_within(end..self.num, end - shrink);
        }
        self.buf[start..start + take].copy_from_slice(&replacement[..take]);
        self.buf.truncate(self.num + take - removed_len);
    }

    /// Strips exactly one trailing space, the accept-time normalization
    /// every Enter key press applies before history push / return. Unlike
    /// the other mutators this one also syncs `pos`/`num`, since it is
    /// only ever called once at accept time with no further `refresh`.
    pub fn strip_one_trailing_space(&mut self) {
        if self.buf.last() == Some(&b' ') {
            self.buf.pop();
        }
        self.num = self.buf.len();
        self.pos = self.pos.min(self.num);
    }

    /// The refresh primitive: moves the cursor to the head of the edit
    /// area, reprints the buffer through `new_num` bytes, erases any stale
    /// tail left over from a shrink, and backs up to `new_pos`.
    ///
    /// `new_num` must already be reflected in `self`'s bytes (callers
    /// mutate first, then call this); `pos`/`num` are updated to
    /// `new_pos`/`new_num` on return.
    pub fn refresh<W: Write>(&mut self, out: &mut W, new_pos: usize, new_num: usize) -> io::Result<()> {
        debug_assert!(new_pos <= new_num);
        debug_assert!(new_num <= self.capacity);
        debug_assert!(new_num <= self.buf.len());

        // 1. Cursor left `pos` positions to the start of the edit area.
        write_backspaces(out, self.pos)?;

        // 2. Emit buffer[0..new_num].
        out.write_all(&self.buf[..new_num])?;

        // 3. Erase stale tail if the buffer shrank.
        if self.num > new_num {
            let erased = self.num - new_num;
            write_spaces(out, erased)?;
            write_backspaces(out, erased)?;
        }

        // 4. Back up to new_pos.
        let printed_end = self.num.max(new_num);
        write_backspaces(out, printed_end - new_pos)?;

        self.pos = new_pos;
        self.num = new_num;
        out.flush()
    }
}

fn write_backspaces<W: Write>(out: &mut W, count: usize) -> io::Result<()> {
    write_repeated(out, b'\x08', count)
}

fn write_spaces<W: Write>(out: &mut W, count: usize) -> io::Result<()> {
    write_repeated(out, b' ', count)
}

fn write_repeated<W: Write>(out: &mut W, byte: u8, count: usize) -> io::Result<()> {
    const CHUNK: usize = 64;
    let chunk = [byte; CHUNK];
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(CHUNK);
        out.write_all(&chunk[..n])?;
        remaining -= n;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn insert_advances_pos_and_num_after_refresh() {
        let mut line = Line::new(16);
        let mut out = Vec::new();
        let inserted = line.insert_at_cursor(b"hi");
        let new_num = line.raw_len();
        line.refresh(&mut out, inserted, new_num).unwrap();
        assert_eq!(line.as_str(), "hi");
        assert_eq!(line.pos(), 2);
        assert_eq!(line.num(), 2);
    }

    #[test]
    fn insert_respects_capacity_silently() {
        let mut line = Line::new(3);
        let inserted = line.insert_at_cursor(b"hello");
        assert_eq!(inserted, 3);
        assert_eq!(line.raw_len(), 3);
    }

    #[test]
    fn refresh_erases_stale_tail_on_shrink() {
        let mut line = Line::with_seed(16, "hello");
        let mut out = Vec::new();
        // Backspace at end: remove last byte.
        line.remove_range(4, 1);
        line.refresh(&mut out, 4, 4).unwrap();
        let written = String::from_utf8(out).unwrap();
        // 5 backspaces to the head, "hell", one space + one backspace to
        // erase the stale "o", then 0 backspaces back to new_pos (4 == 4).
        assert_eq!(written, "\u{8}\u{8}\u{8}\u{8}\u{8}hell \u{8}");
        assert_eq!(line.as_str(), "hell");
    }

    #[test]
    fn strip_one_trailing_space_strips_exactly_one() {
        let mut line = Line::with_seed(16, "hi  ");
        line.strip_one_trailing_space();
        assert_eq!(line.as_str(), "hi ");
    }

    #[test]
    fn remove_range_returns_removed_bytes_for_clipboard() {
        let mut line = Line::with_seed(16, "hello world");
        let removed = line.remove_range(0, 6);
        assert_eq!(String::from_utf8(removed).unwrap(), "hello ");
        line.refresh(&mut Vec::new(), 0, line.raw_len()).unwrap();
        assert_eq!(line.as_str(), "world");
    }

    #[test]
    fn replace_range_same_length_preserves_len() {
        let mut line = Line::with_seed(16, "one two three");
        line.replace_range(4, 7, b"TWO");
        assert_eq!(line.raw_len(), 13);
        line.refresh(&mut Vec::new(), 7, line.raw_len()).unwrap();
        assert_eq!(line.as_str(), "one TWO three");
    }
}
