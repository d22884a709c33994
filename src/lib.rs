//! `crossline`: a small, self-contained, cross-platform readline / libedit
//! replacement. Emacs-style line editing over raw terminal input, a
//! fixed-capacity history ring with pattern search, tab completion, and
//! output paging, built on `crossterm`.
//!
//! The [`Editor`] type owns all per-session state (history, clipboard,
//! word delimiters, the registered completion callback) and exposes
//! [`Editor::read_line`] as the one entry point that drives a full raw-mode
//! editing session. A process-wide default editor is also available as a
//! set of free functions, for callers that only ever need one.

mod completion;
mod editor;
mod error;
mod history;
mod key;
mod line;
pub mod logging;
mod paging;
mod terminal;

pub use completion::{Candidate, CompletionCallback, Completions};
pub use editor::{
    completion_register, history_clear, history_load, history_save, history_show, read_line, read_line_with_input,
    set_word_delimiters, Editor, EditorConfig, ReadOutcome,
};
pub use error::ReadlineError;
pub use history::{PatternFilter, CAPACITY_H, LINE_MAX_H};
pub use key::{Key, NamedKey};
