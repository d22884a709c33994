//! Error type for the line editor.
//!
//! `Aborted` and `Eof` are not represented here: per the propagation policy
//! they are ordinary, expected results of a read and live in
//! [`crate::editor::ReadOutcome`], not in the error path. This enum covers
//! only the genuinely exceptional conditions: OS I/O failure and a caller
//! misusing the API with a too-small capacity. An invalid history id typed
//! during interactive search is not one of these — it is reported inline
//! in the transcript, the same way the original treats a bad search
//! selection as user input to recover from, not a fatal error.

use std::io;

use miette::Diagnostic;
use thiserror::Error;

/// Errors produced by the line editor.
#[derive(Error, Diagnostic, Debug)]
pub enum ReadlineError {
    /// The terminal (or, in degraded mode, stdin/stdout) returned an error.
    #[error("terminal I/O error")]
    #[diagnostic(code(crossline::io))]
    Io(#[from] io::Error),

    /// Caller supplied a buffer capacity below the minimum of 2.
    #[error("line capacity must be at least 2, got {0}")]
    #[diagnostic(code(crossline::bad_arg))]
    CapacityTooSmall(usize),
}
