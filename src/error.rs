use std::io;

/// Errors surfaced by the interpreter.
///
/// Language-level faults (stack underflow, out-of-range `g`/`p`, unknown
/// opcodes) are not errors and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source had no non-empty lines, so the grid has no cells.
    #[error("program has no non-empty lines")]
    EmptyProgram,

    /// The host's input or output stream failed.
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
