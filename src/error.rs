use std::{io, path::PathBuf};

use thiserror::Error;

use crate::ast::Command;

/// Translation-time defects raised by the code generator.
///
/// `position` is the 0-based index of the offending command in the stream
/// handed to the generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("malformed command #{position} `{command}`: {reason}")]
    MalformedCommand {
        position: usize,
        command: Command,
        reason: String,
    },

    #[error(
        "stack underflow at command #{position} `{command}`: needs {required} value(s), stack holds {available}"
    )]
    StackUnderflow {
        position: usize,
        command: Command,
        required: usize,
        available: usize,
    },

    #[error(
        "cannot allocate static {index} of module `{module}` at command #{position}: all {capacity} static slots are in use"
    )]
    UnresolvedStatic {
        position: usize,
        module: String,
        index: u16,
        capacity: usize,
    },
}

impl TranslateError {
    pub fn position(&self) -> usize {
        match self {
            TranslateError::MalformedCommand { position, .. }
            | TranslateError::StackUnderflow { position, .. }
            | TranslateError::UnresolvedStatic { position, .. } => *position,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: invalid command `{text}`")]
    InvalidCommand { line: usize, text: String },

    #[error("line {line}: command `{text}` has extra parts `{rest}`")]
    TrailingInput {
        line: usize,
        text: String,
        rest: String,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::InvalidCommand { line, .. } | ParseError::TrailingInput { line, .. } => {
                *line
            }
        }
    }
}

/// Everything that can stop the translation of one source file.
#[derive(Error, Debug)]
pub enum Error {
    #[error("error while reading {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("error while writing {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("line {line}: {source}")]
    Translate { line: usize, source: TranslateError },

    #[error("cannot derive a module name from {}", .0.display())]
    ModuleName(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
