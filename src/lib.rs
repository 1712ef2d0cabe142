//! Nand2Tetris VM translator: turns stack-machine commands into Hack assembly.
//!
//! [`parser`] reads `.vm` text into [`ast::Command`]s, and
//! [`translator::CodeGenerator`] expands them one at a time, keeping the
//! logical stack depth and the module's static symbols in a
//! [`context::TranslationContext`].

pub mod ast;
pub mod config;
pub mod context;
mod depth;
pub mod error;
pub mod parser;
pub mod statics;
pub mod translator;

pub use ast::{Command, Segment, Spanned};
pub use context::TranslationContext;
pub use error::{Error, ParseError, TranslateError};
pub use translator::{render, CodeGenerator};

/// Parses and translates the source of one module.
///
/// Nothing is returned unless every command translated; a failing command
/// is reported with its source line.
pub fn translate_source(module: &str, source: &str) -> error::Result<Vec<String>> {
    let parsed = parser::parse(source)?;
    let (lines, commands): (Vec<usize>, Vec<Command>) =
        parsed.into_iter().map(|s| (s.line, s.command)).unzip();

    CodeGenerator::for_module(module)
        .translate(&commands)
        .map_err(|source| Error::Translate {
            line: lines.get(source.position()).copied().unwrap_or_default(),
            source,
        })
}
