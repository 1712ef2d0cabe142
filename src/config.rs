use std::path::{Path, PathBuf};

use clap::Parser;
use log::LevelFilter;

use crate::error::Error;

/// Translate a Nand2Tetris `.vm` file into Hack assembly.
#[derive(Parser, Debug)]
#[command(name = "hack-vm-translator", version)]
pub struct Cli {
    /// VM source file to translate
    pub input: PathBuf,

    /// Output file [default: input with an `.asm` extension]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Namespace for static symbols and labels [default: input file stem]
    #[arg(short, long)]
    pub module: Option<String>,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Resolved settings for one translation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub module: String,
    pub log_level: LevelFilter,
}

impl TryFrom<Cli> for Config {
    type Error = Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let module = match cli.module {
            Some(module) => module,
            None => module_name(&cli.input)?,
        };
        let output = cli.output.unwrap_or_else(|| output_path(&cli.input));
        let log_level = match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        Ok(Config {
            input: cli.input,
            output,
            module,
            log_level,
        })
    }
}

/// The file stem names the module: `dir/StaticTest.vm` -> `StaticTest`.
pub fn module_name(input: &Path) -> Result<String, Error> {
    input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::ModuleName(input.to_path_buf()))
}

/// `dir/Foo.vm` -> `dir/Foo.asm`; a path without extension gains one.
pub fn output_path(input: &Path) -> PathBuf {
    input.with_extension("asm")
}
