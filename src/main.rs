use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    process::exit,
};

use clap::Parser;

use vmil::{
    config::{Cli, Config},
    error::{Error, Result},
};

fn main() {
    let config = match Config::try_from(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    };

    env_logger::Builder::new()
        .filter_level(config.log_level)
        .parse_default_env()
        .init();

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        exit(1);
    }

    println!(
        "Translation complete: {} -> {}",
        config.input.display(),
        config.output.display()
    );
}

fn run(config: &Config) -> Result<()> {
    let data = fs::read_to_string(&config.input).map_err(|source| Error::Read {
        path: config.input.clone(),
        source,
    })?;
    log::info!(
        "translating {} as module {}",
        config.input.display(),
        config.module
    );

    // Translate fully before touching the output so a failure leaves no file.
    let translation = vmil::translate_source(&config.module, &data)?;

    let write_err = |source: io::Error| Error::Write {
        path: config.output.clone(),
        source,
    };
    let mut outfile = BufWriter::new(File::create(&config.output).map_err(write_err)?);
    outfile
        .write_all(vmil::render(&translation).as_bytes())
        .map_err(write_err)?;
    outfile.flush().map_err(write_err)?;

    log::info!("wrote {} lines", translation.len());
    Ok(())
}
