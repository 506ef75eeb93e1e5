//! Matrixcode - render precomputed matrix codes from the command line.

mod cli;

use std::io::Write;
use std::process;
use std::sync::Arc;

use clap::Parser;
use matrixcode::config::{self, Config};
use matrixcode::logging::init_logging;
use matrixcode::{resolve, MatrixSymbol, MatrixcodeError, RenderOutcome, Renderer};
use serde_json::Value;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), MatrixcodeError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)?;

    let symbol = MatrixSymbol::load(&cli.symbol)?;
    let options =
        cli.renderer_options(&config.renderer.params).map_err(MatrixcodeError::Configuration)?;
    let name = cli.renderer.as_deref().unwrap_or(&config.renderer.name);

    log::debug!("renderer '{name}' with options {options:?}");
    let mut renderer = resolve(name, &Value::Object(options))?;
    renderer.bind_symbol(Arc::new(symbol));

    match renderer.render()? {
        // The response is complete; nothing else may go to stdout.
        RenderOutcome::Dispatched => Ok(()),
        RenderOutcome::Returned(bytes) => {
            if let Some(ref path) = cli.output {
                std::fs::write(path, &bytes)?;
                eprintln!("Saved: {}", path.display());
            } else {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&bytes)?;
                stdout.flush()?;
            }
            Ok(())
        }
    }
}
