// SPDX-License-Identifier: Apache-2.0 OR MIT
//! `qtc`: compiles quicktemplate files into Go source files.

use std::path::PathBuf;

use clap::Parser;
use quicktpl_build::{compile_dir, compile_file, BuildConfig, BuildError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qtc")]
#[command(version, about = "Compile quicktemplate files into Go code", long_about = None)]
struct Cli {
    /// Directory scanned recursively for templates
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Compile a single template instead of scanning --dir
    #[arg(long)]
    file: Option<PathBuf>,

    /// Template file extension (overrides the config file)
    #[arg(long)]
    ext: Option<String>,

    /// JSON build configuration
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), BuildError> {
    let mut config = match &cli.config {
        Some(path) => BuildConfig::from_file(path)?,
        None => BuildConfig::default(),
    };
    if let Some(ext) = &cli.ext {
        config = config.with_extension(ext.clone());
    }

    match &cli.file {
        Some(file) => {
            compile_file(file, &config)?;
        }
        None => {
            let report = compile_dir(&cli.dir, &config)?;
            tracing::info!(
                dir = %cli.dir.display(),
                count = report.written.len(),
                "compiled templates"
            );
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
