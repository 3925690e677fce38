use std::{
    io::{self, Read, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use dotenv::dotenv;
use serde::Serialize;

use mwtextextract::{Diagnostic, ExtractError, Extractor, ExtractorConfig, Result};

#[derive(Parser)]
#[command(version, about = "Extract plain body text from MediaWiki wikitext", long_about = None)]
struct Cli {
    /// Wikitext files to read. `-` reads standard input.
    #[arg(value_name = "FILE", default_value = "-")]
    inputs: Vec<PathBuf>,

    /// Print one JSON object per input instead of the bare text.
    #[arg(long)]
    json: bool,

    /// JSON configuration file.
    #[arg(short, long, value_name = "PATH", env = "MWTEXT_CONFIG")]
    config: Option<PathBuf>,
}

/// One line of `--json` output.
#[derive(Serialize)]
struct Extracted<'a> {
    source: String,
    body: &'a str,
    warnings: &'a [Diagnostic],
}

fn read_input(path: &Path) -> Result<String> {
    let mut text = String::new();
    if path == Path::new("-") {
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| ExtractError::io_err("failed to read standard input", e))?;
    } else {
        text = std::fs::read_to_string(path)
            .map_err(|e| ExtractError::io_err(format!("failed to read {}", path.display()), e))?;
    }
    Ok(text)
}

fn process(extractor: &Extractor, path: &Path, json: bool, out: &mut impl Write) -> Result<()> {
    let wikitext = read_input(path)?;
    let mut warnings: Vec<Diagnostic> = Vec::new();
    let body = extractor.extract_with(&wikitext, &mut warnings)?;

    if json {
        let record = Extracted {
            source: path.display().to_string(),
            body: &body,
            warnings: &warnings,
        };
        serde_json::to_writer(&mut *out, &record)
            .map_err(|e| ExtractError::io_err("failed to write JSON output", e))?;
        writeln!(out)?;
    } else {
        for w in &warnings {
            log::warn!("{}: {}", path.display(), w);
        }
        writeln!(out, "{}", body)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ExtractorConfig::from_json_file(path),
        None => Ok(ExtractorConfig::default()),
    };
    let extractor = match config.and_then(Extractor::new) {
        Ok(ex) => ex,
        Err(e) => {
            log::error!("{} ({})", e, e.kind());
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = 0usize;
    for path in &cli.inputs {
        if let Err(e) = process(&extractor, path, cli.json, &mut out) {
            if let ExtractError::Io {
                source: Some(source),
                ..
            } = &e
                && let Some(io_err) = source.downcast_ref::<io::Error>()
                && io_err.kind() == io::ErrorKind::BrokenPipe
            {
                return ExitCode::SUCCESS;
            }
            log::error!("{}: {} ({})", path.display(), e, e.kind());
            failed += 1;
        }
    }

    log::info!(
        "Total: {}. Passed: {}. Failed: {}",
        cli.inputs.len(),
        cli.inputs.len() - failed,
        failed
    );

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
