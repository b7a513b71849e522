use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::{self, WrapErr};
use rayon::prelude::*;
use rusty_javap::disassemble_file;

/// Prints class files the way `javap -v -l -p` does.
#[derive(clap::Parser)]
struct Args {
    /// Class files to disassemble, printed in the order given.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Number of files disassembled in parallel.
    #[arg(long, short)]
    jobs: Option<usize>,
}

fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;

    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .wrap_err("failed to configure worker pool")?;
    }

    let results: Vec<eyre::Result<String>> = args
        .paths
        .par_iter()
        .map(|path| disassemble_file(path).wrap_err_with(|| path.display().to_string()))
        .collect();

    let mut failed = 0;
    let mut stdout = io::stdout().lock();
    for result in results {
        match result {
            Ok(listing) => stdout.write_all(listing.as_bytes())?,
            Err(e) => {
                failed += 1;
                eprintln!("error: {e:#}");
            }
        }
    }
    stdout.flush()?;

    if failed > 0 {
        log::debug!("{failed} of {} files failed", args.paths.len());
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
