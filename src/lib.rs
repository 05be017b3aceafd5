pub mod args;
pub mod cli;
pub mod config;
pub mod error;
pub mod file_types;
pub mod list;
pub mod logging;
pub mod metrics;
pub mod output;
pub mod processor;
pub mod rules;
pub mod search;
pub mod walker;

use crate::args::{Command, Environment, SearchConfig};
use crate::config::Config;
use crate::output::Printer;
use crate::search::{Matcher, SearchEngine};
use crate::walker::Walker;
use log::{debug, info};
use std::io::{self, BufWriter, Write};
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub use crate::cli::Cli;
pub use crate::error::{Result, SeekrError};
pub use clap::Parser;

/// Runs one invocation. `Ok(true)` means something was found (exit 0),
/// `Ok(false)` means nothing was (exit 1).
pub fn run(cli: &Cli) -> Result<bool> {
    let file_config = if cli.no_config {
        Config::default()
    } else {
        Config::load()?
    };
    let env = Environment::detect()?;
    let config = SearchConfig::from_cli(cli, &file_config, &env)?;
    colored::control::set_override(config.printer.color);

    let mut out = BufWriter::new(io::stdout().lock());
    match config.command {
        Command::TypeList => {
            list::print_type_list(&config.types, &mut out)
                .and_then(|_| out.flush())
                .or_else(ignore_broken_pipe)?;
            Ok(true)
        }
        Command::Files => {
            let walker = Walker::new(config.paths.clone(), config.walk.clone());
            list::print_files(walker, &mut out, config.printer.null, config.printer.path_separator)
                .and_then(|count| {
                    debug!("listed {count} files");
                    out.flush()
                })
                .or_else(ignore_broken_pipe)?;
            Ok(true)
        }
        Command::Search => search(config, out),
    }
}

fn search<W: Write>(config: SearchConfig, out: W) -> Result<bool> {
    let matcher = Matcher::new(&config.patterns, &config.matcher)?;
    let walker = Walker::new(config.paths.clone(), config.walk.clone());
    let config = Arc::new(config);
    let engine = SearchEngine::new(Arc::clone(&config), matcher);

    let stop = engine.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)) {
        debug!("could not install interrupt handler: {e}");
    }

    let mut printer = Printer::new(out, config.printer.clone());
    let summary = engine.search(walker, &mut printer)?;
    info!(
        "searched {} files in {:?}",
        summary.stats.files_searched, summary.stats.elapsed
    );

    if config.stats {
        printer.write_stats(&summary.stats).or_else(ignore_broken_pipe)?;
    }
    printer.flush().or_else(ignore_broken_pipe)?;
    Ok(summary.matched)
}

fn ignore_broken_pipe(e: io::Error) -> io::Result<()> {
    if e.kind() == io::ErrorKind::BrokenPipe {
        Ok(())
    } else {
        Err(e)
    }
}
