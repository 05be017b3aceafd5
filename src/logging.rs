//! Side-channel messages on stderr (or `--log FILE`).
use crate::cli::Cli;
use crate::error::{Result, SeekrError};
use env_logger::{Builder, Env, Target};
use log::Level;
use std::fs;
use std::io::Write;

/// Level used when `RUST_LOG` is unset.
pub fn default_level(cli: &Cli) -> &'static str {
    if cli.debug {
        "debug"
    } else if cli.no_messages {
        "error"
    } else {
        "warn"
    }
}

pub fn setup_logging(cli: &Cli) -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level(cli)));
    let to_file = cli.log.is_some();

    builder.format(move |buf, record| {
        if !to_file && record.level() <= Level::Warn {
            return writeln!(buf, "seekr: {}", record.args());
        }
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    if let Some(log_path) = &cli.log {
        if let Some(parent_dir) = log_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir)?;
            }
        }
        let log_file = fs::File::create(log_path).map_err(|e| SeekrError::file(log_path, e))?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| SeekrError::Other(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_level() {
        let cli = Cli::try_parse_from(["seekr", "x"]).unwrap();
        assert_eq!(default_level(&cli), "warn");
        let cli = Cli::try_parse_from(["seekr", "--debug", "--no-messages", "x"]).unwrap();
        assert_eq!(default_level(&cli), "debug");
        let cli = Cli::try_parse_from(["seekr", "--no-messages", "x"]).unwrap();
        assert_eq!(default_level(&cli), "error");
    }
}
