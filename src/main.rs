use clap::Parser;
use seekr::cli::Cli;
use seekr::logging::setup_logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(&cli) {
        eprintln!("seekr: {e}");
        return ExitCode::from(2);
    }

    match seekr::run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("seekr: {e}");
            ExitCode::from(2)
        }
    }
}
