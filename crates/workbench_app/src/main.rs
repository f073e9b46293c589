use std::process::ExitCode;

use clap::Parser;

mod cli;
mod platform;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match platform::run_app(cli) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("workbench: {err:#}");
            ExitCode::from(2)
        }
    }
}
