mod logging;
mod run;
mod settings;

use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let settings = settings::Settings::parse();
    logging::setup_logging();
    tracing::debug!("Settings: {:?}", settings);

    if run::run(&settings) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
