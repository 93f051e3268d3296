use fifu_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Logs go to a file so they never garble the progress display.
    logging::init_logging_or_stderr();

    if let Err(err) = CliCommand::run_from_args().await {
        tracing::error!("{:#}", err);
        eprintln!("fifu error: {:#}", err);
        std::process::exit(1);
    }
}
