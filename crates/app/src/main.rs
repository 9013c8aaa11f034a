//! Nimbus Application CLI

use std::{io, process};

use nimbus_app::{
    commands,
    config::{Cli, Command},
    errors::AppError,
    observability,
};
use tracing::error;

#[tokio::main]
pub async fn main() {
    let cli = Cli::load().unwrap_or_else(|error| error.exit());

    if let Err(error) = observability::init_subscriber(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for setup errors"
        )]
        {
            eprintln!("{error}");
        }

        process::exit(1);
    }

    if let Err(error) = run(cli.command).await {
        error!(%error, "command failed");
        process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Scrape(args) => commands::scrape(&args, io::stdout())
            .await
            .map(|_report| ()),
        Command::Migrate(config) => commands::migrate(&config).await,
    }
}
