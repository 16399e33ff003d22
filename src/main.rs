mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;
use output::emit_error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = cli.output;
    let command = cli.command.name();

    if let Err(err) = commands::dispatch(cli).await {
        emit_error(output, command, &err);
        std::process::exit(err.exit_code());
    }
}
