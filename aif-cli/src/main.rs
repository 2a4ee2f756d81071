//! AIF CLI - ammonia inventory forecast dashboard on the command line.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "aif-cli",
    version,
    about = "Ammonia inventory forecast toolkit"
)]
struct Cli {
    #[command(flatten)]
    settings: aif_cmd::Settings,

    #[command(subcommand)]
    command: aif_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    log::debug!("settings: {:?}", cli.settings);
    aif_cmd::run(cli.settings, cli.command).await
}
