mod catalog_loader;
mod cli_args;
mod config;
mod dataset_select;
mod engine;
mod logging;
mod run;
mod snapshot_io;
mod summary;

use clap::Parser;

use cli_args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let exit_code = run::run(cli).await?;
    std::process::exit(exit_code);
}
