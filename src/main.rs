use bandit_engine::cli::{self, Cli, Command};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::AddExperiment(args) => cli::experiment::add_experiment(args).await,
        Command::ArchiveExperiment(args) => cli::experiment::archive_experiment(args).await,
        Command::AddChoice(args) => cli::experiment::add_choice(args).await,
        Command::RemoveChoice(args) => cli::experiment::remove_choice(args).await,
        Command::Results(args) => cli::experiment::results(args).await,
        Command::List(args) => cli::experiment::list(args).await,
        Command::Sync(args) => cli::sync::run(args).await,
    }
}
