//! CLI module for the bandit engine
//!
//! Provides administrative subcommands over the configured store:
//! - experiment and choice management
//! - `results`: ranked results for every active experiment
//! - `sync`: reconcile experiments against a JSON spec file

pub mod experiment;
pub mod sync;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::BanditEngine;

/// Bandit Engine - multi-armed bandit A/B testing administration
#[derive(Parser)]
#[command(name = "bandit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new experiment
    AddExperiment(experiment::ExperimentArgs),

    /// Archive an experiment, keeping its history
    ArchiveExperiment(experiment::ExperimentArgs),

    /// Add a choice to an experiment
    AddChoice(experiment::ChoiceArgs),

    /// Remove a choice from an experiment
    RemoveChoice(experiment::ChoiceArgs),

    /// Print results for all active experiments
    Results(experiment::ResultsArgs),

    /// List experiment names
    List(experiment::ListArgs),

    /// Reconcile experiments with a JSON spec file
    Sync(sync::SyncArgs),
}

/// Load configuration, install logging and connect to the store
pub(crate) async fn bootstrap() -> anyhow::Result<BanditEngine> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    crate::create_engine_with_config(&config).await
}
