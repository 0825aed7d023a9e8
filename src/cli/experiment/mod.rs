//! Experiment commands - administration and results output

use std::io::Write;

use clap::Args;

use crate::BanditEngine;

#[derive(Args, Clone, Debug)]
pub struct ExperimentArgs {
    /// Experiment name
    pub name: String,
}

#[derive(Args, Clone, Debug)]
pub struct ChoiceArgs {
    /// Experiment name
    pub experiment: String,

    /// Choice name
    pub choice: String,
}

#[derive(Args, Clone, Debug)]
pub struct ResultsArgs {
    /// Print results as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    /// List archived instead of active experiments
    #[arg(long)]
    pub archived: bool,
}

pub async fn add_experiment(args: ExperimentArgs) -> anyhow::Result<()> {
    let engine = super::bootstrap().await?;
    engine.experiment_service.add_experiment(&args.name).await?;
    Ok(())
}

pub async fn archive_experiment(args: ExperimentArgs) -> anyhow::Result<()> {
    let engine = super::bootstrap().await?;
    engine.experiment_service.archive_experiment(&args.name).await?;
    Ok(())
}

pub async fn add_choice(args: ChoiceArgs) -> anyhow::Result<()> {
    let engine = super::bootstrap().await?;
    engine
        .experiment_service
        .add_choice(&args.experiment, &args.choice)
        .await?;
    Ok(())
}

pub async fn remove_choice(args: ChoiceArgs) -> anyhow::Result<()> {
    let engine = super::bootstrap().await?;
    engine
        .experiment_service
        .remove_choice(&args.experiment, &args.choice)
        .await?;
    Ok(())
}

pub async fn results(args: ResultsArgs) -> anyhow::Result<()> {
    let engine = super::bootstrap().await?;
    write_results(&engine, args.json, &mut std::io::stdout().lock()).await
}

pub async fn list(args: ListArgs) -> anyhow::Result<()> {
    let engine = super::bootstrap().await?;
    write_list(&engine, !args.archived, &mut std::io::stdout().lock()).await
}

/// Write results for all active experiments, text blocks separated by blank lines
pub async fn write_results<W: Write>(
    engine: &BanditEngine,
    json: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    let results = engine.experiment_service.results_for_active().await?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &results)?;
        writeln!(out)?;
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }

        write!(out, "{}", result)?;
    }

    Ok(())
}

/// Write one experiment name per line
pub async fn write_list<W: Write>(
    engine: &BanditEngine,
    active: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    for name in engine.experiment_service.list(active).await? {
        writeln!(out, "{}", name)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::StoreFactory;
    use crate::AppConfig;

    async fn seeded_engine() -> BanditEngine {
        let engine = BanditEngine::new(StoreFactory::in_memory(), &AppConfig::default());
        let service = &engine.experiment_service;

        service.add_experiment("beta").await.unwrap();
        service.add_choice("beta", "x").await.unwrap();
        service.add_experiment("alpha").await.unwrap();
        service.add_choice("alpha", "a").await.unwrap();
        service.add_choice("alpha", "b").await.unwrap();
        service.add_play("alpha", "b").await.unwrap();
        service.add_reward("alpha", "b").await.unwrap();
        service.add_experiment("old").await.unwrap();
        service.archive_experiment("old").await.unwrap();

        engine
    }

    #[tokio::test]
    async fn test_write_results_text() {
        let engine = seeded_engine().await;

        let mut buf = Vec::new();
        write_results(&engine, false, &mut buf).await.unwrap();
        let output = String::from_utf8(buf).unwrap();

        let alpha = output.find("alpha:").unwrap();
        let beta = output.find("beta:").unwrap();
        assert!(alpha < beta);
        assert!(output.contains("- default choice: b"));
        assert!(output.contains("  - b: plays=1, rewards=1, performance=1"));
        assert!(!output.contains("old:"));
    }

    #[tokio::test]
    async fn test_write_results_json() {
        let engine = seeded_engine().await;

        let mut buf = Vec::new();
        write_results(&engine, true, &mut buf).await.unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let results = parsed.as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["name"], "alpha");
        assert_eq!(results[0]["default"], "b");
        assert_eq!(results[0]["choices"][0]["name"], "b");
        assert_eq!(results[1]["chi_squared"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_write_list() {
        let engine = seeded_engine().await;

        let mut active = Vec::new();
        write_list(&engine, true, &mut active).await.unwrap();
        assert_eq!(String::from_utf8(active).unwrap(), "alpha\nbeta\n");

        let mut archived = Vec::new();
        write_list(&engine, false, &mut archived).await.unwrap();
        assert_eq!(String::from_utf8(archived).unwrap(), "old\n");
    }
}
