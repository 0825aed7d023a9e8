//! Sync command - reconciles experiments with a spec file

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::domain::experiment::SyncSpec;
use crate::BanditEngine;

#[derive(Args, Clone, Debug)]
pub struct SyncArgs {
    /// JSON file shaped as {"experiment": ["choice", ...]}
    pub path: PathBuf,
}

pub async fn run(args: SyncArgs) -> anyhow::Result<()> {
    let engine = super::bootstrap().await?;

    info!(path = %args.path.display(), "Loading experiment spec");
    let spec = SyncSpec::from_file(&args.path).await?;

    sync_and_report(&engine, &spec, &mut std::io::stdout().lock()).await
}

/// Apply a spec and write the resulting report
pub async fn sync_and_report<W: Write>(
    engine: &BanditEngine,
    spec: &SyncSpec,
    out: &mut W,
) -> anyhow::Result<()> {
    let report = engine.sync_service.sync_from_spec(spec).await?;
    write!(out, "{}", report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::StoreFactory;
    use crate::AppConfig;

    #[tokio::test]
    async fn test_sync_and_report() {
        let engine = BanditEngine::new(StoreFactory::in_memory(), &AppConfig::default());
        let spec = SyncSpec::from_json(r#"{"e1": ["a", "b"]}"#).unwrap();

        let mut first = Vec::new();
        sync_and_report(&engine, &spec, &mut first).await.unwrap();
        assert_eq!(
            String::from_utf8(first).unwrap(),
            "Created experiment e1\nAdded choice a to experiment e1\nAdded choice b to experiment e1\n"
        );

        let mut second = Vec::new();
        sync_and_report(&engine, &spec, &mut second).await.unwrap();
        assert_eq!(String::from_utf8(second).unwrap(), "Experiments already in sync\n");
    }
}
