//! Subcommands that go through the ML bridge. All require `--enable-ml`.

use crate::Settings;
use aif_bridge::{BridgeOutcome, PredictParams};
use anyhow::Context;
use log::info;
use std::path::Path;

fn report(action: &str, outcome: BridgeOutcome) -> anyhow::Result<()> {
    if !outcome.log.is_empty() {
        println!("{}", outcome.log);
    }
    if !outcome.success {
        anyhow::bail!("{action} failed");
    }
    info!("{action} succeeded");
    Ok(())
}

/// Validate and store an uploaded training file, then run the prepare step.
pub async fn run_import(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    settings.require_ml("import")?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let dataset = settings
        .store()
        .import_training_data(file_name, &bytes)
        .context("import rejected")?;
    println!("imported {} rows", dataset.len());
    let outcome = settings.bridge().prepare().await?;
    report("prepare", outcome)
}

pub fn run_export(settings: &Settings, destination: &Path) -> anyhow::Result<()> {
    settings.require_ml("export")?;
    let dataset = settings
        .store()
        .export_training_data(destination)
        .context("export failed")?;
    println!("exported {} rows to {}", dataset.len(), destination.display());
    Ok(())
}

pub async fn run_train(settings: &Settings) -> anyhow::Result<()> {
    settings.require_ml("train")?;
    let outcome = settings.bridge().train().await?;
    report("train", outcome)
}

pub async fn run_predict(settings: &Settings, params: &PredictParams) -> anyhow::Result<()> {
    settings.require_ml("predict")?;
    let outcome = settings.bridge().predict(params).await?;
    report("predict", outcome)
}
