use super::args::{Cli, Command, EngineArgs};
use anyhow::{Context, Result};
use clause_engine::config::DEFAULT_CONFIG_FILE;
use clause_engine::{CrossMap, EngineConfig, Snapshot};
use std::path::Path;

pub mod checklist;
pub mod equivalents;
pub mod gaps;
pub mod rules;
pub mod strictest;
pub mod validate;

pub fn dispatch(cli: Cli) -> Result<i32> {
    match cli.cmd {
        Command::Validate(args) => validate::run(args),
        Command::Rules(args) => rules::run(args),
        Command::Equivalents(args) => equivalents::run(args),
        Command::Checklist(args) => checklist::run(args),
        Command::Strictest(args) => strictest::run(args),
        Command::Gaps(args) => gaps::run(args),
    }
}

/// Config file (explicit, or `./clause.yaml` when present) with flag overrides applied.
pub(crate) fn load_config(args: &EngineArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            EngineConfig::load(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("failed to load {}", DEFAULT_CONFIG_FILE))?
        }
        None => EngineConfig::default(),
    };

    if !args.pack.is_empty() {
        config.packs = args.pack.clone();
    }
    if let Some(path) = &args.crossmap {
        let path = std::path::absolute(path)
            .with_context(|| format!("invalid cross-standard map path {}", path.display()))?;
        config.crossmap = Some(path);
    }
    tracing::debug!(
        packs = ?config.packs,
        crossmap = ?config.crossmap,
        "engine config resolved"
    );
    Ok(config)
}

pub(crate) fn load_snapshot(config: &EngineConfig) -> Result<Snapshot> {
    let snapshot = Snapshot::from_config(config).context("failed to build rule registry")?;
    tracing::debug!(
        rules = snapshot.registry.len(),
        digest = snapshot.registry.digest(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

/// Only the cross-standard map; rule packs are not loaded.
pub(crate) fn load_crossmap(args: &EngineArgs) -> Result<CrossMap> {
    let config = load_config(args)?;
    let loaded = config
        .load_crossmap()
        .context("failed to load cross-standard map")?;
    CrossMap::build(&loaded).context("failed to build cross-standard map")
}

/// `ISO45001 8.1.3, 8.1.2; OSHA 1910.132`
pub(crate) fn format_clause_set(
    set: &std::collections::BTreeMap<clause_engine::Standard, Vec<String>>,
) -> String {
    set.iter()
        .map(|(standard, clauses)| format!("{} {}", standard, clauses.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}
