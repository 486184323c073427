//! Subcommand implementations.

use anyhow::{Context, Result};
use permix_config::PermixConfig;
use permix_core::serialize::to_state_json;
use permix_core::{Actions, Permix, StateJson, rules_from_value};
use std::path::Path;
use std::process::ExitCode;

/// Build the container either from config rules or from a snapshot file.
fn container(config: &PermixConfig, state: Option<&Path>) -> Result<Permix> {
    let Some(path) = state else {
        return config.build().context("Invalid rules in config");
    };

    let permix = Permix::new(config.schema.clone());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot: StateJson = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    permix
        .hydrate(&snapshot)
        .with_context(|| format!("Snapshot {} does not match the schema", path.display()))?;
    Ok(permix)
}

fn actions(mut names: Vec<String>) -> Actions {
    if names.len() == 1 {
        Actions::from(names.remove(0))
    } else {
        Actions::from(names)
    }
}

pub fn check(
    config: &PermixConfig,
    entity: &str,
    names: Vec<String>,
    data: Option<&str>,
    state: Option<&Path>,
) -> Result<ExitCode> {
    let permix = container(config, state)?;
    let actions = actions(names);

    let allowed = match data {
        Some(raw) => {
            let data: serde_json::Value =
                serde_json::from_str(raw).context("--data must be valid JSON")?;
            permix.check_with(entity, actions, &data)
        }
        None => permix.check(entity, actions),
    };

    println!("{allowed}");
    Ok(if allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn snapshot(config: &PermixConfig) -> Result<ExitCode> {
    let permix = config.build().context("Invalid rules in config")?;
    let json = serde_json::to_string_pretty(&permix.get_serializable_state())?;
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}

pub fn validate(config: &PermixConfig, file: &Path) -> Result<ExitCode> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    // Without a schema only the shape can be checked.
    let result = rules_from_value(&value).and_then(|rules| {
        if config.schema.is_empty() {
            return Ok(());
        }
        config.schema.check_state(&to_state_json(&rules))
    });

    match result {
        Ok(()) => {
            println!("ok");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("invalid: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
