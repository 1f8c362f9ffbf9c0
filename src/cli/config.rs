use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use receipt_autofill::Config;
use serde_json::{Map, Value as JsonValue};
use tokio::fs;
use tracing::info;

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration to the config path
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set configuration value
    Set {
        /// Configuration key, e.g. `policy.fill_threshold`
        key: String,

        /// Configuration value
        value: String,
    },

    /// Get configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Validate configuration
    Validate,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let path = ctx.config_path().to_path_buf();
    match args.action {
        ConfigAction::Show => {
            println!("Current configuration ({}):", path.display());
            println!("{}", serde_yaml::to_string(ctx.config())?);
        }
        ConfigAction::Init { force } => {
            if fs::try_exists(&path).await? && !force {
                bail!("{} already exists; pass --force to overwrite", path.display());
            }
            Config::default().save(&path).await?;
            println!("Wrote default configuration to {}", path.display());
        }
        ConfigAction::Set { key, value } => {
            let config = load_config_file(&path).await?;
            let mut json = serde_json::to_value(&config)?;
            let segments = split_key(&key)?;
            set_json_value(&mut json, &segments, parse_cli_value(&value))?;
            let config: Config = serde_json::from_value(json)
                .with_context(|| format!("invalid value for {key}"))?;
            config.validate()?;
            config.save(&path).await?;
            info!("Updated configuration key {}", key);
            println!("Saved configuration to {}", path.display());
        }
        ConfigAction::Get { key } => {
            let json = serde_json::to_value(ctx.config())?;
            let segments = split_key(&key)?;
            match get_json_value(&json, &segments) {
                Some(value) => print!("{}", serde_yaml::to_string(value)?),
                None => bail!("{} not found in configuration", key),
            }
        }
        ConfigAction::Validate => {
            if fs::try_exists(&path).await? {
                Config::from_file(&path).await?;
                println!("Configuration file {} is valid", path.display());
            } else {
                println!(
                    "No configuration file at {}; defaults are valid",
                    path.display()
                );
            }
        }
    }

    Ok(())
}

async fn load_config_file(path: &Path) -> Result<Config> {
    if fs::try_exists(path).await? {
        Ok(Config::from_file(path).await?)
    } else {
        Ok(Config::default())
    }
}

fn parse_cli_value(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

fn split_key(key: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = key
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.is_empty() {
        bail!("configuration key cannot be empty");
    }
    Ok(segments)
}

fn set_json_value(target: &mut JsonValue, path: &[&str], value: JsonValue) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        bail!("configuration key cannot be empty");
    };
    let mut current = target;
    for segment in parents {
        current = ensure_object(current, segment)?
            .entry((*segment).to_string())
            .or_insert(JsonValue::Null);
    }
    ensure_object(current, last)?.insert((*last).to_string(), value);
    Ok(())
}

fn ensure_object<'a>(
    value: &'a mut JsonValue,
    segment: &str,
) -> Result<&'a mut Map<String, JsonValue>> {
    if value.is_null() {
        *value = JsonValue::Object(Map::new());
    }
    match value {
        JsonValue::Object(map) => Ok(map),
        _ => bail!(
            "{} resolves to a non-object value; cannot assign nested configuration",
            segment
        ),
    }
}

fn get_json_value<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    path.iter().try_fold(value, |current, segment| match current {
        JsonValue::Object(map) => map.get(*segment),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_and_get_nested_keys() {
        let mut doc = serde_json::to_value(Config::default()).unwrap();
        set_json_value(&mut doc, &["policy", "fill_threshold"], JsonValue::from(0.9)).unwrap();
        set_json_value(&mut doc, &["profile", "net_id"], parse_cli_value("jl123")).unwrap();
        assert_eq!(
            get_json_value(&doc, &["policy", "fill_threshold"]),
            Some(&JsonValue::from(0.9))
        );
        let config: Config = serde_json::from_value(doc).unwrap();
        assert_eq!(config.profile.net_id, "jl123");
    }

    #[test]
    fn cannot_nest_under_scalars() {
        let mut doc = json!({ "policy": 3 });
        assert!(set_json_value(&mut doc, &["policy", "fill_threshold"], json!(1)).is_err());
        assert!(split_key("..").is_err());
    }
}
