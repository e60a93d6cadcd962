//! Handlers for `warden config` subcommands.
//!
//! Each `cmd_config_*` function returns what it would print, so the
//! dispatcher owns stdout and the handlers stay testable. Anything that
//! prints configuration values goes through [`WardenConfig::redacted`].

use std::path::{Path, PathBuf};

use warden_core::WardenConfig;
use warden_core::config::PROJECT_NAME;

use crate::cli::ConfigAction;
use crate::error::{Error, Result};

/// Run a config subcommand against the file at `config_path` (or the
/// resolved default).
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = cmd_config_path(config_path)?;
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist; run `{PROJECT_NAME} config init` to create it)");
            }
        }
        ConfigAction::Init { file, force } => {
            let path = cmd_config_init(file.as_deref(), force)?;
            println!("Config file created at {}", path.display());
        }
        ConfigAction::Show => {
            let config = WardenConfig::load(config_path)?;
            print!("{}", cmd_config_show(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = WardenConfig::load(config_path)?;
            println!("{}", cmd_config_get(&config, &key)?);
        }
        ConfigAction::Set { key, value } => {
            let path = cmd_config_set(config_path, &key, &value)?;
            println!("Set {key} = {value} in {}", path.display());
        }
        ConfigAction::Export { docker_env } => {
            let config = WardenConfig::load(config_path)?;
            for line in cmd_config_export(&config, docker_env) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// The config file path that would be read.
pub fn cmd_config_path(config_path: Option<&str>) -> Result<PathBuf> {
    WardenConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))
}

/// Write a default config to `file`, or to the platform default path.
pub fn cmd_config_init(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => WardenConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(warden_core::Error::from)?;
    }

    let toml_str = WardenConfig::default().to_toml_string()?;
    std::fs::write(&path, toml_str).map_err(warden_core::Error::from)?;
    log::debug!("Wrote default config to {}", path.display());
    Ok(path)
}

/// The effective configuration as TOML, secrets redacted.
pub fn cmd_config_show(config: &WardenConfig) -> Result<String> {
    Ok(config.redacted().to_toml_string()?)
}

/// One value by dotted key, secrets redacted.
pub fn cmd_config_get(config: &WardenConfig, key: &str) -> Result<String> {
    let value = toml::Value::try_from(config.redacted())
        .map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Set `key` to `value` in the config file, keeping the file loadable.
pub fn cmd_config_set(config_path: Option<&str>, key: &str, value: &str) -> Result<PathBuf> {
    let path = cmd_config_path(config_path)?;
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `{PROJECT_NAME} config init` first.",
            path.display()
        )));
    }

    let mut doc = read_document(&path)?;
    set_nested_value(&mut doc, key, parse_value(value))?;
    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    WardenConfig::from_toml_str(&toml_str)
        .map_err(|e| Error::config(format!("Refusing to write {key} = {value}: {e}")))?;

    std::fs::write(&path, toml_str).map_err(warden_core::Error::from)?;
    Ok(path)
}

/// `KEY=VALUE` lines (or `--env KEY=VALUE` for Docker), secrets redacted.
pub fn cmd_config_export(config: &WardenConfig, docker_env: bool) -> Vec<String> {
    config
        .to_env_vars()
        .into_iter()
        .map(|(key, value)| {
            if docker_env {
                format!("--env {key}={value}")
            } else {
                format!("{key}={value}")
            }
        })
        .collect()
}

fn read_document(path: &Path) -> Result<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(warden_core::Error::from)?;
    toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
}

/// Navigate a dotted key path in a TOML value tree.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
pub fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let mut parts: Vec<&str> = key.split('.').collect();
    let last = parts
        .pop()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::config("Empty key path"))?;

    let mut current = root;
    for part in parts {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?
        .insert(last.to_string(), value);
    Ok(())
}

/// Parse a command-line value: bool, then integer, then float, then string.
pub fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => return toml::Value::Boolean(true),
        "false" => return toml::Value::Boolean(false),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(s.to_string())
}

/// Format a TOML value for stdout.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}
