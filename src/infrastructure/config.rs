use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const DEFAULT_APP_NAME: &str = "HabitCanvas";
const DEFAULT_TIMEZONE: &str = "Asia/Manila";
const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;

pub const PORT_ENV_KEYS: &[&str] = &["HABITCANVAS_PORT"];
pub const LISTEN_ADDRESS_ENV_KEYS: &[&str] = &["HABITCANVAS_LISTEN_ADDRESS"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub app_name: String,
    pub timezone: Tz,
    pub listen_address: String,
    pub port: u16,
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([(
        APP_JSON,
        serde_json::json!({
            "schema": 1,
            "appName": DEFAULT_APP_NAME,
            "timezone": DEFAULT_TIMEZONE,
            "listenAddress": DEFAULT_LISTEN_ADDRESS,
            "port": DEFAULT_PORT
        }),
    )])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

fn string_field<'a>(config: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn parse_timezone(value: &str) -> Result<Tz, InfraError> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|_| InfraError::InvalidConfig(format!("unknown timezone '{value}'")))
}

fn parse_port(value: &str, source: &str) -> Result<u16, InfraError> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| InfraError::InvalidConfig(format!("invalid port '{value}' in {source}")))
}

/// Reads `app.json` and applies environment overrides through `lookup`.
pub fn load_app_settings<F>(config_dir: &Path, lookup: F) -> Result<AppSettings, InfraError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = config_dir.join(APP_JSON);
    let app = read_config(&path)?;

    let timezone = parse_timezone(string_field(&app, "timezone").unwrap_or(DEFAULT_TIMEZONE))?;

    let port = match optional_lookup_value(&lookup, PORT_ENV_KEYS) {
        Some(raw) => parse_port(&raw, "environment")?,
        None => match app.get("port") {
            None | Some(serde_json::Value::Null) => DEFAULT_PORT,
            Some(value) => parse_port(&value.to_string(), &path.display().to_string())?,
        },
    };

    let listen_address = optional_lookup_value(&lookup, LISTEN_ADDRESS_ENV_KEYS)
        .or_else(|| string_field(&app, "listenAddress").map(ToOwned::to_owned))
        .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string());

    Ok(AppSettings {
        app_name: string_field(&app, "appName")
            .unwrap_or(DEFAULT_APP_NAME)
            .to_string(),
        timezone,
        listen_address,
        port,
    })
}

pub fn optional_lookup_value<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    for key in keys {
        if let Some(value) = lookup(key) {
            let normalized = value.trim();
            if !normalized.is_empty() {
                return Some(normalized.to_string());
            }
        }
    }
    None
}
