//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the credentials are not in the environment, falls back to a file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `MIXTAPE_CLIENT_ID` (required)
//! - `MIXTAPE_CLIENT_SECRET` (required)
//! - `MIXTAPE_TOKEN_ENDPOINT`
//! - `MIXTAPE_BASE_URL`
//! - `MIXTAPE_TIMEOUT_MS`
//! - `MIXTAPE_RETRIES`
//! - `MIXTAPE_RETRY_DELAY_MS`
//! - `MIXTAPE_MAX_RETRY_DELAY_MS`
//!
//! Unset optional variables keep their defaults.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./mixtape.toml` or `./mixtape.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use mixtape_domain::constants::DEFAULT_TOKEN_ENDPOINT;
use mixtape_domain::{ClientSettings, Config, ConfigError, Credentials};

const CONFIG_FILE_NAMES: [&str; 4] = ["mixtape.toml", "mixtape.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns [`ConfigError`] if neither source yields a valid configuration.
pub fn load() -> Result<Config, ConfigError> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(ConfigError::MissingField(field)) => {
            tracing::debug!(field, "Credentials not in environment, trying file");
            load_from_file(None)
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from `MIXTAPE_*` environment variables
///
/// # Errors
/// Returns [`ConfigError::MissingField`] if the credentials are not set and
/// [`ConfigError::Invalid`] for unparseable numbers.
pub fn load_from_env() -> Result<Config, ConfigError> {
    load_from_env_with(|key| std::env::var(key).ok())
}

/// [`load_from_env`] against an arbitrary variable source.
///
/// # Errors
/// See [`load_from_env`].
pub fn load_from_env_with<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let client_id = lookup("MIXTAPE_CLIENT_ID").ok_or(ConfigError::MissingField("client_id"))?;
    let client_secret =
        lookup("MIXTAPE_CLIENT_SECRET").ok_or(ConfigError::MissingField("client_secret"))?;
    let token_endpoint =
        lookup("MIXTAPE_TOKEN_ENDPOINT").unwrap_or_else(|| DEFAULT_TOKEN_ENDPOINT.to_string());

    let defaults = ClientSettings::default();
    let client = ClientSettings {
        base_url: lookup("MIXTAPE_BASE_URL").unwrap_or(defaults.base_url),
        timeout_ms: env_number(&lookup, "MIXTAPE_TIMEOUT_MS", "timeout_ms", defaults.timeout_ms)?,
        retries: env_number(&lookup, "MIXTAPE_RETRIES", "retries", defaults.retries)?,
        retry_delay_ms: env_number(
            &lookup,
            "MIXTAPE_RETRY_DELAY_MS",
            "retry_delay_ms",
            defaults.retry_delay_ms,
        )?,
        max_retry_delay_ms: env_number(
            &lookup,
            "MIXTAPE_MAX_RETRY_DELAY_MS",
            "max_retry_delay_ms",
            defaults.max_retry_delay_ms,
        )?,
    };

    let config = Config {
        credentials: Credentials::new(client_id, client_secret, token_endpoint)?,
        client,
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns [`ConfigError::Load`] if no file is found or it does not parse,
/// and the validation error if its contents are incomplete.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::Load(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ConfigError::Load("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ConfigError::Load(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config, ConfigError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConfigError::Load(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConfigError::Load(format!("Invalid JSON format: {e}"))),
        _ => Err(ConfigError::Load(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut directories = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        directories.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        directories.push(exe_dir);
    }

    directories
        .iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_number<F, T>(
    lookup: &F,
    key: &str,
    field: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
            field,
            message: format!("{key}={raw}: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use tempfile::{Builder, NamedTempFile};

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    fn temp_with_suffix(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn env_with_only_credentials_uses_defaults() {
        let config = load_from_env_with(vars(&[
            ("MIXTAPE_CLIENT_ID", "id"),
            ("MIXTAPE_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.credentials.token_endpoint, DEFAULT_TOKEN_ENDPOINT);
        assert_eq!(config.client, ClientSettings::default());
    }

    #[test]
    fn env_overrides_every_setting() {
        let config = load_from_env_with(vars(&[
            ("MIXTAPE_CLIENT_ID", "id"),
            ("MIXTAPE_CLIENT_SECRET", "secret"),
            ("MIXTAPE_TOKEN_ENDPOINT", "http://localhost:9000/token"),
            ("MIXTAPE_BASE_URL", "http://localhost:9000/v1"),
            ("MIXTAPE_TIMEOUT_MS", "2500"),
            ("MIXTAPE_RETRIES", "5"),
            ("MIXTAPE_RETRY_DELAY_MS", "200"),
            ("MIXTAPE_MAX_RETRY_DELAY_MS", "5000"),
        ]))
        .unwrap();

        assert_eq!(config.credentials.token_endpoint, "http://localhost:9000/token");
        assert_eq!(config.client.base_url, "http://localhost:9000/v1");
        assert_eq!(config.client.timeout_ms, 2_500);
        assert_eq!(config.client.retries, 5);
        assert_eq!(config.client.retry_delay_ms, 200);
        assert_eq!(config.client.max_retry_delay_ms, 5_000);
    }

    #[test]
    fn env_missing_secret_is_missing_field() {
        let err = load_from_env_with(vars(&[("MIXTAPE_CLIENT_ID", "id")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("client_secret")));
    }

    #[test]
    fn env_invalid_number_names_the_field() {
        let err = load_from_env_with(vars(&[
            ("MIXTAPE_CLIENT_ID", "id"),
            ("MIXTAPE_CLIENT_SECRET", "secret"),
            ("MIXTAPE_RETRIES", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "retries", .. }));
    }

    #[test]
    fn loads_toml_file() {
        let file = temp_with_suffix(
            ".toml",
            r#"
            [credentials]
            client_id = "id"
            client_secret = "secret"

            [client]
            retries = 1
            "#,
        );

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.credentials.client_id, "id");
        assert_eq!(config.client.retries, 1);
        assert_eq!(config.client.timeout_ms, ClientSettings::default().timeout_ms);
    }

    #[test]
    fn loads_json_file() {
        let file = temp_with_suffix(
            ".json",
            r#"{"credentials": {"client_id": "id", "client_secret": "secret"}, "client": {"timeout_ms": 500}}"#,
        );

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.client.timeout_ms, 500);
    }

    #[test]
    fn file_contents_are_validated() {
        let file = temp_with_suffix(
            ".toml",
            r#"
            [credentials]
            client_id = ""
            client_secret = "secret"
            "#,
        );

        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("client_id")));
    }

    #[test]
    fn rejects_unknown_extension_and_missing_file() {
        let file = temp_with_suffix(".yaml", "credentials: {}");
        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Load(message) if message.contains("yaml")));

        let err = load_from_file(Some(PathBuf::from("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn malformed_file_is_load_error() {
        let file = temp_with_suffix(".json", "{ not json");
        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Load(message) if message.starts_with("Invalid JSON")));
    }
}
