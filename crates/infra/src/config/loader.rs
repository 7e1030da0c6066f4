//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If any `SPRINTSYNC_*` variable is set, the environment wins; unset
//!    variables keep their defaults and malformed values are errors
//! 2. Otherwise probes multiple paths for a config file
//! 3. Supports JSON and TOML formats
//! 4. With neither, built-in defaults are used
//!
//! ## Environment Variables
//! - `SPRINTSYNC_DEBOUNCE_MS`: Quiet period before a commit, in milliseconds
//! - `SPRINTSYNC_COMMIT_TIMEOUT_MS`: Upper bound on one remote write
//! - `SPRINTSYNC_SYNC_INTERVAL`: Reconcile interval in seconds
//! - `SPRINTSYNC_SYNC_ENABLED`: Whether background sync runs (true/false)
//! - `SPRINTSYNC_FETCH_TIMEOUT`: Upper bound on one incremental fetch, in
//!   seconds
//! - `SPRINTSYNC_CACHE_SPRINT_TTL`, `SPRINTSYNC_CACHE_TEAM_TTL`,
//!   `SPRINTSYNC_CACHE_COMPANY_TTL`: Aggregate TTLs in seconds
//! - `SPRINTSYNC_CACHE_MAX_ENTRIES`: Cache capacity before LRU eviction
//! - `SPRINTSYNC_SESSION_PATH`: Location of the session file
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./sprintsync.json` or `./sprintsync.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sprintsync_domain::{Config, Result, SprintSyncError};

/// Prefix shared by every recognised environment variable
pub const ENV_PREFIX: &str = "SPRINTSYNC_";

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `SprintSyncError::Config` if an environment variable or the
/// discovered config file is malformed.
pub fn load() -> Result<Config> {
    if env_configured() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("No configuration found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Load configuration from environment variables
///
/// Every variable is optional; unset ones keep the value from
/// [`Config::default`]. At least one `SPRINTSYNC_*` variable must be set.
///
/// # Errors
/// Returns `SprintSyncError::Config` if no variable is set or a value cannot
/// be parsed.
pub fn load_from_env() -> Result<Config> {
    if !env_configured() {
        return Err(SprintSyncError::Config(format!(
            "No {ENV_PREFIX}* environment variables are set"
        )));
    }

    let mut config = Config::default();

    if let Some(v) = env_parse("SPRINTSYNC_DEBOUNCE_MS", "debounce")? {
        config.schedule.debounce_ms = v;
    }
    if let Some(v) = env_parse("SPRINTSYNC_COMMIT_TIMEOUT_MS", "commit timeout")? {
        config.schedule.commit_timeout_ms = v;
    }
    if let Some(v) = env_parse("SPRINTSYNC_SYNC_INTERVAL", "sync interval")? {
        config.sync.interval_seconds = v;
    }
    config.sync.enabled = env_bool("SPRINTSYNC_SYNC_ENABLED", config.sync.enabled);
    if let Some(v) = env_parse("SPRINTSYNC_FETCH_TIMEOUT", "fetch timeout")? {
        config.sync.fetch_timeout_seconds = v;
    }
    if let Some(v) = env_parse("SPRINTSYNC_CACHE_SPRINT_TTL", "sprint TTL")? {
        config.cache.sprint_ttl_seconds = v;
    }
    if let Some(v) = env_parse("SPRINTSYNC_CACHE_TEAM_TTL", "team TTL")? {
        config.cache.team_ttl_seconds = v;
    }
    if let Some(v) = env_parse("SPRINTSYNC_CACHE_COMPANY_TTL", "company TTL")? {
        config.cache.company_ttl_seconds = v;
    }
    if let Some(v) = env_parse("SPRINTSYNC_CACHE_MAX_ENTRIES", "cache size")? {
        config.cache.max_entries = v;
    }
    if let Ok(path) = std::env::var("SPRINTSYNC_SESSION_PATH") {
        config.session.path = PathBuf::from(path);
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SprintSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SprintSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SprintSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SprintSyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SprintSyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SprintSyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SprintSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 6] = [
        "config.json",
        "config.toml",
        "sprintsync.json",
        "sprintsync.toml",
        "../config.json",
        "../config.toml",
    ];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_configured() -> bool {
    std::env::vars_os().any(|(key, _)| key.to_str().is_some_and(|k| k.starts_with(ENV_PREFIX)))
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `SprintSyncError::Config` if the variable is set but malformed.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SprintSyncError::Config(format!("Invalid {what} in {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
