//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files, reading `NP_*`
//! environment variables, and merging configurations with proper precedence
//! rules.

use crate::error::ProbeError;
use crate::protocols::http::normalize_proxy_url;
use crate::types::{MAX_CONCURRENCY, MAX_DELAY_SECS, MIN_CONCURRENCY};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Webhook notification settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationConfig>,

    /// Proxy rotation settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxies: Option<ProxyConfig>,

    /// Name generation defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Authorization token sent with every probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Probe endpoint URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Initial inter-request delay in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay: Option<f64>,

    /// Request timeout (as string, e.g., "5s", "30s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// How many times a rate limited candidate is re-probed (0 = record it)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_retries: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NotificationConfig {
    /// Webhook URL; an empty string disables notifications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProxyConfig {
    /// File with one proxy per line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Inline proxy list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<String>>,
}

/// Name generation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_word: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wordlist_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_numbers: Option<bool>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which config files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// The file must exist and pass validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ProbeError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ProbeError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ProbeError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            ProbeError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;
        debug!(path = %path.display(), "Loaded configuration file");

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is lowest, then the home directory, then the current
    /// directory. Files that fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, ProbeError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping config file"),
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            for (i, path) in loaded_files.iter().enumerate() {
                let status = if i == loaded_files.len() - 1 {
                    "highest precedence"
                } else {
                    "overridden where set later"
                };
                info!(path = %path.display(), status, "Merged config file");
            }
        }

        Ok(merged_config)
    }

    /// Write a configuration to disk as TOML.
    pub fn save_file<P: AsRef<Path>>(&self, path: P, config: &FileConfig) -> Result<(), ProbeError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(config).map_err(|e| {
            ProbeError::config(format!("Failed to serialize configuration: {}", e))
        })?;

        fs::write(path, content).map_err(|e| {
            ProbeError::file_error(
                path.to_string_lossy(),
                format!("Failed to write configuration file: {}", e),
            )
        })?;

        info!(path = %path.display(), "Wrote configuration file");
        Ok(())
    }

    /// A starter configuration with every built-in default filled in.
    pub fn template() -> FileConfig {
        FileConfig {
            defaults: Some(DefaultsConfig {
                token: Some(crate::types::PLACEHOLDER_TOKEN.to_string()),
                endpoint: Some(crate::types::DEFAULT_ENDPOINT.to_string()),
                concurrency: Some(crate::types::DEFAULT_CONCURRENCY),
                retry_delay: Some(crate::types::DEFAULT_RETRY_DELAY_SECS),
                timeout: Some("10s".to_string()),
                rate_limit_retries: Some(0),
                output_file: Some(crate::types::DEFAULT_OUTPUT_FILE.to_string()),
            }),
            notification: Some(NotificationConfig {
                webhook_url: Some(String::new()),
            }),
            proxies: Some(ProxyConfig {
                file: Some("proxies.txt".to_string()),
                list: None,
            }),
            generation: Some(GenerationConfig {
                pattern: Some(crate::generate::DEFAULT_PATTERN.to_string()),
                length: Some(crate::generate::DEFAULT_RANDOM_LENGTH),
                base_word: None,
                wordlist_url: None,
                add_numbers: Some(false),
            }),
        }
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./name-probe.toml", "./.name-probe.toml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Some(path.to_path_buf());
            }
        }

        None
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let candidates = [".name-probe.toml", "name-probe.toml"];

        for candidate in &candidates {
            let path = Path::new(&home).join(candidate);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("name-probe").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win field by field.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    token: higher_defaults.token.or(lower_defaults.token),
                    endpoint: higher_defaults.endpoint.or(lower_defaults.endpoint),
                    concurrency: higher_defaults.concurrency.or(lower_defaults.concurrency),
                    retry_delay: higher_defaults.retry_delay.or(lower_defaults.retry_delay),
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    rate_limit_retries: higher_defaults
                        .rate_limit_retries
                        .or(lower_defaults.rate_limit_retries),
                    output_file: higher_defaults.output_file.or(lower_defaults.output_file),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            notification: match (lower.notification, higher.notification) {
                (Some(lower_n), Some(higher_n)) => Some(NotificationConfig {
                    webhook_url: higher_n.webhook_url.or(lower_n.webhook_url),
                }),
                (lower_n, higher_n) => higher_n.or(lower_n),
            },
            proxies: match (lower.proxies, higher.proxies) {
                (Some(lower_p), Some(higher_p)) => Some(ProxyConfig {
                    file: higher_p.file.or(lower_p.file),
                    list: higher_p.list.or(lower_p.list),
                }),
                (lower_p, higher_p) => higher_p.or(lower_p),
            },
            generation: match (lower.generation, higher.generation) {
                (Some(lower_gen), Some(higher_gen)) => Some(GenerationConfig {
                    pattern: higher_gen.pattern.or(lower_gen.pattern),
                    length: higher_gen.length.or(lower_gen.length),
                    base_word: higher_gen.base_word.or(lower_gen.base_word),
                    wordlist_url: higher_gen.wordlist_url.or(lower_gen.wordlist_url),
                    add_numbers: higher_gen.add_numbers.or(lower_gen.add_numbers),
                }),
                (lower_gen, higher_gen) => higher_gen.or(lower_gen),
            },
        }
    }

    /// Validate a configuration for common issues.
    pub fn validate_config(&self, config: &FileConfig) -> Result<(), ProbeError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
                    return Err(ProbeError::config(format!(
                        "Concurrency must be between {} and {}",
                        MIN_CONCURRENCY, MAX_CONCURRENCY
                    )));
                }
            }

            if let Some(delay) = defaults.retry_delay {
                if !delay.is_finite() || !(0.0..=MAX_DELAY_SECS).contains(&delay) {
                    return Err(ProbeError::config(format!(
                        "retry_delay must be between 0 and {} seconds",
                        MAX_DELAY_SECS
                    )));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(ProbeError::config(format!(
                        "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                        timeout_str
                    )));
                }
            }

            if let Some(endpoint) = &defaults.endpoint {
                if endpoint.trim().is_empty() {
                    return Err(ProbeError::config("endpoint cannot be empty"));
                }
            }
        }

        if let Some(notification) = &config.notification {
            if let Some(url) = &notification.webhook_url {
                if !is_valid_webhook_url(url) {
                    return Err(ProbeError::config(format!(
                        "Invalid webhook_url '{}'. It must start with http:// or https://",
                        url
                    )));
                }
            }
        }

        if let Some(generation) = &config.generation {
            if generation.length == Some(0) {
                return Err(ProbeError::config("generation length must be at least 1"));
            }
        }

        Ok(())
    }
}

/// An empty URL means notifications are off and is accepted.
fn is_valid_webhook_url(url: &str) -> bool {
    let url = url.trim();
    url.is_empty() || url.starts_with("http://") || url.starts_with("https://")
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via NP_* environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub token: Option<String>,
    pub concurrency: Option<usize>,
    pub retry_delay: Option<f64>,
    pub timeout: Option<String>,
    pub endpoint: Option<String>,
    pub webhook_url: Option<String>,
    pub proxy_file: Option<String>,
    pub output: Option<String>,
    pub rate_limit_retries: Option<u32>,
    pub config: Option<String>,
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Load configuration through an arbitrary lookup; the process-wide version
/// is [`load_env_config`].
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    // NP_TOKEN - authorization token
    if let Some(token) = non_empty("NP_TOKEN") {
        env_config.token = Some(token.trim().to_string());
        debug!("Using NP_TOKEN from environment");
    }

    // NP_CONCURRENCY - concurrent probes
    if let Some(val) = lookup("NP_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if (MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) => {
                env_config.concurrency = Some(concurrency);
                debug!(concurrency, "Using NP_CONCURRENCY");
            }
            _ => warn!(
                "Invalid NP_CONCURRENCY='{}', must be {}-{}",
                val, MIN_CONCURRENCY, MAX_CONCURRENCY
            ),
        }
    }

    // NP_RETRY_DELAY - initial delay between requests
    if let Some(val) = lookup("NP_RETRY_DELAY") {
        match val.trim().parse::<f64>() {
            Ok(delay) if delay.is_finite() && (0.0..=MAX_DELAY_SECS).contains(&delay) => {
                env_config.retry_delay = Some(delay);
                debug!(delay, "Using NP_RETRY_DELAY");
            }
            _ => warn!(
                "Invalid NP_RETRY_DELAY='{}', must be seconds between 0 and {}",
                val, MAX_DELAY_SECS
            ),
        }
    }

    if let Some(timeout_str) = lookup("NP_TIMEOUT") {
        if parse_timeout_string(&timeout_str).is_some() {
            debug!(timeout = %timeout_str, "Using NP_TIMEOUT");
            env_config.timeout = Some(timeout_str);
        } else {
            warn!(
                "Invalid NP_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                timeout_str
            );
        }
    }

    if let Some(endpoint) = non_empty("NP_ENDPOINT") {
        debug!(endpoint = %endpoint, "Using NP_ENDPOINT");
        env_config.endpoint = Some(endpoint);
    }

    // NP_WEBHOOK_URL - set but empty means "no webhook"
    if let Some(url) = lookup("NP_WEBHOOK_URL") {
        if is_valid_webhook_url(&url) {
            env_config.webhook_url = Some(url.trim().to_string());
        } else {
            warn!(
                "Invalid NP_WEBHOOK_URL='{}', must start with http:// or https://",
                url
            );
        }
    }

    if let Some(path) = non_empty("NP_PROXY_FILE") {
        debug!(path = %path, "Using NP_PROXY_FILE");
        env_config.proxy_file = Some(path);
    }

    if let Some(path) = non_empty("NP_OUTPUT") {
        debug!(path = %path, "Using NP_OUTPUT");
        env_config.output = Some(path);
    }

    if let Some(val) = lookup("NP_RATE_LIMIT_RETRIES") {
        match val.trim().parse::<u32>() {
            Ok(retries) => {
                env_config.rate_limit_retries = Some(retries);
                debug!(retries, "Using NP_RATE_LIMIT_RETRIES");
            }
            Err(_) => warn!(
                "Invalid NP_RATE_LIMIT_RETRIES='{}', must be a whole number",
                val
            ),
        }
    }

    if let Some(path) = non_empty("NP_CONFIG") {
        debug!(path = %path, "Using NP_CONFIG");
        env_config.config = Some(path);
    }

    env_config
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// Bare numbers are taken as seconds. Returns `None` on anything else.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| m * 60)
    } else {
        timeout_str.parse::<u64>().ok()
    }
}

/// Read a proxy list, one entry per line.
///
/// A missing file yields an empty list so the run goes out directly.
/// Entries without a scheme are treated as HTTP proxies.
pub fn load_proxy_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ProbeError> {
    let path = path.as_ref();

    if !path.exists() {
        info!(path = %path.display(), "No proxy file found, running directly");
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ProbeError::file_error(
            path.to_string_lossy(),
            format!("Failed to read proxy file: {}", e),
        )
    })?;

    let proxies: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_proxy_url)
        .collect();

    info!(count = proxies.len(), "Loaded proxies");
    Ok(proxies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("5s"), Some(5));
        assert_eq!(parse_timeout_string("30s"), Some(30));
        assert_eq!(parse_timeout_string("2m"), Some(120));
        assert_eq!(parse_timeout_string("5"), Some(5));
        assert_eq!(parse_timeout_string("invalid"), None);
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[defaults]
token = "abc"
concurrency = 8
retry_delay = 1.5
timeout = "20s"

[notification]
webhook_url = "https://hooks.example/x"

[proxies]
list = ["10.0.0.1:8080"]

[generation]
pattern = "ace_{random}"
length = 6
"#,
        );

        let manager = ConfigManager::new(false);
        let config = manager.load_file(temp_file.path()).unwrap();

        let defaults = config.defaults.unwrap();
        assert_eq!(defaults.token.as_deref(), Some("abc"));
        assert_eq!(defaults.concurrency, Some(8));
        assert_eq!(defaults.retry_delay, Some(1.5));
        assert_eq!(defaults.timeout.as_deref(), Some("20s"));

        assert_eq!(
            config.notification.unwrap().webhook_url.as_deref(),
            Some("https://hooks.example/x")
        );
        assert_eq!(
            config.proxies.unwrap().list,
            Some(vec!["10.0.0.1:8080".to_string()])
        );

        let gen = config.generation.unwrap();
        assert_eq!(gen.pattern.as_deref(), Some("ace_{random}"));
        assert_eq!(gen.length, Some(6));
    }

    #[test]
    fn test_invalid_concurrency() {
        let manager = ConfigManager::new(false);
        for bad in ["0", "51"] {
            let temp_file = write_config(&format!("[defaults]\nconcurrency = {}\n", bad));
            assert!(manager.load_file(temp_file.path()).is_err());
        }
    }

    #[test]
    fn test_negative_retry_delay_rejected() {
        let temp_file = write_config("[defaults]\nretry_delay = -1.0\n");
        let manager = ConfigManager::new(false);
        let err = manager.load_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, ProbeError::ConfigError { .. }));
    }

    #[test]
    fn test_huge_retry_delay_rejected() {
        let temp_file = write_config("[defaults]\nretry_delay = 1e20\n");
        let manager = ConfigManager::new(false);
        let err = manager.load_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, ProbeError::ConfigError { .. }));
    }

    #[test]
    fn test_webhook_scheme_checked() {
        let manager = ConfigManager::new(false);

        let bad = write_config("[notification]\nwebhook_url = \"ftp://x\"\n");
        assert!(manager.load_file(bad.path()).is_err());

        let empty = write_config("[notification]\nwebhook_url = \"\"\n");
        assert!(manager.load_file(empty.path()).is_ok());
    }

    #[test]
    fn test_missing_file_is_error() {
        let manager = ConfigManager::new(false);
        assert!(manager.load_file("/definitely/not/here.toml").is_err());
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new(false);

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(10),
                token: Some("lower".to_string()),
                retry_delay: Some(3.0),
                ..Default::default()
            }),
            generation: Some(GenerationConfig {
                pattern: Some("a_{random}".to_string()),
                length: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(25),
                ..Default::default()
            }),
            generation: Some(GenerationConfig {
                length: Some(8),
                ..Default::default()
            }),
            notification: Some(NotificationConfig {
                webhook_url: Some("https://hooks.example/y".to_string()),
            }),
            ..Default::default()
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();
        assert_eq!(defaults.concurrency, Some(25)); // Higher wins
        assert_eq!(defaults.token.as_deref(), Some("lower")); // Lower preserved
        assert_eq!(defaults.retry_delay, Some(3.0));

        let gen = merged.generation.unwrap();
        assert_eq!(gen.pattern.as_deref(), Some("a_{random}"));
        assert_eq!(gen.length, Some(8));

        assert!(merged.notification.is_some());
        assert!(merged.proxies.is_none());
    }

    #[test]
    fn test_template_round_trips_through_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("name-probe.toml");
        let manager = ConfigManager::new(false);

        manager
            .save_file(&path, &ConfigManager::template())
            .unwrap();
        let loaded = manager.load_file(&path).unwrap();

        assert_eq!(loaded, ConfigManager::template());
    }

    #[test]
    fn test_env_config_parsing() {
        let vars: HashMap<&str, &str> = [
            ("NP_TOKEN", " tok "),
            ("NP_CONCURRENCY", "12"),
            ("NP_RETRY_DELAY", "0.5"),
            ("NP_TIMEOUT", "2m"),
            ("NP_WEBHOOK_URL", ""),
            ("NP_RATE_LIMIT_RETRIES", "3"),
            ("NP_OUTPUT", "out.txt"),
        ]
        .into_iter()
        .collect();

        let env_config = load_env_config_from(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(env_config.token.as_deref(), Some("tok"));
        assert_eq!(env_config.concurrency, Some(12));
        assert_eq!(env_config.retry_delay, Some(0.5));
        assert_eq!(env_config.timeout.as_deref(), Some("2m"));
        assert_eq!(env_config.webhook_url.as_deref(), Some(""));
        assert_eq!(env_config.rate_limit_retries, Some(3));
        assert_eq!(env_config.output.as_deref(), Some("out.txt"));
        assert!(env_config.endpoint.is_none());
    }

    #[test]
    fn test_env_config_ignores_invalid_values() {
        let vars: HashMap<&str, &str> = [
            ("NP_CONCURRENCY", "500"),
            ("NP_RETRY_DELAY", "-2"),
            ("NP_TIMEOUT", "soon"),
            ("NP_WEBHOOK_URL", "discord.com/hook"),
            ("NP_RATE_LIMIT_RETRIES", "many"),
        ]
        .into_iter()
        .collect();

        let env_config = load_env_config_from(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(env_config, EnvConfig::default());
    }

    #[test]
    fn test_load_proxy_file() {
        let temp_file = write_config("\n10.0.0.1:8080\n# comment\nsocks5://10.0.0.2:1080\n  \n");
        let proxies = load_proxy_file(temp_file.path()).unwrap();
        assert_eq!(
            proxies,
            vec![
                "http://10.0.0.1:8080".to_string(),
                "socks5://10.0.0.2:1080".to_string()
            ]
        );
    }

    #[test]
    fn test_missing_proxy_file_is_empty() {
        let proxies = load_proxy_file("/no/such/proxies.txt").unwrap();
        assert!(proxies.is_empty());
    }
}
