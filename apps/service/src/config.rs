use std::path::PathBuf;
use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read config file: {0}")]
    ReadFailed(#[source] std::io::Error),
    #[error("Failed to write config file: {0}")]
    WriteFailed(#[source] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseFailed(String),
    #[error("No config path available (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
    #[error("Missing required variable {0}")]
    MissingVariable(&'static str),
    #[error("Invalid value for {name}: {value}")]
    InvalidVariable { name: &'static str, value: String },
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discord: Discord,
    pub monitor: Monitor,
    pub gateway: Gateway,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Discord {
    /// Bot credential. Usually supplied through `TOKEN` rather than the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Monitor {
    pub check_interval_ms: u64,
    /// Accepted for compatibility, presence rotation is not performed.
    pub presence_interval_ms: u64,
    pub command_prefix: String,
    pub data_dir: PathBuf,
    pub main_admin: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Gateway {
    pub bind: String,
    pub port: u16,
}

/// Required values once configuration is complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub channel_id: String,
}

impl Default for Discord {
    fn default() -> Self {
        Self { token: None, channel_id: None, api_base: pulse::notifier::discord::DEFAULT_API_BASE.into() }
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            check_interval_ms: 5000,
            presence_interval_ms: 10_000,
            command_prefix: "!".into(),
            data_dir: PathBuf::from("data"),
            main_admin: pulse::engine::DEFAULT_MAIN_ADMIN.into(),
        }
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self { bind: "127.0.0.1".into(), port: 8080 }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/pulse/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("pulse/config.toml"))
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, Error> {
    value.trim().parse().map_err(|_| Error::InvalidVariable { name, value })
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);
        let unset = "<unset>";

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Discord")?;
        write_1(f, "Token", &if self.discord.token.is_some() { "<redacted>" } else { unset })?;
        write_1(f, "Channel", &self.discord.channel_id.as_deref().unwrap_or(unset))?;
        write_1(f, "API Base", &self.discord.api_base)?;
        write_title_1(f, "Monitor")?;
        write_1(f, "Check Interval (ms)", &self.monitor.check_interval_ms)?;
        write_1(f, "Presence Interval (ms)", &self.monitor.presence_interval_ms)?;
        write_1(f, "Command Prefix", &self.monitor.command_prefix)?;
        write_1(f, "Data Directory", &self.monitor.data_dir.display())?;
        write_1(f, "Main Admin", &self.monitor.main_admin)?;
        write_title_1(f, "Gateway")?;
        write_1(f, "Bind Address", &self.gateway.bind)?;
        write_1(f, "Port", &self.gateway.port)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/pulse/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```rust,ignore
    /// let cfg = config::Config::from_config(None::<&path::Path>)?;
    /// println!("{}", cfg);
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(Error::ReadFailed)?;
            toml::from_str(raw_string.as_str()).map_err(|err| Error::ParseFailed(err.to_string()))
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &std::path::Path) -> Result<(), Error> {
        let config_str: String =
            toml::to_string_pretty(self).map_err(|err| Error::ParseFailed(err.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Error::WriteFailed)?;
        }

        std::fs::write(path, config_str).map_err(Error::WriteFailed)
    }

    /// Overlay environment variables, looked up through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), Error> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = var("TOKEN") {
            self.discord.token = Some(token);
        }
        if let Some(channel_id) = var("CHANNEL_ID") {
            self.discord.channel_id = Some(channel_id);
        }
        if let Some(api_base) = var("DISCORD_API_BASE") {
            self.discord.api_base = api_base;
        }
        if let Some(value) = var("CHECK_INTERVAL_MS") {
            self.monitor.check_interval_ms = parse_var("CHECK_INTERVAL_MS", value)?;
        }
        if let Some(value) = var("PRESENCE_INTERVAL_MS") {
            self.monitor.presence_interval_ms = parse_var("PRESENCE_INTERVAL_MS", value)?;
        }
        if let Some(prefix) = var("PREFIX") {
            self.monitor.command_prefix = prefix;
        }
        if let Some(dir) = var("PULSE_DATA_DIR") {
            self.monitor.data_dir = PathBuf::from(dir);
        }
        if let Some(main_admin) = var("MAIN_ADMIN_ID") {
            self.monitor.main_admin = main_admin;
        }
        if let Some(bind) = var("GATEWAY_BIND") {
            self.gateway.bind = bind;
        }
        if let Some(value) = var("GATEWAY_PORT") {
            self.gateway.port = parse_var("GATEWAY_PORT", value)?;
        }
        Ok(())
    }

    /// The bot credential and destination, both required to run.
    pub fn credentials(&self) -> Result<Credentials, Error> {
        let token = self.discord.token.clone().ok_or(Error::MissingVariable("TOKEN"))?;
        let channel_id = self.discord.channel_id.clone().ok_or(Error::MissingVariable("CHANNEL_ID"))?;
        Ok(Credentials { token, channel_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pulse/config");

        let config = Config::from_config(Some(&path)).unwrap();

        assert!(dir.path().join("pulse/config.toml").exists());
        assert_eq!(config.monitor.check_interval_ms, 5000);
        assert_eq!(config.monitor.command_prefix, "!");
        assert_eq!(config.gateway.port, 8080);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[monitor]\ncheck_interval_ms = 2000\n").unwrap();

        let config = Config::from_config(Some(&path)).unwrap();

        assert_eq!(config.monitor.check_interval_ms, 2000);
        assert_eq!(config.monitor.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_env_overrides_and_credentials() {
        let mut config = Config::default();
        assert!(matches!(config.credentials(), Err(Error::MissingVariable("TOKEN"))));

        config
            .apply_env(env_of(&[
                ("TOKEN", "secret"),
                ("CHANNEL_ID", "42"),
                ("CHECK_INTERVAL_MS", "7000"),
                ("PREFIX", "?"),
                ("GATEWAY_PORT", "9090"),
            ]))
            .unwrap();

        assert_eq!(
            config.credentials().unwrap(),
            Credentials { token: "secret".into(), channel_id: "42".into() }
        );
        assert_eq!(config.monitor.check_interval_ms, 7000);
        assert_eq!(config.monitor.command_prefix, "?");
        assert_eq!(config.gateway.port, 9090);
    }

    #[test]
    fn test_channel_is_required_too() {
        let mut config = Config::default();
        config.apply_env(env_of(&[("TOKEN", "secret"), ("CHANNEL_ID", "  ")])).unwrap();
        assert!(matches!(config.credentials(), Err(Error::MissingVariable("CHANNEL_ID"))));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(env_of(&[("CHECK_INTERVAL_MS", "fast")]));
        assert!(matches!(result, Err(Error::InvalidVariable { name: "CHECK_INTERVAL_MS", .. })));
    }

    #[test]
    fn test_display_redacts_token() {
        let mut config = Config::default();
        config.discord.token = Some("secret".into());
        let rendered = config.to_string();
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("secret"));
    }
}
