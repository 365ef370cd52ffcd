//! Configuration – reads/writes `~/.zerobot/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use zerobot_types::ZeroBotError;

/// Largest refresh interval whose doubled safety window still fits the
/// wire's `u32` timeout field.
pub const MAX_REFRESH_INTERVAL_MS: u64 = u32::MAX as u64 / 2;

/// Persisted settings stored in `~/.zerobot/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// TCP port the vehicle listens on (HTTP page and WebSocket).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the vehicle binds.
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// Endpoint `zerobot drive` connects to when no URL is given.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Operator re-send cadence.  Commands carry twice this as their
    /// safety window.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

fn default_port() -> u16 {
    8555
}
fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}
fn default_server_url() -> String {
    "ws://localhost:8555".to_string()
}
fn default_refresh_interval_ms() -> u64 {
    250
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_host: default_bind_host(),
            server_url: default_server_url(),
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Parsed [`bind_host`][Self::bind_host].
    pub fn bind_addr(&self) -> Result<IpAddr, ZeroBotError> {
        self.bind_host
            .parse()
            .map_err(|e| ZeroBotError::Config(format!("invalid bind_host {:?}: {e}", self.bind_host)))
    }

    /// Reject settings that would make the control loop unsafe or unusable.
    pub fn validate(&self) -> Result<(), ZeroBotError> {
        if self.refresh_interval_ms == 0 {
            return Err(ZeroBotError::Config(
                "refresh_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.refresh_interval_ms > MAX_REFRESH_INTERVAL_MS {
            return Err(ZeroBotError::Config(format!(
                "refresh_interval_ms must be at most {MAX_REFRESH_INTERVAL_MS}, got {}",
                self.refresh_interval_ms
            )));
        }
        if !self.server_url.starts_with("ws://") && !self.server_url.starts_with("wss://") {
            return Err(ZeroBotError::Config(format!(
                "server_url must be a ws:// or wss:// URL, got {:?}",
                self.server_url
            )));
        }
        self.bind_addr()?;
        Ok(())
    }
}

/// Return the path to `~/.zerobot/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".zerobot").join("config.toml")
}

/// Load the effective config: file (or defaults when absent), then
/// environment overrides, then validation.
pub fn load() -> Result<Config, ZeroBotError> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(cfg)
}

/// Load the file at `path`.  Returns `None` if it does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, ZeroBotError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        ZeroBotError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| ZeroBotError::Config(format!("failed to parse config: {e}")))?;
    Ok(Some(cfg))
}

/// Apply `ZEROBOT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ZEROBOT_PORT` | `port` |
/// | `ZEROBOT_BIND_HOST` | `bind_host` |
/// | `ZEROBOT_SERVER_URL` | `server_url` |
/// | `ZEROBOT_REFRESH_INTERVAL_MS` | `refresh_interval_ms` |
///
/// Unparseable numeric values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("ZEROBOT_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.port = port;
    }
    if let Ok(v) = std::env::var("ZEROBOT_BIND_HOST") {
        cfg.bind_host = v;
    }
    if let Ok(v) = std::env::var("ZEROBOT_SERVER_URL") {
        cfg.server_url = v;
    }
    if let Ok(v) = std::env::var("ZEROBOT_REFRESH_INTERVAL_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.refresh_interval_ms = ms;
    }
}

/// Save the config to disk, creating `~/.zerobot/` if necessary.
pub fn save(cfg: &Config) -> Result<(), ZeroBotError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), ZeroBotError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            ZeroBotError::Config(format!("failed to create config directory: {e}"))
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                ZeroBotError::Config(format!("failed to set config directory permissions: {e}"))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| ZeroBotError::Config(format!("failed to serialize config: {e}")))?;
    let write_err =
        |e: std::io::Error| ZeroBotError::Config(format!("failed to write config at {}: {e}", path.display()));
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_vehicle_endpoint() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 8555);
        assert_eq!(cfg.bind_host, "0.0.0.0");
        assert_eq!(cfg.server_url, "ws://localhost:8555");
        assert_eq!(cfg.refresh_interval(), Duration::from_millis(250));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        let cfg = Config {
            refresh_interval_ms: 0,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(ZeroBotError::Config(_))));
    }

    #[test]
    fn refresh_interval_must_fit_the_wire_timeout() {
        let largest = Config {
            refresh_interval_ms: MAX_REFRESH_INTERVAL_MS,
            ..Config::default()
        };
        assert!(largest.validate().is_ok());
        assert!(largest.refresh_interval_ms * 2 <= u64::from(u32::MAX));

        for too_large in [MAX_REFRESH_INTERVAL_MS + 1, u64::MAX] {
            let cfg = Config {
                refresh_interval_ms: too_large,
                ..Config::default()
            };
            assert!(matches!(cfg.validate(), Err(ZeroBotError::Config(_))));
        }
    }

    #[test]
    fn bad_bind_host_and_url_are_rejected() {
        let cfg = Config {
            bind_host: "not-an-ip".to_string(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            server_url: "http://robot:8555".to_string(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);

        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn roundtrip_custom_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config {
            port: 9000,
            server_url: "ws://zerobot.local:9000".to_string(),
            refresh_interval_ms: 100,
            ..Config::default()
        };
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = 9100\n").expect("write");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.port, 9100);
        assert_eq!(loaded.refresh_interval_ms, 250);
    }

    #[test]
    fn unparseable_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = \"eighty\"\n").expect("write");
        assert!(matches!(load_from(&path), Err(ZeroBotError::Config(_))));
    }

    #[test]
    fn config_path_points_to_zerobot_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".zerobot"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    // Each override test uses its own variable so parallel tests never race
    // on the same key.

    #[test]
    fn apply_env_overrides_changes_server_url() {
        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("ZEROBOT_SERVER_URL", "ws://robot-host:8555") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.server_url, "ws://robot-host:8555");
        unsafe { std::env::remove_var("ZEROBOT_SERVER_URL") };
    }

    #[test]
    fn apply_env_overrides_changes_port() {
        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("ZEROBOT_PORT", "9999") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.port, 9999);
        unsafe { std::env::remove_var("ZEROBOT_PORT") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_refresh_interval() {
        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("ZEROBOT_REFRESH_INTERVAL_MS", "fast") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.refresh_interval_ms, 250);
        unsafe { std::env::remove_var("ZEROBOT_REFRESH_INTERVAL_MS") };
    }
}
