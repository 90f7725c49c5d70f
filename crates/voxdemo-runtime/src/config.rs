//! Runtime configuration loaded from TOML.
//!
//! Resolution order:
//! 1. Explicit `--config` argument
//! 2. `$VOXDEMO_CONFIG`
//! 3. Built-in defaults
//!
//! Every field has a default, so a partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxdemo_core::AgentType;

pub const CONFIG_ENV: &str = "VOXDEMO_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Persona used when none is given on the command line.
    pub agent: AgentType,
    pub playback: PlaybackConfig,
    pub connection: ConnectionConfig,
    pub watchdog: WatchdogConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            agent: AgentType::Revenue,
            playback: PlaybackConfig::default(),
            connection: ConnectionConfig::default(),
            watchdog: WatchdogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Pause between scripted steps.
    pub step_delay_ms: u64,
    /// Pause between streamed words of an assistant turn.
    pub chunk_delay_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 700,
            chunk_delay_ms: 60,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectOutcome {
    #[default]
    Connect,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Simulated handshake latency.
    pub delay_ms: u64,
    pub outcome: ConnectOutcome,
    /// Reported on `CONNECTION_FAILED`; the machine's default applies when unset.
    pub error: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            delay_ms: 400,
            outcome: ConnectOutcome::Connect,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchdogConfig {
    /// How long CONNECTING/PROCESSING/RESPONDING may last before TIMEOUT.
    pub deadline_ms: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 15_000,
        }
    }
}

impl DemoConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the explicit path, else `$VOXDEMO_CONFIG`, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match resolve_path(explicit, std::env::var_os(CONFIG_ENV).map(PathBuf::from)) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }
}

fn resolve_path(explicit: Option<&Path>, from_env: Option<PathBuf>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or(from_env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = DemoConfig::from_toml_str("").expect("parse");
        assert_eq!(cfg, DemoConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = DemoConfig::from_toml_str(
            r#"
agent = "service"

[connection]
outcome = "fail"
error = "webrtc unavailable"
"#,
        )
        .expect("parse");
        assert_eq!(cfg.agent, AgentType::Service);
        assert_eq!(cfg.connection.outcome, ConnectOutcome::Fail);
        assert_eq!(cfg.connection.error.as_deref(), Some("webrtc unavailable"));
        assert_eq!(cfg.connection.delay_ms, 400);
        assert_eq!(cfg.playback, PlaybackConfig::default());
        assert_eq!(cfg.watchdog.deadline_ms, 15_000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(DemoConfig::from_toml_str("[playback]\nspeed = 2\n").is_err());
    }

    #[test]
    fn explicit_path_wins_over_env() {
        let explicit = PathBuf::from("/tmp/a.toml");
        let env = Some(PathBuf::from("/tmp/b.toml"));
        assert_eq!(resolve_path(Some(&explicit), env.clone()), Some(explicit));
        assert_eq!(resolve_path(None, env.clone()), env);
        assert_eq!(resolve_path(None, None), None);
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[watchdog]\ndeadline_ms = 250").expect("write");
        let cfg = DemoConfig::from_file(file.path()).expect("load");
        assert_eq!(cfg.watchdog.deadline_ms, 250);
    }

    #[test]
    fn sample_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/voxdemo.toml");
        let cfg = DemoConfig::from_file(&path).expect("sample config");
        assert_eq!(cfg.agent, AgentType::Service);
        assert_eq!(cfg.connection.outcome, ConnectOutcome::Connect);
        assert_eq!(cfg.watchdog.deadline_ms, 10_000);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DemoConfig::from_file(Path::new("/nonexistent/voxdemo.toml")).expect_err("io");
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/voxdemo.toml"));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "agent = 3").expect("write");
        let err = DemoConfig::from_file(file.path()).expect_err("parse");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
