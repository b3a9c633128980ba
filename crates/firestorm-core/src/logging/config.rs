//! Logging settings resolved from the environment and CLI flags.
//!
//! Precedence, lowest first: built-in defaults, `RUST_LOG`, `FIRESTORM_LOG`,
//! `FIRESTORM_LOG_FORMAT`, then `-v`/`-q` and `--log-format`. A full
//! directive string from the environment (`firestorm_math=trace,warn`) is kept
//! for the subscriber, but only while no level was given on the command line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

pub const ENV_LOG: &str = "FIRESTORM_LOG";
pub const ENV_LOG_FORMAT: &str = "FIRESTORM_LOG_FORMAT";
pub const ENV_RUST_LOG: &str = "RUST_LOG";

/// How events are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event, for run logs that get post-processed.
    Jsonl,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "text" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("unknown log format '{}' (expected human or jsonl)", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbosity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    /// Most verbose level named anywhere in an `EnvFilter` directive string.
    ///
    /// `"firestorm_core=debug,warn"` gives `Debug`. Targets without a level
    /// are ignored.
    fn most_verbose_in(directives: &str) -> Option<LogLevel> {
        directives
            .split(',')
            .filter_map(|d| d.rsplit('=').next())
            .filter_map(|level| level.parse::<LogLevel>().ok())
            .min()
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            "off" | "quiet" => LogLevel::Off,
            other => return Err(format!("unknown log level '{}'", other)),
        };
        Ok(level)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

/// Resolved logging settings for one CLI run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// `level` was set explicitly and overrides environment directives.
    pub level_explicit: bool,
    /// Per-target directives from the environment.
    pub env_directives: Option<String>,
    /// Prefix human output with timestamps.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            level_explicit: false,
            env_directives: None,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Resolve against the process environment.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::resolve(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Resolve with an arbitrary variable lookup.
    ///
    /// Unparseable values are skipped.
    pub fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let env_level = lookup(ENV_LOG)
            .and_then(|v| LogLevel::most_verbose_in(&v))
            .or_else(|| lookup(ENV_RUST_LOG).and_then(|v| LogLevel::most_verbose_in(&v)));
        let env_format = lookup(ENV_LOG_FORMAT).and_then(|v| v.parse().ok());
        let env_directives = lookup(ENV_LOG)
            .or_else(|| lookup(ENV_RUST_LOG))
            .filter(|v| v.parse::<LogLevel>().is_err());

        let defaults = LogConfig::default();
        LogConfig {
            level: cli_level.or(env_level).unwrap_or(defaults.level),
            level_explicit: cli_level.is_some(),
            env_directives,
            format: cli_format.or(env_format).unwrap_or(defaults.format),
            timestamps: defaults.timestamps,
        }
    }

    /// Fix the level, ignoring environment directives.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self.level_explicit = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn format_aliases() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Jsonl.to_string(), "jsonl");
    }

    #[test]
    fn levels_parse_and_order() {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("quiet".parse::<LogLevel>().unwrap(), LogLevel::Off);
        assert!("loud".parse::<LogLevel>().is_err());
        assert!(LogLevel::Trace < LogLevel::Info);
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::DEBUG);
    }

    #[test]
    fn directive_strings_yield_most_verbose_level() {
        assert_eq!(
            LogLevel::most_verbose_in("firestorm_core=debug,warn"),
            Some(LogLevel::Debug)
        );
        assert_eq!(LogLevel::most_verbose_in("firestorm_math"), None);
    }

    #[test]
    fn firestorm_log_beats_rust_log() {
        let config = LogConfig::resolve(
            env(&[(ENV_LOG, "error"), (ENV_RUST_LOG, "trace")]),
            None,
            None,
        );
        assert_eq!(config.level, LogLevel::Error);

        let config = LogConfig::resolve(env(&[(ENV_RUST_LOG, "hyper=warn,debug")]), None, None);
        assert_eq!(config.level, LogLevel::Debug);
    }

    #[test]
    fn cli_flags_win_and_bad_values_fall_back() {
        let lookup = env(&[(ENV_LOG, "nonsense"), (ENV_LOG_FORMAT, "jsonl")]);
        let config = LogConfig::resolve(&lookup, None, None);
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Jsonl);

        let config = LogConfig::resolve(&lookup, Some(LogLevel::Trace), Some(LogFormat::Human));
        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Human);
        assert!(config.level_explicit);
    }

    #[test]
    fn directive_strings_are_kept_but_plain_levels_are_not() {
        let lookup = env(&[(ENV_RUST_LOG, "firestorm_math=trace")]);
        let config = LogConfig::resolve(lookup, None, None);
        assert_eq!(config.env_directives.as_deref(), Some("firestorm_math=trace"));
        assert!(!config.level_explicit);

        let config = LogConfig::resolve(env(&[(ENV_LOG, "debug")]), None, None);
        assert_eq!(config.env_directives, None);
    }
}
