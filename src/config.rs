//! Layered `AppConfig`: file-default → TOML config file → environment
//! variable → CLI flag, later sources winning (§6.2).

use crate::core::controller::KeywordRule;
use crate::core::planner::YearFilter;
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

const MAX_KEYWORD_RULES: usize = 5;
const DEFAULT_PAGES_DESIRED: u32 = 10;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a platform config directory")]
    NoProjectDirs,
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid year_filter value: {0} (expected none, 5, 10, or 20)")]
    InvalidYearFilter(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    api_key: Option<String>,
    tor_socks_proxy: Option<String>,
    tor_http_proxy: Option<String>,
    tor_browser_path: Option<PathBuf>,
    tor_control_port: Option<String>,
    tor_control_password: Option<String>,
    year_filter: Option<String>,
    pages_desired: Option<u32>,
    output_dir: Option<PathBuf>,
    log_level: Option<String>,
}

/// CLI-supplied values, already parsed by `clap`. `None` means "flag not
/// given"; layering falls through to the environment, then the file, then
/// the compiled default.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub tor_socks_proxy: Option<String>,
    pub tor_http_proxy: Option<String>,
    pub tor_control_port: Option<String>,
    pub tor_control_password: Option<String>,
    pub year_filter: Option<String>,
    pub pages_desired: Option<u32>,
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub keyword_rules: Vec<KeywordRule>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub semantic_scholar_api_key: Option<String>,
    pub tor_socks_proxy: Option<String>,
    pub tor_http_proxy: Option<String>,
    pub tor_browser_path: Option<PathBuf>,
    pub tor_control_port: Option<u16>,
    pub tor_control_password: Option<String>,
    pub year_filter: YearFilter,
    pub pages_desired: u32,
    pub keyword_rules: Vec<KeywordRule>,
    pub output_dir: PathBuf,
    pub log_level: String,
}

/// `cli` wins over `env` wins over `file` wins over `default`.
fn layered<T>(cli: Option<T>, env: Option<T>, file: Option<T>, default: T) -> T {
    cli.or(env).or(file).unwrap_or(default)
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs, ConfigError> {
        ProjectDirs::from("", "", "paperhound").ok_or(ConfigError::NoProjectDirs)
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    fn default_output_dir() -> Result<PathBuf, ConfigError> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    fn load_file() -> Result<FileConfig, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(FileConfig::default());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let file = Self::load_file()?;
        let default_output_dir = Self::default_output_dir()?;

        let semantic_scholar_api_key = layered(
            overrides.api_key,
            std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
            file.api_key,
            None::<String>,
        );

        let tor_socks_proxy = layered(
            overrides.tor_socks_proxy,
            std::env::var("TOR_SOCKS_PROXY")
                .or_else(|_| std::env::var("TOR_PROXY"))
                .ok(),
            file.tor_socks_proxy,
            None::<String>,
        );

        let tor_http_proxy = layered(overrides.tor_http_proxy, None, file.tor_http_proxy, None::<String>);
        let tor_control_password =
            layered(overrides.tor_control_password, None, file.tor_control_password, None::<String>);

        let control_port_raw = layered(
            overrides.tor_control_port,
            None,
            file.tor_control_port,
            None::<String>,
        );
        let tor_control_port = control_port_raw.and_then(|raw| match raw.trim().parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                warn!(
                    marker = "CONFIG_INVALID_CONTROL_PORT",
                    value = %raw,
                    "unparsable tor_control_port, disabling NEWNYM signal"
                );
                None
            }
        });

        let year_filter_raw = layered(
            overrides.year_filter,
            None,
            file.year_filter,
            "none".to_string(),
        );
        let year_filter = parse_year_filter(&year_filter_raw)?;

        let pages_desired_raw = layered(
            overrides.pages_desired,
            None,
            file.pages_desired,
            DEFAULT_PAGES_DESIRED,
        );
        let pages_desired = if pages_desired_raw < 1 {
            warn!(
                marker = "CONFIG_PAGES_CLAMPED",
                requested = pages_desired_raw,
                "pages_desired < 1, clamping to 1"
            );
            1
        } else {
            pages_desired_raw
        };

        let mut keyword_rules = overrides.keyword_rules;
        if keyword_rules.len() > MAX_KEYWORD_RULES {
            warn!(
                marker = "CONFIG_KEYWORD_CAP",
                supplied = keyword_rules.len(),
                cap = MAX_KEYWORD_RULES,
                "keyword_rules exceeds cap, truncating"
            );
            keyword_rules.truncate(MAX_KEYWORD_RULES);
        }

        let output_dir_raw = layered(overrides.output_dir, None, file.output_dir, default_output_dir);
        let output_dir = expand_path(output_dir_raw);

        let log_level = layered(
            overrides.log_level,
            std::env::var("PAPERHOUND_LOG").ok(),
            file.log_level,
            DEFAULT_LOG_LEVEL.to_string(),
        );

        Ok(AppConfig {
            semantic_scholar_api_key,
            tor_socks_proxy,
            tor_http_proxy,
            tor_browser_path: file.tor_browser_path,
            tor_control_port,
            tor_control_password,
            year_filter,
            pages_desired,
            keyword_rules,
            output_dir,
            log_level,
        })
    }
}

fn expand_path(path: PathBuf) -> PathBuf {
    shellexpand::tilde(&path.to_string_lossy()).into_owned().into()
}

fn parse_year_filter(raw: &str) -> Result<YearFilter, ConfigError> {
    match raw.trim() {
        "none" => Ok(YearFilter::None),
        "5" => Ok(YearFilter::Five),
        "10" => Ok(YearFilter::Ten),
        "20" => Ok(YearFilter::Twenty),
        other => Err(ConfigError::InvalidYearFilter(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layered_prefers_cli_then_env_then_file_then_default() {
        assert_eq!(layered(Some(1), Some(2), Some(3), 4), 1);
        assert_eq!(layered(None, Some(2), Some(3), 4), 2);
        assert_eq!(layered(None, None, Some(3), 4), 3);
        assert_eq!(layered(None::<i32>, None, None, 4), 4);
    }

    #[test]
    fn parse_year_filter_accepts_known_values() {
        assert_eq!(parse_year_filter("none").unwrap(), YearFilter::None);
        assert_eq!(parse_year_filter("5").unwrap(), YearFilter::Five);
        assert_eq!(parse_year_filter("10").unwrap(), YearFilter::Ten);
        assert_eq!(parse_year_filter("20").unwrap(), YearFilter::Twenty);
    }

    #[test]
    fn parse_year_filter_rejects_unknown_value() {
        assert!(parse_year_filter("15").is_err());
    }
}
