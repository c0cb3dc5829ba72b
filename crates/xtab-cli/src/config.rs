//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `$XTAB_CONFIG` environment variable
//! 2. `~/.config/xtab/config.toml`
//! 3. Built-in defaults (everything is optional)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub worker: WorkerConfig,
}

/// Defaults for every analysis run.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Interval level for kappa and risk estimates.
    pub confidence_level: f64,
}

/// Report rendering.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// "text" or "json".
    pub format: String,
    pub decimals: usize,
    pub show_expected: bool,
    pub show_residuals: bool,
}

/// Analysis worker settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Custom text returned from `initialize`.
    pub instructions: Option<String>,
}

// --- Defaults ---

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".into(),
            decimals: 3,
            show_expected: true,
            show_residuals: false,
        }
    }
}

/// Load config from disk. Returns defaults if no config file exists.
pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(p) if p.exists() => load_config_from(&p),
        _ => Ok(Config::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

/// Resolve the config file path.
fn config_path() -> Option<PathBuf> {
    // 1. Environment variable
    if let Ok(p) = std::env::var("XTAB_CONFIG") {
        return Some(PathBuf::from(p));
    }

    // 2. ~/.config/xtab/config.toml
    directories::BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".config")
            .join("xtab")
            .join("config.toml")
    })
}

/// Show the active config path (for `xtab config`).
pub fn show_config_path() -> String {
    match config_path() {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analysis.confidence_level, 0.95);
        assert_eq!(config.output.format, "text");
        assert_eq!(config.output.decimals, 3);
        assert!(config.worker.instructions.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[output]
decimals = 4
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.decimals, 4);
        // Other fields should be defaults
        assert_eq!(config.output.format, "text");
        assert_eq!(config.analysis.confidence_level, 0.95);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[analysis]
confidence_level = 0.99

[output]
format = "json"
decimals = 2
show_expected = false
show_residuals = true

[worker]
instructions = "Send one request per line"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.analysis.confidence_level, 0.99);
        assert_eq!(config.output.format, "json");
        assert!(!config.output.show_expected);
        assert!(config.output.show_residuals);
        assert!(config.worker.instructions.is_some());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analysis]\nconfidence_level = 0.99\n").unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.analysis.confidence_level, 0.99);

        std::fs::write(&path, "[analysis\n").unwrap();
        assert!(load_config_from(&path).is_err());
    }
}
