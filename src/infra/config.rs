use crate::domain::{DetectorPolicy, ExclusionRule};
use crate::infra::scan::dlp::DlpSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".leakwatch.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum bytes per scan unit.
    pub chunk_size: usize,
    /// Maximum items per inspection request.
    pub scan_batch_size: usize,
    /// Maximum inspection requests in flight.
    pub scan_concurrency: usize,
    /// Maximum annotations per check-run update.
    pub annotation_batch_size: usize,
    pub check_name: String,
    pub detectors: DetectorPolicy,
    pub exclusions: Vec<ExclusionRule>,
    pub dlp: Option<DlpSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            scan_batch_size: crate::infra::scan::batch::DEFAULT_BATCH_SIZE,
            scan_concurrency: 1,
            annotation_batch_size: crate::application::review::annotate::DEFAULT_BATCH_SIZE,
            check_name: "leakwatch".to_string(),
            detectors: DetectorPolicy::default(),
            exclusions: Vec::new(),
            dlp: None,
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("chunk_size", self.chunk_size),
            ("scan_batch_size", self.scan_batch_size),
            ("scan_concurrency", self.scan_concurrency),
            ("annotation_batch_size", self.annotation_batch_size),
        ] {
            if value == 0 {
                anyhow::bail!("`{name}` must be greater than zero");
            }
        }
        for rule in &self.exclusions {
            if let ExclusionRule::Regex(pattern) = rule {
                regex::Regex::new(pattern)
                    .with_context(|| format!("invalid exclusion regex `{pattern}`"))?;
            }
        }
        Ok(())
    }
}

/// Loads the config from `explicit`, or the first file found on the lookup path.
/// No file at all yields the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    match candidate_paths().into_iter().find(|path| path.is_file()) {
        Some(path) => read_config(&path),
        None => {
            log::info!("No config file found; using defaults");
            Ok(Config::default())
        }
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    log::debug!("Loading config from {}", path.display());
    Config::from_toml(&contents).with_context(|| format!("load config {}", path.display()))
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(path) = std::env::var("LEAKWATCH_CONFIG_PATH") {
        paths.push(PathBuf::from(path));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    if let Some(home) = home::home_dir() {
        paths.push(home.join(".config").join("leakwatch").join("config.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Likelihood;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scan_batch_size, 479);
        assert_eq!(config.annotation_batch_size, 50);
        assert!(config.detectors.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
chunk_size = 256
scan_concurrency = 4

[detectors]
CREDIT_CARD_NUMBER = "POSSIBLE"
EMAIL_ADDRESS = "LIKELY"

[[exclusions]]
exact = "test@example.com"

[[exclusions]]
regex = "^4242"

[dlp]
project = "acme-prod"
"#,
        )
        .unwrap();

        assert_eq!(config.chunk_size, 256);
        assert_eq!(config.scan_concurrency, 4);
        assert_eq!(config.scan_batch_size, 479);
        assert_eq!(
            config.detectors.minimum("EMAIL_ADDRESS"),
            Some(Likelihood::Likely)
        );
        assert_eq!(
            config.exclusions,
            vec![
                ExclusionRule::Exact("test@example.com".into()),
                ExclusionRule::Regex("^4242".into()),
            ]
        );
        assert_eq!(config.dlp.unwrap().project, "acme-prod");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(Config::from_toml("scan_batch_size = 0").is_err());
        let unclosed_regex = "[[exclusions]]\nregex = \"(unclosed\"";
        assert!(Config::from_toml(unclosed_regex).is_err());
        let unknown_likelihood = "[detectors]\nEMAIL_ADDRESS = \"SURE\"";
        assert!(Config::from_toml(unknown_likelihood).is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "check_name = \"secrets\"").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.check_name, "secrets");

        let missing = file.path().with_extension("missing");
        assert!(load_config(Some(&missing)).is_err());
    }
}
