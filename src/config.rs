use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

/// Where the ledger keeps its database and reads its flow definitions.
///
/// Build one directly with [`Config::new`] or read an rc file:
///
/// ```text
/// # ~/.flowledger/rc
/// data.location=./ledger.db
/// flows.location=/usr/share/flowledger/flows
/// ```
///
/// Relative paths in an rc file are resolved against the directory that
/// contains the rc file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_location: PathBuf,
    pub flows_location: PathBuf,
}

impl Config {
    pub fn new(data_location: impl Into<PathBuf>, flows_location: impl Into<PathBuf>) -> Self {
        Self {
            data_location: data_location.into(),
            flows_location: flows_location.into(),
        }
    }

    /// Read configuration from an rc file
    pub fn from_rc_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse_rc(&content, base_dir)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse `key=value` lines. Blank lines, `#` comments and unknown keys are skipped.
    pub fn parse_rc(content: &str, base_dir: &Path) -> Result<Self> {
        let mut data_location = None;
        let mut flows_location = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                anyhow::bail!("Expected key=value, got '{}'", line);
            };
            let path = resolve(base_dir, value.trim());
            match key.trim() {
                "data.location" => data_location = Some(path),
                "flows.location" => flows_location = Some(path),
                other => log::debug!("ignoring unknown config key '{}'", other),
            }
        }

        Ok(Self {
            data_location: data_location.context("Missing 'data.location'")?,
            flows_location: flows_location.context("Missing 'flows.location'")?,
        })
    }
}

fn resolve(base_dir: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_absolute_paths() {
        let config = Config::parse_rc(
            "data.location=/var/lib/ledger.db\nflows.location=/etc/flows\n",
            Path::new("/home/me/.flowledger"),
        )
        .unwrap();
        assert_eq!(config, Config::new("/var/lib/ledger.db", "/etc/flows"));
    }

    #[test]
    fn test_parse_relative_paths_and_comments() {
        let content = "# ledger settings\n\n data.location = ./ledger.db \ncolor=auto\nflows.location=flows\n";
        let config = Config::parse_rc(content, Path::new("/home/me/.flowledger")).unwrap();
        assert_eq!(config.data_location, Path::new("/home/me/.flowledger/./ledger.db"));
        assert_eq!(config.flows_location, Path::new("/home/me/.flowledger/flows"));
    }

    #[test]
    fn test_parse_missing_key() {
        let err = Config::parse_rc("data.location=/tmp/x.db\n", Path::new("/")).unwrap_err();
        assert!(err.to_string().contains("flows.location"), "got: {err}");
    }

    #[test]
    fn test_parse_malformed_line() {
        let err = Config::parse_rc("data.location\n", Path::new("/")).unwrap_err();
        assert!(err.to_string().contains("key=value"), "got: {err}");
    }

    #[test]
    fn test_from_rc_file() {
        let temp_dir = TempDir::new().unwrap();
        let rc = temp_dir.path().join("rc");
        fs::write(&rc, "data.location=ledger.db\nflows.location=flows\n").unwrap();

        let config = Config::from_rc_file(&rc).unwrap();
        assert_eq!(config.data_location, temp_dir.path().join("ledger.db"));
        assert_eq!(config.flows_location, temp_dir.path().join("flows"));
    }

    #[test]
    fn test_from_rc_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let err = Config::from_rc_file(&temp_dir.path().join("rc")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"), "got: {err}");
    }
}
