use crate::error::{CliError, CliResult};
use geodrop_claims::{AudienceDirectory, ClaimConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// SQLite database file holding the drops
    pub database_path: PathBuf,

    /// Claim gate settings
    pub claims: ClaimConfig,

    /// Named groups for restricted drops
    pub audience: AudienceDirectory,
}

impl CliConfig {
    /// Read the YAML file at `path`; a missing file means all defaults
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Self::default().validated();
        }

        let raw = std::fs::read_to_string(path)?;
        let config: CliConfig = serde_yaml::from_str(&raw)?;
        config.validated()
    }

    fn validated(mut self) -> CliResult<Self> {
        if self.database_path.as_os_str().is_empty() {
            self.database_path = PathBuf::from("geodrop.db");
        }
        self.claims
            .validate()
            .map_err(|e| CliError::InvalidConfig(e.to_string()))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.database_path, PathBuf::from("geodrop.db"));
        assert_eq!(config.claims, ClaimConfig::default());
    }

    #[test]
    fn test_parses_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geodrop.yaml");
        std::fs::write(
            &path,
            r#"
database_path: /var/lib/geodrop/drops.db
claims:
  claim_radius_meters: 30
audience:
  friends:
    - GALICE
    - GBOB
"#,
        )
        .unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/geodrop/drops.db"));
        assert_eq!(config.claims.claim_radius_meters, 30.0);
        assert_eq!(config.claims.max_cas_retries, 1);
        assert!(config.audience.is_member("friends", &"GBOB".parse().unwrap()));
    }

    #[test]
    fn test_rejects_invalid_radius() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "claims:\n  claim_radius_meters: -5\n").unwrap();

        assert!(matches!(
            CliConfig::load(&path),
            Err(CliError::InvalidConfig(_))
        ));
    }
}
