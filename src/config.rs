//! Service configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CaError, Result};
use crate::signature::SigningAlgorithm;

/// Directory under the platform data dir that holds persisted CA containers.
const DATA_DIR_NAME: &str = "test-authority";

/// Configuration for the certificate authority core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaConfig {
    /// Base address of this service, used to build CRL distribution point
    /// URIs embedded in issued CA certificates.
    pub ca_address: String,
    /// Password protecting the persisted Root/intermediate containers.
    pub store_password: String,
    /// Signature algorithm used for certificate and CRL signing.
    #[serde(default)]
    pub signing_algorithm: SigningAlgorithm,
    /// Override for the application-data directory. When unset the platform
    /// data dir is used.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for CaConfig {
    fn default() -> Self {
        Self {
            ca_address: "http://localhost:5000".to_string(),
            store_password: "123123123".to_string(),
            signing_algorithm: SigningAlgorithm::default(),
            data_dir: None,
        }
    }
}

impl CaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| CaError::Validation(format!("invalid configuration: {e}")))
    }

    /// Directory that holds the persisted certificate containers.
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(DATA_DIR_NAME),
        }
    }

    /// CRL distribution point URI for the signer with the given serial.
    pub fn crl_distribution_url(&self, serial_hex: &str) -> String {
        format!(
            "{}/api/crl/{serial_hex}",
            self.ca_address.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crl_url_includes_serial() {
        let config = CaConfig {
            ca_address: "http://ca.local:5000/".to_string(),
            ..CaConfig::default()
        };
        assert_eq!(
            config.crl_distribution_url("1a2b"),
            "http://ca.local:5000/api/crl/1a2b"
        );
    }

    #[test]
    fn data_dir_override_wins() {
        let config = CaConfig {
            data_dir: Some(PathBuf::from("/tmp/ca-test")),
            ..CaConfig::default()
        };
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/ca-test"));
    }
}
