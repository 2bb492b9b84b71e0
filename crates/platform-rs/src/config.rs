//! Platform connection config
//!
//! Loaded from `~/.universe-pilot/config.yaml` unless a path is given:
//!
//! ```yaml
//! endpoint: https://platform.example.com
//! customer: 11d78d93-1381-4d1d-8393-ba76f47ba7a6
//! timeout_secs: 30
//! ```

use crate::error::{PlatformError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = ".universe-pilot";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform, without the `/api` suffix
    pub endpoint: String,
    /// Customer UUID every API path is scoped to
    pub customer: String,
    /// Per-request timeout; requests wait indefinitely when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl PlatformConfig {
    pub fn new(endpoint: impl Into<String>, customer: impl Into<String>) -> Result<Self> {
        let config = Self {
            endpoint: endpoint.into(),
            customer: customer.into(),
            timeout_secs: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Default config location in the user's home directory
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().ok_or(PlatformError::NoHomeDirectory)?;
        Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load config from the default location
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path()?)
    }

    /// Load config from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PlatformError::ConfigNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: PlatformConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the endpoint and customer where given, then re-validate
    pub fn with_overrides(
        mut self,
        endpoint: Option<String>,
        customer: Option<String>,
    ) -> Result<Self> {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(customer) = customer {
            self.customer = customer;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(PlatformError::ConfigInvalid(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.customer.trim().is_empty() {
            return Err(PlatformError::ConfigInvalid(
                "customer must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(PlatformError::ConfigInvalid(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Base URL for customer-scoped API calls
    pub fn customer_url(&self) -> String {
        format!(
            "{}/api/v1/customers/{}",
            self.endpoint.trim_end_matches('/'),
            self.customer
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
endpoint: https://platform.local/
customer: c-1
timeout_secs: 15
"#;
        let config = PlatformConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.customer, "c-1");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(
            config.customer_url(),
            "https://platform.local/api/v1/customers/c-1"
        );
    }

    #[test]
    fn test_timeout_is_optional() {
        let config =
            PlatformConfig::from_yaml("endpoint: http://localhost:9000\ncustomer: c-1\n").unwrap();
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let err = PlatformConfig::from_yaml("endpoint: localhost\ncustomer: c-1\n").unwrap_err();
        assert!(matches!(err, PlatformError::ConfigInvalid(_)));
    }

    #[test]
    fn test_rejects_empty_customer() {
        let err =
            PlatformConfig::from_yaml("endpoint: http://localhost\ncustomer: ' '\n").unwrap_err();
        assert!(matches!(err, PlatformError::ConfigInvalid(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = PlatformConfig::load("/nonexistent/universe-pilot.yaml").unwrap_err();
        assert!(matches!(err, PlatformError::ConfigNotFound(_)));
    }

    #[test]
    fn test_overrides_replace_and_validate() {
        let config = PlatformConfig::new("http://localhost:9000", "c-1")
            .unwrap()
            .with_overrides(Some("https://platform.local".to_string()), None)
            .unwrap();
        assert_eq!(config.endpoint, "https://platform.local");
        assert_eq!(config.customer, "c-1");

        let err = config
            .with_overrides(None, Some(String::new()))
            .unwrap_err();
        assert!(matches!(err, PlatformError::ConfigInvalid(_)));
    }
}
