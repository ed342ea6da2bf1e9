use std::path::PathBuf;

use url::Url;

use crate::auth::PublicKey;
use crate::error::{DealBoardError, Result};

/// Which deal record store the board talks to.
#[derive(Debug)]
pub enum StoreConfig {
    /// JSON file on local disk, seeded with sample deals when missing.
    Mock { path: PathBuf },
    Remote {
        base_url: Url,
        project_id: String,
        public_key: Option<PublicKey>,
    },
}

impl StoreConfig {
    pub fn mock(path: impl Into<PathBuf>) -> Self {
        Self::Mock { path: path.into() }
    }

    pub fn remote(
        base_url: &str,
        project_id: Option<&str>,
        public_key: Option<&str>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DealBoardError::Config(format!("Invalid base URL: {e}")))?;

        let project_id = project_id
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                DealBoardError::Config("A project ID is required for the remote store".to_string())
            })?;

        Ok(Self::Remote {
            base_url,
            project_id: project_id.to_string(),
            public_key: public_key.and_then(PublicKey::parse),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_config() {
        let config =
            StoreConfig::remote("https://records.example.com", Some("crm-42"), Some("pk_1"))
                .unwrap();

        let StoreConfig::Remote {
            base_url,
            project_id,
            public_key,
        } = config
        else {
            panic!("expected remote config");
        };
        assert_eq!(base_url.as_str(), "https://records.example.com/");
        assert_eq!(project_id, "crm-42");
        assert_eq!(public_key.unwrap().as_str(), "pk_1");
    }

    #[test]
    fn test_remote_config_requires_project() {
        let err = StoreConfig::remote("https://records.example.com", Some("  "), None).unwrap_err();

        assert!(matches!(err, DealBoardError::Config(_)));
    }

    #[test]
    fn test_remote_config_rejects_bad_url() {
        let err = StoreConfig::remote("not a url", Some("crm"), None).unwrap_err();

        assert!(matches!(err, DealBoardError::Config(_)));
    }

    #[test]
    fn test_remote_config_empty_key_is_none() {
        let config = StoreConfig::remote("http://localhost:8080", Some("crm"), Some(" ")).unwrap();

        assert!(matches!(config, StoreConfig::Remote { public_key: None, .. }));
    }
}
