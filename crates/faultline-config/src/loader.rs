use std::path::Path;

use secrecy::ExposeSecret;

use crate::{Config, cors::Origins};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// expanded, the TOML is malformed or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus the file read
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;
        config.validate()?;

        Ok(config)
    }

    /// Check values serde cannot
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_auth()?;
        self.validate_upload()?;
        self.validate_storage()?;
        self.validate_cors()?;
        Ok(())
    }

    fn validate_auth(&self) -> anyhow::Result<()> {
        if self.auth.access_token_secret.expose_secret().is_empty() {
            anyhow::bail!("auth.access_token_secret must not be empty");
        }

        if self.auth.token_ttl_seconds == 0 {
            anyhow::bail!("auth.token_ttl_seconds must be greater than 0");
        }

        Ok(())
    }

    fn validate_upload(&self) -> anyhow::Result<()> {
        if self.upload.max_file_bytes == 0 {
            anyhow::bail!("upload.max_file_bytes must be greater than 0");
        }

        if self.upload.field.trim().is_empty() {
            anyhow::bail!("upload.field must not be empty");
        }

        if self.upload.directory.as_os_str().is_empty() {
            anyhow::bail!("upload.directory must not be empty");
        }

        Ok(())
    }

    fn validate_storage(&self) -> anyhow::Result<()> {
        let storage = &self.storage;

        if storage.cloud_name.trim().is_empty() {
            anyhow::bail!("storage.cloud_name must not be empty");
        }

        if storage.api_key.trim().is_empty() || storage.api_secret.expose_secret().is_empty() {
            anyhow::bail!("storage.api_key and storage.api_secret must both be set");
        }

        if storage.folder.trim().is_empty() {
            anyhow::bail!("storage.folder must not be empty");
        }

        Ok(())
    }

    fn validate_cors(&self) -> anyhow::Result<()> {
        let Some(ref cors) = self.server.cors else {
            return Ok(());
        };

        // Browsers refuse credentialed responses for a wildcard origin
        if cors.credentials && cors.origins == Origins::Any {
            anyhow::bail!("server.cors.credentials requires an explicit origin list");
        }

        Ok(())
    }
}
