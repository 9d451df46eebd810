use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::request::DEFAULT_VALIDITY_SECONDS;
use crate::store::s3::DEFAULT_REGION;

/// CloudFront signing key (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudFrontConfig {
    /// Public key id registered in the distribution's key group.
    pub key_pair_id: String,
    /// PEM file holding the matching RSA private key.
    pub private_key_path: PathBuf,
}

/// Backing store location (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Config {
    #[serde(default = "default_region")]
    pub region: String,
    /// S3-compatible endpoint; when set, requests use path-style addressing.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
        }
    }
}

/// Global configuration loaded from `~/.config/vlink/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlinkConfig {
    /// Default lifetime of an issued link, in seconds.
    #[serde(default = "default_validity_seconds")]
    pub validity_seconds: i64,
    /// Default bucket when `--bucket` is not given.
    #[serde(default)]
    pub bucket: Option<String>,
    /// Default distribution base URL when `--cdn-url` is not given.
    #[serde(default)]
    pub cdn_base_url: Option<String>,
    #[serde(default)]
    pub cloudfront: Option<CloudFrontConfig>,
    #[serde(default)]
    pub s3: Option<S3Config>,
}

impl Default for VlinkConfig {
    fn default() -> Self {
        Self {
            validity_seconds: DEFAULT_VALIDITY_SECONDS,
            bucket: None,
            cdn_base_url: None,
            cloudfront: None,
            s3: None,
        }
    }
}

impl VlinkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.validity_seconds < 1 {
            bail!(
                "validity_seconds must be a positive integer (got {})",
                self.validity_seconds
            );
        }
        if let Some(cdn) = &self.cdn_base_url {
            if cdn.ends_with('/') {
                bail!("cdn_base_url must not end with '/' (got {})", cdn);
            }
        }
        Ok(())
    }

    /// S3 settings, falling back to defaults when the section is absent.
    pub fn s3_or_default(&self) -> S3Config {
        self.s3.clone().unwrap_or_default()
    }
}

fn default_validity_seconds() -> i64 {
    DEFAULT_VALIDITY_SECONDS
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vlink")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VlinkConfig> {
    let path = config_path()?;
    tracing::debug!("using config {}", path.display());
    if !path.exists() {
        let default_cfg = VlinkConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load and validate configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<VlinkConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: VlinkConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
