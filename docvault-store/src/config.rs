//! Document store configuration.
//!
//! Loaded from a TOML file and/or `DOCVAULT_*` environment variables. Key
//! passphrases are never part of the file: each version's secret is read
//! from `CRYPTO_PASSPHRASE_<version>` when the key ring is built.

use crate::error::{StoreError, StoreResult};
use crate::store::StoreOptions;
use crate::virus_scan::HttpVirusScanner;
use docvault_crypto::{EncryptionKey, KdfParams, KeyRing, KeySecret, KeyVersion};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix of the environment variables holding key passphrases.
pub const PASSPHRASE_ENV_PREFIX: &str = "CRYPTO_PASSPHRASE_";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Key ring configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Version used for all new documents.
    pub encryption_key_version: KeyVersion,
    /// Additional versions kept for reading older documents.
    pub decryption_key_versions: Vec<KeyVersion>,
    pub kdf: KdfParams,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            encryption_key_version: 1,
            decryption_key_versions: Vec::new(),
            kdf: KdfParams::default(),
        }
    }
}

/// S3 connection settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Optional endpoint override (for MinIO or localstack).
    pub endpoint_override: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Default document lifetime. `None` keeps documents until deleted.
    pub expiration_in_days: Option<u32>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "docvault".to_string(),
            region: "us-east-1".to_string(),
            endpoint_override: None,
            access_key: None,
            secret_key: None,
            expiration_in_days: None,
        }
    }
}

/// Virus scanning settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirusScanConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for VirusScanConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            timeout_secs: 30,
        }
    }
}

/// Top-level configuration for the document store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub crypto: CryptoConfig,
    pub s3: S3Config,
    pub virus_scan: VirusScanConfig,
    /// Service-account subjects allowed to act on behalf of owners. Empty
    /// admits all.
    pub authorized_subjects: Vec<String>,
    /// Whether callers may set their own document lifetime.
    pub allow_request_expiry: bool,
    #[serde(default = "default_backend_timeout_secs")]
    pub backend_timeout_secs: u64,
}

fn default_backend_timeout_secs() -> u64 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            crypto: CryptoConfig::default(),
            s3: S3Config::default(),
            virus_scan: VirusScanConfig::default(),
            authorized_subjects: Vec::new(),
            allow_request_expiry: false,
            backend_timeout_secs: default_backend_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(raw: &str) -> StoreResult<Self> {
        toml::from_str(raw).map_err(|e| StoreError::Config(format!("invalid config file: {e}")))
    }

    /// Reads a TOML file.
    pub fn from_toml_file(path: &Path) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Defaults overlaid with `DOCVAULT_*` environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Overlays values from an environment lookup onto this config.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> StoreResult<()> {
        if let Some(v) = lookup("DOCVAULT_ENCRYPTION_KEY_VERSION") {
            self.crypto.encryption_key_version = parse_env("DOCVAULT_ENCRYPTION_KEY_VERSION", &v)?;
        }
        if let Some(v) = lookup("DOCVAULT_DECRYPTION_KEY_VERSIONS") {
            self.crypto.decryption_key_versions = split_list(&v)
                .map(|item| parse_env("DOCVAULT_DECRYPTION_KEY_VERSIONS", item))
                .collect::<StoreResult<_>>()?;
        }
        if let Some(v) = lookup("DOCVAULT_S3_BUCKET") {
            self.s3.bucket = v;
        }
        if let Some(v) = lookup("DOCVAULT_S3_REGION") {
            self.s3.region = v;
        }
        if let Some(v) = lookup("DOCVAULT_S3_ENDPOINT") {
            self.s3.endpoint_override = Some(v);
        }
        if let Some(v) = lookup("DOCVAULT_S3_ACCESS_KEY") {
            self.s3.access_key = Some(v);
        }
        if let Some(v) = lookup("DOCVAULT_S3_SECRET_KEY") {
            self.s3.secret_key = Some(v);
        }
        if let Some(v) = lookup("DOCVAULT_S3_EXPIRATION_IN_DAYS") {
            self.s3.expiration_in_days = Some(parse_env("DOCVAULT_S3_EXPIRATION_IN_DAYS", &v)?);
        }
        if let Some(v) = lookup("DOCVAULT_VIRUS_SCAN_ENABLED") {
            self.virus_scan.enabled = v.trim().eq_ignore_ascii_case("true");
        }
        if let Some(v) = lookup("DOCVAULT_VIRUS_SCAN_URL") {
            self.virus_scan.url = Some(v);
        }
        if let Some(v) = lookup("DOCVAULT_AUTHORIZED_SUBJECTS") {
            self.authorized_subjects = split_list(&v).map(str::to_string).collect();
        }
        if let Some(v) = lookup("DOCVAULT_ALLOW_REQUEST_EXPIRY") {
            self.allow_request_expiry = v.trim().eq_ignore_ascii_case("true");
        }
        Ok(())
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> StoreResult<()> {
        if self.crypto.encryption_key_version == 0 {
            return Err(StoreError::Config(
                "encryption key version must be positive".to_string(),
            ));
        }
        if self.s3.bucket.trim().is_empty() {
            return Err(StoreError::Config("s3 bucket must be set".to_string()));
        }
        if self.virus_scan.enabled && self.virus_scan.url.is_none() {
            return Err(StoreError::Config(
                "virus scanning is enabled but no scan url is set".to_string(),
            ));
        }
        if self.backend_timeout_secs == 0 {
            return Err(StoreError::Config(
                "backend timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the key ring, reading passphrases from the process
    /// environment.
    pub fn key_ring(&self) -> StoreResult<KeyRing> {
        self.key_ring_with(|name| std::env::var(name).ok())
    }

    /// Builds the key ring with passphrases from `lookup`.
    pub fn key_ring_with(&self, lookup: impl Fn(&str) -> Option<String>) -> StoreResult<KeyRing> {
        let passphrase = |version: KeyVersion| -> StoreResult<EncryptionKey> {
            let name = format!("{PASSPHRASE_ENV_PREFIX}{version}");
            let secret = lookup(&name)
                .ok_or_else(|| StoreError::Config(format!("environment variable {name} must be set")))?;
            Ok(EncryptionKey {
                version,
                secret: KeySecret::from(secret),
            })
        };

        let active = passphrase(self.crypto.encryption_key_version)?;
        let decryption = self
            .crypto
            .decryption_key_versions
            .iter()
            .map(|version| passphrase(*version))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(KeyRing::new(active, decryption, &self.crypto.kdf)?)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            default_ttl: self
                .s3
                .expiration_in_days
                .map(|days| Duration::from_secs(u64::from(days) * SECONDS_PER_DAY)),
            allow_request_ttl: self.allow_request_expiry,
            backend_timeout: Duration::from_secs(self.backend_timeout_secs),
            scan_timeout: Duration::from_secs(self.virus_scan.timeout_secs),
        }
    }

    /// The configured HTTP scanner, or `None` when scanning is disabled.
    pub fn virus_scanner(&self) -> StoreResult<Option<HttpVirusScanner>> {
        if !self.virus_scan.enabled {
            return Ok(None);
        }
        let url = self.virus_scan.url.as_deref().ok_or_else(|| {
            StoreError::Config("virus scanning is enabled but no scan url is set".to_string())
        })?;
        let scanner = HttpVirusScanner::new(url, Duration::from_secs(self.virus_scan.timeout_secs))
            .map_err(|e| StoreError::Config(format!("cannot build virus scan client: {e}")))?;
        Ok(Some(scanner))
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> StoreResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| StoreError::Config(format!("{name} has invalid value {raw:?}")))
}
