use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CertError, Result};
use crate::thumbprint::HashAlgorithm;

pub const DEFAULT_CONFIG_PATH: &str = "certops.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IssuanceConfig {
    #[serde(default)]
    pub root_ca: RootCADefaults,
    #[serde(default)]
    pub device: DeviceDefaults,
    #[serde(default)]
    pub self_signed: SelfSignedDefaults,
    #[serde(default)]
    pub verification: VerificationDefaults,
    #[serde(default)]
    pub chain: ChainDefaults,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RootCADefaults {
    #[serde(default = "default_root_ca_subject")]
    pub subject: String,
    #[serde(default = "default_root_ca_cert_name")]
    pub cert_name: String,
    #[serde(default = "default_validity")]
    pub validity_days: u32,
    #[serde(default = "default_ca_key_bits")]
    pub key_bits: u32,
}

impl Default for RootCADefaults {
    fn default() -> Self {
        Self {
            subject: default_root_ca_subject(),
            cert_name: default_root_ca_cert_name(),
            validity_days: default_validity(),
            key_bits: default_ca_key_bits(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceDefaults {
    /// Appended to the device id to form the leaf certificate's common name
    #[serde(default = "default_device_subject_suffix")]
    pub subject_suffix: String,
    #[serde(default = "default_validity")]
    pub validity_days: u32,
    #[serde(default = "default_ca_key_bits")]
    pub key_bits: u32,
}

impl Default for DeviceDefaults {
    fn default() -> Self {
        Self {
            subject_suffix: default_device_subject_suffix(),
            validity_days: default_validity(),
            key_bits: default_ca_key_bits(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SelfSignedDefaults {
    #[serde(default = "default_leaf_key_bits")]
    pub key_bits: u32,
    #[serde(default = "default_validity")]
    pub validity_days: u32,
    #[serde(default)]
    pub thumbprint: HashAlgorithm,
}

impl Default for SelfSignedDefaults {
    fn default() -> Self {
        Self {
            key_bits: default_leaf_key_bits(),
            validity_days: default_validity(),
            thumbprint: HashAlgorithm::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VerificationDefaults {
    #[serde(default = "default_verification_validity")]
    pub validity_days: u32,
    #[serde(default = "default_leaf_key_bits")]
    pub key_bits: u32,
}

impl Default for VerificationDefaults {
    fn default() -> Self {
        Self {
            validity_days: default_verification_validity(),
            key_bits: default_leaf_key_bits(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainDefaults {
    #[serde(default = "default_chain_file_name")]
    pub file_name: String,
}

impl Default for ChainDefaults {
    fn default() -> Self {
        Self {
            file_name: default_chain_file_name(),
        }
    }
}

fn default_root_ca_subject() -> String {
    "Azure_IoT_Config_Cli_Cert".to_string()
}

fn default_root_ca_cert_name() -> String {
    "iotedge_config_cli_root".to_string()
}

fn default_device_subject_suffix() -> String {
    ".deviceca".to_string()
}

fn default_chain_file_name() -> String {
    "cert-chain.pem".to_string()
}

fn default_validity() -> u32 {
    365
}

fn default_verification_validity() -> u32 {
    30
}

fn default_ca_key_bits() -> u32 {
    4096
}

fn default_leaf_key_bits() -> u32 {
    2048
}

impl IssuanceConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path).map_err(|e| CertError::FileOperation {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&config_str)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        toml::from_str(config_str)
            .map_err(|e| CertError::InvalidArgument(format!("Failed to parse config: {}", e)))
    }

    /// Load `certops.toml` from the working directory, falling back to built-in defaults
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Ok(Self::default())
        }
    }
}
