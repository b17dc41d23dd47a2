//! Root CA Certificate Generation Module
//!
//! This module generates the self-signed root CA used to sign IoT Edge device CA
//! certificates and DPS verification certificates.
//!
//! # PKI Hierarchy Position
//! ```text
//! Root CA (self-signed) ← This module
//!   ├── Device CA certificate "<device-id>.deviceca" (signed by Root)
//!   └── Verification certificate "<verification-code>" (signed by Root)
//! ```
//!
//! # Certificate Properties
//! - **Self-signed**: Issuer and subject are the same
//! - **Key Usage**: keyCertSign, cRLSign, digitalSignature (critical)
//! - **Basic Constraints**: CA=true, no path length limit (critical)
//! - **Key Identifiers**: Subject Key Identifier and self-referencing Authority Key Identifier
//! - **Default Key Size**: RSA 4096-bit
//! - **Default Validity**: 365 days
//! - **Thumbprint**: SHA-256
//!
//! # Example
//! ```rust,no_run
//! use iot_certops::generate_root_ca::RsaRootCABuilder;
//! # fn example() -> iot_certops::Result<()> {
//! let root = RsaRootCABuilder::new()
//!     .subject_common_name("Contoso IoT Root")
//!     .output_dir("certs")
//!     .build()?;
//! // writes certs/iotedge_config_cli_root.cert.pem and .key.pem
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use openssl::pkey::{PKey, Private};
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, SubjectKeyIdentifier,
};
use openssl::x509::X509;

use crate::configs::RootCADefaults;
use crate::error::Result;
use crate::pki_generator::{
    common_name, ensure_validity, generate_rsa_key, sign, CertificateTemplate,
};
use crate::record::{CertificateRecord, OutputNaming};
use crate::sources::{Clock, RandomSerial, SerialSource, SystemClock};
use crate::thumbprint::HashAlgorithm;

/// Builder for generating RSA key pairs and self-signed root CA certificates
///
/// Issuer and subject are the same single-CN name. The certificate carries the
/// extensions chain validators need before they accept it as a signer of device
/// certificates: `CA=true` and `keyCertSign`.
pub struct RsaRootCABuilder {
    subject_common_name: String,
    cert_name: String,
    validity_days: u32,
    key_bits: u32,
    output_dir: Option<PathBuf>,
    serial_source: Box<dyn SerialSource>,
    clock: Box<dyn Clock>,
}

impl Default for RsaRootCABuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RsaRootCABuilder {
    /// Create a new root CA builder with the built-in defaults
    pub fn new() -> Self {
        Self::with_defaults(&RootCADefaults::default())
    }

    pub fn with_defaults(defaults: &RootCADefaults) -> Self {
        Self {
            subject_common_name: defaults.subject.clone(),
            cert_name: defaults.cert_name.clone(),
            validity_days: defaults.validity_days,
            key_bits: defaults.key_bits,
            output_dir: None,
            serial_source: Box::new(RandomSerial),
            clock: Box::new(SystemClock),
        }
    }

    /// Set the common name (CN) used for both subject and issuer
    pub fn subject_common_name(mut self, cn: impl Into<String>) -> Self {
        self.subject_common_name = cn.into();
        self
    }

    /// Set the file name stem: `<cert_name>.cert.pem` / `<cert_name>.key.pem`
    pub fn cert_name(mut self, name: impl Into<String>) -> Self {
        self.cert_name = name.into();
        self
    }

    /// Set validity period in days
    pub fn validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    pub fn key_bits(mut self, bits: u32) -> Self {
        self.key_bits = bits;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn serial_source(mut self, source: impl SerialSource + 'static) -> Self {
        self.serial_source = Box::new(source);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Build the RSA key pair and self-signed root CA certificate
    ///
    /// # Certificate Properties
    /// - **Version**: X.509v3
    /// - **Signature Algorithm**: SHA-256 with RSA
    /// - **Basic Constraints**: CA=true, critical
    /// - **Key Usage**: keyCertSign, cRLSign, digitalSignature, critical
    /// - **Serial Number**: Random 128-bit number unless a serial source was set
    ///
    /// # Errors
    /// Returns error if:
    /// - The common name is empty or the validity is zero days
    /// - RSA key generation fails
    /// - X.509 extension creation fails
    /// - Certificate signing fails
    pub fn build_pair(&self) -> Result<(PKey<Private>, X509)> {
        ensure_validity(self.validity_days)?;
        let name = common_name(&self.subject_common_name)?;
        let private_key = generate_rsa_key(self.key_bits)?;

        let template = CertificateTemplate {
            subject: &name,
            issuer: &name,
            public_key: &*private_key,
            validity_days: self.validity_days,
            serial_source: self.serial_source.as_ref(),
            clock: self.clock.as_ref(),
        };
        let mut builder = template.builder()?;

        // SKI must be present before AKI can reference it
        let ski = SubjectKeyIdentifier::new().build(&builder.x509v3_context(None, None))?;
        builder.append_extension(ski)?;

        let aki = AuthorityKeyIdentifier::new()
            .keyid(true)
            .build(&builder.x509v3_context(None, None))?;
        builder.append_extension(aki)?;

        let bc = BasicConstraints::new().critical().ca().build()?;
        builder.append_extension(bc)?;

        let ku = KeyUsage::new()
            .critical()
            .digital_signature()
            .crl_sign()
            .key_cert_sign()
            .build()?;
        builder.append_extension(ku)?;

        let certificate = sign(builder, &private_key)?;
        Ok((private_key, certificate))
    }

    /// Build the root CA record, persisting it when an output directory was set
    pub fn build(self) -> Result<CertificateRecord> {
        let (private_key, certificate) = self.build_pair()?;
        let record =
            CertificateRecord::new(&certificate, Some(&*private_key), HashAlgorithm::Sha256)?;
        log::debug!(
            "Generated root CA '{}' (sha256 thumbprint {})",
            self.subject_common_name,
            record.thumbprint()
        );

        if let Some(dir) = &self.output_dir {
            record.persist(dir, &OutputNaming::Dotted(self.cert_name.clone()), false)?;
        }
        Ok(record)
    }
}

/// Generate a root CA with the default 4096-bit key and 365-day validity.
pub fn create_root_ca(
    subject: &str,
    output_dir: Option<&Path>,
    cert_name: &str,
) -> Result<CertificateRecord> {
    let mut builder = RsaRootCABuilder::new()
        .subject_common_name(subject)
        .cert_name(cert_name);
    if let Some(dir) = output_dir {
        builder = builder.output_dir(dir);
    }
    builder.build()
}
