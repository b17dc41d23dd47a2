//! Self-Signed Certificate Generation Module
//!
//! Generates the plain self-signed certificates used for IoT Hub X.509 thumbprint
//! authentication: a single CN subject that is also the issuer, no extensions, a
//! 2048-bit RSA key and a SHA-256 signature.
//!
//! # Example
//! ```rust,no_run
//! use iot_certops::generate_self_signed::RsaSelfSignedBuilder;
//! use iot_certops::HashAlgorithm;
//! # fn example() -> iot_certops::Result<()> {
//! let record = RsaSelfSignedBuilder::new("device-01")
//!     .validity_days(30)
//!     .thumbprint_algorithm(HashAlgorithm::Sha1)
//!     .build()?;
//! println!("primary thumbprint: {}", record.thumbprint());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use openssl::pkey::{PKey, Private};
use openssl::x509::X509;

use crate::configs::SelfSignedDefaults;
use crate::error::Result;
use crate::pki_generator::{
    common_name, ensure_validity, generate_rsa_key, sign, CertificateTemplate,
};
use crate::record::{CertificateRecord, OutputNaming};
use crate::sources::{Clock, RandomSerial, SerialSource, SystemClock};
use crate::thumbprint::HashAlgorithm;

/// Builder for self-signed, non-CA certificates.
pub struct RsaSelfSignedBuilder {
    subject: String,
    validity_days: u32,
    key_bits: u32,
    thumbprint_algorithm: HashAlgorithm,
    output_dir: Option<PathBuf>,
    cert_only: bool,
    file_prefix: Option<String>,
    serial_source: Box<dyn SerialSource>,
    clock: Box<dyn Clock>,
}

impl RsaSelfSignedBuilder {
    pub fn new(subject: impl Into<String>) -> Self {
        Self::with_defaults(subject, &SelfSignedDefaults::default())
    }

    pub fn with_defaults(subject: impl Into<String>, defaults: &SelfSignedDefaults) -> Self {
        Self {
            subject: subject.into(),
            validity_days: defaults.validity_days,
            key_bits: defaults.key_bits,
            thumbprint_algorithm: defaults.thumbprint,
            output_dir: None,
            cert_only: false,
            file_prefix: None,
            serial_source: Box::new(RandomSerial),
            clock: Box::new(SystemClock),
        }
    }

    pub fn validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    pub fn key_bits(mut self, bits: u32) -> Self {
        self.key_bits = bits;
        self
    }

    /// Digest used for the record's thumbprint. The signature is always SHA-256.
    pub fn thumbprint_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.thumbprint_algorithm = algorithm;
        self
    }

    /// Write `<prefix>-cert.pem` (and `<prefix>-key.pem`) into `dir` after generation.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Skip writing the key file. The key is still returned in the record.
    pub fn cert_only(mut self, cert_only: bool) -> Self {
        self.cert_only = cert_only;
        self
    }

    /// Override the file name stem, which defaults to the subject.
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = Some(prefix.into());
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

    /// Generate the key pair and certificate without touching the filesystem.
    pub fn build_pair(&self) -> Result<(PKey<Private>, X509)> {
        ensure_validity(self.validity_days)?;
        let name = common_name(&self.subject)?;
        let private_key = generate_rsa_key(self.key_bits)?;

        let template = CertificateTemplate {
            subject: &name,
            issuer: &name,
            public_key: &*private_key,
            validity_days: self.validity_days,
            serial_source: self.serial_source.as_ref(),
            clock: self.clock.as_ref(),
        };
        let certificate = sign(template.builder()?, &private_key)?;
        Ok((private_key, certificate))
    }

    /// Generate the certificate record, persisting it when an output directory was set.
    pub fn build(self) -> Result<CertificateRecord> {
        let (private_key, certificate) = self.build_pair()?;
        let record =
            CertificateRecord::new(&certificate, Some(&*private_key), self.thumbprint_algorithm)?;
        log::debug!(
            "Generated self-signed certificate for '{}' ({} thumbprint {})",
            self.subject,
            self.thumbprint_algorithm,
            record.thumbprint()
        );

        if let Some(dir) = &self.output_dir {
            let prefix = self.file_prefix.as_deref().unwrap_or(&self.subject);
            record.persist(dir, &OutputNaming::Dashed(prefix.to_string()), self.cert_only)?;
        }
        Ok(record)
    }
}

/// Generate a self-signed certificate for `subject`, valid for `valid_days` from now.
pub fn create_self_signed(
    subject: &str,
    valid_days: u32,
    output_dir: Option<&Path>,
    cert_only: bool,
    file_prefix: Option<&str>,
    algorithm: HashAlgorithm,
) -> Result<CertificateRecord> {
    let mut builder = RsaSelfSignedBuilder::new(subject)
        .validity_days(valid_days)
        .cert_only(cert_only)
        .thumbprint_algorithm(algorithm);
    if let Some(dir) = output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(prefix) = file_prefix {
        builder = builder.file_prefix(prefix);
    }
    builder.build()
}
