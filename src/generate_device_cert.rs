//! Device Certificate Issuance Module
//!
//! Issues certificates for device identities, signed by a CA loaded from PEM text or
//! files. The leaf subject is `<device-id><suffix>` where the suffix defaults to
//! `.deviceca`, the IoT Edge device CA naming convention.
//!
//! # PKI Hierarchy Position
//! ```text
//! Root CA (self-signed)
//!   └── Device CA "<device-id>.deviceca" (signed by Root) ← This module
//! ```
//!
//! The leaf is issued through a certificate signing request: a fresh key signs a CSR
//! carrying the subject, and the CA copies subject and public key from the CSR into a
//! certificate whose issuer is the CA's subject. Thumbprints are always SHA-256.

use std::path::{Path, PathBuf};

use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use serde::Serialize;

use crate::chain::build_chain;
use crate::configs::DeviceDefaults;
use crate::error::Result;
use crate::pki_generator::{
    common_name, ensure_validity, generate_rsa_key, sign, signing_request,
    CertificateAuthorityContext, CertificateTemplate,
};
use crate::record::{ensure_directory, write_text, CertificateRecord, OutputNaming};
use crate::sources::{Clock, RandomSerial, SerialSource, SystemClock};
use crate::thumbprint::HashAlgorithm;

/// Builder for device certificates signed by a CA
pub struct RsaDeviceCertBuilder<'a> {
    device_id: String,
    subject_suffix: String,
    validity_days: u32,
    key_bits: u32,
    output_dir: Option<PathBuf>,
    naming: Option<OutputNaming>,
    serial_source: Box<dyn SerialSource>,
    clock: Box<dyn Clock>,
    authority: &'a CertificateAuthorityContext,
}

impl<'a> RsaDeviceCertBuilder<'a> {
    /// Create a new device certificate builder
    ///
    /// # Arguments
    /// * `device_id` - Device identity; the subject CN becomes `<device_id>.deviceca`
    /// * `authority` - CA certificate and key used for signing
    pub fn new(device_id: impl Into<String>, authority: &'a CertificateAuthorityContext) -> Self {
        Self::with_defaults(device_id, authority, &DeviceDefaults::default())
    }

    pub fn with_defaults(
        device_id: impl Into<String>,
        authority: &'a CertificateAuthorityContext,
        defaults: &DeviceDefaults,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            subject_suffix: defaults.subject_suffix.clone(),
            validity_days: defaults.validity_days,
            key_bits: defaults.key_bits,
            output_dir: None,
            naming: None,
            serial_source: Box::new(RandomSerial),
            clock: Box::new(SystemClock),
            authority,
        }
    }

    /// Override the suffix appended to the device id in the subject CN
    pub fn subject_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.subject_suffix = suffix.into();
        self
    }

    pub fn validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    pub fn key_bits(mut self, bits: u32) -> Self {
        self.key_bits = bits;
        self
    }

    /// Write the certificate and key after issuance.
    ///
    /// Files are named `<device_id>-cert.pem` / `<device_id>-key.pem` unless
    /// [`naming`](Self::naming) overrides them.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn naming(mut self, naming: OutputNaming) -> Self {
        self.naming = Some(naming);
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

    pub fn subject_common_name(&self) -> String {
        format!("{}{}", self.device_id, self.subject_suffix)
    }

    /// Generate the device key, a CSR for it, and the CA-signed certificate
    pub fn build_pair(&self) -> Result<(PKey<Private>, X509)> {
        ensure_validity(self.validity_days)?;
        let subject = common_name(&self.subject_common_name())?;
        let private_key = generate_rsa_key(self.key_bits)?;

        let csr = signing_request(&subject, &private_key)?;
        let csr_public_key = csr.public_key()?;

        let template = CertificateTemplate {
            subject: csr.subject_name(),
            issuer: self.authority.subject_name(),
            public_key: &*csr_public_key,
            validity_days: self.validity_days,
            serial_source: self.serial_source.as_ref(),
            clock: self.clock.as_ref(),
        };
        let certificate = sign(template.builder()?, self.authority.private_key())?;
        Ok((private_key, certificate))
    }

    /// Issue the device certificate record, persisting it when an output directory was set
    pub fn build(self) -> Result<CertificateRecord> {
        let (private_key, certificate) = self.build_pair()?;
        let record =
            CertificateRecord::new(&certificate, Some(&*private_key), HashAlgorithm::Sha256)?;
        log::debug!(
            "Issued certificate '{}' (sha256 thumbprint {})",
            self.subject_common_name(),
            record.thumbprint()
        );

        if let Some(dir) = &self.output_dir {
            let naming = self
                .naming
                .clone()
                .unwrap_or_else(|| OutputNaming::Dashed(self.device_id.clone()));
            record.persist(dir, &naming, false)?;
        }
        Ok(record)
    }
}

/// Issue a certificate for `subject_id`, signed by the CA given as PEM text.
///
/// Fails with a parse error when either PEM input is malformed.
pub fn issue_signed_certificate(
    subject_id: &str,
    ca_certificate_pem: &str,
    ca_private_key_pem: &str,
    output_dir: Option<&Path>,
) -> Result<CertificateRecord> {
    let authority = CertificateAuthorityContext::from_pem(ca_certificate_pem, ca_private_key_pem)?;
    let mut builder = RsaDeviceCertBuilder::new(subject_id, &authority);
    if let Some(dir) = output_dir {
        builder = builder.output_dir(dir);
    }
    builder.build()
}

/// An IoT Edge device CA bundle: the device certificate, the root it chains to, and
/// the full chain a device presents.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceBundle {
    pub device_id: String,
    pub device: CertificateRecord,
    pub root_certificate_pem: String,
    pub full_chain_pem: String,
}

impl DeviceBundle {
    /// Write `<id>.cert.pem`, `<id>.key.pem` and `<id>.full-chain.cert.pem` into `output_dir`
    pub fn persist(&self, output_dir: &Path) -> Result<PathBuf> {
        ensure_directory(output_dir)?;
        self.device
            .persist(output_dir, &OutputNaming::Dotted(self.device_id.clone()), false)?;
        let chain_path = output_dir.join(format!("{}.full-chain.cert.pem", self.device_id));
        write_text(&chain_path, &self.full_chain_pem)?;
        Ok(chain_path)
    }
}

/// Issue a device CA certificate and assemble its full chain (device first, then CA).
///
/// Subject suffix, validity and key size come from `defaults`.
pub fn issue_device_bundle(
    device_id: &str,
    authority: &CertificateAuthorityContext,
    defaults: &DeviceDefaults,
    output_dir: Option<&Path>,
) -> Result<DeviceBundle> {
    let device = RsaDeviceCertBuilder::with_defaults(device_id, authority, defaults).build()?;
    let root_certificate_pem = crate::record::pem_string(authority.certificate().to_pem()?)?;
    let full_chain_pem = build_chain(&[device.certificate_pem(), root_certificate_pem.as_str()]);

    let bundle = DeviceBundle {
        device_id: device_id.to_string(),
        device,
        root_certificate_pem,
        full_chain_pem,
    };
    if let Some(dir) = output_dir {
        bundle.persist(dir)?;
    }
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::split_chain;
    use crate::error::CertError;
    use crate::generate_root_ca::RsaRootCABuilder;
    use crate::pki_generator::name_common_name;

    fn test_authority() -> (CertificateRecord, CertificateAuthorityContext) {
        let root = RsaRootCABuilder::new()
            .subject_common_name("root")
            .key_bits(2048)
            .build()
            .unwrap();
        let authority = CertificateAuthorityContext::from_record(&root).unwrap();
        (root, authority)
    }

    #[test]
    fn test_device_cert_names() {
        let (_, authority) = test_authority();
        let record = RsaDeviceCertBuilder::new("device-42", &authority)
            .key_bits(2048)
            .build()
            .unwrap();
        let cert = record.certificate().unwrap();
        assert_eq!(
            name_common_name(cert.subject_name()).as_deref(),
            Some("device-42.deviceca")
        );
        assert_eq!(name_common_name(cert.issuer_name()).as_deref(), Some("root"));
    }

    #[test]
    fn test_device_cert_verifies_against_ca() {
        let (_, authority) = test_authority();
        let (key, cert) = RsaDeviceCertBuilder::new("dev", &authority)
            .key_bits(2048)
            .build_pair()
            .unwrap();
        let ca_public = authority.certificate().public_key().unwrap();
        assert!(cert.verify(&ca_public).unwrap());
        assert!(cert.public_key().unwrap().public_eq(&key));
    }

    #[test]
    fn test_issuer_equals_ca_subject() {
        let (_, authority) = test_authority();
        let (_, cert) = RsaDeviceCertBuilder::new("dev", &authority)
            .key_bits(2048)
            .build_pair()
            .unwrap();
        let issuer_der = cert.issuer_name().to_der().unwrap();
        let ca_subject_der = authority.subject_name().to_der().unwrap();
        assert_eq!(issuer_der, ca_subject_der);
    }

    #[test]
    fn test_custom_suffix() {
        let (_, authority) = test_authority();
        let builder = RsaDeviceCertBuilder::new("edge-1", &authority).subject_suffix(".edgeca");
        assert_eq!(builder.subject_common_name(), "edge-1.edgeca");
    }

    #[test]
    fn test_default_key_and_validity() {
        let (_, authority) = test_authority();
        let builder = RsaDeviceCertBuilder::new("dev", &authority);
        assert_eq!(builder.key_bits, 4096);
        assert_eq!(builder.validity_days, 365);
    }

    #[test]
    fn test_issue_rejects_malformed_key() {
        let (root, _) = test_authority();
        let err = issue_signed_certificate("dev", root.certificate_pem(), "garbage", None)
            .unwrap_err();
        assert!(matches!(err, CertError::Parse(_)));
    }

    #[test]
    fn test_issue_rejects_malformed_certificate() {
        let (root, _) = test_authority();
        let err = issue_signed_certificate(
            "dev",
            "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n",
            root.private_key_pem().unwrap(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CertError::Parse(_)));
    }

    #[test]
    fn test_output_files_use_device_id() {
        let (_, authority) = test_authority();
        let dir = tempfile::tempdir().unwrap();
        RsaDeviceCertBuilder::new("dev7", &authority)
            .key_bits(2048)
            .output_dir(dir.path())
            .build()
            .unwrap();
        assert!(dir.path().join("dev7-cert.pem").exists());
        assert!(dir.path().join("dev7-key.pem").exists());
    }

    #[test]
    fn test_device_bundle_chain_order() {
        let (root, authority) = test_authority();
        let dir = tempfile::tempdir().unwrap();
        let defaults = DeviceDefaults {
            key_bits: 2048,
            ..DeviceDefaults::default()
        };
        let bundle = issue_device_bundle("edge", &authority, &defaults, Some(dir.path())).unwrap();

        let blocks = split_chain(&bundle.full_chain_pem);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], bundle.device.certificate_pem());
        assert_eq!(blocks[1], root.certificate_pem());

        assert!(dir.path().join("edge.cert.pem").exists());
        assert!(dir.path().join("edge.key.pem").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("edge.full-chain.cert.pem")).unwrap(),
            bundle.full_chain_pem
        );
    }

    #[test]
    fn test_device_bundle_honours_configured_defaults() {
        let (_, authority) = test_authority();
        let defaults = DeviceDefaults {
            subject_suffix: ".edgeca".to_string(),
            validity_days: 10,
            key_bits: 2048,
        };
        let bundle = issue_device_bundle("edge-2", &authority, &defaults, None).unwrap();

        let cert = bundle.device.certificate().unwrap();
        assert_eq!(
            name_common_name(cert.subject_name()).as_deref(),
            Some("edge-2.edgeca")
        );
        let diff = cert.not_before().diff(cert.not_after()).unwrap();
        assert_eq!(diff.days, 10);
        assert_eq!(cert.public_key().unwrap().bits(), 2048);
    }
}
