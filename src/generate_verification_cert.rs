//! Proof-of-possession certificates for DPS CA verification.
//!
//! After a CA certificate is uploaded to the Device Provisioning Service, the service
//! issues a verification code. Signing a certificate whose CN is exactly that code with
//! the CA's key proves possession of the key.

use std::path::PathBuf;

use crate::configs::VerificationDefaults;
use crate::error::{CertError, Result};
use crate::pki_generator::{
    common_name, ensure_validity, generate_rsa_key, sign, CertificateAuthorityContext,
    CertificateTemplate,
};
use crate::record::{CertificateRecord, OutputNaming};
use crate::sources::{Clock, RandomSerial, SerialSource, SystemClock};
use crate::thumbprint::HashAlgorithm;

pub struct VerificationCertBuilder<'a> {
    verification_code: String,
    validity_days: u32,
    key_bits: u32,
    output_dir: Option<PathBuf>,
    serial_source: Box<dyn SerialSource>,
    clock: Box<dyn Clock>,
    authority: &'a CertificateAuthorityContext,
}

impl<'a> VerificationCertBuilder<'a> {
    pub fn new(
        verification_code: impl Into<String>,
        authority: &'a CertificateAuthorityContext,
    ) -> Self {
        Self::with_defaults(verification_code, authority, &VerificationDefaults::default())
    }

    pub fn with_defaults(
        verification_code: impl Into<String>,
        authority: &'a CertificateAuthorityContext,
        defaults: &VerificationDefaults,
    ) -> Self {
        Self {
            verification_code: verification_code.into(),
            validity_days: defaults.validity_days,
            key_bits: defaults.key_bits,
            output_dir: None,
            serial_source: Box::new(RandomSerial),
            clock: Box::new(SystemClock),
            authority,
        }
    }

    pub fn validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    /// Write `verification-cert.pem` / `verification-key.pem` after issuance
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

    pub fn build(self) -> Result<CertificateRecord> {
        if self.verification_code.trim().is_empty() {
            return Err(CertError::InvalidArgument(
                "Verification code must not be empty".to_string(),
            ));
        }
        ensure_validity(self.validity_days)?;

        let subject = common_name(&self.verification_code)?;
        let private_key = generate_rsa_key(self.key_bits)?;
        let template = CertificateTemplate {
            subject: &subject,
            issuer: self.authority.subject_name(),
            public_key: &*private_key,
            validity_days: self.validity_days,
            serial_source: self.serial_source.as_ref(),
            clock: self.clock.as_ref(),
        };
        let certificate = sign(template.builder()?, self.authority.private_key())?;

        let record =
            CertificateRecord::new(&certificate, Some(&*private_key), HashAlgorithm::Sha256)?;
        log::debug!("Issued verification certificate (sha256 thumbprint {})", record.thumbprint());

        if let Some(dir) = &self.output_dir {
            record.persist(dir, &OutputNaming::Dashed("verification".to_string()), false)?;
        }
        Ok(record)
    }
}

/// Issue a verification certificate for `verification_code`, signed by `authority`.
pub fn issue_verification_certificate(
    verification_code: &str,
    authority: &CertificateAuthorityContext,
    validity_days: Option<u32>,
) -> Result<CertificateRecord> {
    let mut builder = VerificationCertBuilder::new(verification_code, authority);
    if let Some(days) = validity_days {
        builder = builder.validity_days(days);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_root_ca::RsaRootCABuilder;
    use crate::pki_generator::name_common_name;

    fn authority() -> CertificateAuthorityContext {
        let root = RsaRootCABuilder::new()
            .subject_common_name("dps-root")
            .key_bits(2048)
            .build()
            .unwrap();
        CertificateAuthorityContext::from_record(&root).unwrap()
    }

    #[test]
    fn test_subject_is_exact_code() {
        let authority = authority();
        let record =
            issue_verification_certificate("6F1C9E0A2B3D4C5E", &authority, None).unwrap();
        let cert = record.certificate().unwrap();
        assert_eq!(
            name_common_name(cert.subject_name()).as_deref(),
            Some("6F1C9E0A2B3D4C5E")
        );
        assert_eq!(name_common_name(cert.issuer_name()).as_deref(), Some("dps-root"));
        let ca_public = authority.certificate().public_key().unwrap();
        assert!(cert.verify(&ca_public).unwrap());
    }

    #[test]
    fn test_default_validity_is_thirty_days() {
        let authority = authority();
        let record = issue_verification_certificate("code", &authority, None).unwrap();
        let cert = record.certificate().unwrap();
        let diff = cert.not_before().diff(cert.not_after()).unwrap();
        assert_eq!(diff.days, 30);
    }

    #[test]
    fn test_empty_code_rejected() {
        let authority = authority();
        let err = issue_verification_certificate("  ", &authority, None).unwrap_err();
        assert!(matches!(err, CertError::InvalidArgument(_)));
    }

    #[test]
    fn test_writes_verification_files() {
        let authority = authority();
        let dir = tempfile::tempdir().unwrap();
        VerificationCertBuilder::new("abc", &authority)
            .output_dir(dir.path())
            .build()
            .unwrap();
        assert!(dir.path().join("verification-cert.pem").exists());
        assert!(dir.path().join("verification-key.pem").exists());
    }
}
