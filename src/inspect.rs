//! Human-oriented summary of a certificate, used by the `inspect` command.

use openssl::x509::X509;
use serde::Serialize;

use crate::error::{CertError, Result};
use crate::pki_generator::name_common_name;
use crate::thumbprint::{thumbprint, HashAlgorithm};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateSummary {
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub serial_number: String,
    pub not_before: String,
    pub not_after: String,
    pub is_ca: bool,
    pub self_signed: bool,
    pub sha1_thumbprint: String,
    pub sha256_thumbprint: String,
}

impl CertificateSummary {
    pub fn from_pem(certificate_pem: &str) -> Result<Self> {
        let certificate = X509::from_pem(certificate_pem.as_bytes()).map_err(CertError::Parse)?;
        Self::from_certificate(&certificate)
    }

    pub fn from_certificate(certificate: &X509) -> Result<Self> {
        let subject_der = certificate.subject_name().to_der()?;
        let issuer_der = certificate.issuer_name().to_der()?;
        let self_signed = subject_der == issuer_der
            && certificate
                .public_key()
                .and_then(|key| certificate.verify(&key))
                .unwrap_or(false);

        Ok(Self {
            subject: name_common_name(certificate.subject_name()),
            issuer: name_common_name(certificate.issuer_name()),
            serial_number: certificate.serial_number().to_bn()?.to_hex_str()?.to_string(),
            not_before: certificate.not_before().to_string(),
            not_after: certificate.not_after().to_string(),
            is_ca: is_ca(certificate)?,
            self_signed,
            sha1_thumbprint: thumbprint(certificate, HashAlgorithm::Sha1)?,
            sha256_thumbprint: thumbprint(certificate, HashAlgorithm::Sha256)?,
        })
    }
}

// The openssl crate has no BasicConstraints getter.
fn is_ca(certificate: &X509) -> Result<bool> {
    let der = certificate.to_der()?;
    let (_, parsed) = x509_parser::parse_x509_certificate(&der)
        .map_err(|e| CertError::Decode(e.to_string()))?;
    let constraints = parsed
        .basic_constraints()
        .map_err(|e| CertError::Decode(e.to_string()))?;
    Ok(constraints.map_or(false, |bc| bc.value.ca))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_root_ca::RsaRootCABuilder;
    use crate::generate_self_signed::RsaSelfSignedBuilder;
    use crate::sources::FixedSerial;

    #[test]
    fn test_summary_of_root() {
        let root = RsaRootCABuilder::new()
            .subject_common_name("summary-root")
            .key_bits(2048)
            .serial_source(FixedSerial(0xBEEF))
            .build()
            .unwrap();
        let summary = CertificateSummary::from_pem(root.certificate_pem()).unwrap();
        assert_eq!(summary.subject.as_deref(), Some("summary-root"));
        assert_eq!(summary.issuer.as_deref(), Some("summary-root"));
        assert_eq!(summary.serial_number, "BEEF");
        assert!(summary.is_ca);
        assert!(summary.self_signed);
        assert_eq!(summary.sha256_thumbprint, root.thumbprint());
    }

    #[test]
    fn test_ca_flag_ignores_subject_text() {
        let record = RsaSelfSignedBuilder::new("CA:TRUE")
            .validity_days(1)
            .build()
            .unwrap();
        let summary = CertificateSummary::from_pem(record.certificate_pem()).unwrap();
        assert_eq!(summary.subject.as_deref(), Some("CA:TRUE"));
        assert!(!summary.is_ca);
    }

    #[test]
    fn test_summary_of_plain_self_signed() {
        let record = RsaSelfSignedBuilder::new("leafy").validity_days(2).build().unwrap();
        let summary = CertificateSummary::from_pem(record.certificate_pem()).unwrap();
        assert!(!summary.is_ca);
        assert!(summary.self_signed);
        assert_eq!(summary.sha1_thumbprint, record.thumbprint());
    }
}
