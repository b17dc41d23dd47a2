//! Certificate thumbprints
//!
//! IoT Hub matches X.509 thumbprint devices on the SHA-1 digest of the certificate's
//! DER encoding, while the Device Provisioning Service expects SHA-256. Only those two
//! digests are accepted; anything else is rejected as an invalid argument.

use std::fmt;
use std::str::FromStr;

use openssl::hash::MessageDigest;
use openssl::x509::{X509Ref, X509};
use serde::{Deserialize, Serialize};

use crate::error::{CertError, Result};

/// Digest used to compute a certificate thumbprint.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1, required for IoT Hub thumbprint attestation
    #[default]
    Sha1,
    /// SHA-256, required for DPS attestation
    Sha256,
}

impl HashAlgorithm {
    fn message_digest(self) -> MessageDigest {
        match self {
            HashAlgorithm::Sha1 => MessageDigest::sha1(),
            HashAlgorithm::Sha256 => MessageDigest::sha256(),
        }
    }

    /// Length of the rendered thumbprint in hex characters.
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Sha256 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha1 => f.write_str("sha1"),
            HashAlgorithm::Sha256 => f.write_str("sha256"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(HashAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(CertError::InvalidArgument(format!(
                "Unsupported thumbprint algorithm '{}', expected sha1 or sha256",
                other
            ))),
        }
    }
}

/// Compute the uppercase hex thumbprint of `certificate`.
///
/// The digest covers the DER encoding of the certificate, so the result matches the
/// value IoT Hub and DPS compute for the same certificate.
pub fn thumbprint(certificate: &X509Ref, algorithm: HashAlgorithm) -> Result<String> {
    let digest = certificate.digest(algorithm.message_digest())?;
    Ok(digest.iter().map(|b| format!("{:02X}", b)).collect())
}

/// Parse a PEM certificate and compute its thumbprint.
pub fn thumbprint_pem(certificate_pem: &str, algorithm: HashAlgorithm) -> Result<String> {
    let certificate = X509::from_pem(certificate_pem.as_bytes()).map_err(CertError::Parse)?;
    thumbprint(&certificate, algorithm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::hash::hash;

    fn test_certificate() -> X509 {
        let (_, cert) = crate::generate_self_signed::RsaSelfSignedBuilder::new("thumbprint-test")
            .validity_days(1)
            .build_pair()
            .unwrap();
        cert
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!("sha1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
    }

    #[test]
    fn test_parse_unsupported_algorithm() {
        let err = "md5".parse::<HashAlgorithm>().unwrap_err();
        assert!(matches!(err, CertError::InvalidArgument(_)));
        assert!("sha512".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_thumbprint_is_uppercase_hex_over_der() {
        let cert = test_certificate();
        let expected: String = hash(MessageDigest::sha256(), &cert.to_der().unwrap())
            .unwrap()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<String>()
            .to_uppercase();

        let thumb = thumbprint(&cert, HashAlgorithm::Sha256).unwrap();
        assert_eq!(thumb, expected);
        assert_eq!(thumb.len(), HashAlgorithm::Sha256.hex_len());
        assert!(!thumb.contains(':'));
        assert!(thumb.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_algorithm_selection_is_honored() {
        let cert = test_certificate();
        let sha1 = thumbprint(&cert, HashAlgorithm::Sha1).unwrap();
        let sha256 = thumbprint(&cert, HashAlgorithm::Sha256).unwrap();
        assert_eq!(sha1.len(), 40);
        assert_eq!(sha256.len(), 64);
        assert_ne!(sha1, sha256);
    }

    #[test]
    fn test_thumbprint_is_stable() {
        let cert = test_certificate();
        let pem = String::from_utf8(cert.to_pem().unwrap()).unwrap();
        assert_eq!(
            thumbprint(&cert, HashAlgorithm::Sha1).unwrap(),
            thumbprint_pem(&pem, HashAlgorithm::Sha1).unwrap()
        );
    }

    #[test]
    fn test_thumbprint_pem_rejects_garbage() {
        let err = thumbprint_pem("not a certificate", HashAlgorithm::Sha1).unwrap_err();
        assert!(matches!(err, CertError::Parse(_)));
    }
}
