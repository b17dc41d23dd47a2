//! The certificate record returned by every issuance operation, and its on-disk layout.

use std::fs;
use std::path::{Path, PathBuf};

use openssl::pkey::{Id, PKey, PKeyRef, Private};
use openssl::x509::{X509Ref, X509};
use serde::Serialize;

use crate::error::{CertError, Result};
use crate::thumbprint::{thumbprint, HashAlgorithm};

/// A certificate in PEM form together with its (optional) private key and thumbprint.
///
/// The thumbprint is always derived from the certificate; it cannot be set independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateRecord {
    certificate_pem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_key_pem: Option<String>,
    thumbprint: String,
    thumbprint_algorithm: HashAlgorithm,
}

impl CertificateRecord {
    /// Build a record from a certificate and (optionally) its private key.
    pub fn new(
        certificate: &X509Ref,
        private_key: Option<&PKeyRef<Private>>,
        algorithm: HashAlgorithm,
    ) -> Result<Self> {
        let certificate_pem = pem_string(certificate.to_pem()?)?;
        let private_key_pem = private_key.map(private_key_to_pem).transpose()?;
        Ok(Self {
            certificate_pem,
            private_key_pem,
            thumbprint: thumbprint(certificate, algorithm)?,
            thumbprint_algorithm: algorithm,
        })
    }

    pub fn certificate_pem(&self) -> &str {
        &self.certificate_pem
    }

    pub fn private_key_pem(&self) -> Option<&str> {
        self.private_key_pem.as_deref()
    }

    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    pub fn thumbprint_algorithm(&self) -> HashAlgorithm {
        self.thumbprint_algorithm
    }

    /// Drop the private key, keeping only the certificate and thumbprint.
    pub fn without_private_key(mut self) -> Self {
        self.private_key_pem = None;
        self
    }

    /// Parse the certificate back into an OpenSSL object.
    pub fn certificate(&self) -> Result<X509> {
        X509::from_pem(self.certificate_pem.as_bytes()).map_err(CertError::Parse)
    }

    /// Parse the private key back into an OpenSSL object, if present.
    pub fn private_key(&self) -> Result<Option<PKey<Private>>> {
        self.private_key_pem
            .as_deref()
            .map(|pem| PKey::private_key_from_pem(pem.as_bytes()).map_err(CertError::Parse))
            .transpose()
    }

    /// Check that the private key (when present) matches the certificate's public key.
    ///
    /// Returns `Ok(true)` for a certificate-only record.
    pub fn verify_key_pair(&self) -> Result<bool> {
        let private_key = match self.private_key()? {
            Some(key) => key,
            None => return Ok(true),
        };
        let public_key = self.certificate()?.public_key()?;
        Ok(public_key.public_eq(&private_key))
    }

    /// Write the certificate (and key, unless `cert_only`) into `output_dir`.
    ///
    /// The directory must already exist; it is never created. Existing files are overwritten.
    pub fn persist(
        &self,
        output_dir: &Path,
        naming: &OutputNaming,
        cert_only: bool,
    ) -> Result<PersistedFiles> {
        ensure_directory(output_dir)?;

        let certificate_path = output_dir.join(naming.certificate_file());
        write_text(&certificate_path, &self.certificate_pem)?;

        let private_key_path = match (&self.private_key_pem, cert_only) {
            (Some(key_pem), false) => {
                let path = output_dir.join(naming.key_file());
                write_text(&path, key_pem)?;
                Some(path)
            }
            _ => None,
        };

        Ok(PersistedFiles {
            certificate_path,
            private_key_path,
        })
    }
}

/// File name convention for a persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNaming {
    /// `<prefix>-cert.pem` / `<prefix>-key.pem`
    Dashed(String),
    /// `<prefix>.cert.pem` / `<prefix>.key.pem`
    Dotted(String),
}

impl OutputNaming {
    pub fn certificate_file(&self) -> String {
        match self {
            OutputNaming::Dashed(prefix) => format!("{}-cert.pem", prefix),
            OutputNaming::Dotted(prefix) => format!("{}.cert.pem", prefix),
        }
    }

    pub fn key_file(&self) -> String {
        match self {
            OutputNaming::Dashed(prefix) => format!("{}-key.pem", prefix),
            OutputNaming::Dotted(prefix) => format!("{}.key.pem", prefix),
        }
    }
}

/// Paths written by [`CertificateRecord::persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFiles {
    pub certificate_path: PathBuf,
    pub private_key_path: Option<PathBuf>,
}

/// Serialize a private key as PEM: PKCS#1 for RSA keys, PKCS#8 for anything else.
pub(crate) fn private_key_to_pem(key: &PKeyRef<Private>) -> Result<String> {
    let pem = if key.id() == Id::RSA {
        key.rsa()?.private_key_to_pem()?
    } else {
        key.private_key_to_pem_pkcs8()?
    };
    pem_string(pem)
}

pub(crate) fn pem_string(pem: Vec<u8>) -> Result<String> {
    String::from_utf8(pem)
        .map_err(|e| CertError::InvalidArgument(format!("PEM output is not UTF-8: {}", e)))
}

pub(crate) fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(CertError::DirectoryNotFound(dir.to_path_buf()))
    }
}

pub(crate) fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| CertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
