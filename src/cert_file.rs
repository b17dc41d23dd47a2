//! Reading certificates and keys supplied as files.

use std::fs;
use std::path::Path;

use base64::Engine;
use openssl::pkey::PKey;
use openssl::x509::X509;

use crate::error::{CertError, Result};
use crate::pki_generator::CertificateAuthorityContext;
use crate::record::CertificateRecord;
use crate::thumbprint::HashAlgorithm;

const CERTIFICATE_EXTENSIONS: [&str; 2] = ["pem", "cer"];

/// Read a `.pem` or `.cer` certificate file as text.
///
/// UTF-8 content (PEM) is returned as is; binary content (DER) is base64 encoded.
/// Trailing whitespace is stripped either way.
pub fn open_certificate_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    ensure_certificate_extension(path)?;

    let bytes = read_file(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(not_utf8) => {
            log::debug!("{} is not UTF-8, treating it as DER", path.display());
            base64::engine::general_purpose::STANDARD.encode(not_utf8.into_bytes())
        }
    };
    Ok(text.trim_end().to_string())
}

/// Parse a `.pem` or `.cer` certificate file, accepting PEM text or binary DER.
pub fn load_certificate_from_file(path: impl AsRef<Path>) -> Result<X509> {
    let path = path.as_ref();
    ensure_certificate_extension(path)?;

    let bytes = read_file(path)?;
    match X509::from_pem(&bytes) {
        Ok(certificate) => Ok(certificate),
        Err(_) => {
            log::debug!("{} is not PEM, parsing it as DER", path.display());
            X509::from_der(&bytes).map_err(CertError::Parse)
        }
    }
}

/// Load a certificate and its private key from two files.
///
/// Both paths are checked for existence before anything is parsed, certificate first.
/// The certificate and the key are both re-serialized in canonical PEM form and the
/// thumbprint is SHA-256.
pub fn load_certificate_and_key(
    cert_path: impl AsRef<Path>,
    key_path: impl AsRef<Path>,
) -> Result<CertificateRecord> {
    let cert_path = cert_path.as_ref();
    let key_path = key_path.as_ref();
    for path in [cert_path, key_path] {
        if !path.exists() {
            return Err(CertError::missing_file(path));
        }
    }

    let certificate = X509::from_pem(&read_file(cert_path)?).map_err(CertError::Parse)?;
    let private_key = PKey::private_key_from_pem(&read_file(key_path)?).map_err(CertError::Parse)?;
    log::debug!(
        "Loaded certificate {} with key {}",
        cert_path.display(),
        key_path.display()
    );
    CertificateRecord::new(&certificate, Some(&*private_key), HashAlgorithm::Sha256)
}

/// Load a CA certificate and key from files for signing.
pub fn load_authority(
    cert_path: impl AsRef<Path>,
    key_path: impl AsRef<Path>,
) -> Result<CertificateAuthorityContext> {
    let record = load_certificate_and_key(cert_path, key_path)?;
    CertificateAuthorityContext::from_record(&record)
}

fn ensure_certificate_extension(path: &Path) -> Result<()> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    if CERTIFICATE_EXTENSIONS
        .iter()
        .any(|allowed| extension.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }
    Err(CertError::InvalidArgument(format!(
        "Certificate file '{}' must have a .pem or .cer extension",
        path.display()
    )))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| CertError::FileOperation {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
