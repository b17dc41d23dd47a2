//! Building blocks shared by the certificate builders.
//!
//! Every certificate produced by this crate is X.509v3, signed with SHA-256, with a
//! subject made of a single common name and a validity window taken from a [`Clock`].

use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{HasPublic, PKey, PKeyRef, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509Name, X509NameRef, X509Ref, X509Req, X509};

use crate::error::{CertError, Result};
use crate::sources::{validity_window, Clock, SerialSource};

const X509_VERSION_3: i32 = 2; // X509 version 3 is represented by 2

pub(crate) fn generate_rsa_key(bits: u32) -> Result<PKey<Private>> {
    log::debug!("Generating {}-bit RSA key", bits);
    let rsa = Rsa::generate(bits)?;
    Ok(PKey::from_rsa(rsa)?)
}

/// A name with a single CN entry.
pub(crate) fn common_name(cn: &str) -> Result<X509Name> {
    if cn.is_empty() {
        return Err(CertError::InvalidArgument(
            "Certificate subject must not be empty".to_string(),
        ));
    }
    let mut name_builder = X509Name::builder()?;
    name_builder.append_entry_by_nid(Nid::COMMONNAME, cn)?;
    Ok(name_builder.build())
}

/// The first CN entry of `name`, if any.
pub fn name_common_name(name: &X509NameRef) -> Option<String> {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|entry| entry.data().as_utf8().ok())
        .map(|cn| cn.to_string())
}

pub(crate) fn ensure_validity(days: u32) -> Result<()> {
    if days == 0 {
        return Err(CertError::InvalidArgument(
            "Validity must be at least one day".to_string(),
        ));
    }
    Ok(())
}

/// Everything a certificate needs before extensions and signing.
pub(crate) struct CertificateTemplate<'a, K: HasPublic> {
    pub subject: &'a X509NameRef,
    pub issuer: &'a X509NameRef,
    pub public_key: &'a PKeyRef<K>,
    pub validity_days: u32,
    pub serial_source: &'a dyn SerialSource,
    pub clock: &'a dyn Clock,
}

impl<K: HasPublic> CertificateTemplate<'_, K> {
    pub(crate) fn builder(&self) -> Result<X509Builder> {
        let mut builder = X509::builder()?;
        builder.set_version(X509_VERSION_3)?;

        let serial = self.serial_source.next_serial()?;
        builder.set_serial_number(&serial)?;

        builder.set_subject_name(self.subject)?;
        builder.set_issuer_name(self.issuer)?;

        let (not_before, not_after) = validity_window(self.clock, self.validity_days)?;
        builder.set_not_before(&not_before)?;
        builder.set_not_after(&not_after)?;

        builder.set_pubkey(self.public_key)?;
        Ok(builder)
    }
}

pub(crate) fn sign(mut builder: X509Builder, signing_key: &PKeyRef<Private>) -> Result<X509> {
    builder.sign(signing_key, MessageDigest::sha256())?;
    Ok(builder.build())
}

/// A certificate signing request for `subject`, signed by `key`.
pub(crate) fn signing_request(subject: &X509NameRef, key: &PKeyRef<Private>) -> Result<X509Req> {
    let mut req = X509Req::builder()?;
    req.set_version(0)?;
    req.set_subject_name(subject)?;
    req.set_pubkey(key)?;
    req.sign(key, MessageDigest::sha256())?;
    Ok(req.build())
}

/// A CA certificate together with the key that signs on its behalf.
///
/// Only lives for the duration of an issuance call.
pub struct CertificateAuthorityContext {
    certificate: X509,
    private_key: PKey<Private>,
}

impl CertificateAuthorityContext {
    pub fn new(certificate: X509, private_key: PKey<Private>) -> Self {
        Self {
            certificate,
            private_key,
        }
    }

    /// Load the CA from PEM text. The key must be unencrypted.
    pub fn from_pem(certificate_pem: &str, private_key_pem: &str) -> Result<Self> {
        let private_key =
            PKey::private_key_from_pem(private_key_pem.as_bytes()).map_err(CertError::Parse)?;
        let certificate = X509::from_pem(certificate_pem.as_bytes()).map_err(CertError::Parse)?;
        Ok(Self::new(certificate, private_key))
    }

    /// Load the CA from a record that carries its private key.
    pub fn from_record(record: &crate::CertificateRecord) -> Result<Self> {
        let private_key_pem = record.private_key_pem().ok_or_else(|| {
            CertError::InvalidArgument("CA record has no private key".to_string())
        })?;
        Self::from_pem(record.certificate_pem(), private_key_pem)
    }

    pub fn certificate(&self) -> &X509Ref {
        &self.certificate
    }

    pub(crate) fn private_key(&self) -> &PKeyRef<Private> {
        &self.private_key
    }

    pub fn subject_name(&self) -> &X509NameRef {
        self.certificate.subject_name()
    }
}
