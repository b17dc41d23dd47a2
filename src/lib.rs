//! IoT Certops - X.509 certificates for IoT Hub and Device Provisioning Service attestation
//!
//! Generates the certificates device-authentication scenarios need and computes the
//! thumbprints IoT Hub and DPS use to match a device's identity.
//!
//! # Overview
//!
//! ```text
//! Root CA (self-signed, CA=true, 4096-bit)
//!   ├── Device CA "<device-id>.deviceca" (signed by Root, 4096-bit)
//!   └── Verification certificate "<code>" (signed by Root, DPS proof-of-possession)
//!
//! Self-signed device certificate (2048-bit, no extensions, IoT Hub thumbprint auth)
//! ```
//!
//! Every operation returns a [`CertificateRecord`]: the certificate and key in PEM plus
//! the uppercase hex thumbprint of the certificate's DER encoding. Generation is pure;
//! writing PEM files happens only when an output directory is supplied, and that
//! directory must already exist.
//!
//! # Modules
//!
//! - [`generate_self_signed`]: self-signed certificates with a SHA-1 or SHA-256 thumbprint
//! - [`generate_root_ca`]: self-signed root CA certificates
//! - [`generate_device_cert`]: CA-signed device certificates and edge device bundles
//! - [`generate_verification_cert`]: DPS proof-of-possession certificates
//! - [`chain`]: PEM chain concatenation and splitting
//! - [`cert_file`]: loading certificates and keys from files
//! - [`thumbprint`]: SHA-1/SHA-256 thumbprints
//! - [`configs`]: overridable naming and sizing defaults (`certops.toml`)
//!
//! # Example
//!
//! ```no_run
//! use iot_certops::generate_root_ca::RsaRootCABuilder;
//! use iot_certops::generate_device_cert::issue_signed_certificate;
//!
//! fn main() -> iot_certops::Result<()> {
//!     let root = RsaRootCABuilder::new().subject_common_name("root").build()?;
//!     let device = issue_signed_certificate(
//!         "device-42",
//!         root.certificate_pem(),
//!         root.private_key_pem().unwrap_or_default(),
//!         None,
//!     )?;
//!     println!("device thumbprint: {}", device.thumbprint());
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All public APIs return [`Result<T>`] with [`CertError`]. Malformed PEM input surfaces
//! as [`CertError::Parse`] carrying the OpenSSL error stack unchanged.

pub mod cert_file;
pub mod chain;
pub mod configs;
pub mod error;
pub mod generate_device_cert;
pub mod generate_root_ca;
pub mod generate_self_signed;
pub mod generate_verification_cert;
pub mod inspect;
pub mod pki_generator;
pub mod record;
pub mod sources;
pub mod thumbprint;

pub use cert_file::{
    load_authority, load_certificate_and_key, load_certificate_from_file, open_certificate_file,
};
pub use chain::{build_chain, build_chain_to_file, split_chain};
pub use error::{CertError, Result};
pub use generate_device_cert::{issue_device_bundle, issue_signed_certificate};
pub use generate_root_ca::create_root_ca;
pub use generate_self_signed::create_self_signed;
pub use generate_verification_cert::issue_verification_certificate;
pub use pki_generator::CertificateAuthorityContext;
pub use record::{CertificateRecord, OutputNaming};
pub use thumbprint::{thumbprint, HashAlgorithm};
