//! Certificate chain assembly.
//!
//! A chain is the plain concatenation of PEM certificate blocks, leaf first. Blocks that
//! do not end in a newline get one appended so two blocks never run together.

use std::path::Path;

use openssl::x509::X509;

use crate::error::{CertError, Result};
use crate::record::{ensure_directory, write_text};

const PEM_CERTIFICATE_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_CERTIFICATE_END: &str = "-----END CERTIFICATE-----";

pub const DEFAULT_CHAIN_FILE_NAME: &str = "cert-chain.pem";

/// Concatenate certificate texts in order.
pub fn build_chain<S: AsRef<str>>(certificate_texts: &[S]) -> String {
    let mut chain = String::new();
    for text in certificate_texts {
        let text = text.as_ref();
        chain.push_str(text);
        if !text.is_empty() && !text.ends_with('\n') {
            log::warn!("Chain element lacks a trailing newline; inserting one");
            chain.push('\n');
        }
    }
    chain
}

/// Concatenate certificate texts and, when `output_dir` is given and at least one text
/// was supplied, write the chain to `output_dir/file_name` (overwriting).
pub fn build_chain_to_file<S: AsRef<str>>(
    certificate_texts: &[S],
    output_dir: Option<&Path>,
    file_name: &str,
) -> Result<String> {
    let chain = build_chain(certificate_texts);
    if let Some(dir) = output_dir {
        ensure_directory(dir)?;
        if !certificate_texts.is_empty() {
            write_text(&dir.join(file_name), &chain)?;
        }
    }
    Ok(chain)
}

/// Like [`build_chain`], but every element must parse as a PEM certificate.
pub fn build_validated_chain<S: AsRef<str>>(certificate_texts: &[S]) -> Result<String> {
    if certificate_texts.is_empty() {
        return Err(CertError::InvalidArgument(
            "A certificate chain needs at least one certificate".to_string(),
        ));
    }
    for text in certificate_texts {
        X509::from_pem(text.as_ref().as_bytes()).map_err(CertError::Parse)?;
    }
    Ok(build_chain(certificate_texts))
}

/// Split a chain back into its certificate blocks, each ending with a newline.
///
/// Text outside `BEGIN CERTIFICATE`/`END CERTIFICATE` markers is ignored.
pub fn split_chain(chain: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut rest = chain;
    while let Some(start) = rest.find(PEM_CERTIFICATE_BEGIN) {
        let after_start = &rest[start..];
        let end = match after_start.find(PEM_CERTIFICATE_END) {
            Some(end) => end + PEM_CERTIFICATE_END.len(),
            None => break,
        };
        let mut block = after_start[..end].to_string();
        block.push('\n');
        blocks.push(block);
        rest = &after_start[end..];
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_self_signed::RsaSelfSignedBuilder;

    fn pem(subject: &str) -> String {
        RsaSelfSignedBuilder::new(subject)
            .validity_days(1)
            .build()
            .unwrap()
            .certificate_pem()
            .to_string()
    }

    #[test]
    fn test_chain_preserves_order() {
        let a = pem("leaf");
        let b = pem("root");
        let chain = build_chain(&[&a, &b]);
        assert_eq!(chain, format!("{}{}", a, b));
        assert_eq!(split_chain(&chain), vec![a, b]);
    }

    #[test]
    fn test_missing_newline_gets_separator() {
        let a = pem("a");
        let b = pem("b");
        let trimmed = a.trim_end();
        let chain = build_chain(&[trimmed, b.as_str()]);
        assert!(chain.contains("-----END CERTIFICATE-----\n-----BEGIN CERTIFICATE-----"));
        assert_eq!(split_chain(&chain), vec![a, b]);
    }

    #[test]
    fn test_empty_chain() {
        let empty: [&str; 0] = [];
        assert_eq!(build_chain(&empty), "");
        assert!(split_chain("").is_empty());
    }

    #[test]
    fn test_chain_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let a = pem("a");
        let chain = build_chain_to_file(&[&a], Some(dir.path()), DEFAULT_CHAIN_FILE_NAME).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("cert-chain.pem")).unwrap(),
            chain
        );
    }

    #[test]
    fn test_empty_chain_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let empty: [&str; 0] = [];
        let chain = build_chain_to_file(&empty, Some(dir.path()), "chain.pem").unwrap();
        assert!(chain.is_empty());
        assert!(!dir.path().join("chain.pem").exists());
    }

    #[test]
    fn test_chain_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_chain_to_file(&["x\n"], Some(dir.path().join("nope").as_path()), "c.pem")
            .unwrap_err();
        assert!(matches!(err, CertError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_validated_chain_rejects_non_certificate() {
        let a = pem("a");
        let err = build_validated_chain(&[a.as_str(), "hello\n"]).unwrap_err();
        assert!(matches!(err, CertError::Parse(_)));
        assert!(build_validated_chain(&[a.as_str()]).is_ok());
    }

    #[test]
    fn test_split_ignores_surrounding_text() {
        let a = pem("a");
        let noisy = format!("subject=/CN=a\n{}trailing junk", a);
        assert_eq!(split_chain(&noisy), vec![a]);
    }
}
