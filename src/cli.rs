//! Command-line argument parsing for iot-certops.

use clap::{Parser, Subcommand};
use iot_certops::HashAlgorithm;
use std::path::PathBuf;

/// Generate X.509 certificates and thumbprints for IoT Hub and DPS device attestation.
#[derive(Parser, Debug)]
#[command(name = "iot-certops")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML file overriding the built-in defaults
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a self-signed certificate (IoT Hub thumbprint authentication)
    SelfSigned {
        #[arg(long)]
        subject: String,
        #[arg(long = "valid-days")]
        valid_days: Option<u32>,
        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,
        /// Do not write the private key file
        #[arg(long = "cert-only")]
        cert_only: bool,
        /// File name stem, defaults to the subject
        #[arg(long = "file-prefix")]
        file_prefix: Option<String>,
        #[arg(long = "sha", value_enum)]
        sha: Option<HashAlgorithm>,
    },

    /// Generate a self-signed root CA certificate
    RootCa {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long = "cert-name")]
        cert_name: Option<String>,
        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,
    },

    /// Issue a device CA certificate signed by an existing CA
    Sign {
        #[arg(long = "device-id")]
        device_id: String,
        #[arg(long = "ca-cert")]
        ca_cert: PathBuf,
        #[arg(long = "ca-key")]
        ca_key: PathBuf,
        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,
        /// Also emit the device + CA full chain (edge device bundle layout)
        #[arg(long = "full-chain")]
        full_chain: bool,
    },

    /// Issue a DPS proof-of-possession certificate for a verification code
    Verification {
        #[arg(long)]
        code: String,
        #[arg(long = "ca-cert")]
        ca_cert: PathBuf,
        #[arg(long = "ca-key")]
        ca_key: PathBuf,
        #[arg(long = "valid-days")]
        valid_days: Option<u32>,
        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,
    },

    /// Concatenate certificate files into a chain
    Chain {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,
        #[arg(long = "file-name")]
        file_name: Option<String>,
    },

    /// Print the thumbprint of a certificate file
    Thumbprint {
        file: PathBuf,
        #[arg(long = "sha", value_enum, default_value_t = HashAlgorithm::Sha1)]
        sha: HashAlgorithm,
    },

    /// Summarize a certificate file
    Inspect { file: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_self_signed_args() {
        let cli = Cli::parse_from([
            "iot-certops",
            "self-signed",
            "--subject",
            "dev1",
            "--valid-days",
            "10",
            "--sha",
            "sha256",
            "--cert-only",
        ]);
        match cli.command {
            Command::SelfSigned {
                subject,
                valid_days,
                cert_only,
                sha,
                ..
            } => {
                assert_eq!(subject, "dev1");
                assert_eq!(valid_days, Some(10));
                assert!(cert_only);
                assert_eq!(sha, Some(HashAlgorithm::Sha256));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_thumbprint_defaults_to_sha1() {
        let cli = Cli::parse_from(["iot-certops", "thumbprint", "device.pem"]);
        match cli.command {
            Command::Thumbprint { sha, .. } => assert_eq!(sha, HashAlgorithm::Sha1),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_sha_rejected() {
        let result = Cli::try_parse_from(["iot-certops", "thumbprint", "d.pem", "--sha", "md5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_chain_requires_files() {
        assert!(Cli::try_parse_from(["iot-certops", "chain"]).is_err());
    }
}
