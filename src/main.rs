//! iot-certops - certificate tooling for IoT Hub and DPS device attestation
//!
//! # Quick Start
//!
//! ```bash
//! # Root CA written to ./certs/iotedge_config_cli_root.{cert,key}.pem
//! iot-certops root-ca --output-dir certs
//!
//! # Device CA signed by that root, plus the full chain
//! iot-certops sign --device-id edge-01 \
//!     --ca-cert certs/iotedge_config_cli_root.cert.pem \
//!     --ca-key certs/iotedge_config_cli_root.key.pem \
//!     --output-dir certs --full-chain
//!
//! # SHA-1 thumbprint for IoT Hub registration
//! iot-certops thumbprint certs/edge-01.cert.pem
//! ```

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use iot_certops::chain::build_chain_to_file;
use iot_certops::configs::IssuanceConfig;
use iot_certops::generate_device_cert::{issue_device_bundle, RsaDeviceCertBuilder};
use iot_certops::generate_root_ca::RsaRootCABuilder;
use iot_certops::generate_self_signed::RsaSelfSignedBuilder;
use iot_certops::generate_verification_cert::VerificationCertBuilder;
use iot_certops::inspect::CertificateSummary;
use iot_certops::{load_authority, load_certificate_from_file, open_certificate_file, thumbprint};
use serde::Serialize;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let config = match &cli.config {
        Some(path) => IssuanceConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => IssuanceConfig::load().context("Failed to load certops.toml")?,
    };

    run(cli.command, &config)
}

fn run(command: Command, config: &IssuanceConfig) -> Result<()> {
    match command {
        Command::SelfSigned {
            subject,
            valid_days,
            output_dir,
            cert_only,
            file_prefix,
            sha,
        } => {
            let mut builder = RsaSelfSignedBuilder::with_defaults(subject, &config.self_signed)
                .cert_only(cert_only);
            if let Some(days) = valid_days {
                builder = builder.validity_days(days);
            }
            if let Some(sha) = sha {
                builder = builder.thumbprint_algorithm(sha);
            }
            if let Some(dir) = output_dir {
                builder = builder.output_dir(dir);
            }
            if let Some(prefix) = file_prefix {
                builder = builder.file_prefix(prefix);
            }
            let record = builder
                .build()
                .context("Failed to generate self-signed certificate")?;
            print_json(&record)
        }

        Command::RootCa {
            subject,
            cert_name,
            output_dir,
        } => {
            let mut builder = RsaRootCABuilder::with_defaults(&config.root_ca);
            if let Some(subject) = subject {
                builder = builder.subject_common_name(subject);
            }
            if let Some(name) = cert_name {
                builder = builder.cert_name(name);
            }
            if let Some(dir) = output_dir {
                builder = builder.output_dir(dir);
            }
            let record = builder.build().context("Failed to generate root CA")?;
            print_json(&record)
        }

        Command::Sign {
            device_id,
            ca_cert,
            ca_key,
            output_dir,
            full_chain,
        } => {
            let authority = load_authority(&ca_cert, &ca_key).context("Failed to load CA")?;
            if full_chain {
                let bundle = issue_device_bundle(
                    &device_id,
                    &authority,
                    &config.device,
                    output_dir.as_deref(),
                )
                .with_context(|| format!("Failed to issue bundle for '{}'", device_id))?;
                return print_json(&bundle);
            }
            let mut builder =
                RsaDeviceCertBuilder::with_defaults(&device_id, &authority, &config.device);
            if let Some(dir) = output_dir {
                builder = builder.output_dir(dir);
            }
            let record = builder
                .build()
                .with_context(|| format!("Failed to issue certificate for '{}'", device_id))?;
            print_json(&record)
        }

        Command::Verification {
            code,
            ca_cert,
            ca_key,
            valid_days,
            output_dir,
        } => {
            let authority = load_authority(&ca_cert, &ca_key).context("Failed to load CA")?;
            let mut builder =
                VerificationCertBuilder::with_defaults(code, &authority, &config.verification);
            if let Some(days) = valid_days {
                builder = builder.validity_days(days);
            }
            if let Some(dir) = output_dir {
                builder = builder.output_dir(dir);
            }
            let record = builder
                .build()
                .context("Failed to issue verification certificate")?;
            print_json(&record)
        }

        Command::Chain {
            files,
            output_dir,
            file_name,
        } => {
            let texts = files
                .iter()
                .map(|path| {
                    open_certificate_file(path)
                        .map(|text| text + "\n")
                        .with_context(|| format!("Failed to read {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()?;
            let file_name = file_name.unwrap_or_else(|| config.chain.file_name.clone());
            let chain = build_chain_to_file(&texts, output_dir.as_deref(), &file_name)
                .context("Failed to build chain")?;
            print!("{}", chain);
            Ok(())
        }

        Command::Thumbprint { file, sha } => {
            let certificate = load_certificate_from_file(&file)
                .with_context(|| format!("Failed to load certificate {}", file.display()))?;
            let thumb = thumbprint(&certificate, sha).context("Failed to compute thumbprint")?;
            println!("{}", thumb);
            Ok(())
        }

        Command::Inspect { file } => {
            let certificate = load_certificate_from_file(&file)
                .with_context(|| format!("Failed to load certificate {}", file.display()))?;
            let summary = CertificateSummary::from_certificate(&certificate)
                .context("Failed to summarize certificate")?;
            print_json(&summary)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
