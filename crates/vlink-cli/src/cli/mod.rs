//! CLI for issuing volatile CloudFront download links.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vlink_core::config::{self, VlinkConfig};

use commands::{run_config, run_sign};

/// Top-level CLI for vlink.
#[derive(Debug, Parser)]
#[command(name = "vlink")]
#[command(about = "vlink: time-limited, IP-restricted CloudFront download links", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/vlink/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Check that an object exists and print a signed CloudFront URL for it.
    Sign(SignArgs),

    /// Show the config file location and the effective configuration.
    Config,
}

#[derive(Debug, Args)]
pub struct SignArgs {
    /// Object path relative to the bucket root (e.g. records.backup.zip).
    pub path: String,

    /// S3 bucket holding the object (overrides `bucket` in config).
    #[arg(long)]
    pub bucket: Option<String>,

    /// CloudFront distribution base URL, e.g. https://d111111abcdef8.cloudfront.net.
    #[arg(long, value_name = "URL")]
    pub cdn_url: Option<String>,

    /// Seconds the link stays valid (default from config, 120 if unset).
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub valid_for: Option<i64>,

    /// Only this IPv4 address may use the link.
    #[arg(long, value_name = "ADDR")]
    pub ip: Option<String>,

    /// CloudFront public key id (overrides [cloudfront] key_pair_id).
    #[arg(long, value_name = "ID")]
    pub key_pair_id: Option<String>,

    /// PEM file with the RSA private key (overrides [cloudfront] private_key_path).
    #[arg(long, value_name = "FILE")]
    pub private_key: Option<PathBuf>,

    /// AWS region of the bucket (overrides [s3] region).
    #[arg(long)]
    pub region: Option<String>,

    /// S3-compatible endpoint, path-style (overrides [s3] endpoint).
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Also write the target URL and policy JSON to stderr.
    #[arg(long)]
    pub print_policy: bool,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Sign(args) => run_sign(&cfg, &args)?,
            CliCommand::Config => run_config(cli.config.as_deref(), &cfg)?,
        }

        Ok(())
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<VlinkConfig> {
    match path {
        Some(path) => {
            tracing::debug!("using config {}", path.display());
            config::load_from(path)
        }
        None => config::load_or_init(),
    }
}
