//! `vlink sign <path>` – check the object exists and print a signed link.

use anyhow::{Context, Result};
use std::path::PathBuf;
use vlink_core::config::VlinkConfig;
use vlink_core::{CloudFrontSigner, Credentials, PrivateKey, S3ObjectStore, SignedUrlRequest};

use crate::cli::SignArgs;

/// Flags merged over config values.
#[derive(Debug, PartialEq, Eq)]
struct SignSettings {
    bucket: String,
    cdn_base_url: String,
    validity_seconds: i64,
    key_pair_id: String,
    private_key_path: PathBuf,
    region: String,
    endpoint: Option<String>,
}

fn resolve(cfg: &VlinkConfig, args: &SignArgs) -> Result<SignSettings> {
    let bucket = args
        .bucket
        .clone()
        .or_else(|| cfg.bucket.clone())
        .context("no bucket given (use --bucket or set `bucket` in config.toml)")?;
    let cdn_base_url = args
        .cdn_url
        .clone()
        .or_else(|| cfg.cdn_base_url.clone())
        .context("no CDN base URL given (use --cdn-url or set `cdn_base_url` in config.toml)")?
        .trim_end_matches('/')
        .to_string();

    let cloudfront = cfg.cloudfront.as_ref();
    let key_pair_id = args
        .key_pair_id
        .clone()
        .or_else(|| cloudfront.map(|cf| cf.key_pair_id.clone()))
        .context("no key pair id (use --key-pair-id or set [cloudfront] key_pair_id)")?;
    let private_key_path = args
        .private_key
        .clone()
        .or_else(|| cloudfront.map(|cf| cf.private_key_path.clone()))
        .context("no private key (use --private-key or set [cloudfront] private_key_path)")?;

    let s3 = cfg.s3_or_default();
    Ok(SignSettings {
        bucket,
        cdn_base_url,
        validity_seconds: args.valid_for.unwrap_or(cfg.validity_seconds),
        key_pair_id,
        private_key_path,
        region: args.region.clone().unwrap_or(s3.region),
        endpoint: args.endpoint.clone().or(s3.endpoint),
    })
}

pub fn run_sign(cfg: &VlinkConfig, args: &SignArgs) -> Result<()> {
    let settings = resolve(cfg, args)?;

    let key = PrivateKey::from_pem_file(&settings.private_key_path)?;
    let signer = CloudFrontSigner::new(&settings.key_pair_id, key)?;

    let mut store =
        S3ObjectStore::new(&settings.region).with_credentials(Credentials::from_env());
    if let Some(endpoint) = &settings.endpoint {
        store = store.with_endpoint(endpoint)?;
    }

    let mut request =
        SignedUrlRequest::new(store, signer, &settings.bucket, &settings.cdn_base_url);
    request.set_validity_seconds(settings.validity_seconds)?;
    if let Some(ip) = &args.ip {
        request.set_source_ip_restriction(ip)?;
    }
    request.set_remote_resource_path(args.path.as_str());

    let result = if args.print_policy {
        match request.prepare() {
            Ok(prepared) => {
                eprintln!("target: {}", prepared.target_url());
                eprintln!("policy: {}", prepared.policy().to_json()?);
                request.sign_prepared(&prepared)
            }
            Err(err) => Err(err),
        }
    } else {
        request.produce_signed_url()
    };

    match result {
        Ok(link) => println!("{}", link),
        // A missing object is reported, not treated as a failure of the tool.
        Err(err) if err.is_not_found() => println!("{}", err),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use vlink_core::config::{CloudFrontConfig, S3Config};

    use crate::cli::{Cli, CliCommand};

    fn sign_args(args: &[&str]) -> SignArgs {
        match Cli::try_parse_from(args).unwrap().command {
            CliCommand::Sign(args) => args,
            _ => panic!("expected Sign"),
        }
    }

    fn full_config() -> VlinkConfig {
        VlinkConfig {
            validity_seconds: 300,
            bucket: Some("cfg-bucket".to_string()),
            cdn_base_url: Some("https://cfg.cloudfront.net".to_string()),
            cloudfront: Some(CloudFrontConfig {
                key_pair_id: "APKACONFIG".to_string(),
                private_key_path: PathBuf::from("/etc/vlink/pk.pem"),
            }),
            s3: Some(S3Config {
                region: "eu-west-1".to_string(),
                endpoint: None,
            }),
        }
    }

    #[test]
    fn config_supplies_defaults() {
        let settings = resolve(&full_config(), &sign_args(&["vlink", "sign", "a.zip"])).unwrap();
        assert_eq!(
            settings,
            SignSettings {
                bucket: "cfg-bucket".to_string(),
                cdn_base_url: "https://cfg.cloudfront.net".to_string(),
                validity_seconds: 300,
                key_pair_id: "APKACONFIG".to_string(),
                private_key_path: PathBuf::from("/etc/vlink/pk.pem"),
                region: "eu-west-1".to_string(),
                endpoint: None,
            }
        );
    }

    #[test]
    fn flags_override_config() {
        let args = sign_args(&[
            "vlink",
            "sign",
            "a.zip",
            "--bucket",
            "yegnold-example",
            "--cdn-url",
            "http://dz9ncp1xthllc.cloudfront.net/",
            "--valid-for",
            "20",
            "--key-pair-id",
            "APKAFLAG",
            "--private-key",
            "/tmp/pk.pem",
            "--region",
            "us-west-2",
            "--endpoint",
            "http://127.0.0.1:9000",
        ]);
        let settings = resolve(&full_config(), &args).unwrap();
        assert_eq!(settings.bucket, "yegnold-example");
        assert_eq!(settings.cdn_base_url, "http://dz9ncp1xthllc.cloudfront.net");
        assert_eq!(settings.validity_seconds, 20);
        assert_eq!(settings.key_pair_id, "APKAFLAG");
        assert_eq!(settings.private_key_path, PathBuf::from("/tmp/pk.pem"));
        assert_eq!(settings.region, "us-west-2");
        assert_eq!(settings.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
    }

    #[test]
    fn missing_bucket_is_reported() {
        let cfg = VlinkConfig {
            bucket: None,
            ..full_config()
        };
        let err = resolve(&cfg, &sign_args(&["vlink", "sign", "a.zip"])).unwrap_err();
        assert!(err.to_string().contains("--bucket"));
    }

    #[test]
    fn missing_signing_key_is_reported() {
        let cfg = VlinkConfig {
            cloudfront: None,
            ..full_config()
        };
        let err = resolve(&cfg, &sign_args(&["vlink", "sign", "a.zip"])).unwrap_err();
        assert!(err.to_string().contains("--key-pair-id"));
    }

    #[test]
    fn defaults_without_s3_section() {
        let cfg = VlinkConfig {
            s3: None,
            ..full_config()
        };
        let settings = resolve(&cfg, &sign_args(&["vlink", "sign", "a.zip"])).unwrap();
        assert_eq!(settings.region, "us-east-1");
        assert!(settings.endpoint.is_none());
    }

    #[test]
    fn unreadable_private_key_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = VlinkConfig {
            cloudfront: Some(CloudFrontConfig {
                key_pair_id: "APKACONFIG".to_string(),
                private_key_path: dir.path().join("missing.pem"),
            }),
            ..full_config()
        };
        let args = sign_args(&["vlink", "sign", "a.zip", "--ip", "999.1.1.1"]);
        let err = run_sign(&cfg, &args).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.pem"));
    }
}
