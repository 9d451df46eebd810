//! CloudFront custom-policy URL signing.
//!
//! The signature is RSA PKCS#1 v1.5 over the SHA-1 digest of the policy JSON,
//! encoded with the CloudFront-safe base64 alphabet. The link carries
//! `Policy`, `Signature` and `Key-Pair-Id` query parameters.

use anyhow::{anyhow, bail, Context, Result};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::{Digest, Sha1};
use std::fmt;
use std::path::Path;

use super::UrlSigner;
use crate::policy::{cloudfront_base64, Policy};

/// RSA key registered with the CloudFront key group.
#[derive(Clone)]
pub struct PrivateKey(RsaPrivateKey);

impl PrivateKey {
    /// Loads a PEM-encoded RSA key in PKCS#1 or PKCS#8 form.
    pub fn from_pem(bytes: &[u8]) -> Result<Self> {
        let pem = std::str::from_utf8(bytes).context("private key is not valid UTF-8")?;

        if pem.contains("BEGIN RSA PRIVATE KEY") {
            let key = RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|e| anyhow!("invalid PKCS#1 RSA private key: {e}"))?;
            return Ok(Self(key));
        }
        if pem.contains("BEGIN PRIVATE KEY") {
            let key = RsaPrivateKey::from_pkcs8_pem(pem)
                .map_err(|e| anyhow!("invalid PKCS#8 RSA private key: {e}"))?;
            return Ok(Self(key));
        }

        bail!("unsupported key format, expected an RSA key in PKCS#1 or PKCS#8 PEM")
    }

    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_pem(&bytes).with_context(|| format!("load private key {}", path.display()))
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let digest = Sha1::digest(message);
        self.0
            .sign(Pkcs1v15Sign::new::<Sha1>(), &digest)
            .map_err(|e| anyhow!("RSA signing failed: {e}"))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct CloudFrontSigner {
    key_pair_id: String,
    private_key: PrivateKey,
}

impl CloudFrontSigner {
    pub fn new(key_pair_id: impl Into<String>, private_key: PrivateKey) -> Result<Self> {
        let key_pair_id = key_pair_id.into();
        if key_pair_id.trim().is_empty() {
            bail!("CloudFront key pair id must not be empty");
        }
        Ok(Self {
            key_pair_id,
            private_key,
        })
    }

    pub fn key_pair_id(&self) -> &str {
        &self.key_pair_id
    }
}

impl UrlSigner for CloudFrontSigner {
    fn sign(&self, url: &str, policy: &Policy) -> Result<String> {
        let json = policy.to_json().context("serialize policy")?;
        let signature = cloudfront_base64(&self.private_key.sign(json.as_bytes())?);
        let separator = if url.contains('?') { '&' } else { '?' };
        tracing::debug!(
            "signed policy for {} with key pair {}",
            policy.resource(),
            self.key_pair_id
        );
        Ok(format!(
            "{url}{separator}Policy={}&Signature={signature}&Key-Pair-Id={}",
            cloudfront_base64(json.as_bytes()),
            self.key_pair_id
        ))
    }
}
