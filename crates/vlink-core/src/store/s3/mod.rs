//! S3 existence probe.
//!
//! Sends a HEAD for the object key with the curl crate (libcurl), signed with
//! SigV4 when credentials are available. 2xx means the object exists, 404
//! means it does not; any other status is an error rather than an answer.
//!
//! Keys are sent exactly as stored. A key or bucket with a `.` or `..` path
//! segment is refused, since HTTP clients and servers resolve those segments
//! and the probe would then address a different object.

mod credentials;
mod sigv4;

pub use credentials::Credentials;

use anyhow::{bail, Context, Result};
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

use super::ObjectStore;
use crate::location::ObjectLocation;

pub const DEFAULT_REGION: &str = "us-east-1";

/// The location cannot be expressed as an S3 request path without the
/// path being rewritten on the way.
#[derive(Debug, thiserror::Error)]
#[error("{location} contains a '.' or '..' path segment")]
pub struct UnaddressableObject {
    pub location: String,
}

fn has_dot_segment(location: &ObjectLocation) -> bool {
    let is_dot = |segment: &str| segment == "." || segment == "..";
    is_dot(&location.bucket) || location.key.split('/').any(is_dot)
}

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    region: String,
    /// Custom S3-compatible endpoint (path-style). `None` = AWS virtual-hosted style.
    endpoint: Option<Url>,
    credentials: Option<Credentials>,
}

impl S3ObjectStore {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: None,
            credentials: None,
        }
    }

    /// Use a custom endpoint (e.g. MinIO) with path-style addressing.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint).with_context(|| format!("invalid S3 endpoint {endpoint}"))?;
        if url.host_str().is_none() {
            bail!("S3 endpoint {} has no host", endpoint);
        }
        self.endpoint = Some(url);
        Ok(self)
    }

    /// `None` sends unsigned (anonymous) requests.
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// HTTP URL addressing `location` on this store.
    ///
    /// Buckets with a `.` in their name use path-style addressing on AWS,
    /// because `a.b.s3.<region>.amazonaws.com` is not covered by the
    /// wildcard certificate.
    pub fn object_url(&self, location: &ObjectLocation) -> Result<Url> {
        if has_dot_segment(location) {
            return Err(UnaddressableObject {
                location: location.to_string(),
            }
            .into());
        }
        let key = sigv4::percent_encode_path(&location.key);
        let bucket = sigv4::percent_encode(&location.bucket);
        let raw = match &self.endpoint {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.as_str().trim_end_matches('/'),
                bucket,
                key
            ),
            None if location.bucket.contains('.') => format!(
                "https://s3.{}.amazonaws.com/{}/{}",
                self.region, bucket, key
            ),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key),
        };
        let url = Url::parse(&raw).with_context(|| format!("cannot address {}", location))?;
        if !raw.ends_with(url.path()) {
            bail!("{} was rewritten to {}", raw, url);
        }
        Ok(url)
    }

    fn request_headers(&self, url: &Url) -> Result<Vec<(String, String)>> {
        match &self.credentials {
            Some(credentials) => sigv4::signed_headers(
                "HEAD",
                url,
                &[],
                sigv4::EMPTY_PAYLOAD_SHA256,
                sigv4::SigningParams {
                    region: &self.region,
                    service: sigv4::SERVICE,
                    credentials,
                    now: OffsetDateTime::now_utc(),
                },
            ),
            None => Ok(Vec::new()),
        }
    }

    /// Performs the HEAD and returns the response code.
    /// Runs in the current thread and blocks until the transfer finishes.
    fn head(&self, url: &Url) -> Result<u32> {
        let headers = self.request_headers(url)?;

        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str()).context("invalid URL")?;
        easy.nobody(true)?;
        easy.path_as_is(true)?;
        easy.connect_timeout(Duration::from_secs(15))?;
        easy.timeout(Duration::from_secs(30))?;

        if !headers.is_empty() {
            let mut list = curl::easy::List::new();
            for (name, value) in &headers {
                list.append(&format!("{}: {}", name, value))?;
            }
            easy.http_headers(list)?;
        }

        easy.perform().context("HEAD request failed")?;
        easy.response_code().context("no response code")
    }
}

impl ObjectStore for S3ObjectStore {
    fn exists(&self, location: &ObjectLocation) -> Result<bool> {
        let url = self.object_url(location)?;
        tracing::debug!(
            "HEAD {} (signed={})",
            url,
            self.credentials.is_some()
        );
        let code = self.head(&url)?;
        match code {
            200..=299 => Ok(true),
            404 => Ok(false),
            _ => bail!("HEAD {} returned HTTP {}", url, code),
        }
    }
}
