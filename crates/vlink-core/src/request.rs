//! Configuration and issuance of one volatile download link.
//!
//! A [`SignedUrlRequest`] is bound to one bucket and one CDN distribution for
//! its whole life. Setters validate eagerly and leave the previous value in
//! place on failure. The expiry is computed only when the link is produced,
//! so every call to [`SignedUrlRequest::produce_signed_url`] starts a fresh
//! validity window.

use std::net::Ipv4Addr;

use crate::clock::{Clock, SystemClock};
use crate::error::LinkError;
use crate::location::ObjectLocation;
use crate::policy::Policy;
use crate::signer::UrlSigner;
use crate::store::ObjectStore;

/// Validity window used when none is configured.
pub const DEFAULT_VALIDITY_SECONDS: i64 = 120;

/// Target URL and policy, ready to be signed. Only [`SignedUrlRequest::prepare`]
/// creates one, after the existence check has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedLink {
    target_url: String,
    policy: Policy,
}

impl PreparedLink {
    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }
}

#[derive(Debug)]
pub struct SignedUrlRequest<S, G> {
    store: S,
    signer: G,
    clock: Box<dyn Clock>,
    bucket: String,
    cdn_base_url: String,
    validity_seconds: i64,
    source_ip: Option<String>,
    remote_resource_path: String,
}

impl<S, G> SignedUrlRequest<S, G>
where
    S: ObjectStore,
    G: UrlSigner,
{
    pub fn new(
        store: S,
        signer: G,
        bucket: impl Into<String>,
        cdn_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            signer,
            clock: Box::new(SystemClock),
            bucket: bucket.into(),
            cdn_base_url: cdn_base_url.into(),
            validity_seconds: DEFAULT_VALIDITY_SECONDS,
            source_ip: None,
            remote_resource_path: String::new(),
        }
    }

    /// Replaces the time source used for expiry.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn set_validity_seconds(&mut self, seconds: i64) -> Result<(), LinkError> {
        if seconds < 1 {
            return Err(LinkError::invalid_parameter(format!(
                "validity seconds must be a positive integer (got {})",
                seconds
            )));
        }
        self.validity_seconds = seconds;
        Ok(())
    }

    /// Restricts the link to one IPv4 client. The address is stored as given.
    /// An empty string removes the restriction.
    pub fn set_source_ip_restriction(&mut self, addr: &str) -> Result<(), LinkError> {
        if addr.is_empty() {
            self.source_ip = None;
            return Ok(());
        }
        if addr.parse::<Ipv4Addr>().is_err() {
            return Err(LinkError::invalid_parameter(format!(
                "invalid IPv4 address: {:?}",
                addr
            )));
        }
        self.source_ip = Some(addr.to_string());
        Ok(())
    }

    /// Path of the object relative to the bucket root. Not validated.
    pub fn set_remote_resource_path(&mut self, path: impl Into<String>) {
        self.remote_resource_path = path.into();
    }

    pub fn validity_seconds(&self) -> i64 {
        self.validity_seconds
    }

    pub fn source_ip_restriction(&self) -> Option<&str> {
        self.source_ip.as_deref()
    }

    pub fn remote_resource_path(&self) -> &str {
        &self.remote_resource_path
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn cdn_base_url(&self) -> &str {
        &self.cdn_base_url
    }

    pub fn location(&self) -> ObjectLocation {
        ObjectLocation::new(&self.bucket, &self.remote_resource_path)
    }

    /// The CDN URL the signature authorizes.
    pub fn target_url(&self) -> String {
        format!("{}/{}", self.cdn_base_url, self.remote_resource_path)
    }

    /// Checks the object exists and builds the policy with a fresh expiry.
    pub fn prepare(&self) -> Result<PreparedLink, LinkError> {
        let location = self.location();
        tracing::debug!("checking {} exists", location);

        let exists = self
            .store
            .exists(&location)
            .map_err(|e| LinkError::ExistenceCheck {
                key: location.to_string(),
                source: e.into(),
            })?;
        if !exists {
            return Err(LinkError::ResourceNotFound {
                key: location.to_string(),
            });
        }

        let expires_at = self.clock.now_unix() + self.validity_seconds;
        let target_url = self.target_url();
        let mut policy = Policy::new(target_url.clone(), expires_at);
        if let Some(ip) = &self.source_ip {
            policy = policy.with_single_host(ip);
        }

        Ok(PreparedLink { target_url, policy })
    }

    /// Signs an already prepared link.
    pub fn sign_prepared(&self, prepared: &PreparedLink) -> Result<String, LinkError> {
        self.signer
            .sign(&prepared.target_url, &prepared.policy)
            .map_err(|e| LinkError::Signing(e.into()))
    }

    /// Existence check, policy construction and signing in one step.
    pub fn produce_signed_url(&self) -> Result<String, LinkError> {
        let prepared = self.prepare()?;
        let signed = self.sign_prepared(&prepared)?;
        tracing::info!(
            "issued link for {} valid until {}",
            prepared.target_url,
            prepared.policy.expires_at()
        );
        Ok(signed)
    }
}
