//! URL signing.
//!
//! [`UrlSigner`] turns a target URL and its policy into the final link. The
//! CloudFront implementation is in [`cloudfront`].

pub mod cloudfront;

use crate::policy::Policy;

pub trait UrlSigner {
    /// Returns the signed URL for `url` authorized by `policy`.
    fn sign(&self, url: &str, policy: &Policy) -> anyhow::Result<String>;
}

impl<T: UrlSigner + ?Sized> UrlSigner for &T {
    fn sign(&self, url: &str, policy: &Policy) -> anyhow::Result<String> {
        (**self).sign(url, policy)
    }
}

impl<T: UrlSigner + ?Sized> UrlSigner for Box<T> {
    fn sign(&self, url: &str, policy: &Policy) -> anyhow::Result<String> {
        (**self).sign(url, policy)
    }
}
