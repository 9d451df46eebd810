//! Error taxonomy for signed-link issuance.
//!
//! Setter validation yields `InvalidParameter`; everything else is raised
//! from the finalize step (`prepare` / `produce_signed_url`).

use thiserror::Error;

/// Boxed error from a collaborator (object store or signer).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum LinkError {
    /// Caller supplied an invalid validity duration or IPv4 address.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The target object is not present in the backing store.
    #[error("the resource {key} does not exist in the backing store")]
    ResourceNotFound { key: String },

    /// The object store could not answer the existence query.
    #[error("existence check failed for {key}")]
    ExistenceCheck {
        key: String,
        #[source]
        source: BoxError,
    },

    /// The signer failed; the cause is passed through untouched.
    #[error("signing failed")]
    Signing(#[source] BoxError),
}

impl LinkError {
    pub(crate) fn invalid_parameter(message: impl Into<String>) -> Self {
        LinkError::InvalidParameter(message.into())
    }

    /// True for the not-found case, which callers usually report rather than abort on.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LinkError::ResourceNotFound { .. })
    }
}
