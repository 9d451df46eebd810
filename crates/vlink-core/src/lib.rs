//! Time-limited, IP-restricted CloudFront download links for S3 objects.

pub mod clock;
pub mod config;
pub mod error;
pub mod location;
pub mod logging;
pub mod policy;
pub mod request;
pub mod signer;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use error::LinkError;
pub use location::ObjectLocation;
pub use policy::Policy;
pub use request::{PreparedLink, SignedUrlRequest, DEFAULT_VALIDITY_SECONDS};
pub use signer::cloudfront::{CloudFrontSigner, PrivateKey};
pub use signer::UrlSigner;
pub use store::s3::{Credentials, S3ObjectStore, UnaddressableObject};
pub use store::ObjectStore;
