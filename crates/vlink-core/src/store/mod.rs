//! Object existence checks.
//!
//! The link builder only depends on [`ObjectStore`]; the S3 implementation
//! lives in [`s3`] and tests substitute in-memory fakes.

pub mod s3;

use crate::location::ObjectLocation;

/// Answers whether an object is present in the backing store.
pub trait ObjectStore {
    /// `Ok(false)` means the store answered and the object is absent;
    /// `Err` means the store could not answer.
    fn exists(&self, location: &ObjectLocation) -> anyhow::Result<bool>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn exists(&self, location: &ObjectLocation) -> anyhow::Result<bool> {
        (**self).exists(location)
    }
}

impl<T: ObjectStore + ?Sized> ObjectStore for Box<T> {
    fn exists(&self, location: &ObjectLocation) -> anyhow::Result<bool> {
        (**self).exists(location)
    }
}
