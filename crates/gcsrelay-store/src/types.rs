//! Destination object options and results.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::StoreError;
use crate::store::ByteSource;

/// Storage tier applied to the destination object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StorageClass {
    #[default]
    #[serde(rename = "STANDARD")]
    Standard,
    #[serde(rename = "NEARLINE")]
    Nearline,
    #[serde(rename = "COLDLINE")]
    Coldline,
    #[serde(rename = "ARCHIVE")]
    Archive,
}

impl StorageClass {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::Nearline => "NEARLINE",
            StorageClass::Coldline => "COLDLINE",
            StorageClass::Archive => "ARCHIVE",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageClass {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STANDARD" => Ok(StorageClass::Standard),
            "NEARLINE" => Ok(StorageClass::Nearline),
            "COLDLINE" => Ok(StorageClass::Coldline),
            "ARCHIVE" => Ok(StorageClass::Archive),
            _ => Err(StoreError::Validation {
                field: "storage-class",
                value: s.to_string(),
                expected: "STANDARD, NEARLINE, COLDLINE, ARCHIVE",
            }),
        }
    }
}

/// Named bundle of access-control rules applied to the object at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PredefinedAcl {
    #[serde(rename = "authenticatedRead")]
    AuthenticatedRead,
    #[serde(rename = "bucketOwnerFullControl")]
    BucketOwnerFullControl,
    #[serde(rename = "bucketOwnerRead")]
    BucketOwnerRead,
    #[serde(rename = "private")]
    Private,
    #[serde(rename = "projectPrivate")]
    ProjectPrivate,
    #[serde(rename = "publicRead")]
    PublicRead,
}

impl PredefinedAcl {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PredefinedAcl::AuthenticatedRead => "authenticatedRead",
            PredefinedAcl::BucketOwnerFullControl => "bucketOwnerFullControl",
            PredefinedAcl::BucketOwnerRead => "bucketOwnerRead",
            PredefinedAcl::Private => "private",
            PredefinedAcl::ProjectPrivate => "projectPrivate",
            PredefinedAcl::PublicRead => "publicRead",
        }
    }
}

impl fmt::Display for PredefinedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredefinedAcl {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [PredefinedAcl; 6] = [
            PredefinedAcl::AuthenticatedRead,
            PredefinedAcl::BucketOwnerFullControl,
            PredefinedAcl::BucketOwnerRead,
            PredefinedAcl::Private,
            PredefinedAcl::ProjectPrivate,
            PredefinedAcl::PublicRead,
        ];
        ALL.into_iter()
            .find(|acl| acl.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| StoreError::Validation {
                field: "predefined-acl",
                value: s.to_string(),
                expected: "authenticatedRead, bucketOwnerFullControl, bucketOwnerRead, \
                           private, projectPrivate, publicRead",
            })
    }
}

/// Everything the uploader needs to write one object.
///
/// The source stream is owned here: from the moment an `UploadRequest` is
/// handed to a store, the store terminates the stream on success and failure
/// alike.
pub struct UploadRequest {
    pub bucket: String,
    pub object: String,
    pub source: ByteSource,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
    pub storage_class: StorageClass,
    pub predefined_acl: Option<PredefinedAcl>,
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("bucket", &self.bucket)
            .field("object", &self.object)
            .field("source", &"<stream>")
            .field("content_type", &self.content_type)
            .field("cache_control", &self.cache_control)
            .field("metadata", &self.metadata)
            .field("storage_class", &self.storage_class)
            .field("predefined_acl", &self.predefined_acl)
            .finish()
    }
}

/// What the store reports once the write is fully acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Version identifier the store assigned to this write.
    pub generation: String,
    /// Canonical `gs://` URL of the destination.
    pub gs_url: String,
}

/// Canonical `gs://` form of a destination.
#[must_use]
pub fn gs_url(bucket: &str, object: &str) -> String {
    format!("gs://{bucket}/{object}")
}
