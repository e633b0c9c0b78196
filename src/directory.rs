//! Administrative access to the external identity directory.
//!
//! The directory is the system of record for accounts and their credentials.
//! The reset pipeline only ever reads a per-request view of a record and
//! replaces its credential; nothing is cached here.

pub mod supabase;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::credential::TemporaryCredential;

pub use supabase::SupabaseDirectory;

/// Account as exposed by the directory's admin listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("directory responded with {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("directory call timed out after {0:?}")]
    Timeout(Duration),
    #[error("directory listing exceeded {0} pages")]
    ListingTruncated(u32),
    #[error("invalid directory url: {0}")]
    Url(#[from] url::ParseError),
    #[error("directory url cannot carry a path")]
    UrlNotABase,
}

/// Narrow seam over the identity directory so the reset pipeline can run
/// against an in-memory fake.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Returns the record whose stored email equals `email` exactly, if any.
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, DirectoryError>;

    /// Replaces the credential of the account identified by `id`.
    ///
    /// Called at most once per reset; callers must not retry on failure.
    async fn update_credential(
        &self,
        id: &str,
        credential: &TemporaryCredential,
    ) -> Result<(), DirectoryError>;
}
