use certinject_blob::BlobError;

use crate::store::StoreError;

/// Top-level failures of injection and the expiry sweep.
///
/// Per-entry sweep failures are not represented here; those are isolated
/// into [`crate::CleanSummary::errors`] so one bad entry cannot abort the
/// remaining scan.
#[derive(Debug, thiserror::Error)]
pub enum CertInjectError {
    #[error(
        "unknown physical store scope '{name}' \
         (expected current-user, system, enterprise, or group-policy)"
    )]
    UnknownPhysicalScope { name: String },

    #[error("certificate store {location} is unavailable: {source}")]
    StoreUnavailable {
        location: String,
        #[source]
        source: StoreError,
    },

    #[error("couldn't write {value} for certificate {fingerprint}: {source}")]
    EntryWriteFailure {
        fingerprint: String,
        value: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("couldn't inspect store entry {entry}: {source}")]
    EntryReadFailure {
        entry: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Blob(#[from] BlobError),
}
