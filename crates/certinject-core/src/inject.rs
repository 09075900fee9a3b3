//! Certificate injection: write one blob under its fingerprint, marked as
//! ours.

use certinject_blob::Blob;
use sha1::{Digest, Sha1};

use crate::{
    error::CertInjectError,
    scope::resolve_store,
    store::{Access, CertStore, StoreKey},
};

/// Name of the sentinel value that marks an entry as created by this tool.
pub const MAGIC_VALUE_NAME: &str = "Certinject";
/// Expected dword content of the marker. Anything else is a foreign marker.
pub const MAGIC_VALUE: u32 = 1;
/// Name of the binary value holding the encoded blob.
pub const BLOB_VALUE_NAME: &str = "Blob";

/// Uppercase hex SHA-1 of the DER bytes: the identity the trust subsystem
/// files certificates under. Re-injecting the same bytes lands on the same
/// entry.
#[must_use]
pub fn fingerprint(der: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(der))
}

/// Injects a DER-encoded certificate into the resolved store.
///
/// Builds the minimal single-record blob, opens the (pre-existing) store
/// container, and creates a subkey named by the certificate's fingerprint
/// holding the marker and blob values. The marker is deleted before it is
/// rewritten: the store only advances a key's last-modified timestamp on
/// structural change, and a re-injected certificate must not look old to the
/// expiry sweep. There is no rollback on partial failure; re-running the
/// injection repairs any half-written entry.
///
/// Returns the fingerprint of the injected certificate.
pub fn inject<S: CertStore>(
    store: &S,
    der: &[u8],
    physical_store: &str,
    logical_store: &str,
) -> Result<String, CertInjectError> {
    let resolved = resolve_store(physical_store, logical_store)?;

    let blob_bytes = Blob::for_certificate(der).encode()?;

    let store_key = store
        .open_key(resolved.hive, &resolved.key_path, Access::ReadWrite)
        .map_err(|source| CertInjectError::StoreUnavailable {
            location: resolved.to_string(),
            source,
        })?;

    let fingerprint = fingerprint(der);

    let cert_key =
        store_key
            .create_subkey(&fingerprint)
            .map_err(|source| CertInjectError::EntryWriteFailure {
                fingerprint: fingerprint.clone(),
                value: "entry key",
                source,
            })?;

    // Absence is the common case here; only the recreation below matters.
    cert_key.delete_value_best_effort(MAGIC_VALUE_NAME);

    cert_key
        .set_u32_value(MAGIC_VALUE_NAME, MAGIC_VALUE)
        .map_err(|source| CertInjectError::EntryWriteFailure {
            fingerprint: fingerprint.clone(),
            value: "marker value",
            source,
        })?;

    cert_key
        .set_binary_value(BLOB_VALUE_NAME, &blob_bytes)
        .map_err(|source| CertInjectError::EntryWriteFailure {
            fingerprint: fingerprint.clone(),
            value: "blob value",
            source,
        })?;

    tracing::debug!(%fingerprint, store = %resolved, "injected certificate");
    Ok(fingerprint)
}
