//! Injects X.509 certificates into a hierarchical trust store and expires
//! the entries it previously created.
//!
//! The blob wire format lives in `certinject-blob`; this crate owns the
//! store protocol: scope/location resolution, the injection sequence, and
//! the expiry sweep. The store itself sits behind the [`store::CertStore`]
//! trait.

mod clean;
mod error;
mod inject;
mod scope;
pub mod store;

pub use clean::{clean, clean_at, CleanError, CleanSummary};
pub use error::CertInjectError;
pub use inject::{fingerprint, inject, BLOB_VALUE_NAME, MAGIC_VALUE, MAGIC_VALUE_NAME};
pub use scope::{resolve_store, PhysicalScope, ResolvedStore, StoreLocation};

/// Default expiry threshold for the sweep, in seconds (one day).
pub const DEFAULT_EXPIRE_PERIOD_SECS: u64 = 24 * 60 * 60;
