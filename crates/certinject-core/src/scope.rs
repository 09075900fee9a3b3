//! Physical-scope table and store location resolution.
//!
//! The four scopes are a closed set; each maps to a fixed root hive and base
//! path. No dynamic registration, no fallthrough.

use std::str::FromStr;

use crate::{error::CertInjectError, store::RootHive};

/// Placeholder in a logical path template replaced by the logical store name.
const STORE_PLACEHOLDER: &str = "{store}";

/// Access boundary a certificate store belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum PhysicalScope {
    CurrentUser,
    System,
    Enterprise,
    GroupPolicy,
}

/// A store location template: root hive, physical base path, and a logical
/// path template whose `{store}` placeholder takes the logical store name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLocation {
    pub hive: RootHive,
    pub physical: &'static str,
    pub logical: &'static str,
}

impl PhysicalScope {
    #[must_use]
    pub fn location(self) -> StoreLocation {
        match self {
            Self::CurrentUser => StoreLocation {
                hive: RootHive::CurrentUser,
                physical: r"SOFTWARE\Microsoft\SystemCertificates",
                logical: r"{store}\Certificates",
            },
            Self::System => StoreLocation {
                hive: RootHive::LocalMachine,
                physical: r"SOFTWARE\Microsoft\SystemCertificates",
                logical: r"{store}\Certificates",
            },
            Self::Enterprise => StoreLocation {
                hive: RootHive::LocalMachine,
                physical: r"SOFTWARE\Microsoft\EnterpriseCertificates",
                logical: r"{store}\Certificates",
            },
            Self::GroupPolicy => StoreLocation {
                hive: RootHive::LocalMachine,
                physical: r"SOFTWARE\Policies\Microsoft\SystemCertificates",
                logical: r"{store}\Certificates",
            },
        }
    }
}

/// A location with the logical store name substituted in: the concrete key
/// path injection and the sweep open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStore {
    pub hive: RootHive,
    pub key_path: String,
}

impl std::fmt::Display for ResolvedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\\{}", self.hive, self.key_path)
    }
}

/// Looks up `physical` in the scope table and substitutes `logical` into the
/// path template. Pure; does not touch the store.
pub fn resolve_store(physical: &str, logical: &str) -> Result<ResolvedStore, CertInjectError> {
    let scope = PhysicalScope::from_str(physical).map_err(|_| {
        CertInjectError::UnknownPhysicalScope {
            name: physical.to_string(),
        }
    })?;
    let location = scope.location();
    let logical_path = location.logical.replace(STORE_PLACEHOLDER, logical);
    Ok(ResolvedStore {
        hive: location.hive,
        key_path: format!("{}\\{}", location.physical, logical_path),
    })
}
