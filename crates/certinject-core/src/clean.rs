//! Expiry sweep: delete marked entries whose last-modified age exceeds the
//! threshold.

use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::{
    error::CertInjectError,
    inject::{MAGIC_VALUE, MAGIC_VALUE_NAME},
    scope::resolve_store,
    store::{Access, CertStore, StoreError, StoreKey},
};

/// Outcome of one sweep over a store container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    /// Entries enumerated in the container.
    pub scanned: usize,
    /// Entries deleted because they were ours and past the threshold.
    pub deleted: usize,
    /// Entries skipped because the marker was missing or foreign.
    pub skipped_unmarked: usize,
    /// Marked entries still inside the threshold.
    pub skipped_fresh: usize,
    /// Per-entry failures; these never abort the sweep.
    pub errors: Vec<CleanError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanError {
    pub entry: String,
    pub error: String,
}

enum EntryState {
    NotOwned,
    Fresh,
    Expired,
}

/// Sweeps the resolved store, deleting entries this tool created whose age
/// exceeds `expire_after`. See [`clean_at`] for the contract.
pub fn clean<S: CertStore>(
    store: &S,
    physical_store: &str,
    logical_store: &str,
    expire_after: Duration,
) -> Result<CleanSummary, CertInjectError> {
    clean_at(store, physical_store, logical_store, expire_after, SystemTime::now())
}

/// [`clean`] with an explicit clock, so tests can move time instead of
/// sleeping.
///
/// Resolution, container open, and enumeration failures abort the sweep.
/// Everything per entry is isolated: an entry that cannot be opened or read
/// is reported in the summary and the scan moves on. Entries are only ever
/// deleted when they carry our marker with exactly the expected value, and
/// only when their age is strictly greater than `expire_after`. Age is the
/// absolute difference between `now` and the entry's last-modified
/// timestamp, so a backdated clock cannot park entries forever.
pub fn clean_at<S: CertStore>(
    store: &S,
    physical_store: &str,
    logical_store: &str,
    expire_after: Duration,
    now: SystemTime,
) -> Result<CleanSummary, CertInjectError> {
    let resolved = resolve_store(physical_store, logical_store)?;

    let store_key = store
        .open_key(resolved.hive, &resolved.key_path, Access::ReadWrite)
        .map_err(|source| CertInjectError::StoreUnavailable {
            location: resolved.to_string(),
            source,
        })?;

    let names = store_key
        .subkey_names()
        .map_err(|source| CertInjectError::StoreUnavailable {
            location: resolved.to_string(),
            source,
        })?;

    let mut summary = CleanSummary {
        scanned: names.len(),
        ..CleanSummary::default()
    };

    for name in names {
        match inspect_entry(&store_key, &name, expire_after, now) {
            Ok(EntryState::NotOwned) => summary.skipped_unmarked += 1,
            Ok(EntryState::Fresh) => summary.skipped_fresh += 1,
            Ok(EntryState::Expired) => match store_key.delete_subkey(&name) {
                Ok(()) => {
                    tracing::info!(entry = %name, store = %resolved, "deleted expired certificate");
                    summary.deleted += 1;
                }
                Err(err) => {
                    tracing::warn!(entry = %name, error = %err, "couldn't delete expired certificate");
                    summary.errors.push(CleanError {
                        entry: name,
                        error: err.to_string(),
                    });
                }
            },
            Err(err) => {
                let err = CertInjectError::EntryReadFailure {
                    entry: name.clone(),
                    source: err,
                };
                tracing::warn!(entry = %name, error = %err, "couldn't inspect store entry");
                summary.errors.push(CleanError {
                    entry: name,
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(summary)
}

fn inspect_entry<K: StoreKey>(
    store_key: &K,
    name: &str,
    expire_after: Duration,
    now: SystemTime,
) -> Result<EntryState, StoreError> {
    let entry = store_key.open_subkey(name, Access::Read)?;

    let marker = match entry.get_u32_value(MAGIC_VALUE_NAME) {
        Ok(value) => value,
        // No marker: not created by this tool, leave it alone.
        Err(err) if err.is_not_found() => return Ok(EntryState::NotOwned),
        Err(err) => return Err(err),
    };
    if marker != MAGIC_VALUE {
        return Ok(EntryState::NotOwned);
    }

    let modified = entry.last_modified()?;
    let age = match now.duration_since(modified) {
        Ok(elapsed) => elapsed,
        // Timestamp in the future; use the absolute difference.
        Err(err) => err.duration(),
    };

    if age > expire_after {
        Ok(EntryState::Expired)
    } else {
        Ok(EntryState::Fresh)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        inject::{inject, BLOB_VALUE_NAME},
        store::{MemoryStore, RootHive},
    };

    use super::*;

    const STORE_PATH: &str = r"SOFTWARE\Microsoft\SystemCertificates\Root\Certificates";
    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_container(RootHive::LocalMachine, STORE_PATH);
        store
    }

    fn entry_names(store: &MemoryStore) -> Vec<String> {
        store
            .open_key(RootHive::LocalMachine, STORE_PATH, Access::Read)
            .expect("open store")
            .subkey_names()
            .expect("names")
    }

    fn backdate(store: &MemoryStore, fingerprint: &str, now: SystemTime, age: Duration) {
        store.set_last_modified(
            RootHive::LocalMachine,
            &format!(r"{STORE_PATH}\{fingerprint}"),
            now - age,
        );
    }

    #[test]
    fn fresh_entry_survives_expired_entry_does_not() {
        let store = seeded_store();
        let fp = inject(&store, b"cert", "system", "Root").expect("inject");
        let now = SystemTime::now();

        let summary = clean_at(&store, "system", "Root", DAY, now).expect("clean");
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.skipped_fresh, 1);
        assert_eq!(entry_names(&store), [fp.clone()]);

        let later = now + Duration::from_secs(25 * 60 * 60);
        let summary = clean_at(&store, "system", "Root", DAY, later).expect("clean");
        assert_eq!(summary.deleted, 1);
        assert!(summary.errors.is_empty());
        assert!(entry_names(&store).is_empty());
    }

    #[test]
    fn age_exactly_at_threshold_is_not_expired() {
        let store = seeded_store();
        let fp = inject(&store, b"cert", "system", "Root").expect("inject");
        let now = SystemTime::now();
        backdate(&store, &fp, now, DAY);

        let summary = clean_at(&store, "system", "Root", DAY, now).expect("clean");
        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.skipped_fresh, 1);

        backdate(&store, &fp, now, DAY + Duration::from_secs(1));
        let summary = clean_at(&store, "system", "Root", DAY, now).expect("clean");
        assert_eq!(summary.deleted, 1);
    }

    #[test]
    fn future_timestamps_expire_by_absolute_age() {
        let store = seeded_store();
        let fp = inject(&store, b"cert", "system", "Root").expect("inject");
        let now = SystemTime::now();
        // Clock skew: entry claims to be modified two days from now.
        store.set_last_modified(
            RootHive::LocalMachine,
            &format!(r"{STORE_PATH}\{fp}"),
            now + 2 * DAY,
        );

        let summary = clean_at(&store, "system", "Root", DAY, now).expect("clean");
        assert_eq!(summary.deleted, 1);
    }

    #[test]
    fn unmarked_and_foreign_entries_are_never_deleted() {
        let store = seeded_store();
        let now = SystemTime::now();

        let root = store
            .open_key(RootHive::LocalMachine, STORE_PATH, Access::ReadWrite)
            .expect("open store");
        let foreign = root.create_subkey("F0REIGN").expect("subkey");
        foreign.set_binary_value(BLOB_VALUE_NAME, b"blob").expect("blob");
        let wrong = root.create_subkey("BADMAGIC").expect("subkey");
        wrong.set_u32_value(MAGIC_VALUE_NAME, 2).expect("marker");

        backdate(&store, "F0REIGN", now, 10 * DAY);
        backdate(&store, "BADMAGIC", now, 10 * DAY);

        let summary = clean_at(&store, "system", "Root", DAY, now).expect("clean");
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.skipped_unmarked, 2);
        assert_eq!(entry_names(&store).len(), 2);
    }

    #[test]
    fn one_unreadable_entry_does_not_abort_the_sweep() {
        let store = seeded_store();
        let now = SystemTime::now();

        let expired = inject(&store, b"old cert", "system", "Root").expect("inject");
        backdate(&store, &expired, now, 10 * DAY);
        let broken = inject(&store, b"broken cert", "system", "Root").expect("inject");
        store.deny_subkey(&broken);

        let summary = clean_at(&store, "system", "Root", DAY, now).expect("clean");
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].entry, broken);
        assert_eq!(entry_names(&store), [broken]);
    }

    #[test]
    fn missing_container_aborts_the_sweep() {
        let store = MemoryStore::new();
        let err = clean_at(&store, "system", "Root", DAY, SystemTime::now()).unwrap_err();
        assert!(matches!(err, CertInjectError::StoreUnavailable { .. }));
    }

    #[test]
    fn reinjection_refreshes_the_timestamp() {
        let store = seeded_store();
        let now = SystemTime::now();

        let fp = inject(&store, b"cert", "system", "Root").expect("inject");
        backdate(&store, &fp, now, 10 * DAY);
        // Refresh: deleting and recreating the marker advances last-modified.
        inject(&store, b"cert", "system", "Root").expect("re-inject");

        let summary = clean_at(&store, "system", "Root", DAY, now).expect("clean");
        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.skipped_fresh, 1);
    }
}
