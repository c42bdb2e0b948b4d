//! Append-only snapshot persistence with cache-or-fetch retrieval.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::key::LogicalKey;

/// Timestamp tag appended to snapshot filenames.
const TAG_FORMAT: &str = "%Y-%m-%d %Hh%Mm%Ss";

/// Width of a formatted tag, e.g. `2024-01-31 23h59m59s`.
const TAG_LEN: usize = 20;

/// Persists every fetched payload as an immutable timestamped JSON file and
/// serves the latest one back on subsequent runs.
///
/// Snapshots are never mutated or deleted; "latest" is the lexicographically
/// greatest filename among those matching a key's leaf.
pub struct SnapshotStore {
    root: PathBuf,
    persist: bool,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>, persist: bool) -> Self {
        Self {
            root: root.into(),
            persist,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether fetched payloads are written to disk.
    pub fn persist_enabled(&self) -> bool {
        self.persist
    }

    /// Return the payload for `key`, fetching it remotely only when needed.
    ///
    /// With `update` set, or when no snapshot exists yet, the fetch thunk is
    /// invoked and its result persisted as the new latest snapshot. Otherwise
    /// the latest snapshot on disk is parsed and returned without any remote
    /// call. A missing parent directory with `update` unset is a cache miss
    /// that fails before the thunk runs.
    pub fn fetch_or_load<T, F>(&self, key: &LogicalKey, update: bool, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if !update {
            if let Some(path) = self.latest_path(key)? {
                tracing::debug!(key = %key, path = %path.display(), "loading cached snapshot");
                return read_snapshot(&path);
            }
        }

        let payload = fetch()?;
        if self.persist {
            self.save(key, &payload)?;
        }
        Ok(payload)
    }

    /// Whether any snapshot exists for `key`.
    ///
    /// Fails with a cache-miss error when the key's parent directory is
    /// absent, mirroring `fetch_or_load`.
    pub fn exists(&self, key: &LogicalKey) -> Result<bool> {
        Ok(self.latest_path(key)?.is_some())
    }

    /// Write `value` as a new snapshot for `key`, tagged with the current
    /// time. Parent directories are created as needed.
    pub fn save<T: Serialize>(&self, key: &LogicalKey, value: &T) -> Result<PathBuf> {
        let dir = self.root.join(key.dir());
        fs::create_dir_all(&dir)?;

        let tag = Local::now().format(TAG_FORMAT).to_string();
        let path = dir.join(format!("{}_{}.json", key.leaf(), tag));
        fs::write(&path, serde_json::to_vec(value)?)?;
        tracing::debug!(key = %key, path = %path.display(), "snapshot written");
        Ok(path)
    }

    /// Parse and return the latest snapshot for `key`.
    pub fn load_latest<T: DeserializeOwned>(&self, key: &LogicalKey) -> Result<T> {
        match self.latest_path(key)? {
            Some(path) => read_snapshot(&path),
            None => Err(Error::NotFound(key.to_string())),
        }
    }

    /// Path of the latest snapshot for `key`, or `None` when the directory
    /// exists but holds no matching snapshot. A missing directory is a
    /// cache-miss error.
    fn latest_path(&self, key: &LogicalKey) -> Result<Option<PathBuf>> {
        let dir = self.root.join(key.dir());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut latest: Option<String> = None;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !matches_key(name, key.leaf()) {
                continue;
            }
            if latest.as_deref().map_or(true, |current| name > current) {
                latest = Some(name.to_string());
            }
        }

        Ok(latest.map(|name| dir.join(name)))
    }
}

/// Strict snapshot filename check: `<leaf>_<tag>.json` with a full-width
/// timestamp tag. Keeps sibling keys sharing a prefix (`user_info` vs
/// `user_info_basic`) from matching each other's snapshots.
fn matches_key(filename: &str, leaf: &str) -> bool {
    let Some(rest) = filename.strip_prefix(leaf) else {
        return false;
    };
    let Some(rest) = rest.strip_prefix('_') else {
        return false;
    };
    let Some(tag) = rest.strip_suffix(".json") else {
        return false;
    };
    tag.len() == TAG_LEN && tag.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn store_with_dir(category: &str) -> (TempDir, SnapshotStore) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(category)).unwrap();
        let store = SnapshotStore::new(tmp.path().to_path_buf(), true);
        (tmp, store)
    }

    fn seed_snapshot(root: &Path, key: &LogicalKey, tag: &str, value: &serde_json::Value) {
        let dir = root.join(key.dir());
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}_{}.json", key.leaf(), tag));
        fs::write(path, serde_json::to_vec(value).unwrap()).unwrap();
    }

    #[test]
    fn test_cache_idempotence() {
        let (_tmp, store) = store_with_dir("posts");
        let key = LogicalKey::page("posts", 0).unwrap();
        let calls = Cell::new(0u32);

        let fetch = || {
            calls.set(calls.get() + 1);
            Ok(serde_json::json!({"items": [1, 2, 3]}))
        };

        let first: serde_json::Value = store.fetch_or_load(&key, false, fetch).unwrap();
        let second: serde_json::Value = store.fetch_or_load(&key, false, fetch).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_update_bypasses_cache_and_becomes_latest() {
        let (tmp, store) = store_with_dir("posts");
        let key = LogicalKey::page("posts", 0).unwrap();
        seed_snapshot(
            tmp.path(),
            &key,
            "2000-01-01 00h00m00s",
            &serde_json::json!({"items": ["old"]}),
        );

        let calls = Cell::new(0u32);
        let fresh: serde_json::Value = store
            .fetch_or_load(&key, true, || {
                calls.set(calls.get() + 1);
                Ok(serde_json::json!({"items": ["new"]}))
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(fresh["items"][0], "new");

        // The fresh snapshot is now what update-less calls see.
        let cached: serde_json::Value = store.load_latest(&key).unwrap();
        assert_eq!(cached["items"][0], "new");
    }

    #[test]
    fn test_missing_directory_without_update_is_cache_miss() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().to_path_buf(), true);
        let key = LogicalKey::page("posts", 0).unwrap();
        let invoked = Cell::new(false);

        let result: Result<serde_json::Value> = store.fetch_or_load(&key, false, || {
            invoked.set(true);
            Ok(serde_json::json!({}))
        });

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(!invoked.get());
    }

    #[test]
    fn test_missing_directory_with_update_fetches_and_creates() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().to_path_buf(), true);
        let key = LogicalKey::page("posts", 0).unwrap();

        let value: serde_json::Value = store
            .fetch_or_load(&key, true, || Ok(serde_json::json!({"items": []})))
            .unwrap();

        assert_eq!(value["items"], serde_json::json!([]));
        assert!(store.exists(&key).unwrap());
    }

    #[test]
    fn test_latest_is_lexicographically_greatest() {
        let (tmp, store) = store_with_dir("posts");
        let key = LogicalKey::page("posts", 0).unwrap();
        seed_snapshot(tmp.path(), &key, "2024-01-01 10h00m00s", &serde_json::json!(1));
        seed_snapshot(tmp.path(), &key, "2024-02-01 09h00m00s", &serde_json::json!(2));
        seed_snapshot(tmp.path(), &key, "2024-01-15 23h59m59s", &serde_json::json!(3));

        let latest: serde_json::Value = store.load_latest(&key).unwrap();
        assert_eq!(latest, serde_json::json!(2));
    }

    #[test]
    fn test_prefix_sharing_keys_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().to_path_buf(), true);
        let basic = LogicalKey::new("user_info_basic").unwrap();
        seed_snapshot(
            tmp.path(),
            &basic,
            "2024-01-01 10h00m00s",
            &serde_json::json!({"basic": true}),
        );

        let key = LogicalKey::new("user_info").unwrap();
        assert!(!store.exists(&key).unwrap());
    }

    #[test]
    fn test_disabled_persistence_fetches_every_time() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("posts")).unwrap();
        let store = SnapshotStore::new(tmp.path().to_path_buf(), false);
        let key = LogicalKey::page("posts", 0).unwrap();
        let calls = Cell::new(0u32);

        for _ in 0..2 {
            let _: serde_json::Value = store
                .fetch_or_load(&key, false, || {
                    calls.set(calls.get() + 1);
                    Ok(serde_json::json!(1))
                })
                .unwrap();
        }

        assert_eq!(calls.get(), 2);
    }
}
