/*
 * update.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Sigillo, an encrypted webmail client.
 *
 * Sigillo is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Sigillo is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Sigillo.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Versioned migrations of the local store.
//!
//! The store version lives under [`DB_VERSION_KEY`]. Step `n` of an update list moves
//! the store from version `n` to `n + 1`; the version is written after every step, so
//! a failed step is retried on the next run.

use tracing::{debug, info};

use super::DeviceStorage;
use crate::store::{Folder, FolderType, StoreError};

pub const DB_VERSION_KEY: &str = "dbVersion";

/// One migration step.
pub type Update = fn(&DeviceStorage) -> Result<(), StoreError>;

/// Migrations of the current store layout, oldest first.
pub const UPDATES: &[Update] = &[drop_message_cache, dedupe_special_folders];

const MESSAGE_CACHE_PREFIX: &str = "email_";
const FOLDERS_KEY: &str = "folders";

pub fn db_version(storage: &DeviceStorage) -> Result<u32, StoreError> {
    Ok(storage.read_item(DB_VERSION_KEY)?.unwrap_or(0))
}

/// Apply the steps of `updates` the store has not seen yet. Returns the resulting version.
pub fn run_updates(storage: &DeviceStorage, updates: &[Update]) -> Result<u32, StoreError> {
    let mut version = db_version(storage)?;
    let target = updates.len() as u32;
    if version >= target {
        debug!(version, "local store is current");
        return Ok(version);
    }
    for update in &updates[version as usize..] {
        update(storage).map_err(|e| e.context(&format!("Updating local store from version {} failed: ", version)))?;
        version += 1;
        storage.store_item(DB_VERSION_KEY, &version)?;
        debug!(version, "local store updated");
    }
    info!(version, "local store migrated");
    Ok(version)
}

/// Message bodies cached by older builds were stored in plaintext.
fn drop_message_cache(storage: &DeviceStorage) -> Result<(), StoreError> {
    storage.remove_list(MESSAGE_CACHE_PREFIX)
}

/// Keep only the first cached folder of each special role.
fn dedupe_special_folders(storage: &DeviceStorage) -> Result<(), StoreError> {
    let Some(folders) = storage.read_item::<Vec<Folder>>(FOLDERS_KEY)? else {
        return Ok(());
    };
    let special = [FolderType::Inbox, FolderType::Sent, FolderType::Drafts, FolderType::Trash];
    let mut seen = Vec::new();
    let kept: Vec<Folder> = folders
        .into_iter()
        .filter(|f| match f.folder_type {
            Some(t) if special.contains(&t) => {
                if seen.contains(&t) {
                    false
                } else {
                    seen.push(t);
                    true
                }
            }
            _ => true,
        })
        .collect();
    storage.store_item(FOLDERS_KEY, &kept)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::localstorage::{KeyValueStore, MemoryStore};

    fn storage() -> (Arc<MemoryStore>, DeviceStorage) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), DeviceStorage::new(store))
    }

    #[test]
    fn migrates_fresh_store_to_latest() {
        let (store, storage) = storage();
        store.persist("email_INBOX_1", json!({"body": "plain"})).unwrap();
        store.persist("publickey_A1", json!({"_id": "A1"})).unwrap();
        store
            .persist(
                "folders",
                json!([
                    {"name": "Inbox", "path": "INBOX", "type": "Inbox"},
                    {"name": "Sent", "path": "Sent", "type": "Sent"},
                    {"name": "Inbox", "path": "Old/INBOX", "type": "Inbox"},
                    {"name": "Archive", "path": "Archive", "type": null}
                ]),
            )
            .unwrap();

        assert_eq!(db_version(&storage).unwrap(), 0);
        assert_eq!(run_updates(&storage, UPDATES).unwrap(), UPDATES.len() as u32);
        assert_eq!(db_version(&storage).unwrap(), 2);

        assert_eq!(store.read("email_INBOX_1").unwrap(), None);
        assert!(store.read("publickey_A1").unwrap().is_some());
        let folders: Vec<Folder> = storage.read_item("folders").unwrap().unwrap();
        let paths: Vec<&str> = folders.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["INBOX", "Sent", "Archive"]);
    }

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counted(_: &DeviceStorage) -> Result<(), StoreError> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn failing(_: &DeviceStorage) -> Result<(), StoreError> {
        Err(StoreError::new("disk full"))
    }

    #[test]
    fn runs_only_pending_steps_and_stops_on_failure() {
        let (_, storage) = storage();
        storage.store_item(DB_VERSION_KEY, &1u32).unwrap();

        let err = run_updates(&storage, &[counted, counted, failing, counted]).unwrap_err();
        assert_eq!(err.to_string(), "Updating local store from version 2 failed: disk full");
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(db_version(&storage).unwrap(), 2);

        assert_eq!(run_updates(&storage, &[counted, counted]).unwrap(), 2);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
