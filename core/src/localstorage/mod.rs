/*
 * mod.rs
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

//! Local persistent key/value storage: the key cache and the cached folder list, with
//! versioned migrations.

mod device;
mod encrypted_file;
mod memory;
mod update;

use serde_json::Value;

use crate::store::StoreError;

pub use device::DeviceStorage;
pub use encrypted_file::EncryptedFileStore;
pub use memory::MemoryStore;
pub use update::{db_version, run_updates, Update, DB_VERSION_KEY, UPDATES};

/// Key/value store with prefix listing. Values are JSON documents.
pub trait KeyValueStore: Send + Sync {
    fn persist(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Write several entries in one operation.
    fn batch(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError>;

    fn read(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Values whose key starts with `prefix` (or equals it, when `exact`), in key order.
    fn list(&self, prefix: &str, exact: bool) -> Result<Vec<Value>, StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every entry whose key starts with `prefix`.
    fn remove_list(&self, prefix: &str) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

pub(crate) fn key_matches(key: &str, prefix: &str, exact: bool) -> bool {
    if exact {
        key == prefix
    } else {
        key.starts_with(prefix)
    }
}
