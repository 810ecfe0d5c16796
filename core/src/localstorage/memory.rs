/*
 * memory.rs
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

//! In-memory key/value store (tests, ephemeral sessions).

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde_json::Value;

use super::{key_matches, KeyValueStore};
use crate::store::StoreError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> StoreError {
        StoreError::storage("memory store lock poisoned")
    }
}

impl KeyValueStore for MemoryStore {
    fn persist(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn batch(&self, batch: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.extend(batch);
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn list(&self, prefix: &str, exact: bool) -> Result<Vec<Value>, StoreError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries
            .iter()
            .filter(|(k, _)| key_matches(k, prefix, exact))
            .map(|(_, v)| v.clone())
            .collect())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn remove_list(&self, prefix: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.retain(|k, _| !k.starts_with(prefix));
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefix_and_exact_listing() {
        let s = MemoryStore::new();
        s.persist("publickey_A", json!({"id": "A"})).unwrap();
        s.batch(vec![
            ("publickey_B".into(), json!({"id": "B"})),
            ("privatekey_A".into(), json!({"id": "A"})),
        ])
        .unwrap();
        assert_eq!(s.list("publickey", false).unwrap().len(), 2);
        assert_eq!(s.list("publickey_A", true).unwrap(), vec![json!({"id": "A"})]);
        assert!(s.list("publickey", true).unwrap().is_empty());

        s.remove_list("publickey").unwrap();
        assert_eq!(s.len(), 1);
        s.remove("privatekey_A").unwrap();
        assert!(s.is_empty());
    }
}
