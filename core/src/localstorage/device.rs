/*
 * device.rs
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

//! Typed access to a [`KeyValueStore`]: lists keyed `<type>_<id>`, single items by key.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::KeyValueStore;
use crate::store::StoreError;

#[derive(Clone)]
pub struct DeviceStorage {
    store: Arc<dyn KeyValueStore>,
}

impl DeviceStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn item_key(db_type: &str, id: &str) -> String {
        format!("{}_{}", db_type, id)
    }

    /// Store each `(id, item)` under `<db_type>_<id>` in one batch.
    pub fn store_list<T: Serialize>(&self, db_type: &str, items: &[(String, T)]) -> Result<(), StoreError> {
        let mut batch = Vec::with_capacity(items.len());
        for (id, item) in items {
            batch.push((Self::item_key(db_type, id), serde_json::to_value(item)?));
        }
        self.store.batch(batch)
    }

    /// Store one item under an exact key.
    pub fn store_item<T: Serialize>(&self, key: &str, item: &T) -> Result<(), StoreError> {
        self.store.persist(key, serde_json::to_value(item)?)
    }

    pub fn read_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.read(key)? {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    pub fn list_items<T: DeserializeOwned>(&self, prefix: &str, exact: bool) -> Result<Vec<T>, StoreError> {
        self.store
            .list(prefix, exact)?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(StoreError::from))
            .collect()
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.store.remove(key)
    }

    pub fn remove_list(&self, db_type: &str) -> Result<(), StoreError> {
        self.store.remove_list(db_type)
    }

    /// Wipe everything (logout).
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear()
    }
}
