/*
 * encrypted_file.rs
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

//! File-backed key/value store, sealed with XChaCha20-Poly1305.
//!
//! File format: "SGENC" + 24-byte nonce + ciphertext (with tag) of the JSON object of all entries.
//! The 32-byte key lives in `.key` next to the store file (mode 0o600), created on first write.
//! The whole map is held in memory and rewritten on every change. A change reaches memory
//! only after the file was replaced, through a temporary file renamed over the store.

use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::XChaCha20Poly1305;
use serde_json::Value;
use tracing::{debug, warn};

use super::{key_matches, KeyValueStore};
use crate::store::StoreError;

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

/// Magic header for the encrypted store file (5 bytes).
const ENCRYPTED_MAGIC: &[u8] = b"SGENC";
const NONCE_LEN: usize = 24;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;

pub struct EncryptedFileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Value>>,
}

impl EncryptedFileStore {
    /// Open (or prepare to create) the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = load_entries(&path)?;
        debug!(path = %path.display(), entries = entries.len(), "opened encrypted store");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Default location: ~/.sigillo/storage.
    pub fn default_path() -> Option<PathBuf> {
        crate::config::default_config_dir().map(|d| d.join("storage"))
    }

    fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, Value>),
    {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::storage("store lock poisoned"))?;
        let mut next = entries.clone();
        f(&mut next);
        write_entries(&self.path, &next)?;
        *entries = next;
        Ok(())
    }
}

/// Path to the key file: same directory as the store, file `.key`.
fn key_path(store_path: &Path) -> Option<PathBuf> {
    store_path.parent().map(|p| p.join(".key"))
}

fn read_key(key_path: &Path) -> Result<Option<[u8; KEY_LEN]>, StoreError> {
    let buf = match fs::read(key_path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::storage(e.to_string())),
    };
    if buf.len() != KEY_LEN {
        return Err(StoreError::storage("key file has wrong length"));
    }
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&buf);
    Ok(Some(key))
}

/// Read the key file, or generate one with getrandom and write it (mode 0o600).
fn get_or_create_key(key_path: &Path, parent_dir: &Path) -> Result<[u8; KEY_LEN], StoreError> {
    if let Some(key) = read_key(key_path)? {
        return Ok(key);
    }
    fs::create_dir_all(parent_dir).map_err(|e| StoreError::storage(e.to_string()))?;
    #[cfg(unix)]
    if let Err(e) = fs::set_permissions(parent_dir, PermissionsExt::from_mode(0o700)) {
        warn!(error = %e, "could not restrict store directory permissions");
    }
    let mut key = [0u8; KEY_LEN];
    getrandom::getrandom(&mut key).map_err(|e| StoreError::storage(e.to_string()))?;
    let mut f = open_private_file_for_write(key_path)?;
    f.write_all(&key).map_err(|e| StoreError::storage(e.to_string()))?;
    f.flush().map_err(|e| StoreError::storage(e.to_string()))?;
    Ok(key)
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, Value>, StoreError> {
    let raw = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(StoreError::storage(e.to_string())),
    };
    if !raw.starts_with(ENCRYPTED_MAGIC) {
        return Err(StoreError::storage("store file is not encrypted"));
    }
    if raw.len() < ENCRYPTED_MAGIC.len() + NONCE_LEN + TAG_LEN {
        return Err(StoreError::storage("encrypted store file too short"));
    }
    let key_path = key_path(path).ok_or_else(|| StoreError::storage("no parent for store path"))?;
    let key = read_key(&key_path)?
        .ok_or_else(|| StoreError::storage("encrypted store file but key file not found"))?;
    let cipher = XChaCha20Poly1305::new_from_slice(&key).map_err(|e| StoreError::storage(e.to_string()))?;
    let nonce = chacha20poly1305::XNonce::from_slice(&raw[ENCRYPTED_MAGIC.len()..ENCRYPTED_MAGIC.len() + NONCE_LEN]);
    let plain = cipher
        .decrypt(nonce, &raw[ENCRYPTED_MAGIC.len() + NONCE_LEN..])
        .map_err(|_| StoreError::storage("decryption failed (wrong key or tampered file)"))?;
    Ok(serde_json::from_slice(&plain)?)
}

fn write_entries(path: &Path, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
    let plain = serde_json::to_vec(entries)?;
    let key_path = key_path(path).ok_or_else(|| StoreError::storage("no parent for store path"))?;
    let parent = path.parent().ok_or_else(|| StoreError::storage("no parent dir"))?;
    let key = get_or_create_key(&key_path, parent)?;
    let cipher = XChaCha20Poly1305::new_from_slice(&key).map_err(|e| StoreError::storage(e.to_string()))?;
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plain.as_ref())
        .map_err(|e| StoreError::storage(e.to_string()))?;
    let tmp = temp_path(path);
    let io = |e: std::io::Error| StoreError::storage(e.to_string());
    let written = open_private_file_for_write(&tmp).and_then(|mut f| {
        f.write_all(ENCRYPTED_MAGIC).map_err(io)?;
        f.write_all(nonce.as_slice()).map_err(io)?;
        f.write_all(&ciphertext).map_err(io)?;
        f.sync_all().map_err(io)
    });
    let result = written.and_then(|()| fs::rename(&tmp, path).map_err(io));
    if let Err(e) = &result {
        warn!(path = %path.display(), error = %e, "store write failed");
        drop(fs::remove_file(&tmp));
    }
    result
}

/// Sibling `<name>.tmp` of the store file.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Open a file for writing. On Unix, creates it with mode 0o600 (owner read/write only).
fn open_private_file_for_write(path: &Path) -> Result<File, StoreError> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        let f = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| StoreError::storage(e.to_string()))?;
        drop(fs::set_permissions(path, PermissionsExt::from_mode(0o600)));
        Ok(f)
    }
    #[cfg(not(unix))]
    {
        File::create(path).map_err(|e| StoreError::storage(e.to_string()))
    }
}

impl KeyValueStore for EncryptedFileStore {
    fn persist(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.update(|e| {
            e.insert(key.to_string(), value);
        })
    }

    fn batch(&self, batch: Vec<(String, Value)>) -> Result<(), StoreError> {
        self.update(|e| e.extend(batch))
    }

    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::storage("store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn list(&self, prefix: &str, exact: bool) -> Result<Vec<Value>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::storage("store lock poisoned"))?;
        Ok(entries
            .iter()
            .filter(|(k, _)| key_matches(k, prefix, exact))
            .map(|(_, v)| v.clone())
            .collect())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|e| {
            e.remove(key);
        })
    }

    fn remove_list(&self, prefix: &str) -> Result<(), StoreError> {
        self.update(|e| e.retain(|k, _| !k.starts_with(prefix)))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.update(|e| e.clear())
    }
}
