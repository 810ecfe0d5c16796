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

//! Keychain: local key cache backed by device storage, reconciled against a key directory.
//!
//! Public keys are cached under `publickey_<id>`, the user's own private key under
//! `privatekey_<id>`. A contact's cached key is replaced only with the user's consent
//! (or an explicit override); manually imported keys are never rotated.

mod consent;
mod directory;
mod record;

pub use consent::{ConsentPrompt, FixedConsent, KeyUpdateRequest};
pub use directory::{hkp_index_url, KeyDirectory};
pub use record::{storage_key, ActiveKey, KeyKind, KeyRecord, Keypair, UserId, DB_PRIVATEKEY, DB_PUBLICKEY};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::DialogStrings;
use crate::crypto::PgpEngine;
use crate::localstorage::DeviceStorage;
use crate::store::StoreError;

pub struct Keychain {
    storage: DeviceStorage,
    directory: Arc<dyn KeyDirectory>,
    pgp: Arc<dyn PgpEngine>,
    consent: Arc<dyn ConsentPrompt>,
    strings: DialogStrings,
}

impl Keychain {
    pub fn new(
        storage: DeviceStorage,
        directory: Arc<dyn KeyDirectory>,
        pgp: Arc<dyn PgpEngine>,
        consent: Arc<dyn ConsentPrompt>,
        strings: DialogStrings,
    ) -> Self {
        Self {
            storage,
            directory,
            pgp,
            consent,
            strings,
        }
    }

    pub fn list_local_public_keys(&self) -> Result<Vec<KeyRecord>, StoreError> {
        self.storage.list_items(DB_PUBLICKEY, false)
    }

    /// Cached public key for `user_id`: primary address first, then any secondary user id.
    /// Records cached without a user id list are re-read with `get_key_params`.
    pub fn local_public_key(&self, user_id: &str) -> Result<Option<KeyRecord>, StoreError> {
        let keys = self.list_local_public_keys()?;
        if let Some(k) = keys.iter().find(|k| k.user_id.eq_ignore_ascii_case(user_id)) {
            return Ok(Some(k.clone()));
        }
        for key in keys {
            if key.has_address(user_id) {
                return Ok(Some(key));
            }
            if key.user_ids.is_empty() {
                match self.pgp.get_key_params(&key.armored) {
                    Ok(params) if params.user_ids.iter().any(|u| u.email_address.eq_ignore_ascii_case(user_id)) => {
                        return Ok(Some(key));
                    }
                    Ok(_) => {}
                    Err(e) => debug!(key_id = %key.id, error = %e, "unreadable cached key"),
                }
            }
        }
        Ok(None)
    }

    /// Public key for `user_id`: local cache, then the directory (cached on a hit).
    /// Offline directory means no key.
    pub async fn resolve_public_key(&self, user_id: &str) -> Result<Option<KeyRecord>, StoreError> {
        if let Some(local) = self.local_public_key(user_id)? {
            return Ok(Some(local));
        }
        match self.directory.get_by_user_id(user_id).await {
            Ok(Some(remote)) => {
                debug!(user_id, key_id = %remote.id, "caching public key from directory");
                self.save_local_public_key(&remote)?;
                Ok(Some(remote))
            }
            Ok(None) => Ok(None),
            Err(StoreError::Offline) => {
                debug!(user_id, "key directory offline, no public key");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn save_local_public_key(&self, key: &KeyRecord) -> Result<(), StoreError> {
        if key.kind != KeyKind::Public {
            return Err(StoreError::new("Cannot store a private key as public key!"));
        }
        self.storage.store_item(&key.storage_key(), key)
    }

    pub fn remove_local_public_key(&self, key_id: &str) -> Result<(), StoreError> {
        self.storage.remove_item(&storage_key(KeyKind::Public, key_id))
    }

    pub fn lookup_private_key(&self, key_id: &str) -> Result<Option<KeyRecord>, StoreError> {
        self.storage.read_item(&storage_key(KeyKind::Private, key_id))
    }

    pub fn save_local_private_key(&self, key: &KeyRecord) -> Result<(), StoreError> {
        if key.kind != KeyKind::Private {
            return Err(StoreError::new("Cannot store a public key as private key!"));
        }
        self.storage.store_item(&key.storage_key(), key)
    }

    /// Public key by id: local cache first, then the directory (cached on success).
    /// An offline directory yields `Ok(None)`.
    pub async fn lookup_public_key(&self, key_id: &str) -> Result<Option<KeyRecord>, StoreError> {
        if let Some(local) = self.storage.read_item::<KeyRecord>(&storage_key(KeyKind::Public, key_id))? {
            return Ok(Some(local));
        }
        match self.directory.get(key_id).await {
            Ok(Some(remote)) => {
                self.save_local_public_key(&remote)?;
                Ok(Some(remote))
            }
            Ok(None) => Ok(None),
            Err(StoreError::Offline) => {
                debug!(key_id, "key directory offline, no public key");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Reconcile the cached key for `user_id` with the directory.
    ///
    /// Returns the key to use from now on: the cached key when nothing changed, the user
    /// declined, the key was imported or the directory is offline; the directory's key
    /// (or `None` when revoked) when the replacement was accepted.
    pub async fn refresh_key(&self, user_id: &str, override_permission: bool) -> Result<Option<KeyRecord>, StoreError> {
        let local = match self.local_public_key(user_id)? {
            Some(k) => k,
            None => return Ok(None),
        };
        if local.imported {
            return Ok(Some(local));
        }

        let cloud = match self.directory.get_by_user_id(user_id).await {
            Ok(c) => c,
            Err(StoreError::Offline) => {
                debug!(user_id, "key directory offline, keeping cached key");
                return Ok(Some(local));
            }
            Err(e) => return Err(e),
        };
        if cloud.as_ref().map(|c| c.id.as_str()) == Some(local.id.as_str()) {
            return Ok(Some(local));
        }

        let granted = override_permission || {
            let request = KeyUpdateRequest::new(&self.strings, user_id, &local, cloud.as_ref());
            self.consent.confirm(request).await
        };
        if !granted {
            info!(user_id, key_id = %local.id, "key update declined");
            return Ok(Some(local));
        }

        self.remove_local_public_key(&local.id)?;
        match cloud {
            Some(new_key) => {
                self.save_local_public_key(&new_key)?;
                info!(user_id, old = %local.id, new = %new_key.id, "public key replaced");
                Ok(Some(new_key))
            }
            None => {
                info!(user_id, old = %local.id, "public key removed");
                Ok(None)
            }
        }
    }

    /// The user's own key pair from the local cache, if both halves are present.
    pub fn get_user_key_pair(&self, user_id: &str) -> Result<Option<Keypair>, StoreError> {
        let public_key = match self.local_public_key(user_id)? {
            Some(k) => k,
            None => return Ok(None),
        };
        Ok(self.lookup_private_key(&public_key.id)?.map(|private_key| Keypair {
            public_key,
            private_key,
        }))
    }

    /// Check that both halves describe the same key and belong to `user_id`.
    pub fn validate_key_pair(&self, user_id: &str, keypair: &Keypair) -> Result<(), StoreError> {
        let priv_params = self.pgp.get_key_params(&keypair.private_key.armored)?;
        let pub_params = self.pgp.get_key_params(&keypair.public_key.armored)?;
        if priv_params.id != pub_params.id
            || keypair.private_key.id != keypair.public_key.id
            || keypair.private_key.id != priv_params.id
        {
            return Err(StoreError::KeyMismatch("Key IDs dont match!".into()));
        }
        let has_user = |params: &crate::crypto::KeyParams| {
            params.user_id.eq_ignore_ascii_case(user_id)
                || params.user_ids.iter().any(|u| u.email_address.eq_ignore_ascii_case(user_id))
        };
        if !has_user(&priv_params) || !has_user(&pub_params) {
            return Err(StoreError::KeyMismatch("User IDs dont match!".into()));
        }
        Ok(())
    }

    /// Store the user's key pair locally and publish the public half.
    pub async fn put_user_key_pair(&self, user_id: &str, keypair: &Keypair) -> Result<(), StoreError> {
        self.validate_key_pair(user_id, keypair)?;
        let mut public_key = keypair.public_key.clone();
        public_key.imported = true;
        self.save_local_public_key(&public_key)?;
        self.save_local_private_key(&keypair.private_key)?;
        if let Err(e) = self.upload_public_key(&public_key).await {
            if !e.is_offline() {
                return Err(e);
            }
            warn!(key_id = %public_key.id, "offline, public key not published");
        }
        Ok(())
    }

    pub async fn upload_public_key(&self, key: &KeyRecord) -> Result<(), StoreError> {
        if key.kind != KeyKind::Public {
            return Err(StoreError::new("Refusing to upload a private key!"));
        }
        self.directory.put(key).await
    }
}
