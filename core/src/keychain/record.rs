/*
 * record.rs
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

//! Key records as stored in the local key cache.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::KeyParams;

/// Local store type prefix for public keys (`publickey_<id>`).
pub const DB_PUBLICKEY: &str = "publickey";
/// Local store type prefix for private keys (`privatekey_<id>`).
pub const DB_PRIVATEKEY: &str = "privatekey";

/// One user id of a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserId {
    pub name: Option<String>,
    pub email_address: String,
}

impl UserId {
    pub fn new(name: Option<&str>, email_address: impl Into<String>) -> Self {
        Self {
            name: name.map(str::to_string),
            email_address: email_address.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyKind {
    Public,
    /// Passphrase-encrypted private key material only.
    Private,
}

/// Public or private key record. Replaced wholesale on update, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// 16 upper-case hex chars.
    pub id: String,
    /// Primary address.
    pub user_id: String,
    #[serde(default)]
    pub user_ids: Vec<UserId>,
    pub armored: String,
    /// Manually imported keys are never rotated automatically.
    #[serde(default)]
    pub imported: bool,
    /// Key server the record was fetched from, if any.
    #[serde(default)]
    pub source: Option<String>,
    pub kind: KeyKind,
}

impl KeyRecord {
    pub fn from_params(params: KeyParams, armored: impl Into<String>, kind: KeyKind) -> Self {
        Self {
            id: params.id,
            user_id: params.user_id,
            user_ids: params.user_ids,
            armored: armored.into(),
            imported: false,
            source: None,
            kind,
        }
    }

    /// Local store key: `publickey_<id>` or `privatekey_<id>`.
    pub fn storage_key(&self) -> String {
        storage_key(self.kind, &self.id)
    }

    /// Primary address or any listed user id matches (ASCII case-insensitive).
    pub fn has_address(&self, address: &str) -> bool {
        self.user_id.eq_ignore_ascii_case(address)
            || self
                .user_ids
                .iter()
                .any(|u| u.email_address.eq_ignore_ascii_case(address))
    }
}

pub fn storage_key(kind: KeyKind, id: &str) -> String {
    let prefix = match kind {
        KeyKind::Public => DB_PUBLICKEY,
        KeyKind::Private => DB_PRIVATEKEY,
    };
    format!("{}_{}", prefix, id)
}

/// The user's own key pair. Both halves share `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keypair {
    pub public_key: KeyRecord,
    pub private_key: KeyRecord,
}

/// The unlocked key pair used for decryption and backup, owned by the session and
/// passed explicitly to the components that need it.
#[derive(Clone)]
pub struct ActiveKey {
    keypair: Keypair,
    passphrase: Option<String>,
}

impl ActiveKey {
    pub fn new(keypair: Keypair, passphrase: Option<String>) -> Self {
        Self { keypair, passphrase }
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn key_id(&self) -> &str {
        &self.keypair.private_key.id
    }

    pub fn private_armored(&self) -> &str {
        &self.keypair.private_key.armored
    }

    pub fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_deref()
    }
}

impl fmt::Debug for ActiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveKey")
            .field("key_id", &self.key_id())
            .field("user_id", &self.keypair.private_key.user_id)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}
