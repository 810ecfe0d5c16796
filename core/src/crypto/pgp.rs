/*
 * pgp.rs
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

//! PGP primitive collaborator (OpenPGP library binding supplied by the host).

use async_trait::async_trait;

use crate::keychain::{ActiveKey, KeyRecord, UserId};
use crate::store::StoreError;

/// Result of a decryption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decrypted {
    /// Plaintext; `None` when the library could not decrypt.
    pub decrypted: Option<String>,
    /// `None` when the ciphertext carried no signature or no sender key was available.
    pub signatures_valid: Option<bool>,
}

/// Parameters read from an armored key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParams {
    /// 16 upper-case hex chars.
    pub id: String,
    /// Primary address.
    pub user_id: String,
    pub user_ids: Vec<UserId>,
}

#[async_trait]
pub trait PgpEngine: Send + Sync {
    /// Decrypt armored ciphertext with the active private key, checking signatures against
    /// `sender_key` when one is given.
    async fn decrypt(
        &self,
        ciphertext: &str,
        active_key: &ActiveKey,
        sender_key: Option<&KeyRecord>,
    ) -> Result<Decrypted, StoreError>;

    /// Verify a cleartext-signed block. `Ok(None)` when it cannot be verified (no key).
    async fn verify_clear_signed(
        &self,
        clear_signed: &str,
        sender_key: Option<&KeyRecord>,
    ) -> Result<Option<bool>, StoreError>;

    /// Verify a detached signature over `signed_message`.
    async fn verify_signed(
        &self,
        signed_message: &str,
        signature: &str,
        sender_key: Option<&KeyRecord>,
    ) -> Result<Option<bool>, StoreError>;

    fn get_key_params(&self, armored: &str) -> Result<KeyParams, StoreError>;

    /// Armored public key derived from an armored private key.
    fn extract_public_key(&self, private_armored: &str) -> Result<String, StoreError>;
}
