/*
 * envelope.rs
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

//! Key sync envelope: `version (1) | salt (32) | iv (12) | ciphertext (rest)`.

use thiserror::Error;

/// The only supported key sync protocol version.
pub const PROTOCOL_VERSION: u8 = 0x01;
pub const SALT_LEN: usize = 32;
pub const IV_LEN: usize = 12;
/// Version byte + salt + iv.
pub const HEADER_LEN: usize = 1 + SALT_LEN + IV_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("Unsupported key sync protocol version! (got {0})")]
    UnsupportedVersion(u8),
    #[error("key sync payload truncated ({0} bytes)")]
    Truncated(usize),
}

/// Decoded envelope fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySyncPayload {
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

pub fn encode(version: u8, salt: &[u8; SALT_LEN], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.push(version);
    out.extend_from_slice(salt);
    out.extend_from_slice(iv);
    out.extend_from_slice(ciphertext);
    out
}

/// Version is checked before length: a foreign version byte is always `UnsupportedVersion`.
pub fn decode(bytes: &[u8]) -> Result<KeySyncPayload, EnvelopeError> {
    let version = *bytes.first().ok_or(EnvelopeError::Truncated(0))?;
    if version != PROTOCOL_VERSION {
        return Err(EnvelopeError::UnsupportedVersion(version));
    }
    if bytes.len() < HEADER_LEN {
        return Err(EnvelopeError::Truncated(bytes.len()));
    }
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&bytes[1..1 + SALT_LEN]);
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&bytes[1 + SALT_LEN..HEADER_LEN]);
    Ok(KeySyncPayload {
        salt,
        iv,
        ciphertext: bytes[HEADER_LEN..].to_vec(),
    })
}
