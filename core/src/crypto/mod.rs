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

//! Crypto collaborators: password-based symmetric crypto and the PGP engine interface.

mod pgp;
mod symmetric;

pub use pgp::{Decrypted, KeyParams, PgpEngine};
pub use symmetric::{derive_key_offloaded, AesGcmCrypto, SymmetricCrypto, PBKDF2_ITERATIONS};

/// Fill a buffer with OS randomness.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], crate::store::StoreError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf)
        .map_err(|e| crate::store::StoreError::new(format!("getrandom: {}", e)))?;
    Ok(buf)
}
