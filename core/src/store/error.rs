/*
 * error.rs
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

//! Store, crypto and protocol errors.

use thiserror::Error;

use crate::keysync::EnvelopeError;

/// Errors from the transport, local storage, crypto collaborators and the core services.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// The session (or the transport) is offline. Best-effort callers degrade silently.
    #[error("Client is currently offline!")]
    Offline,
    /// Credentials were rejected; the caller refreshes once and retries once.
    #[error("authentication expired")]
    AuthExpired,
    /// The PGP collaborator produced no plaintext.
    #[error("Error decrypting message.")]
    DecryptionFailed,
    /// Key backup ciphertext did not decrypt with the supplied code.
    #[error("Invalid backup code!")]
    InvalidBackupCode,
    /// Key sync envelope could not be decoded.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    /// Private and public key of a pair disagree on key id or user id.
    #[error("{0}")]
    KeyMismatch(String),
    /// Local key/value store failure.
    #[error("local storage: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, StoreError::Offline)
    }

    /// Prefix a message-class error with `ctx`. Other variants keep their class unchanged,
    /// so callers can still match on `Offline`, `AuthExpired` and friends.
    pub fn context(self, ctx: &str) -> Self {
        match self {
            StoreError::Message(m) => StoreError::Message(format!("{}{}", ctx, m)),
            StoreError::Storage(m) => StoreError::Message(format!("{}{}", ctx, m)),
            other => other,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}
