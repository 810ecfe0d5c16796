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

//! Private key sync: the binary envelope and the backup service that stores it as a
//! message in a hidden mailbox folder.

mod backup;
mod envelope;

pub use backup::{build_key_message, BackupState, EncryptedKey, PrivateKeyBackup};
pub use envelope::{decode, encode, EnvelopeError, KeySyncPayload, HEADER_LEN, IV_LEN, PROTOCOL_VERSION, SALT_LEN};
