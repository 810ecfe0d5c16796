/*
 * backup.rs
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

//! Private key backup to the user's own mailbox.
//!
//! The armored private key is encrypted with a key derived from the backup code,
//! wrapped in a key sync envelope and stored as the single base64 body of a message
//! (subject = key id) in the hidden keys folder.

use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::envelope::{self, KeySyncPayload, IV_LEN, PROTOCOL_VERSION, SALT_LEN};
use crate::config::CoreConfig;
use crate::crypto::{derive_key_offloaded, random_bytes, PgpEngine, SymmetricCrypto};
use crate::keychain::{ActiveKey, KeyKind, KeyRecord, Keypair};
use crate::mime::{attachments, classify, RawMimeParser};
use crate::store::{with_auth_retry, FolderInfo, MailTransport, RemoteMessage, StoreError};

const BASE64_LINE_LEN: usize = 76;

/// What the backup service is currently doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackupState {
    #[default]
    Idle,
    Encrypting,
    Uploading,
    /// Last backup was uploaded.
    Synced,
    Downloading,
    Decrypting,
}

/// Encrypted private key, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedKey {
    pub key_id: String,
    pub ciphertext: Vec<u8>,
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
}

pub struct PrivateKeyBackup {
    transport: Arc<dyn MailTransport>,
    crypto: Arc<dyn SymmetricCrypto>,
    pgp: Arc<dyn PgpEngine>,
    reader: Arc<dyn RawMimeParser>,
    config: Arc<CoreConfig>,
    user_address: String,
    state: Mutex<BackupState>,
}

impl PrivateKeyBackup {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        crypto: Arc<dyn SymmetricCrypto>,
        pgp: Arc<dyn PgpEngine>,
        reader: Arc<dyn RawMimeParser>,
        config: Arc<CoreConfig>,
        user_address: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            crypto,
            pgp,
            reader,
            config,
            user_address: user_address.into(),
            state: Mutex::new(BackupState::Idle),
        }
    }

    pub fn state(&self) -> BackupState {
        self.state.lock().map(|s| *s).unwrap_or_default()
    }

    fn set_state(&self, state: BackupState) {
        if let Ok(mut s) = self.state.lock() {
            debug!(from = ?*s, to = ?state, "key backup state");
            *s = state;
        }
    }

    /// Log in to the mail transport.
    pub async fn init(&self) -> Result<(), StoreError> {
        with_auth_retry(self.transport.as_ref(), || self.transport.login()).await
    }

    pub fn destroy(&self) {}

    /// Encrypt `private_armored` with a key derived from `code`. Salt and IV are fresh per call.
    pub async fn encrypt(&self, code: &str, private_armored: &str, key_id: &str) -> Result<EncryptedKey, StoreError> {
        if self.config.sym_iv_size / 8 != IV_LEN {
            return Err(StoreError::new(format!(
                "Unsupported IV size for key sync: {} bits",
                self.config.sym_iv_size
            )));
        }
        let salt = random_bytes::<SALT_LEN>()?;
        let iv = random_bytes::<IV_LEN>()?;
        let key = derive_key_offloaded(
            self.crypto.clone(),
            code.to_string(),
            salt.to_vec(),
            self.config.sym_key_size,
        )
        .await?;
        let ciphertext = self.crypto.encrypt(private_armored.as_bytes(), &key, &iv)?;
        Ok(EncryptedKey {
            key_id: key_id.to_string(),
            ciphertext,
            salt,
            iv,
        })
    }

    /// Store an encrypted key as a message in the keys folder, creating the folder (hidden)
    /// when it does not exist yet.
    pub async fn upload(&self, encrypted: &EncryptedKey) -> Result<(), StoreError> {
        let folder = match self
            .find_keys_folder()
            .await
            .map_err(|e| e.context(&format!("Searching imap folder {} failed: ", self.config.keys_folder)))?
        {
            Some(f) => f,
            None => {
                info!(folder = %self.config.keys_folder, "creating key sync folder");
                with_auth_retry(self.transport.as_ref(), || {
                    self.transport.create_folder(&self.config.keys_folder, true)
                })
                .await
                .map_err(|e| e.context(&format!("Creating imap folder {} failed: ", self.config.keys_folder)))?
            }
        };
        let payload = envelope::encode(PROTOCOL_VERSION, &encrypted.salt, &encrypted.iv, &encrypted.ciphertext);
        let rfc822 = build_key_message(&self.user_address, &encrypted.key_id, &self.config.key_mime_type, &payload);
        let id = with_auth_retry(self.transport.as_ref(), || {
            self.transport.insert_message(&folder.path, &rfc822)
        })
        .await?;
        info!(key_id = %encrypted.key_id, message_id = %id, "private key uploaded");
        Ok(())
    }

    /// Encrypt and upload.
    pub async fn backup(&self, code: &str, private_armored: &str, key_id: &str) -> Result<(), StoreError> {
        self.set_state(BackupState::Encrypting);
        let result = async {
            let encrypted = self.encrypt(code, private_armored, key_id).await?;
            self.set_state(BackupState::Uploading);
            self.upload(&encrypted).await
        }
        .await;
        match result {
            Ok(()) => {
                self.set_state(BackupState::Synced);
                Ok(())
            }
            Err(e) => {
                warn!(key_id, error = %e, "private key backup failed");
                self.set_state(BackupState::Idle);
                Err(e)
            }
        }
    }

    pub async fn backup_active_key(&self, code: &str, active: &ActiveKey) -> Result<(), StoreError> {
        self.backup(code, active.private_armored(), active.key_id()).await
    }

    /// True when a key message can be found. Every error counts as not synced.
    pub async fn is_synced(&self) -> bool {
        match self.fetch_message(None).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                debug!(error = %e, "key sync check failed");
                false
            }
        }
    }

    /// Fetch the key message (by key id, or the first one) and decode its envelope.
    pub async fn download(&self, key_id: Option<&str>) -> Result<KeySyncPayload, StoreError> {
        self.set_state(BackupState::Downloading);
        let result = self.download_payload(key_id).await;
        self.set_state(BackupState::Idle);
        result
    }

    async fn download_payload(&self, key_id: Option<&str>) -> Result<KeySyncPayload, StoreError> {
        let message = self
            .fetch_message(key_id)
            .await?
            .ok_or_else(|| StoreError::new("Private key not synced!"))?;
        let raw = with_auth_retry(self.transport.as_ref(), || self.transport.get_raw_message(&message.id)).await?;
        let root = self.reader.parse(&raw)?;
        let parts = classify(&root);
        let content = attachments(&parts)
            .into_iter()
            .find_map(|a| a.content)
            .ok_or_else(|| StoreError::new("Key sync message has no key attachment!"))?;
        debug!(message_id = %message.id, len = content.len(), "downloaded key sync payload");
        Ok(envelope::decode(&content)?)
    }

    /// Decrypt a downloaded payload with the backup code and rebuild the key pair.
    pub async fn decrypt(&self, code: &str, payload: &KeySyncPayload) -> Result<Keypair, StoreError> {
        self.set_state(BackupState::Decrypting);
        let result = self.decrypt_payload(code, payload).await;
        self.set_state(BackupState::Idle);
        result
    }

    async fn decrypt_payload(&self, code: &str, payload: &KeySyncPayload) -> Result<Keypair, StoreError> {
        let key = derive_key_offloaded(
            self.crypto.clone(),
            code.to_string(),
            payload.salt.to_vec(),
            self.config.sym_key_size,
        )
        .await?;
        let plaintext = self
            .crypto
            .decrypt(&payload.ciphertext, &key, &payload.iv)
            .map_err(|_| StoreError::InvalidBackupCode)?;
        let private_armored = String::from_utf8(plaintext).map_err(|_| StoreError::InvalidBackupCode)?;

        let parse_error = |e: StoreError| {
            warn!(error = %e, "restored key is not a PGP key");
            StoreError::new("Error parsing PGP key!")
        };
        let params = self.pgp.get_key_params(&private_armored).map_err(parse_error)?;
        let public_armored = self.pgp.extract_public_key(&private_armored).map_err(parse_error)?;
        Ok(Keypair {
            public_key: KeyRecord::from_params(params.clone(), public_armored, KeyKind::Public),
            private_key: KeyRecord::from_params(params, private_armored, KeyKind::Private),
        })
    }

    /// Download and decrypt the first backed up key.
    pub async fn restore(&self, code: &str) -> Result<Keypair, StoreError> {
        let payload = self.download(None).await?;
        self.decrypt(code, &payload).await
    }

    pub async fn restore_key(&self, code: &str, key_id: &str) -> Result<Keypair, StoreError> {
        let payload = self.download(Some(key_id)).await?;
        self.decrypt(code, &payload).await
    }

    async fn find_keys_folder(&self) -> Result<Option<FolderInfo>, StoreError> {
        let folders = with_auth_retry(self.transport.as_ref(), || self.transport.list_folders()).await?;
        Ok(folders.into_iter().find(|f| f.name == self.config.keys_folder))
    }

    async fn fetch_message(&self, key_id: Option<&str>) -> Result<Option<RemoteMessage>, StoreError> {
        let context = "Failed to retrieve PGP key message from IMAP! Reason: ";
        let folder = self
            .find_keys_folder()
            .await
            .map_err(|e| e.context(context))?
            .ok_or_else(|| {
                StoreError::new(format!("Folder {} does not exist for key sync!", self.config.keys_folder))
            })?;
        let ids = with_auth_retry(self.transport.as_ref(), || self.transport.list_message_ids(&folder.path))
            .await
            .map_err(|e| e.context(context))?;
        for id in ids {
            let message = with_auth_retry(self.transport.as_ref(), || self.transport.get_message(&id))
                .await
                .map_err(|e| e.context(context))?;
            let matches = match key_id {
                Some(k) => message.envelope.subject.as_deref() == Some(k),
                None => true,
            };
            if matches {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }
}

/// The synthetic RFC 822 message carrying a key sync envelope.
pub fn build_key_message(user_address: &str, key_id: &str, mime_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    append_header(&mut out, "Date", &Utc::now().to_rfc2822());
    append_header(&mut out, "From", user_address);
    append_header(&mut out, "To", user_address);
    append_header(&mut out, "Subject", key_id);
    append_header(&mut out, "MIME-Version", "1.0");
    append_header(&mut out, "Content-Type", &format!("{}; charset=us-ascii", mime_type));
    append_header(&mut out, "Content-Transfer-Encoding", "base64");
    out.extend_from_slice(b"\r\n");
    let encoded = STANDARD.encode(payload);
    for line in encoded.as_bytes().chunks(BASE64_LINE_LEN) {
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out
}

fn append_header(out: &mut Vec<u8>, name: &str, value: &str) {
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(b"\r\n");
}
