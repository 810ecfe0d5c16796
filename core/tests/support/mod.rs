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

//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sigillo_core::account::{AccountSession, Collaborators};
use sigillo_core::config::CoreConfig;
use sigillo_core::crypto::{AesGcmCrypto, Decrypted, KeyParams, PgpEngine};
use sigillo_core::keychain::{
    ActiveKey, ConsentPrompt, KeyDirectory, KeyKind, KeyRecord, KeyUpdateRequest, Keypair, UserId,
};
use sigillo_core::localstorage::MemoryStore;
use sigillo_core::message_id::MessageId;
use sigillo_core::mime::{MailParserReader, MimeNode, RawMimeParser};
use sigillo_core::store::{Envelope, FolderInfo, MailTransport, RemoteMessage, StoreError};

pub const ME: &str = "me@example.org";
pub const ALICE: &str = "alice@example.org";

pub fn armor(body: &str) -> String {
    format!("-----BEGIN PGP MESSAGE-----\n\n{}\n-----END PGP MESSAGE-----", body)
}

/// Mail transport over in-memory folders.
#[derive(Default)]
pub struct FakeTransport {
    pub folders: Mutex<Vec<FolderInfo>>,
    pub hidden: Mutex<Vec<String>>,
    pub listing: Mutex<HashMap<String, Vec<MessageId>>>,
    pub messages: Mutex<HashMap<MessageId, RemoteMessage>>,
    pub raw: Mutex<HashMap<MessageId, Vec<u8>>>,
    pub attachments: Mutex<HashMap<(MessageId, String), Vec<u8>>>,
    pub sent: Mutex<Vec<Vec<u8>>>,
    /// Calls to fail with `AuthExpired` before succeeding.
    pub expired_logins: AtomicUsize,
    pub logins: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub offline: std::sync::atomic::AtomicBool,
    /// Folder listing fails with a plain error message.
    pub refuse_listing: std::sync::atomic::AtomicBool,
    next_id: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folders(paths: &[&str]) -> Self {
        let t = Self::new();
        *t.folders.lock().unwrap() = paths.iter().map(|p| FolderInfo::new(*p, *p)).collect();
        t
    }

    pub fn add_message(&self, folder: &str, message: RemoteMessage) {
        self.listing
            .lock()
            .unwrap()
            .entry(folder.to_string())
            .or_default()
            .push(message.id.clone());
        self.messages.lock().unwrap().insert(message.id.clone(), message);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Offline)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MailTransport for FakeTransport {
    async fn login(&self) -> Result<(), StoreError> {
        self.check()?;
        self.logins.fetch_add(1, Ordering::SeqCst);
        let remaining = self.expired_logins.load(Ordering::SeqCst);
        if remaining > 0 {
            self.expired_logins.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::AuthExpired);
        }
        Ok(())
    }

    async fn refresh_credentials(&self) -> Result<(), StoreError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn logout(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_folders(&self) -> Result<Vec<FolderInfo>, StoreError> {
        self.check()?;
        if self.refuse_listing.load(Ordering::SeqCst) {
            return Err(StoreError::new("listing refused"));
        }
        Ok(self.folders.lock().unwrap().clone())
    }

    async fn list_message_ids(&self, folder_path: &str) -> Result<Vec<MessageId>, StoreError> {
        self.check()?;
        Ok(self.listing.lock().unwrap().get(folder_path).cloned().unwrap_or_default())
    }

    async fn get_message(&self, id: &MessageId) -> Result<RemoteMessage, StoreError> {
        self.check()?;
        self.messages
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::new(format!("no message {}", id)))
    }

    async fn get_attachment(&self, message_id: &MessageId, attachment_id: &str) -> Result<Vec<u8>, StoreError> {
        self.check()?;
        self.attachments
            .lock()
            .unwrap()
            .get(&(message_id.clone(), attachment_id.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::new("no attachment"))
    }

    async fn get_raw_message(&self, id: &MessageId) -> Result<Vec<u8>, StoreError> {
        self.check()?;
        self.raw
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::new("no raw message"))
    }

    async fn send(&self, rfc822: &[u8]) -> Result<(), StoreError> {
        self.check()?;
        self.sent.lock().unwrap().push(rfc822.to_vec());
        Ok(())
    }

    async fn insert_message(&self, folder_path: &str, rfc822: &[u8]) -> Result<MessageId, StoreError> {
        self.check()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = MessageId::new(format!("inserted-{}", n));
        let subject = String::from_utf8_lossy(rfc822)
            .lines()
            .find_map(|l| l.strip_prefix("Subject: ").map(str::to_string));
        let root = MailParserReader.parse(rfc822)?;
        self.add_message(
            folder_path,
            RemoteMessage {
                id: id.clone(),
                uid: Some(n as u64),
                envelope: Envelope {
                    subject,
                    ..Default::default()
                },
                root,
            },
        );
        self.raw.lock().unwrap().insert(id.clone(), rfc822.to_vec());
        Ok(id)
    }

    async fn create_folder(&self, name: &str, hidden: bool) -> Result<FolderInfo, StoreError> {
        self.check()?;
        let info = FolderInfo::new(name, format!("Label_{}", name));
        self.folders.lock().unwrap().push(info.clone());
        if hidden {
            self.hidden.lock().unwrap().push(name.to_string());
        }
        Ok(info)
    }
}

/// PGP engine over a toy format.
///
/// Keys are armored as `KEY:<id>:<address>:<public|private>`. Ciphertext is the plaintext
/// inside PGP message armor; a plaintext starting with `SIGNED\n` carries a signature that
/// verifies when a sender key is given; `GARBAGE` does not decrypt. Detached and cleartext
/// signatures verify when a sender key is given and the signature text contains `GOOD`.
pub struct FakePgp;

pub fn key_armor(id: &str, address: &str, kind: KeyKind) -> String {
    let k = match kind {
        KeyKind::Public => "public",
        KeyKind::Private => "private",
    };
    format!("KEY:{}:{}:{}", id, address, k)
}

pub fn key_record(id: &str, address: &str, kind: KeyKind) -> KeyRecord {
    KeyRecord {
        id: id.to_string(),
        user_id: address.to_string(),
        user_ids: vec![UserId::new(None, address)],
        armored: key_armor(id, address, kind),
        imported: false,
        source: None,
        kind,
    }
}

pub fn keypair(id: &str, address: &str) -> Keypair {
    Keypair {
        public_key: key_record(id, address, KeyKind::Public),
        private_key: key_record(id, address, KeyKind::Private),
    }
}

pub fn active_key() -> ActiveKey {
    ActiveKey::new(keypair("00000000000000AA", ME), Some("passphrase".into()))
}

#[async_trait]
impl PgpEngine for FakePgp {
    async fn decrypt(
        &self,
        ciphertext: &str,
        _active_key: &ActiveKey,
        sender_key: Option<&KeyRecord>,
    ) -> Result<Decrypted, StoreError> {
        let inner = ciphertext
            .trim()
            .strip_prefix("-----BEGIN PGP MESSAGE-----")
            .and_then(|s| s.strip_suffix("-----END PGP MESSAGE-----"))
            .map(|s| s.trim())
            .ok_or_else(|| StoreError::new("not armored"))?;
        if inner == "GARBAGE" {
            return Ok(Decrypted::default());
        }
        match inner.strip_prefix("SIGNED\n") {
            Some(rest) => Ok(Decrypted {
                decrypted: Some(rest.to_string()),
                signatures_valid: sender_key.map(|_| true),
            }),
            None => Ok(Decrypted {
                decrypted: Some(inner.to_string()),
                signatures_valid: None,
            }),
        }
    }

    async fn verify_clear_signed(
        &self,
        clear_signed: &str,
        sender_key: Option<&KeyRecord>,
    ) -> Result<Option<bool>, StoreError> {
        Ok(sender_key.map(|_| clear_signed.contains("GOOD")))
    }

    async fn verify_signed(
        &self,
        _signed_message: &str,
        signature: &str,
        sender_key: Option<&KeyRecord>,
    ) -> Result<Option<bool>, StoreError> {
        Ok(sender_key.map(|_| signature.contains("GOOD")))
    }

    fn get_key_params(&self, armored: &str) -> Result<KeyParams, StoreError> {
        let fields: Vec<&str> = armored.split(':').collect();
        match fields.as_slice() {
            ["KEY", id, address, _] => Ok(KeyParams {
                id: id.to_string(),
                user_id: address.to_string(),
                user_ids: vec![UserId::new(None, *address)],
            }),
            _ => Err(StoreError::new("not a key")),
        }
    }

    fn extract_public_key(&self, private_armored: &str) -> Result<String, StoreError> {
        private_armored
            .strip_suffix(":private")
            .map(|s| format!("{}:public", s))
            .ok_or_else(|| StoreError::new("not a private key"))
    }
}

/// Key directory keyed by address.
#[derive(Default)]
pub struct FakeDirectory {
    pub keys: Mutex<HashMap<String, KeyRecord>>,
    pub offline: std::sync::atomic::AtomicBool,
    pub uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl KeyDirectory for FakeDirectory {
    async fn get(&self, key_id: &str) -> Result<Option<KeyRecord>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Offline);
        }
        Ok(self.keys.lock().unwrap().values().find(|k| k.id == key_id).cloned())
    }

    async fn get_by_user_id(&self, user_id: &str) -> Result<Option<KeyRecord>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Offline);
        }
        Ok(self.keys.lock().unwrap().get(user_id).cloned())
    }

    async fn put(&self, key: &KeyRecord) -> Result<(), StoreError> {
        self.uploads.lock().unwrap().push(key.id.clone());
        Ok(())
    }
}

/// Consent prompt with a fixed answer that records what it was asked.
pub struct RecordingConsent {
    pub answer: bool,
    pub requests: Mutex<Vec<KeyUpdateRequest>>,
}

impl RecordingConsent {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ConsentPrompt for RecordingConsent {
    async fn confirm(&self, request: KeyUpdateRequest) -> bool {
        self.requests.lock().unwrap().push(request);
        self.answer
    }
}

/// Fast key derivation for tests.
pub fn test_config() -> CoreConfig {
    CoreConfig {
        pbkdf2_iterations: 1000,
        ..CoreConfig::default()
    }
}

pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub directory: Arc<FakeDirectory>,
    pub consent: Arc<RecordingConsent>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new(transport: FakeTransport) -> Self {
        Self {
            transport: Arc::new(transport),
            directory: Arc::new(FakeDirectory::default()),
            consent: Arc::new(RecordingConsent::new(false)),
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            transport: self.transport.clone(),
            symmetric: Arc::new(AesGcmCrypto::from_config(&test_config())),
            pgp: Arc::new(FakePgp),
            reader: Arc::new(MailParserReader),
            directory: self.directory.clone(),
            consent: self.consent.clone(),
            store: self.store.clone(),
        }
    }

    pub fn session(&self) -> AccountSession {
        AccountSession::new(ME, test_config(), self.collaborators())
    }
}

pub fn envelope_from(address: &str) -> Envelope {
    Envelope {
        from: vec![sigillo_core::store::Address::new(address)],
        to: vec![sigillo_core::store::Address::new(ME)],
        subject: Some("test".into()),
        ..Default::default()
    }
}

pub fn remote(id: &str, from: &str, root: MimeNode) -> RemoteMessage {
    RemoteMessage {
        id: MessageId::new(id),
        uid: None,
        envelope: envelope_from(from),
        root,
    }
}
