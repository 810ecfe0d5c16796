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

//! Account session: connection lifecycle, folder list, message access and the active key.
//!
//! The session owns the account state and the active decryption key and hands the key
//! explicitly to the pipeline and the key backup. Messages are processed on a copy taken
//! out of the folder and written back, so no lock is held across remote calls.

mod folders;
mod state;

pub use folders::reconcile_folders;
pub use state::{AccountState, BusyGuard, ConnectionState};

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use state::{read_state, write_state};

use crate::config::CoreConfig;
use crate::crypto::{PgpEngine, SymmetricCrypto};
use crate::keychain::{hkp_index_url, ActiveKey, ConsentPrompt, KeyDirectory, Keychain, Keypair};
use crate::keysync::PrivateKeyBackup;
use crate::localstorage::{run_updates, DeviceStorage, KeyValueStore, UPDATES};
use crate::message_id::MessageId;
use crate::mime::RawMimeParser;
use crate::pipeline::MessageCryptoPipeline;
use crate::store::{with_auth_retry, Folder, FolderType, MailTransport, Message, StoreError};

/// Local store key of the cached folder list.
const FOLDERS_KEY: &str = "folders";

/// Host-supplied collaborators of a session.
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn MailTransport>,
    pub symmetric: Arc<dyn SymmetricCrypto>,
    pub pgp: Arc<dyn PgpEngine>,
    pub reader: Arc<dyn RawMimeParser>,
    pub directory: Arc<dyn KeyDirectory>,
    pub consent: Arc<dyn ConsentPrompt>,
    pub store: Arc<dyn KeyValueStore>,
}

pub struct AccountSession {
    user_address: String,
    config: Arc<CoreConfig>,
    transport: Arc<dyn MailTransport>,
    storage: DeviceStorage,
    keychain: Arc<Keychain>,
    pipeline: MessageCryptoPipeline,
    backup: PrivateKeyBackup,
    state: RwLock<AccountState>,
    active_key: RwLock<Option<ActiveKey>>,
}

impl AccountSession {
    pub fn new(user_address: impl Into<String>, config: CoreConfig, deps: Collaborators) -> Self {
        let user_address = user_address.into();
        let config = Arc::new(config);
        let storage = DeviceStorage::new(deps.store);
        let keychain = Arc::new(Keychain::new(
            storage.clone(),
            deps.directory,
            deps.pgp.clone(),
            deps.consent,
            config.strings.clone(),
        ));
        let pipeline = MessageCryptoPipeline::new(
            deps.transport.clone(),
            keychain.clone(),
            deps.pgp.clone(),
            deps.reader.clone(),
        );
        let backup = PrivateKeyBackup::new(
            deps.transport.clone(),
            deps.symmetric,
            deps.pgp,
            deps.reader,
            config.clone(),
            user_address.clone(),
        );
        Self {
            user_address,
            config,
            transport: deps.transport,
            storage,
            keychain,
            pipeline,
            backup,
            state: RwLock::new(AccountState::default()),
            active_key: RwLock::new(None),
        }
    }

    pub fn user_address(&self) -> &str {
        &self.user_address
    }

    /// Key server search URL for `query` (address or name).
    pub fn key_server_search_url(&self, query: &str) -> String {
        hkp_index_url(&self.config.hkp_url, query)
    }

    pub fn keychain(&self) -> &Keychain {
        &self.keychain
    }

    pub fn key_backup(&self) -> &PrivateKeyBackup {
        &self.backup
    }

    pub fn is_busy(&self) -> bool {
        read_state(&self.state).busy() > 0
    }

    pub fn is_online(&self) -> bool {
        read_state(&self.state).is_online()
    }

    pub fn is_logging_in(&self) -> bool {
        read_state(&self.state).is_logging_in()
    }

    pub fn connection_state(&self) -> ConnectionState {
        read_state(&self.state).connection()
    }

    /// Snapshot of the folder list.
    pub fn folders(&self) -> Vec<Folder> {
        read_state(&self.state).folders().to_vec()
    }

    pub fn message(&self, folder_path: &str, id: &MessageId) -> Option<Message> {
        read_state(&self.state)
            .folders()
            .iter()
            .find(|f| f.path == folder_path)
            .and_then(|f| f.message(id))
            .cloned()
    }

    pub fn check_online(&self) -> Result<(), StoreError> {
        if self.is_online() {
            Ok(())
        } else {
            Err(StoreError::Offline)
        }
    }

    /// Migrate the local store, then load the cached folder list so the account is
    /// usable offline.
    pub fn init(&self) -> Result<(), StoreError> {
        run_updates(&self.storage, UPDATES)?;
        let cached: Vec<Folder> = self.storage.read_item(FOLDERS_KEY)?.unwrap_or_default();
        debug!(folders = cached.len(), "loaded cached folders");
        write_state(&self.state).folders = cached;
        Ok(())
    }

    /// Log in, reconcile folders, go online and open the inbox. Only login and folder
    /// listing failures leave the session disconnected.
    pub async fn on_connect(&self) -> Result<(), StoreError> {
        {
            let mut s = write_state(&self.state);
            s.connection = ConnectionState::Connecting;
            s.logging_in = true;
        }
        let result = self.connect().await;
        let mut s = write_state(&self.state);
        s.logging_in = false;
        match &result {
            Ok(()) => info!(user = %self.user_address, "connected"),
            Err(e) => {
                warn!(user = %self.user_address, error = %e, "connect failed");
                s.online = false;
                s.connection = ConnectionState::Disconnected;
            }
        }
        result
    }

    async fn connect(&self) -> Result<(), StoreError> {
        {
            let _busy = BusyGuard::new(&self.state);
            with_auth_retry(self.transport.as_ref(), || self.transport.login()).await?;
        }
        {
            let mut s = write_state(&self.state);
            s.online = true;
            s.connection = ConnectionState::Connected;
        }
        self.update_folders().await?;
        let inbox = read_state(&self.state)
            .folders()
            .iter()
            .find(|f| f.wellknown && f.folder_type == Some(FolderType::Inbox))
            .map(|f| f.path.clone());
        if let Some(path) = inbox {
            // the session stays connected when only the inbox fails to load
            if let Err(e) = self.open_folder(&path).await {
                warn!(folder = %path, error = %e, "opening inbox failed");
            }
        }
        Ok(())
    }

    /// Go offline. Logging out remotely is best effort.
    pub async fn on_disconnect(&self) {
        {
            let mut s = write_state(&self.state);
            s.online = false;
            s.connection = ConnectionState::Disconnected;
        }
        if let Err(e) = self.transport.logout().await {
            debug!(error = %e, "remote logout failed");
        }
    }

    /// Fetch the remote folder list and reconcile it with the local one; persist on change.
    pub async fn update_folders(&self) -> Result<(), StoreError> {
        self.check_online()?;
        let remote = {
            let _busy = BusyGuard::new(&self.state);
            with_auth_retry(self.transport.as_ref(), || self.transport.list_folders()).await?
        };
        let (folders, changed) = {
            let s = read_state(&self.state);
            reconcile_folders(s.folders(), &remote, &self.config)
        };
        if changed {
            debug!(folders = folders.len(), "folder list changed");
            self.storage.store_item(FOLDERS_KEY, &folders)?;
        }
        write_state(&self.state).folders = folders;
        Ok(())
    }

    /// List the folder's messages and fetch the ones not loaded yet. Returns the message count.
    pub async fn open_folder(&self, path: &str) -> Result<usize, StoreError> {
        self.check_online()?;
        let _busy = BusyGuard::new(&self.state);
        let ids = with_auth_retry(self.transport.as_ref(), || self.transport.list_message_ids(path)).await?;

        let known: Vec<MessageId> = match read_state(&self.state).folders().iter().find(|f| f.path == path) {
            Some(f) => f.messages.iter().map(|m| m.id.clone()).collect(),
            None => return Err(StoreError::new(format!("Unknown folder {}", path))),
        };
        let mut fetched = Vec::new();
        for id in ids.iter().filter(|id| !known.contains(id)) {
            let remote = with_auth_retry(self.transport.as_ref(), || self.transport.get_message(id)).await?;
            fetched.push(Message::from_remote(remote));
        }

        let mut s = write_state(&self.state);
        let folder = s
            .folder_mut(path)
            .ok_or_else(|| StoreError::new(format!("Unknown folder {}", path)))?;
        let mut previous = std::mem::take(&mut folder.messages);
        previous.append(&mut fetched);
        folder.messages = ids
            .iter()
            .filter_map(|id| previous.iter().position(|m| &m.id == id).map(|i| previous.swap_remove(i)))
            .collect();
        debug!(folder = path, messages = folder.messages.len(), "folder opened");
        Ok(folder.messages.len())
    }

    /// Fetch and extract the body of a message.
    pub async fn get_body(&self, folder_path: &str, id: &MessageId) -> Result<(), StoreError> {
        let mut message = self.take_copy(folder_path, id)?;
        let result = {
            let _busy = BusyGuard::new(&self.state);
            self.pipeline.fetch_body(&mut message).await
        };
        self.write_back(folder_path, message);
        result
    }

    /// Decrypt a message with the active key. Decryption failures end up in the message body.
    pub async fn decrypt_body(&self, folder_path: &str, id: &MessageId) -> Result<(), StoreError> {
        let active = self
            .active_key()
            .ok_or_else(|| StoreError::new("No private key unlocked!"))?;
        let mut message = self.take_copy(folder_path, id)?;
        {
            let _busy = BusyGuard::new(&self.state);
            self.pipeline.decrypt_body(&mut message, &active).await;
        }
        self.write_back(folder_path, message);
        Ok(())
    }

    /// Decoded bytes of an attachment, kept on the message once fetched.
    pub async fn get_attachment(&self, folder_path: &str, id: &MessageId, part_number: &str) -> Result<Vec<u8>, StoreError> {
        self.check_online()?;
        let mut message = self.take_copy(folder_path, id)?;
        let result = {
            let _busy = BusyGuard::new(&self.state);
            self.pipeline.fetch_attachment(&mut message, part_number).await
        };
        self.write_back(folder_path, message);
        result
    }

    /// Send a complete RFC 822 message.
    pub async fn send(&self, rfc822: &[u8]) -> Result<(), StoreError> {
        self.check_online()?;
        let _busy = BusyGuard::new(&self.state);
        with_auth_retry(self.transport.as_ref(), || self.transport.send(rfc822)).await?;
        info!(bytes = rfc822.len(), "message sent");
        Ok(())
    }

    pub fn active_key(&self) -> Option<ActiveKey> {
        self.active_key.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make `keypair` the active decryption key after checking it belongs to this account.
    pub fn unlock(&self, keypair: Keypair, passphrase: Option<String>) -> Result<(), StoreError> {
        self.keychain.validate_key_pair(&self.user_address, &keypair)?;
        let active = ActiveKey::new(keypair, passphrase);
        info!(key_id = %active.key_id(), "private key unlocked");
        *self.active_key.write().unwrap_or_else(|e| e.into_inner()) = Some(active);
        Ok(())
    }

    /// Back up the active private key with `code`.
    pub async fn backup_key(&self, code: &str) -> Result<(), StoreError> {
        self.check_online()?;
        let active = self
            .active_key()
            .ok_or_else(|| StoreError::new("No private key unlocked!"))?;
        let _busy = BusyGuard::new(&self.state);
        self.backup.backup_active_key(code, &active).await
    }

    /// Restore the backed up key pair, store it locally and make it the active key.
    pub async fn restore_key(&self, code: &str, passphrase: Option<String>) -> Result<(), StoreError> {
        self.check_online()?;
        let keypair = {
            let _busy = BusyGuard::new(&self.state);
            self.backup.restore(code).await?
        };
        self.keychain.validate_key_pair(&self.user_address, &keypair)?;
        self.keychain.save_local_public_key(&keypair.public_key)?;
        self.keychain.save_local_private_key(&keypair.private_key)?;
        self.unlock(keypair, passphrase)
    }

    /// Go offline, forget the active key and wipe local storage.
    pub async fn logout(&self) -> Result<(), StoreError> {
        self.on_disconnect().await;
        *self.active_key.write().unwrap_or_else(|e| e.into_inner()) = None;
        write_state(&self.state).folders.clear();
        self.storage.clear()?;
        info!(user = %self.user_address, "logged out");
        Ok(())
    }

    fn take_copy(&self, folder_path: &str, id: &MessageId) -> Result<Message, StoreError> {
        self.message(folder_path, id)
            .ok_or_else(|| StoreError::new(format!("Message {} not found in {}", id, folder_path)))
    }

    fn write_back(&self, folder_path: &str, message: Message) {
        let mut s = write_state(&self.state);
        match s.folder_mut(folder_path).and_then(|f| f.message_mut(&message.id)) {
            Some(slot) => *slot = message,
            None => debug!(message_id = %message.id, "message gone before write back"),
        }
    }
}
