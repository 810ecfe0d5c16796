/*
 * account.rs
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

//! Account session lifecycle: connect, folder reconciliation, message access and keys.

mod support;

use std::sync::atomic::Ordering;

use sigillo_core::account::ConnectionState;
use sigillo_core::localstorage::{db_version, DeviceStorage, UPDATES};
use sigillo_core::message_id::MessageId;
use sigillo_core::mime::MimeNode;
use sigillo_core::store::{Folder, FolderType, StoreError};

use support::*;

fn paths(folders: &[Folder]) -> Vec<String> {
    folders.iter().map(|f| f.path.clone()).collect()
}

fn encrypted(id: &str) -> sigillo_core::store::RemoteMessage {
    remote(
        id,
        ALICE,
        MimeNode::new("", "multipart/encrypted").with_parts(vec![
            MimeNode::new("1", "application/pgp-encrypted").with_data("Version: 1"),
            MimeNode::new("2", "application/octet-stream")
                .with_data(armor("Content-Type: text/plain\r\n\r\nHello from Alice")),
        ]),
    )
}

#[tokio::test]
async fn connect_reconciles_cached_folders() {
    let h = Harness::new(FakeTransport::with_folders(&["INBOX", "SENT", "DRAFT"]));
    DeviceStorage::new(h.store.clone())
        .store_item(
            "folders",
            &vec![
                Folder::new("INBOX", "INBOX", Some(FolderType::Inbox)),
                Folder::new("TRASH", "TRASH", Some(FolderType::Trash)),
            ],
        )
        .unwrap();
    let session = h.session();
    session.init().unwrap();
    assert_eq!(paths(&session.folders()), vec!["INBOX", "TRASH"]);
    assert!(!session.is_online());

    session.on_connect().await.unwrap();
    assert!(session.is_online());
    assert!(!session.is_logging_in());
    assert!(!session.is_busy());
    assert_eq!(session.connection_state(), ConnectionState::Connected);

    let folders = session.folders();
    assert_eq!(paths(&folders), vec!["INBOX", "SENT", "OUTBOX", "DRAFT"]);
    assert!(folders.iter().all(|f| f.wellknown));

    let persisted: Vec<Folder> = DeviceStorage::new(h.store.clone())
        .read_item("folders")
        .unwrap()
        .unwrap();
    assert_eq!(paths(&persisted), paths(&folders));
}

#[test]
fn init_migrates_store_from_version_zero() {
    let h = Harness::new(FakeTransport::new());
    let storage = DeviceStorage::new(h.store.clone());
    storage
        .store_item(
            "folders",
            &vec![
                Folder::new("INBOX", "INBOX", Some(FolderType::Inbox)),
                Folder::new("Trash", "Trash", Some(FolderType::Trash)),
                Folder::new("INBOX", "Legacy/INBOX", Some(FolderType::Inbox)),
            ],
        )
        .unwrap();
    storage.store_item("email_INBOX_42", &"cached body").unwrap();
    assert_eq!(db_version(&storage).unwrap(), 0);

    let session = h.session();
    session.init().unwrap();
    assert_eq!(db_version(&storage).unwrap(), UPDATES.len() as u32);
    assert_eq!(paths(&session.folders()), vec!["INBOX", "Trash"]);
    assert_eq!(storage.read_item::<String>("email_INBOX_42").unwrap(), None);

    session.init().unwrap();
    assert_eq!(db_version(&storage).unwrap(), UPDATES.len() as u32);
}

#[tokio::test]
async fn connect_opens_inbox() {
    let transport = FakeTransport::with_folders(&["INBOX"]);
    transport.add_message("INBOX", encrypted("m1"));
    transport.add_message("INBOX", remote("m2", ALICE, MimeNode::new("1", "text/plain").with_data("hi")));
    let h = Harness::new(transport);
    let session = h.session();
    session.on_connect().await.unwrap();

    let inbox = &session.folders()[0];
    assert_eq!(inbox.path, "INBOX");
    let ids: Vec<&str> = inbox.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2"]);
    assert!(inbox.messages[0].is_encrypted());
    assert_eq!(session.open_folder("INBOX").await.unwrap(), 2);
}

#[tokio::test]
async fn unreadable_inbox_message_keeps_session_online() {
    let transport = FakeTransport::with_folders(&["INBOX", "SENT"]);
    transport
        .listing
        .lock()
        .unwrap()
        .insert("INBOX".to_string(), vec![MessageId::new("ghost")]);
    let h = Harness::new(transport);
    let session = h.session();

    session.on_connect().await.unwrap();
    assert!(session.is_online());
    assert_eq!(session.connection_state(), ConnectionState::Connected);
    assert!(!session.is_busy());
    assert_eq!(session.folders().len(), 3);
    assert!(session.folders()[0].messages.is_empty());

    session.send(b"Subject: x\r\n\r\nbody").await.unwrap();
    assert_eq!(h.transport.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn expired_login_is_refreshed_once() {
    let transport = FakeTransport::with_folders(&["INBOX"]);
    transport.expired_logins.store(1, Ordering::SeqCst);
    let h = Harness::new(transport);
    let session = h.session();
    session.on_connect().await.unwrap();
    assert_eq!(h.transport.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(h.transport.logins.load(Ordering::SeqCst), 2);
    assert!(session.is_online());
}

#[tokio::test]
async fn second_expiry_fails_the_connect() {
    let transport = FakeTransport::with_folders(&["INBOX"]);
    transport.expired_logins.store(2, Ordering::SeqCst);
    let h = Harness::new(transport);
    let session = h.session();
    let err = session.on_connect().await.unwrap_err();
    assert!(matches!(err, StoreError::AuthExpired));
    assert_eq!(h.transport.refreshes.load(Ordering::SeqCst), 1);
    assert!(!session.is_online());
    assert!(!session.is_logging_in());
    assert!(!session.is_busy());
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn offline_operations_fail_fast() {
    let h = Harness::new(FakeTransport::new());
    let session = h.session();
    let err = session.send(b"Subject: x\r\n\r\nbody").await.unwrap_err();
    assert!(err.is_offline());
    assert!(session.update_folders().await.unwrap_err().is_offline());
    assert!(h.transport.sent.lock().unwrap().is_empty());

    session.on_connect().await.unwrap();
    session.send(b"Subject: x\r\n\r\nbody").await.unwrap();
    assert_eq!(h.transport.sent.lock().unwrap().len(), 1);

    session.on_disconnect().await;
    assert!(session.check_online().is_err());
}

#[tokio::test]
async fn unlocked_key_decrypts_inbox_message() {
    let transport = FakeTransport::with_folders(&["INBOX"]);
    transport.add_message("INBOX", encrypted("m1"));
    let h = Harness::new(transport);
    let session = h.session();
    session.on_connect().await.unwrap();
    let id = MessageId::new("m1");

    session.get_body("INBOX", &id).await.unwrap();
    let err = session.decrypt_body("INBOX", &id).await.unwrap_err();
    assert_eq!(err.to_string(), "No private key unlocked!");

    session.unlock(keypair("00000000000000AA", ME), None).unwrap();
    session.decrypt_body("INBOX", &id).await.unwrap();
    let message = session.message("INBOX", &id).unwrap();
    assert!(message.decrypted);
    assert!(message.body.unwrap().contains("Hello from Alice"));
    assert!(!session.is_busy());
}

#[tokio::test]
async fn unlock_rejects_foreign_key_pair() {
    let h = Harness::new(FakeTransport::new());
    let session = h.session();
    let mut pair = keypair("00000000000000AA", ME);
    pair.public_key = key_record("00000000000000BB", ME, sigillo_core::keychain::KeyKind::Public);
    let err = session.unlock(pair, None).unwrap_err();
    assert!(matches!(err, StoreError::KeyMismatch(_)));
    assert!(session.active_key().is_none());

    let err = session.unlock(keypair("00000000000000AA", ALICE), None).unwrap_err();
    assert_eq!(err.to_string(), "User IDs dont match!");
}

#[tokio::test]
async fn key_backup_survives_logout() {
    let h = Harness::new(FakeTransport::with_folders(&["INBOX"]));
    let session = h.session();
    session.on_connect().await.unwrap();
    session.unlock(keypair("00000000000000AA", ME), Some("secret".into())).unwrap();
    session.backup_key("CODE-1234").await.unwrap();
    assert!(session.key_backup().is_synced().await);

    session.logout().await.unwrap();
    assert!(session.active_key().is_none());
    assert!(session.folders().is_empty());
    assert!(h.store.is_empty());

    let restored = h.session();
    restored.on_connect().await.unwrap();
    assert!(restored.folders().iter().all(|f| f.path != "Label_openpgp_keys"));
    restored.restore_key("CODE-1234", Some("secret".into())).await.unwrap();
    let active = restored.active_key().unwrap();
    assert_eq!(active.key_id(), "00000000000000AA");
    assert_eq!(active.passphrase(), Some("secret"));
    assert!(restored.keychain().get_user_key_pair(ME).unwrap().is_some());
}

#[test]
fn key_server_search_url_is_encoded() {
    let h = Harness::new(FakeTransport::new());
    let session = h.session();
    let url = session.key_server_search_url("alice@example.org");
    assert!(url.ends_with("/pks/lookup?op=index&search=alice%40example.org"));
}
