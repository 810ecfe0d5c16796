/*
 * transport.rs
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

//! MailTransport trait: the remote mail API (REST) as seen by the core.

use std::future::Future;

use async_trait::async_trait;
use tracing::warn;

use crate::message_id::MessageId;
use crate::store::error::StoreError;
use crate::store::folder::FolderInfo;
use crate::store::message::RemoteMessage;

/// Remote mailbox access. Timeouts are the implementation's responsibility.
///
/// Rejected credentials must surface as [`StoreError::AuthExpired`] and an unreachable
/// service as [`StoreError::Offline`].
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn login(&self) -> Result<(), StoreError>;

    /// Obtain fresh credentials (e.g. OAuth token refresh).
    async fn refresh_credentials(&self) -> Result<(), StoreError>;

    async fn logout(&self) -> Result<(), StoreError>;

    async fn list_folders(&self) -> Result<Vec<FolderInfo>, StoreError>;

    async fn list_message_ids(&self, folder_path: &str) -> Result<Vec<MessageId>, StoreError>;

    /// Headers and MIME structure. Leaf bodies may be remote handles only.
    async fn get_message(&self, id: &MessageId) -> Result<RemoteMessage, StoreError>;

    /// Decoded bytes of one body part.
    async fn get_attachment(&self, message_id: &MessageId, attachment_id: &str) -> Result<Vec<u8>, StoreError>;

    /// Full RFC 822 bytes of a message.
    async fn get_raw_message(&self, id: &MessageId) -> Result<Vec<u8>, StoreError>;

    async fn send(&self, rfc822: &[u8]) -> Result<(), StoreError>;

    /// Store a message in a folder without sending it. Returns the new message id.
    async fn insert_message(&self, folder_path: &str, rfc822: &[u8]) -> Result<MessageId, StoreError>;

    /// Create a folder; `hidden` keeps it out of the provider's folder list UI.
    async fn create_folder(&self, name: &str, hidden: bool) -> Result<FolderInfo, StoreError>;
}

/// Run `op`; on `AuthExpired` refresh credentials once and run it exactly once more.
pub async fn with_auth_retry<T, F, Fut>(transport: &dyn MailTransport, mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match op().await {
        Err(StoreError::AuthExpired) => {
            warn!("credentials expired, refreshing and retrying once");
            transport.refresh_credentials().await?;
            op().await
        }
        other => other,
    }
}
