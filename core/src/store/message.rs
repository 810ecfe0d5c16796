/*
 * message.rs
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

//! Message and envelope types.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::message_id::MessageId;
use crate::mime::{classify, filter_body_parts, AttachmentPart, BodyPart, BodyPartKind, MimeNode};
use crate::store::StoreError;

/// Email address with optional display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: Option<String>,
    pub address: String,
}

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
        }
    }

    pub fn named(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: address.into(),
        }
    }
}

/// Envelope (headers) for a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub from: Vec<Address>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub date: Option<DateTime<FixedOffset>>,
    pub subject: Option<String>,
}

/// Message as returned by `MailTransport::get_message`: headers plus MIME structure.
#[derive(Debug, Clone, Default)]
pub struct RemoteMessage {
    pub id: MessageId,
    pub uid: Option<u64>,
    pub envelope: Envelope,
    pub root: MimeNode,
}

/// Where a message is in the fetch/decrypt/verify pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProcessingState {
    #[default]
    Unprocessed,
    Fetching,
    Decrypting,
    Verifying,
    Materialized,
    /// Processing failed; `body` holds the error text and the message is still displayable.
    Errored,
}

/// A message in a folder. `encrypted` / `signed` are derived from the body parts.
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub id: MessageId,
    pub uid: Option<u64>,
    pub envelope: Envelope,
    body_parts: Vec<BodyPart>,
    encrypted: bool,
    signed: bool,
    pub body: Option<String>,
    pub html: Option<String>,
    pub attachments: Vec<AttachmentPart>,
    pub decrypted: bool,
    pub signatures_valid: Option<bool>,
    pub signed_message: Option<String>,
    pub signature: Option<String>,
    pub clear_signed_message: Option<String>,
    /// Advisory in-progress flags; not a lock.
    pub loading_body: bool,
    pub decrypting_body: bool,
    pub state: ProcessingState,
}

impl Message {
    pub fn new(id: MessageId, envelope: Envelope) -> Self {
        Self {
            id,
            envelope,
            ..Default::default()
        }
    }

    /// Build from a fetched message, classifying its MIME tree.
    pub fn from_remote(remote: RemoteMessage) -> Self {
        let mut message = Message::new(remote.id, remote.envelope);
        message.uid = remote.uid;
        message.set_body_parts(classify(&remote.root));
        message
    }

    pub fn body_parts(&self) -> &[BodyPart] {
        &self.body_parts
    }

    /// In-place access for filling in fetched content. Replacing a part with one of a
    /// different kind must go through [`set_body_parts`](Self::set_body_parts).
    pub fn body_parts_mut(&mut self) -> &mut [BodyPart] {
        &mut self.body_parts
    }

    /// Replace the body parts and recompute `encrypted` / `signed`.
    pub fn set_body_parts(&mut self, parts: Vec<BodyPart>) {
        self.encrypted = !filter_body_parts(&parts, BodyPartKind::Encrypted).is_empty();
        self.signed = !filter_body_parts(&parts, BodyPartKind::Signed).is_empty();
        self.body_parts = parts;
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Verification outcome may override the classification-time flag
    /// (signature found inside ciphertext, cleartext-signed body, unverifiable signature).
    pub(crate) fn set_signed(&mut self, signed: bool) {
        self.signed = signed;
    }

    /// First From address.
    pub fn sender(&self) -> Option<&str> {
        self.envelope.from.first().map(|a| a.address.as_str())
    }

    /// Turn a processing failure into a displayable message.
    pub fn set_error(&mut self, err: &StoreError) {
        self.body = Some(err.to_string());
        self.decrypted = true;
        self.state = ProcessingState::Errored;
    }
}
