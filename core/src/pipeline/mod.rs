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

//! Message crypto pipeline: fetch body parts, decrypt, verify and materialize the
//! displayable body, html and attachments of a [`Message`].

mod images;
mod inline;

pub use images::inline_images;
pub use inline::{find_clear_signed, find_pgp_message, unescape_dashes, ClearSigned};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::crypto::PgpEngine;
use crate::keychain::{ActiveKey, KeyRecord, Keychain};
use crate::mime::{
    attachments, classify, filter_body_parts, joined_text, AttachmentPart, BodyPart, BodyPartKind, RawMimeParser,
};
use crate::store::{with_auth_retry, MailTransport, Message, ProcessingState, StoreError};

const PGP_SIGNATURE_TYPE: &str = "application/pgp-signature";

pub struct MessageCryptoPipeline {
    transport: Arc<dyn MailTransport>,
    keychain: Arc<Keychain>,
    pgp: Arc<dyn PgpEngine>,
    reader: Arc<dyn RawMimeParser>,
}

impl MessageCryptoPipeline {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        keychain: Arc<Keychain>,
        pgp: Arc<dyn PgpEngine>,
        reader: Arc<dyn RawMimeParser>,
    ) -> Self {
        Self {
            transport,
            keychain,
            pgp,
            reader,
        }
    }

    /// Load the body parts of `message` and extract its body. No-op while a load is in
    /// progress or once a body is present. Errors propagate; the message stays unprocessed.
    pub async fn fetch_body(&self, message: &mut Message) -> Result<(), StoreError> {
        if message.loading_body || message.body.is_some() {
            return Ok(());
        }
        message.loading_body = true;
        message.state = ProcessingState::Fetching;
        let result = match self.load_body_parts(message).await {
            Ok(()) => self.extract_body(message).await,
            Err(e) => Err(e),
        };
        message.loading_body = false;
        if let Err(e) = result {
            warn!(message_id = %message.id, error = %e, "fetching body failed");
            message.state = ProcessingState::Unprocessed;
            return Err(e);
        }
        Ok(())
    }

    /// Fill in encrypted content by attachment id. Signed messages, and messages whose
    /// text parts came without content, are re-read from the raw message so the signed
    /// bytes are exact.
    async fn load_body_parts(&self, message: &mut Message) -> Result<(), StoreError> {
        let id = message.id.clone();
        let remote = with_auth_retry(self.transport.as_ref(), || self.transport.get_message(&id)).await?;
        let mut parts = classify(&remote.root);

        let needs_raw = parts.iter().any(|p| match p {
            BodyPart::Signed { .. } => true,
            BodyPart::Text { content, .. } | BodyPart::Html { content, .. } => content.is_none(),
            _ => false,
        });
        if needs_raw {
            debug!(message_id = %id, "reading raw message");
            let raw = with_auth_retry(self.transport.as_ref(), || self.transport.get_raw_message(&id)).await?;
            parts = classify(&self.reader.parse(&raw)?);
        }

        for part in parts.iter_mut() {
            if let BodyPart::Encrypted {
                attachment_id: Some(attachment_id),
                content,
                ..
            } = part
            {
                if content.is_none() {
                    let attachment_id = attachment_id.clone();
                    let bytes = with_auth_retry(self.transport.as_ref(), || {
                        self.transport.get_attachment(&id, &attachment_id)
                    })
                    .await?;
                    *content = Some(String::from_utf8_lossy(&bytes).into_owned());
                }
            }
        }
        message.set_body_parts(parts);
        Ok(())
    }

    /// Derive body, html and attachments from the body parts of a fetched message.
    ///
    /// Encrypted messages only get their ciphertext as body (see [`decrypt_body`]).
    /// A plain-text body that is entirely a PGP/INLINE block turns the message into an
    /// encrypted one; a cleartext-signed body is unescaped and verified.
    ///
    /// [`decrypt_body`]: Self::decrypt_body
    pub async fn extract_body(&self, message: &mut Message) -> Result<(), StoreError> {
        if message.is_encrypted() {
            message.body = first_encrypted(message.body_parts()).and_then(|(c, _)| c);
            return Ok(());
        }

        let mut root: Vec<BodyPart> = message.body_parts().to_vec();
        if message.is_signed() {
            let signed = filter_body_parts(&root, BodyPartKind::Signed).first().cloned().cloned();
            if let Some(BodyPart::Signed {
                signed_message,
                signature,
                content,
                ..
            }) = signed
            {
                message.signed_message = signed_message;
                message.signature = signature;
                root = content;
            }
        }

        let text = joined_text(&root, BodyPartKind::Text);
        if let Some(armored) = find_pgp_message(&text) {
            let armored = armored.to_string();
            debug!(message_id = %message.id, "PGP/INLINE message");
            message.set_body_parts(vec![BodyPart::pgp_inline(armored.clone())]);
            message.body = Some(armored);
            return Ok(());
        }

        let mut body = text.replace("\r\n", "\n");

        let clear_signed = find_clear_signed(&body).map(|cs| (cs.block.to_string(), cs.text));
        if let Some((block, text)) = clear_signed {
            message.clear_signed_message = Some(block);
            message.set_signed(true);
            body = text;
        }

        if message.is_signed() {
            message.state = ProcessingState::Verifying;
            let valid = self.check_signatures(message).await?;
            message.signatures_valid = valid;
            message.set_signed(valid.is_some());
        }

        message.body = Some(body);
        if message.clear_signed_message.is_none() {
            set_html_and_attachments(message, &root);
        }
        message.state = ProcessingState::Materialized;
        Ok(())
    }

    /// Decrypt an encrypted message with the active key. No-op when there is nothing to
    /// decrypt or decryption is already running or done. Failures become the message body.
    pub async fn decrypt_body(&self, message: &mut Message, active_key: &ActiveKey) {
        if message.body_parts().is_empty()
            || message.decrypting_body
            || message.body.is_none()
            || !message.is_encrypted()
            || message.decrypted
        {
            return;
        }
        message.decrypting_body = true;
        message.state = ProcessingState::Decrypting;
        if let Err(e) = self.decrypt_parts(message, active_key).await {
            warn!(message_id = %message.id, error = %e, "decryption failed");
            message.set_error(&e);
        }
        message.decrypting_body = false;
    }

    async fn decrypt_parts(&self, message: &mut Message, active_key: &ActiveKey) -> Result<(), StoreError> {
        let sender_key = self.sender_key(message).await?;
        let (ciphertext, pgp_inline) = match first_encrypted(message.body_parts()) {
            Some((Some(c), inline)) => (c, inline),
            _ => return Err(StoreError::DecryptionFailed),
        };
        let result = self.pgp.decrypt(&ciphertext, active_key, sender_key.as_ref()).await?;
        let plaintext = result.decrypted.ok_or(StoreError::DecryptionFailed)?;
        message.set_signed(result.signatures_valid.is_some());
        message.signatures_valid = result.signatures_valid;

        if pgp_inline {
            message.body = Some(plaintext);
            message.decrypted = true;
            message.state = ProcessingState::Materialized;
            return Ok(());
        }

        let mut root = classify(&self.reader.parse(plaintext.as_bytes())?);
        if !message.is_signed() {
            let signed = filter_body_parts(&root, BodyPartKind::Signed).first().cloned().cloned();
            if let Some(BodyPart::Signed {
                signed_message,
                signature,
                content,
                ..
            }) = signed
            {
                message.signed_message = signed_message;
                message.signature = signature;
                root = content;
                message.state = ProcessingState::Verifying;
                let valid = self.check_signatures(message).await?;
                message.set_signed(valid.is_some());
                message.signatures_valid = valid;
            }
        }

        message.body = Some(joined_text(&root, BodyPartKind::Text));
        set_html_and_attachments(message, &root);
        message.decrypted = true;
        message.state = ProcessingState::Materialized;
        info!(message_id = %message.id, signed = message.is_signed(), "message decrypted");
        Ok(())
    }

    /// Verify the cleartext signature or the detached signature of `message` against the
    /// sender's key. `None` when there is nothing to verify or no key to verify with.
    pub async fn check_signatures(&self, message: &Message) -> Result<Option<bool>, StoreError> {
        let sender_key = self.sender_key(message).await?;
        if let Some(clear_signed) = &message.clear_signed_message {
            return self.pgp.verify_clear_signed(clear_signed, sender_key.as_ref()).await;
        }
        match (&message.signed_message, &message.signature) {
            (Some(signed_message), Some(signature)) => {
                self.pgp
                    .verify_signed(signed_message, signature, sender_key.as_ref())
                    .await
            }
            _ => Ok(None),
        }
    }

    /// Decoded bytes of the attachment with `part_number`, fetched once and kept on the message.
    pub async fn fetch_attachment(&self, message: &mut Message, part_number: &str) -> Result<Vec<u8>, StoreError> {
        let id = message.id.clone();
        let attachment = message
            .attachments
            .iter_mut()
            .find(|a| a.part_number == part_number)
            .ok_or_else(|| StoreError::new(format!("No attachment {}", part_number)))?;
        if let Some(content) = &attachment.content {
            return Ok(content.clone());
        }
        let attachment_id = attachment
            .attachment_id
            .clone()
            .ok_or_else(|| StoreError::new(format!("Attachment {} has no content handle", part_number)))?;
        let bytes = with_auth_retry(self.transport.as_ref(), || {
            self.transport.get_attachment(&id, &attachment_id)
        })
        .await?;
        attachment.content = Some(bytes.clone());
        Ok(bytes)
    }

    async fn sender_key(&self, message: &Message) -> Result<Option<KeyRecord>, StoreError> {
        match message.sender() {
            Some(sender) => self.keychain.resolve_public_key(sender).await,
            None => Ok(None),
        }
    }
}

/// Content and PGP/INLINE flag of the first encrypted part.
fn first_encrypted(parts: &[BodyPart]) -> Option<(Option<String>, bool)> {
    filter_body_parts(parts, BodyPartKind::Encrypted)
        .into_iter()
        .find_map(|p| match p {
            BodyPart::Encrypted {
                content, pgp_inline, ..
            } => Some((content.clone(), *pgp_inline)),
            _ => None,
        })
}

fn set_html_and_attachments(message: &mut Message, root: &[BodyPart]) {
    message.attachments = attachments(root)
        .into_iter()
        .filter(|a: &AttachmentPart| a.mime_type != PGP_SIGNATURE_TYPE)
        .collect();
    let html = joined_text(root, BodyPartKind::Html);
    message.html = if html.is_empty() {
        None
    } else {
        Some(inline_images(&html, &message.attachments))
    };
}
