/*
 * consent.rs
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

//! User consent for replacing a contact's public key.

use async_trait::async_trait;

use super::record::KeyRecord;
use crate::config::DialogStrings;

/// What the user is asked to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUpdateRequest {
    pub user_id: String,
    pub old_key_id: String,
    /// `None` when the key was revoked without replacement.
    pub new_key_id: Option<String>,
    pub title: String,
    pub message: String,
    pub positive_label: String,
    pub negative_label: String,
}

impl KeyUpdateRequest {
    pub fn new(strings: &DialogStrings, user_id: &str, old_key: &KeyRecord, new_key: Option<&KeyRecord>) -> Self {
        let template = if new_key.is_some() {
            &strings.update_public_key_message_new
        } else {
            &strings.update_public_key_message_removed
        };
        Self {
            user_id: user_id.to_string(),
            old_key_id: old_key.id.clone(),
            new_key_id: new_key.map(|k| k.id.clone()),
            title: strings.update_public_key_title.clone(),
            message: template.replace("{0}", user_id),
            positive_label: strings.update_public_key_pos_button.clone(),
            negative_label: strings.update_public_key_neg_button.clone(),
        }
    }
}

/// Suspends the caller until the user decides. `true` means replace.
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    async fn confirm(&self, request: KeyUpdateRequest) -> bool;
}

/// Fixed answer, for headless use.
#[derive(Debug, Clone, Copy)]
pub struct FixedConsent(pub bool);

#[async_trait]
impl ConsentPrompt for FixedConsent {
    async fn confirm(&self, _request: KeyUpdateRequest) -> bool {
        self.0
    }
}
