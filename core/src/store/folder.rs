/*
 * folder.rs
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

//! Folders: remote listing entries and the session's folder model.

use serde::{Deserialize, Serialize};

use crate::store::message::Message;

/// Canonical folder roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderType {
    Inbox,
    Sent,
    Outbox,
    Drafts,
    Trash,
    Flagged,
}

impl FolderType {
    /// Display order of well-known folders.
    pub const WELLKNOWN_ORDER: [FolderType; 6] = [
        FolderType::Inbox,
        FolderType::Sent,
        FolderType::Outbox,
        FolderType::Drafts,
        FolderType::Trash,
        FolderType::Flagged,
    ];

    /// Role of a remote system label, by path.
    pub fn from_remote_path(path: &str) -> Option<FolderType> {
        match path {
            "INBOX" => Some(FolderType::Inbox),
            "SENT" => Some(FolderType::Sent),
            "DRAFT" => Some(FolderType::Drafts),
            "STARRED" => Some(FolderType::Flagged),
            "TRASH" => Some(FolderType::Trash),
            _ => None,
        }
    }

    pub fn order(self) -> usize {
        FolderType::WELLKNOWN_ORDER
            .iter()
            .position(|t| *t == self)
            .unwrap_or(FolderType::WELLKNOWN_ORDER.len())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FolderType::Inbox => "Inbox",
            FolderType::Sent => "Sent",
            FolderType::Outbox => "Outbox",
            FolderType::Drafts => "Drafts",
            FolderType::Trash => "Trash",
            FolderType::Flagged => "Flagged",
        }
    }
}

/// A folder as listed by the remote mail API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    pub name: String,
    pub path: String,
}

impl FolderInfo {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// A folder in the account. Messages are not persisted with the folder list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub folder_type: Option<FolderType>,
    #[serde(default)]
    pub wellknown: bool,
    #[serde(skip)]
    pub messages: Vec<Message>,
}

impl Folder {
    pub fn new(name: impl Into<String>, path: impl Into<String>, folder_type: Option<FolderType>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            folder_type,
            ..Default::default()
        }
    }

    pub fn message(&self, id: &crate::message_id::MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn message_mut(&mut self, id: &crate::message_id::MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }
}
