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

//! Store abstraction: errors, folders, messages and the remote MailTransport.

mod error;
mod folder;
mod message;
mod transport;

pub use error::StoreError;
pub use folder::{Folder, FolderInfo, FolderType};
pub use message::{Address, Envelope, Message, ProcessingState, RemoteMessage};
pub use transport::{with_auth_retry, MailTransport};
