/*
 * lib.rs
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

//! Sigillo core: the encrypted-mail processing layer behind the webmail UI.
//!
//! - [`mime`]: MIME node tree, body-part classification, raw RFC 822 reader.
//! - [`keysync`]: private key backup through a hidden remote mailbox folder.
//! - [`keychain`]: local-first public key resolution and consent-gated rotation.
//! - [`pipeline`]: body fetch, PGP decrypt/verify, materialization.
//! - [`account`]: online/offline session state and folder reconciliation.
//!
//! Remote mail transport, PGP primitives and user dialogs are collaborators
//! supplied by the host through the traits in [`store`], [`crypto`] and [`keychain`].

pub mod account;
pub mod config;
pub mod crypto;
pub mod keychain;
pub mod keysync;
pub mod localstorage;
pub mod message_id;
pub mod mime;
pub mod pipeline;
pub mod store;
