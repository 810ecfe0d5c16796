/*
 * state.rs
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

//! Account state owned by the session: busy counter, online flag, folders.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::store::Folder;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Waiting for the remote auth round trip.
    Connecting,
    Connected,
}

/// Only the session mutates this; everyone else reads through session accessors.
#[derive(Debug, Default)]
pub struct AccountState {
    pub(crate) busy: usize,
    pub(crate) online: bool,
    pub(crate) logging_in: bool,
    pub(crate) connection: ConnectionState,
    pub(crate) folders: Vec<Folder>,
}

impl AccountState {
    pub fn busy(&self) -> usize {
        self.busy
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn is_logging_in(&self) -> bool {
        self.logging_in
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub(crate) fn folder_mut(&mut self, path: &str) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.path == path)
    }
}

pub(crate) fn read_state(lock: &RwLock<AccountState>) -> RwLockReadGuard<'_, AccountState> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

pub(crate) fn write_state(lock: &RwLock<AccountState>) -> RwLockWriteGuard<'_, AccountState> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// Counts one in-flight remote operation for as long as it lives.
pub struct BusyGuard<'a> {
    state: &'a RwLock<AccountState>,
}

impl<'a> BusyGuard<'a> {
    pub fn new(state: &'a RwLock<AccountState>) -> Self {
        write_state(state).busy += 1;
        Self { state }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut s = write_state(self.state);
        s.busy = s.busy.saturating_sub(1);
    }
}
