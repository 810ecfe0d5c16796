/*
 * folders.rs
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

//! Folder list reconciliation: cached folders against the remote listing.

use std::collections::HashSet;

use crate::config::CoreConfig;
use crate::store::{Folder, FolderInfo, FolderType};

/// Reconcile `current` with the remote listing.
///
/// The local Outbox is added to the remote list and the key sync folder is left out.
/// Folders are matched by path: vanished ones are dropped, new ones appended, existing
/// ones keep their messages. Each well-known type gets exactly one `wellknown` folder
/// (the one already tagged, else the first of that type). Well-known folders come first
/// in canonical order, the rest sorted case-insensitively by path.
///
/// Returns the new list and whether it differs from `current`.
pub fn reconcile_folders(current: &[Folder], remote: &[FolderInfo], config: &CoreConfig) -> (Vec<Folder>, bool) {
    let mut remote_folders: Vec<Folder> = remote
        .iter()
        .filter(|info| info.name != config.keys_folder)
        .map(|info| Folder::new(&info.name, &info.path, FolderType::from_remote_path(&info.path)))
        .collect();
    remote_folders.push(Folder::new(
        &config.outbox_name,
        &config.outbox_path,
        Some(FolderType::Outbox),
    ));

    let mut changed = false;
    let remote_paths: HashSet<&str> = remote_folders.iter().map(|f| f.path.as_str()).collect();
    let mut folders: Vec<Folder> = current
        .iter()
        .filter(|f| remote_paths.contains(f.path.as_str()))
        .cloned()
        .collect();
    if folders.len() != current.len() {
        changed = true;
    }

    for remote_folder in remote_folders {
        match folders.iter_mut().find(|f| f.path == remote_folder.path) {
            Some(existing) => {
                if existing.folder_type != remote_folder.folder_type {
                    existing.folder_type = remote_folder.folder_type;
                    changed = true;
                }
            }
            None => {
                folders.push(remote_folder);
                changed = true;
            }
        }
    }

    for folder_type in FolderType::WELLKNOWN_ORDER {
        let chosen = folders
            .iter()
            .position(|f| f.folder_type == Some(folder_type) && f.wellknown)
            .or_else(|| folders.iter().position(|f| f.folder_type == Some(folder_type)));
        for (i, folder) in folders.iter_mut().enumerate() {
            let wellknown = folder.folder_type == Some(folder_type) && Some(i) == chosen;
            if folder.folder_type == Some(folder_type) && folder.wellknown != wellknown {
                folder.wellknown = wellknown;
                changed = true;
            }
        }
    }
    // a type no longer matching the folder invalidates its tag
    for folder in folders.iter_mut() {
        if folder.wellknown && folder.folder_type.is_none() {
            folder.wellknown = false;
            changed = true;
        }
    }

    let before: Vec<String> = folders.iter().map(|f| f.path.clone()).collect();
    folders.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    if !changed {
        changed = folders.iter().map(|f| &f.path).ne(before.iter());
    }
    (folders, changed)
}

fn sort_key(folder: &Folder) -> (usize, String) {
    match folder.folder_type {
        Some(t) if folder.wellknown => (t.order(), String::new()),
        _ => (FolderType::WELLKNOWN_ORDER.len(), folder.path.to_lowercase()),
    }
}
