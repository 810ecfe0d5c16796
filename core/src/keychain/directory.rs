/*
 * directory.rs
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

//! Remote public key directory (key server) and HKP URL helpers.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::record::KeyRecord;
use crate::store::StoreError;

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Key server access. A key that was deleted or never existed is `Ok(None)`;
/// an unreachable server is `Err(StoreError::Offline)`.
#[async_trait]
pub trait KeyDirectory: Send + Sync {
    async fn get(&self, key_id: &str) -> Result<Option<KeyRecord>, StoreError>;

    async fn get_by_user_id(&self, user_id: &str) -> Result<Option<KeyRecord>, StoreError>;

    async fn put(&self, key: &KeyRecord) -> Result<(), StoreError>;
}

/// `<hkp>/pks/lookup?op=index&search=<query>`.
pub fn hkp_index_url(hkp_url: &str, query: &str) -> String {
    format!(
        "{}/pks/lookup?op=index&search={}",
        hkp_url.trim_end_matches('/'),
        utf8_percent_encode(query, URI_COMPONENT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_url_encodes_like_uri_component() {
        assert_eq!(
            hkp_index_url("https://keyserver.ubuntu.com", "alice+test@example.org"),
            "https://keyserver.ubuntu.com/pks/lookup?op=index&search=alice%2Btest%40example.org"
        );
        assert_eq!(
            hkp_index_url("https://keys.example/", "Bob (work)"),
            "https://keys.example/pks/lookup?op=index&search=Bob%20(work)"
        );
    }
}
