/*
 * inline.rs
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

//! Armored blocks inside plain-text bodies: PGP/INLINE messages and cleartext signatures.
//! PGP messages are found with either line ending; cleartext signatures expect LF.

use std::sync::OnceLock;

use regex::Regex;

fn pgp_message_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?imR)^-{5}BEGIN PGP MESSAGE-{5}[\s\S]*-{5}END PGP MESSAGE-{5}$")
            .expect("valid PGP message regex")
    })
}

fn clear_signed_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?im)^-{5}BEGIN PGP SIGNED MESSAGE-{5}\nHash:[ ][^\n]+\n(?:[A-Za-z]+:[ ][^\n]+\n)*\n",
            r"([\s\S]*?)\n-{5}BEGIN PGP SIGNATURE-{5}[\S\s]*-{5}END PGP SIGNATURE-{5}$",
        ))
        .expect("valid clear-signed regex")
    })
}

fn dash_escape_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^- ").expect("valid dash escape regex"))
}

/// The armored PGP message block in `body`, verbatim.
pub fn find_pgp_message(body: &str) -> Option<&str> {
    pgp_message_regex().find(body).map(|m| m.as_str())
}

/// A cleartext-signed block found in a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearSigned<'a> {
    /// The whole block, header to signature trailer, for verification.
    pub block: &'a str,
    /// Signed text with dash-escaping removed.
    pub text: String,
}

pub fn find_clear_signed(body: &str) -> Option<ClearSigned<'_>> {
    let caps = clear_signed_regex().captures(body)?;
    let block = caps.get(0)?.as_str();
    let text = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    Some(ClearSigned {
        block,
        text: unescape_dashes(text),
    })
}

/// Undo RFC 4880 dash-escaping ("- " at line start).
pub fn unescape_dashes(text: &str) -> String {
    dash_escape_regex().replace_all(text, "").into_owned()
}
