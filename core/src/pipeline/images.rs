/*
 * images.rs
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

//! `cid:` image references rewritten to data URIs from the message's own attachments.

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::{Captures, Regex};

use crate::mime::{strip_angle_brackets, AttachmentPart};

fn cid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(<img[^>]+\bsrc=['"])cid:([^'">]+)(['"])"#).expect("valid cid regex")
    })
}

/// Replace each `<img src="cid:...">` with a base64 data URI of the attachment whose
/// content id matches. References without loaded content get an empty `src`.
pub fn inline_images(html: &str, attachments: &[AttachmentPart]) -> String {
    cid_regex()
        .replace_all(html, |caps: &Captures<'_>| {
            let cid = strip_angle_brackets(&caps[2]);
            let local_src = attachments
                .iter()
                .find(|a| a.id.as_deref() == Some(cid))
                .and_then(|a| a.content.as_deref())
                .map(|bytes| format!("data:application/octet-stream;base64,{}", STANDARD.encode(bytes)))
                .unwrap_or_default();
            format!("{}{}{}", &caps[1], local_src, &caps[3])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, content: Option<&[u8]>) -> AttachmentPart {
        AttachmentPart {
            part_number: "2".into(),
            mime_type: "image/png".into(),
            filename: "logo.png".into(),
            id: Some(id.into()),
            attachment_id: None,
            content: content.map(<[u8]>::to_vec),
        }
    }

    #[test]
    fn rewrites_known_cid() {
        let html = r#"<p><img alt="x" src="cid:logo@example">"#;
        let out = inline_images(html, &[image("logo@example", Some(&[1, 2, 3]))]);
        assert_eq!(out, r#"<p><img alt="x" src="data:application/octet-stream;base64,AQID">"#);
    }

    #[test]
    fn unknown_or_unloaded_cid_becomes_empty() {
        let html = "<IMG class=a SRC='cid:missing'><img src=\"cid:logo@example\">";
        let out = inline_images(html, &[image("logo@example", None)]);
        assert_eq!(out, "<IMG class=a SRC=''><img src=\"\">");
    }

    #[test]
    fn other_sources_untouched() {
        let html = r#"<img src="https://example.org/a.png">"#;
        assert_eq!(inline_images(html, &[]), html);
    }
}
