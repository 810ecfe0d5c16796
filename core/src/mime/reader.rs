/*
 * reader.rs
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

//! Raw RFC 822 bytes to [`MimeNode`] tree.
//!
//! [`MailParserReader`] uses mail-parser for entity boundaries and transfer decoding;
//! headers are re-read from the raw header block so that Content-Type and
//! Content-Disposition go through the same parameter parsing as API-supplied trees.
//! Every node keeps its exact raw bytes (needed for detached signature verification).

use mail_parser::{MessageParser, PartType};
use tracing::debug;

use super::node::MimeNode;
use crate::store::StoreError;

const MAX_DEPTH: usize = 64;

/// Turns raw message (or decrypted entity) bytes into a MIME tree.
pub trait RawMimeParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<MimeNode, StoreError>;
}

/// [`RawMimeParser`] backed by the mail-parser crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailParserReader;

impl RawMimeParser for MailParserReader {
    fn parse(&self, raw: &[u8]) -> Result<MimeNode, StoreError> {
        let message = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| StoreError::new("Could not parse MIME message"))?;
        if message.parts.is_empty() {
            return Err(StoreError::new("MIME message has no parts"));
        }
        let node = build_node(&message, raw, 0, String::new(), 0);
        debug!(mime_type = %node.mime_type, parts = node.parts.len(), "parsed raw MIME");
        Ok(node)
    }
}

fn build_node(
    message: &mail_parser::Message<'_>,
    raw: &[u8],
    index: usize,
    part_id: String,
    depth: usize,
) -> MimeNode {
    let part = match message.parts.get(index) {
        Some(p) => p,
        None => return MimeNode::new(part_id, "text/plain"),
    };
    let body_start = (part.offset_body as usize).min(raw.len());
    let header_start = (part.offset_header as usize).min(body_start);
    let end = (part.offset_end as usize).clamp(body_start, raw.len());

    let headers = parse_header_block(&raw[header_start..body_start]);
    let mut node = MimeNode::from_headers(part_id.clone(), headers);
    node.raw = Some(raw[header_start..end].to_vec());

    match &part.body {
        PartType::Multipart(children) if depth < MAX_DEPTH => {
            node.parts = children
                .iter()
                .enumerate()
                .map(|(i, &child)| {
                    build_node(message, raw, child as usize, child_part_id(&part_id, i + 1), depth + 1)
                })
                .collect();
        }
        PartType::Multipart(_) => {}
        _ => node.body.data = Some(part.contents().to_vec()),
    }
    node
}

fn child_part_id(parent: &str, n: usize) -> String {
    if parent.is_empty() {
        n.to_string()
    } else {
        format!("{}.{}", parent, n)
    }
}

/// Unfold and split an RFC 5322 header block into (name, value) pairs.
fn parse_header_block(block: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(block);
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            break;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::{classify, BodyPart, BodyPartKind};

    const SIGNED: &str = concat!(
        "From: alice@example.org\r\n",
        "To: bob@example.org\r\n",
        "Subject: signed\r\n",
        "MIME-Version: 1.0\r\n",
        "Content-Type: multipart/signed; micalg=pgp-sha256;\r\n",
        " protocol=\"application/pgp-signature\"; boundary=\"b1\"\r\n",
        "\r\n",
        "--b1\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "\r\n",
        "Hello Bob\r\n",
        "--b1\r\n",
        "Content-Type: application/pgp-signature; name=\"signature.asc\"\r\n",
        "\r\n",
        "-----BEGIN PGP SIGNATURE-----\r\n",
        "abc\r\n",
        "-----END PGP SIGNATURE-----\r\n",
        "--b1--\r\n",
    );

    #[test]
    fn header_block_unfolds_continuations() {
        let h = parse_header_block(b"Content-Type: multipart/mixed;\r\n\tboundary=x\r\nSubject: a\r\n\r\nbody");
        assert_eq!(h.len(), 2);
        assert_eq!(h[0].1, "multipart/mixed; boundary=x");
    }

    #[test]
    fn parses_signed_tree_with_raw_and_data() {
        let root = MailParserReader.parse(SIGNED.as_bytes()).unwrap();
        assert_eq!(root.mime_type, "multipart/signed");
        assert_eq!(root.parts.len(), 2);
        assert_eq!(root.parts[0].part_id, "1");
        assert_eq!(root.parts[1].mime_type, "application/pgp-signature");
        let signed_raw = root.parts[0].raw_text().unwrap();
        assert!(signed_raw.starts_with("Content-Type: text/plain"));
        assert!(signed_raw.contains("Hello Bob"));
        assert!(signed_raw.ends_with("Hello Bob"));

        let parts = classify(&root);
        assert_eq!(parts.len(), 1);
        match &parts[0] {
            BodyPart::Signed { signed_message, signature, content, .. } => {
                assert!(signed_message.as_deref().unwrap().contains("Hello Bob"));
                assert!(signature.as_deref().unwrap().contains("BEGIN PGP SIGNATURE"));
                assert_eq!(content[0].kind(), BodyPartKind::Text);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn single_part_binary_decodes_base64() {
        let raw = b"Subject: 0123456789ABCDEF\r\n\
Content-Type: application/x.encrypted-pgp-key; charset=us-ascii\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
AQIDBA==\r\n";
        let root = MailParserReader.parse(raw).unwrap();
        assert_eq!(root.mime_type, "application/x.encrypted-pgp-key");
        assert_eq!(root.body.data.as_deref(), Some(&[1u8, 2, 3, 4][..]));
    }
}
