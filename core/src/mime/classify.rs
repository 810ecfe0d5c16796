/*
 * classify.rs
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

//! Body-part classification: depth-first walk of a [`MimeNode`] tree.
//!
//! At each node the matchers are tried in priority order (encrypted, signed,
//! attachment, text, html). The first match emits one [`BodyPart`] and the node's
//! children are not visited; with no match the walk descends into the children in order.
//! A `multipart/encrypted` node with fewer than two children does not match and is
//! walked like any other container.

use super::body_part::{AttachmentPart, BodyPart};
use super::node::MimeNode;

const DEFAULT_ATTACHMENT_NAME: &str = "attachment";
const DEFAULT_ATTACHMENT_TYPE: &str = "application/octet-stream";

struct Matcher {
    matches: fn(&MimeNode) -> bool,
    build: fn(&MimeNode) -> BodyPart,
}

const MATCHERS: [Matcher; 5] = [
    Matcher {
        matches: is_encrypted,
        build: build_encrypted,
    },
    Matcher {
        matches: is_signed,
        build: build_signed,
    },
    Matcher {
        matches: is_attachment,
        build: build_attachment,
    },
    Matcher {
        matches: is_text,
        build: build_text,
    },
    Matcher {
        matches: is_html,
        build: build_html,
    },
];

/// Classify a MIME tree into body parts, in DFS pre-order.
pub fn classify(root: &MimeNode) -> Vec<BodyPart> {
    let mut out = Vec::new();
    walk(root, &mut out);
    out
}

fn walk(node: &MimeNode, out: &mut Vec<BodyPart>) {
    if let Some(m) = MATCHERS.iter().find(|m| (m.matches)(node)) {
        out.push((m.build)(node));
        return;
    }
    for child in &node.parts {
        walk(child, out);
    }
}

/// multipart/encrypted
/// |-- application/pgp-encrypted
/// |-- application/octet-stream  (ciphertext)
fn is_encrypted(node: &MimeNode) -> bool {
    node.is_type("multipart/encrypted") && node.parts.len() >= 2
}

fn build_encrypted(node: &MimeNode) -> BodyPart {
    let ciphertext = &node.parts[1];
    BodyPart::Encrypted {
        part_number: node.part_id.clone(),
        attachment_id: ciphertext.body.attachment_id.clone(),
        content: ciphertext.text(),
        pgp_inline: false,
    }
}

/// multipart/signed
/// |-- (signed sub-tree)
/// |-- application/pgp-signature
fn is_signed(node: &MimeNode) -> bool {
    node.is_type("multipart/signed")
        && node.parts.len() >= 2
        && node.parts[1].is_type("application/pgp-signature")
}

fn build_signed(node: &MimeNode) -> BodyPart {
    let signed = &node.parts[0];
    BodyPart::Signed {
        part_number: node.part_id.clone(),
        signed_message: signed.raw_text(),
        signature: node.parts[1].text(),
        content: classify(signed),
    }
}

fn is_attachment(node: &MimeNode) -> bool {
    if node.is_type("text/") {
        node.is_attachment_disposition()
    } else {
        !node.is_type("multipart/")
    }
}

fn build_attachment(node: &MimeNode) -> BodyPart {
    let filename = node
        .disposition_parameters
        .get("filename")
        .or_else(|| node.parameters.get("name"))
        .filter(|f| !f.is_empty())
        .cloned()
        .unwrap_or_else(|| DEFAULT_ATTACHMENT_NAME.to_string());
    let mime_type = if node.mime_type.is_empty() {
        DEFAULT_ATTACHMENT_TYPE.to_string()
    } else {
        node.mime_type.clone()
    };
    BodyPart::Attachment(AttachmentPart {
        part_number: node.part_id.clone(),
        mime_type,
        filename,
        id: node.content_id.clone(),
        attachment_id: node.body.attachment_id.clone(),
        content: node.body.data.clone(),
    })
}

fn is_text(node: &MimeNode) -> bool {
    node.is_type("text/plain") && !node.is_attachment_disposition()
}

fn build_text(node: &MimeNode) -> BodyPart {
    BodyPart::Text {
        part_number: node.part_id.clone(),
        content: node.text(),
    }
}

fn is_html(node: &MimeNode) -> bool {
    node.is_type("text/html") && !node.is_attachment_disposition()
}

fn build_html(node: &MimeNode) -> BodyPart {
    BodyPart::Html {
        part_number: node.part_id.clone(),
        content: node.text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::BodyPartKind;

    fn encrypted_tree() -> MimeNode {
        MimeNode::new("0", "multipart/encrypted").with_parts(vec![
            MimeNode::new("1", "application/pgp-encrypted").with_data("Version: 1"),
            MimeNode::new("2", "application/octet-stream").with_attachment_id("ANGjdJ8x"),
        ])
    }

    #[test]
    fn encrypted_node_yields_single_part() {
        let parts = classify(&encrypted_tree());
        assert_eq!(
            parts,
            vec![BodyPart::Encrypted {
                part_number: "0".into(),
                attachment_id: Some("ANGjdJ8x".into()),
                content: None,
                pgp_inline: false,
            }]
        );
    }

    #[test]
    fn encrypted_with_one_child_falls_through() {
        let node = MimeNode::new("0", "Multipart/Encrypted")
            .with_parts(vec![MimeNode::new("1", "application/pgp-encrypted")]);
        let parts = classify(&node);
        assert_eq!(parts.len(), 1);
        match &parts[0] {
            BodyPart::Attachment(a) => {
                assert_eq!(a.mime_type, "application/pgp-encrypted");
                assert_eq!(a.filename, "attachment");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn signed_requires_pgp_signature_second_child() {
        let node = MimeNode::new("0", "multipart/signed").with_parts(vec![
            MimeNode::new("1", "text/plain").with_data("hi"),
            MimeNode::new("2", "application/pgp-signature").with_data("SIG"),
        ]);
        match &classify(&node)[0] {
            BodyPart::Signed { signature, content, .. } => {
                assert_eq!(signature.as_deref(), Some("SIG"));
                assert_eq!(content.len(), 1);
                assert_eq!(content[0].kind(), BodyPartKind::Text);
            }
            other => panic!("unexpected {:?}", other),
        }

        let not_pgp = MimeNode::new("0", "multipart/signed").with_parts(vec![
            MimeNode::new("1", "text/plain"),
            MimeNode::new("2", "application/pkcs7-signature"),
        ]);
        let kinds: Vec<_> = classify(&not_pgp).iter().map(BodyPart::kind).collect();
        assert_eq!(kinds, vec![BodyPartKind::Text, BodyPartKind::Attachment]);
    }

    #[test]
    fn mixed_tree_in_dfs_order() {
        let root = MimeNode::new("0", "multipart/mixed").with_parts(vec![
            MimeNode::new("1", "multipart/alternative").with_parts(vec![
                MimeNode::new("1.1", "text/plain"),
                MimeNode::new("1.2", "text/html"),
            ]),
            MimeNode::new("2", "text/plain").with_disposition("attachment", Some("notes.txt")),
            MimeNode::new("3", "image/png").with_content_id("<logo@x>"),
        ]);
        let parts = classify(&root);
        let numbers: Vec<_> = parts.iter().map(BodyPart::part_number).collect();
        assert_eq!(numbers, vec!["1.1", "1.2", "2", "3"]);
        let kinds: Vec<_> = parts.iter().map(BodyPart::kind).collect();
        assert_eq!(
            kinds,
            vec![
                BodyPartKind::Text,
                BodyPartKind::Html,
                BodyPartKind::Attachment,
                BodyPartKind::Attachment
            ]
        );
        match &parts[2] {
            BodyPart::Attachment(a) => assert_eq!(a.filename, "notes.txt"),
            other => panic!("unexpected {:?}", other),
        }
        match &parts[3] {
            BodyPart::Attachment(a) => assert_eq!(a.id.as_deref(), Some("logo@x")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(classify(&root), parts);
    }

    #[test]
    fn filename_falls_back_to_content_type_name() {
        let mut node = MimeNode::new("1", "application/pdf");
        node.parameters.insert("name".into(), "invoice.pdf".into());
        match &classify(&node)[0] {
            BodyPart::Attachment(a) => assert_eq!(a.filename, "invoice.pdf"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(classify(&MimeNode::new("0", "multipart/mixed")).is_empty());
    }
}
