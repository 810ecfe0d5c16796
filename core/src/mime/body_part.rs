/*
 * body_part.rs
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

//! Classified body parts.

/// Discriminant of [`BodyPart`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPartKind {
    Encrypted,
    Signed,
    Text,
    Html,
    Attachment,
}

/// Attachment body part. Also the element type of `Message::attachments`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentPart {
    pub part_number: String,
    pub mime_type: String,
    pub filename: String,
    /// Content-ID without angle brackets, used for `cid:` references.
    pub id: Option<String>,
    pub attachment_id: Option<String>,
    /// Decoded bytes once fetched.
    pub content: Option<Vec<u8>>,
}

/// One semantic unit of a message, produced by [`classify`](super::classify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyPart {
    Encrypted {
        part_number: String,
        attachment_id: Option<String>,
        /// Armored ciphertext once fetched.
        content: Option<String>,
        /// Synthesized from an armored block found in a plain-text body; not MIME.
        pgp_inline: bool,
    },
    Signed {
        part_number: String,
        signed_message: Option<String>,
        signature: Option<String>,
        content: Vec<BodyPart>,
    },
    Text {
        part_number: String,
        content: Option<String>,
    },
    Html {
        part_number: String,
        content: Option<String>,
    },
    Attachment(AttachmentPart),
}

impl BodyPart {
    pub fn kind(&self) -> BodyPartKind {
        match self {
            BodyPart::Encrypted { .. } => BodyPartKind::Encrypted,
            BodyPart::Signed { .. } => BodyPartKind::Signed,
            BodyPart::Text { .. } => BodyPartKind::Text,
            BodyPart::Html { .. } => BodyPartKind::Html,
            BodyPart::Attachment(_) => BodyPartKind::Attachment,
        }
    }

    pub fn part_number(&self) -> &str {
        match self {
            BodyPart::Encrypted { part_number, .. }
            | BodyPart::Signed { part_number, .. }
            | BodyPart::Text { part_number, .. }
            | BodyPart::Html { part_number, .. } => part_number,
            BodyPart::Attachment(a) => &a.part_number,
        }
    }

    /// Text content of a Text, Html or Encrypted part.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            BodyPart::Text { content, .. }
            | BodyPart::Html { content, .. }
            | BodyPart::Encrypted { content, .. } => content.as_deref(),
            _ => None,
        }
    }

    /// Synthetic encrypted part for an armored PGP/INLINE block.
    pub fn pgp_inline(armored: impl Into<String>) -> Self {
        BodyPart::Encrypted {
            part_number: String::new(),
            attachment_id: None,
            content: Some(armored.into()),
            pgp_inline: true,
        }
    }
}

/// Collect parts of `kind` in order, descending into Signed content when a Signed part
/// is not itself what is being collected.
pub fn filter_body_parts(parts: &[BodyPart], kind: BodyPartKind) -> Vec<&BodyPart> {
    let mut out = Vec::new();
    collect(parts, kind, &mut out);
    out
}

fn collect<'a>(parts: &'a [BodyPart], kind: BodyPartKind, out: &mut Vec<&'a BodyPart>) {
    for part in parts {
        if part.kind() == kind {
            out.push(part);
        } else if let BodyPart::Signed { content, .. } = part {
            collect(content, kind, out);
        }
    }
}

/// Join the contents of all Text (or Html) parts with `\n`.
pub fn joined_text(parts: &[BodyPart], kind: BodyPartKind) -> String {
    filter_body_parts(parts, kind)
        .into_iter()
        .filter_map(BodyPart::text_content)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Attachments in order, cloned.
pub fn attachments(parts: &[BodyPart]) -> Vec<AttachmentPart> {
    filter_body_parts(parts, BodyPartKind::Attachment)
        .into_iter()
        .filter_map(|p| match p {
            BodyPart::Attachment(a) => Some(a.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(n: &str, c: &str) -> BodyPart {
        BodyPart::Text {
            part_number: n.to_string(),
            content: Some(c.to_string()),
        }
    }

    #[test]
    fn filter_descends_into_signed_content() {
        let parts = vec![
            text("1", "outer"),
            BodyPart::Signed {
                part_number: "2".into(),
                signed_message: None,
                signature: None,
                content: vec![text("2.1", "inner")],
            },
        ];
        let texts = filter_body_parts(&parts, BodyPartKind::Text);
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[1].part_number(), "2.1");
        assert_eq!(joined_text(&parts, BodyPartKind::Text), "outer\ninner");
        assert_eq!(filter_body_parts(&parts, BodyPartKind::Signed).len(), 1);
    }

    #[test]
    fn pgp_inline_part_is_encrypted() {
        let p = BodyPart::pgp_inline("-----BEGIN PGP MESSAGE-----");
        assert_eq!(p.kind(), BodyPartKind::Encrypted);
        assert_eq!(p.text_content(), Some("-----BEGIN PGP MESSAGE-----"));
    }
}
