/*
 * node.rs
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

//! MIME node tree as delivered by the mail API (structure + content handles)
//! or by the raw RFC 822 reader (structure + decoded bytes).

use std::collections::HashMap;

use super::content_disposition::parse_content_disposition;
use super::content_type::parse_content_type;
use super::utils::{starts_with_ignore_case, strip_angle_brackets};

/// Content of a node: a remote handle, inline decoded bytes, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeBody {
    /// Opaque handle for `MailTransport::get_attachment`.
    pub attachment_id: Option<String>,
    /// Decoded (transfer-encoding removed) body bytes, when already available.
    pub data: Option<Vec<u8>>,
}

/// One MIME entity. Read-only to the classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeNode {
    /// Path-like part identifier, e.g. `"1.2"`. Root is `""` or `"0"` depending on source.
    pub part_id: String,
    /// Lower-cased `type/subtype` (no parameters).
    pub mime_type: String,
    /// Lower-cased disposition type (`attachment`, `inline`), if any.
    pub disposition: Option<String>,
    pub disposition_parameters: HashMap<String, String>,
    /// Content-Type parameters, names lower-cased.
    pub parameters: HashMap<String, String>,
    /// Content-ID with angle brackets stripped.
    pub content_id: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: MimeBody,
    /// Exact raw bytes of the entity (headers and body) when parsed from raw RFC 822.
    pub raw: Option<Vec<u8>>,
    pub parts: Vec<MimeNode>,
}

impl MimeNode {
    pub fn new(part_id: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            part_id: part_id.into(),
            mime_type: mime_type.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// Build a node from its header list. Content-Type defaults to `text/plain` (RFC 2045 §5.2).
    pub fn from_headers(part_id: impl Into<String>, headers: Vec<(String, String)>) -> Self {
        let mut node = MimeNode::new(part_id, "text/plain");
        for (name, value) in &headers {
            if name.eq_ignore_ascii_case("content-type") {
                if let Some(ct) = parse_content_type(value) {
                    node.mime_type = ct.mime_type();
                    node.parameters = ct.into_parameters();
                }
            } else if name.eq_ignore_ascii_case("content-disposition") {
                if let Some(cd) = parse_content_disposition(value) {
                    let (kind, params) = cd.into_parts();
                    node.disposition = Some(kind);
                    node.disposition_parameters = params;
                }
            } else if name.eq_ignore_ascii_case("content-id") {
                let id = strip_angle_brackets(value);
                if !id.is_empty() {
                    node.content_id = Some(id.to_string());
                }
            }
        }
        node.headers = headers;
        node
    }

    pub fn with_parts(mut self, parts: Vec<MimeNode>) -> Self {
        self.parts = parts;
        self
    }

    pub fn with_attachment_id(mut self, attachment_id: impl Into<String>) -> Self {
        self.body.attachment_id = Some(attachment_id.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.body.data = Some(data.into());
        self
    }

    pub fn with_disposition(mut self, disposition: &str, filename: Option<&str>) -> Self {
        self.disposition = Some(disposition.to_ascii_lowercase());
        if let Some(f) = filename {
            self.disposition_parameters.insert("filename".to_string(), f.to_string());
        }
        self
    }

    pub fn with_content_id(mut self, content_id: &str) -> Self {
        self.content_id = Some(strip_angle_brackets(content_id).to_string());
        self
    }

    /// First header value with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_type(&self, prefix: &str) -> bool {
        starts_with_ignore_case(&self.mime_type, prefix)
    }

    pub fn is_attachment_disposition(&self) -> bool {
        self.disposition
            .as_deref()
            .map_or(false, |d| d.eq_ignore_ascii_case("attachment"))
    }

    /// Inline body as text (lossy UTF-8), if the bytes are present.
    pub fn text(&self) -> Option<String> {
        self.body
            .data
            .as_ref()
            .map(|d| String::from_utf8_lossy(d).into_owned())
    }

    /// Raw entity as text (lossy UTF-8), if the reader recorded it.
    pub fn raw_text(&self) -> Option<String> {
        self.raw
            .as_ref()
            .map(|d| String::from_utf8_lossy(d).into_owned())
    }
}
