/*
 * content_type.rs
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

//! Content-Type header (RFC 2045), with RFC 2231 extended parameter values.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

use super::parameter::{parameter_map, Parameter};
use super::utils::is_token;

#[derive(Debug, Clone)]
pub struct ContentType {
    primary_type: String,
    sub_type: String,
    parameter_map: HashMap<String, String>,
}

impl ContentType {
    pub fn new(
        primary_type: impl Into<String>,
        sub_type: impl Into<String>,
        parameters: Option<Vec<Parameter>>,
    ) -> Self {
        Self {
            primary_type: primary_type.into(),
            sub_type: sub_type.into(),
            parameter_map: parameter_map(parameters),
        }
    }

    /// `primary/sub`, lower-cased.
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.primary_type, self.sub_type).to_ascii_lowercase()
    }

    pub fn is_mime_type(&self, primary: &str, sub: &str) -> bool {
        self.primary_type.eq_ignore_ascii_case(primary) && self.sub_type.eq_ignore_ascii_case(sub)
    }

    pub fn get_parameter(&self, name: &str) -> Option<&str> {
        self.parameter_map.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn into_parameters(self) -> HashMap<String, String> {
        self.parameter_map
    }
}

/// Parse Content-Type header value. `None` when the value has no valid `type/subtype`.
pub fn parse_content_type(value: &str) -> Option<ContentType> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let (type_part, params_part) = split_parameters(value);
    let slash = type_part.find('/')?;
    let primary = type_part[..slash].trim();
    let sub = type_part[slash + 1..].trim();
    if !is_token(primary) || !is_token(sub) {
        return None;
    }
    Some(ContentType::new(primary, sub, parse_parameter_list(params_part)))
}

pub(crate) fn split_parameters(value: &str) -> (&str, &str) {
    match value.find(';') {
        Some(i) => (value[..i].trim(), value[i + 1..].trim()),
        None => (value, ""),
    }
}

/// Parse semicolon-separated parameter list (name=value; name="value"; name*=charset''pct-value).
/// Malformed entries are skipped; what parsed before them is kept.
pub fn parse_parameter_list(params_part: &str) -> Option<Vec<Parameter>> {
    let params_part = params_part.trim();
    if params_part.is_empty() {
        return None;
    }
    let mut parameters = Vec::new();
    let mut pos = 0;
    let bytes = params_part.as_bytes();
    let len = bytes.len();
    while pos < len {
        while pos < len && (bytes[pos] == b';' || bytes[pos].is_ascii_whitespace()) {
            pos += 1;
        }
        if pos >= len {
            break;
        }
        let eq_abs = match bytes[pos..].iter().position(|&b| b == b'=') {
            Some(eq) => pos + eq,
            None => break,
        };
        let name = match std::str::from_utf8(&bytes[pos..eq_abs]) {
            Ok(n) => n.trim(),
            Err(_) => break,
        };
        if !is_token(name) {
            match bytes[pos..].iter().position(|&b| b == b';') {
                Some(semi) => {
                    pos += semi + 1;
                    continue;
                }
                None => break,
            }
        }
        pos = eq_abs + 1;
        while pos < len && bytes[pos] == b' ' {
            pos += 1;
        }
        let value = if pos < len && bytes[pos] == b'"' {
            pos += 1;
            let mut v = Vec::new();
            while pos < len {
                let c = bytes[pos];
                if c == b'\\' && pos + 1 < len {
                    v.push(bytes[pos + 1]);
                    pos += 2;
                } else if c == b'"' {
                    pos += 1;
                    break;
                } else {
                    v.push(c);
                    pos += 1;
                }
            }
            String::from_utf8_lossy(&v).into_owned()
        } else {
            let end = bytes[pos..].iter().position(|&b| b == b';').map(|i| pos + i).unwrap_or(len);
            let v = String::from_utf8_lossy(&bytes[pos..end]).trim().to_string();
            pos = end;
            if !is_token(&v) {
                continue;
            }
            v
        };
        match name.strip_suffix('*') {
            Some(base) => parameters.push(Parameter::new(base, decode_extended_value(&value))),
            None => parameters.push(Parameter::new(name, value)),
        }
    }
    if parameters.is_empty() {
        None
    } else {
        Some(parameters)
    }
}

/// RFC 2231 `charset'language'percent-encoded`. Only UTF-8 and ASCII charsets are decoded faithfully.
fn decode_extended_value(value: &str) -> String {
    let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value);
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}
