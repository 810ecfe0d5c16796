/*
 * config.rs
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

//! Core configuration: crypto sizes, key server, key sync folder, outbox, dialog strings.
//!
//! Stored as ~/.sigillo/config.xml. All XML read/write uses the quick_xml parser/writer.
//! A missing file yields the defaults; unknown elements are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

/// Core settings. `Default` gives the production values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// HKP key server base URL.
    pub hkp_url: String,
    /// Symmetric key size in bits (key backup).
    pub sym_key_size: usize,
    /// Symmetric IV size in bits (key backup).
    pub sym_iv_size: usize,
    /// RSA key size for generated key pairs.
    pub asym_key_size: usize,
    pub pbkdf2_iterations: u32,
    /// Hidden remote folder holding the private key backup.
    pub keys_folder: String,
    /// MIME type of the key backup message body.
    pub key_mime_type: String,
    pub outbox_path: String,
    pub outbox_name: String,
    pub strings: DialogStrings,
}

/// Texts for the key update consent dialog. `{0}` is replaced by the user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogStrings {
    pub update_public_key_title: String,
    pub update_public_key_message_new: String,
    pub update_public_key_message_removed: String,
    pub update_public_key_pos_button: String,
    pub update_public_key_neg_button: String,
}

impl Default for DialogStrings {
    fn default() -> Self {
        Self {
            update_public_key_title: "Public Key Updated".to_string(),
            update_public_key_message_new: "{0} updated their key and may not be able to read encrypted messages sent with their old key. Update the key?".to_string(),
            update_public_key_message_removed: "{0} revoked their key and may no longer be able to read encrypted messages. Remove the key?".to_string(),
            update_public_key_pos_button: "Yes".to_string(),
            update_public_key_neg_button: "No".to_string(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            hkp_url: "https://keyserver.ubuntu.com".to_string(),
            sym_key_size: 256,
            sym_iv_size: 96,
            asym_key_size: 2048,
            pbkdf2_iterations: crate::crypto::PBKDF2_ITERATIONS,
            keys_folder: "openpgp_keys".to_string(),
            key_mime_type: "application/x.encrypted-pgp-key".to_string(),
            outbox_path: "OUTBOX".to_string(),
            outbox_name: "Outbox".to_string(),
            strings: DialogStrings::default(),
        }
    }
}

/// Default config directory: ~/.sigillo.
pub fn default_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from).map(|h| h.join(".sigillo"))
}

/// Default config path: ~/.sigillo/config.xml.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|d| d.join("config.xml"))
}

/// Load config; missing file gives defaults.
pub fn load_config(path: &Path) -> Result<CoreConfig, String> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CoreConfig::default()),
        Err(e) => return Err(e.to_string()),
    };
    parse_config_xml(&content)
}

/// Parse `<sigillo><hkp-url>..</hkp-url><sym-key-size>..</sym-key-size>...</sigillo>`.
pub fn parse_config_xml(content: &str) -> Result<CoreConfig, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut config = CoreConfig::default();
    let mut element_name = Vec::<u8>::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(format!("XML parse error: {}", e)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                element_name.clear();
                element_name.extend_from_slice(e.name().as_ref());
            }
            Ok(Event::Text(e)) => {
                if element_name.is_empty() {
                    continue;
                }
                let text = e.unescape().map_err(|e| e.to_string())?.trim().to_string();
                apply_setting(&mut config, &element_name, text)?;
                element_name.clear();
            }
            Ok(Event::End(_)) => element_name.clear(),
            _ => {}
        }
        buf.clear();
    }
    Ok(config)
}

fn apply_setting(config: &mut CoreConfig, name: &[u8], text: String) -> Result<(), String> {
    fn number<T: std::str::FromStr>(name: &[u8], text: &str) -> Result<T, String> {
        text.parse().map_err(|_| {
            format!("invalid value for {}: {}", String::from_utf8_lossy(name), text)
        })
    }
    match name {
        b"hkp-url" => config.hkp_url = text,
        b"sym-key-size" => config.sym_key_size = number(name, &text)?,
        b"sym-iv-size" => config.sym_iv_size = number(name, &text)?,
        b"asym-key-size" => config.asym_key_size = number(name, &text)?,
        b"pbkdf2-iterations" => config.pbkdf2_iterations = number(name, &text)?,
        b"keys-folder" => config.keys_folder = text,
        b"outbox-path" => config.outbox_path = text,
        b"outbox-name" => config.outbox_name = text,
        _ => {}
    }
    Ok(())
}

/// Write config as XML (dialog strings are not persisted).
pub fn save_config(path: &Path, config: &CoreConfig) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let bytes = config_xml_to_bytes(config)?;
    fs::write(path, bytes).map_err(|e| e.to_string())
}

fn config_xml_to_bytes(config: &CoreConfig) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    let mut writer = Writer::new(&mut out);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| e.to_string())?;
    writer
        .write_event(Event::Start(BytesStart::new("sigillo")))
        .map_err(|e| e.to_string())?;
    let entries = [
        ("hkp-url", config.hkp_url.clone()),
        ("sym-key-size", config.sym_key_size.to_string()),
        ("sym-iv-size", config.sym_iv_size.to_string()),
        ("asym-key-size", config.asym_key_size.to_string()),
        ("pbkdf2-iterations", config.pbkdf2_iterations.to_string()),
        ("keys-folder", config.keys_folder.clone()),
        ("outbox-path", config.outbox_path.clone()),
        ("outbox-name", config.outbox_name.clone()),
    ];
    for (name, value) in &entries {
        writer
            .write_event(Event::Start(BytesStart::new(*name)))
            .map_err(|e| e.to_string())?;
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(|e| e.to_string())?;
        writer
            .write_event(Event::End(BytesEnd::new(*name)))
            .map_err(|e| e.to_string())?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("sigillo")))
        .map_err(|e| e.to_string())?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_key_sync_protocol() {
        let c = CoreConfig::default();
        assert_eq!(c.sym_key_size / 8, crate::keysync::SALT_LEN);
        assert_eq!(c.sym_iv_size / 8, crate::keysync::IV_LEN);
        assert_eq!(c.keys_folder, "openpgp_keys");
        assert_eq!(c.outbox_path, "OUTBOX");
    }

    #[test]
    fn xml_overrides_and_roundtrip() {
        let c = parse_config_xml(
            "<?xml version=\"1.0\"?><sigillo><hkp-url>https://keys.example.org</hkp-url>\
             <pbkdf2-iterations>20000</pbkdf2-iterations><unknown>x</unknown></sigillo>",
        )
        .unwrap();
        assert_eq!(c.hkp_url, "https://keys.example.org");
        assert_eq!(c.pbkdf2_iterations, 20000);
        assert_eq!(c.sym_key_size, 256);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.xml");
        save_config(&path, &c).unwrap();
        assert_eq!(load_config(&path).unwrap(), c);
        assert_eq!(load_config(&dir.path().join("missing.xml")).unwrap(), CoreConfig::default());
    }

    #[test]
    fn bad_number_is_an_error() {
        assert!(parse_config_xml("<sigillo><sym-key-size>big</sym-key-size></sigillo>").is_err());
    }
}
