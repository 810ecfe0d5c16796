/*
 * mod.rs
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

//! MIME structure: node tree, header parameter parsing, body-part classification.

mod body_part;
mod classify;
mod content_disposition;
mod content_type;
mod node;
mod parameter;
mod reader;
mod utils;

pub use body_part::{attachments, filter_body_parts, joined_text, AttachmentPart, BodyPart, BodyPartKind};
pub use classify::classify;
pub use content_disposition::{parse_content_disposition, ContentDisposition};
pub use content_type::{parse_content_type, parse_parameter_list, ContentType};
pub use node::{MimeBody, MimeNode};
pub use parameter::Parameter;
pub use reader::{MailParserReader, RawMimeParser};
pub use utils::{is_token, is_token_char, starts_with_ignore_case, strip_angle_brackets};
