//! CSV encoding and decoding for count lines.
//!
//! The two directions are deliberately asymmetric: export emits strict,
//! canonical RFC 4180 output, while the import decoder is lenient so that
//! hand-edited catalog files never fail a whole run.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::CountLine;
use crate::time::to_rfc3339;

/// Delimiters the format supports. The encoder never auto-detects; callers
/// pick one explicitly. The import path accepts both at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
        }
    }
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "," | "comma" => Ok(Delimiter::Comma),
            ";" | "semicolon" => Ok(Delimiter::Semicolon),
            other => Err(format!("unsupported delimiter: {other:?}")),
        }
    }
}

/// Column sets the export format knows about. `Full` is canonical; `Compact`
/// is the legacy reduced variant. Ordering is part of the format contract and
/// must not change without a version bump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSet {
    #[default]
    Full,
    Compact,
}

impl ColumnSet {
    pub fn header(self) -> &'static [&'static str] {
        match self {
            ColumnSet::Full => &["ean", "name", "quantity", "location", "note", "updated_at"],
            ColumnSet::Compact => &["ean", "name", "quantity", "note"],
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeOptions {
    pub delimiter: Delimiter,
    pub columns: ColumnSet,
}

/// Both import delimiters, accepted together in the same file.
pub const IMPORT_DELIMITERS: &[char] = &[',', ';'];

fn needs_quoting(field: &str, delimiter: char) -> bool {
    field.contains(delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn push_field(out: &mut String, field: &str, delimiter: char) {
    if needs_quoting(field, delimiter) {
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// Encode one row, fields escaped independently, terminated with `\n`.
pub fn encode_row(fields: &[&str], delimiter: Delimiter) -> String {
    let delim = delimiter.as_char();
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(delim);
        }
        push_field(&mut out, field, delim);
    }
    out.push('\n');
    out
}

/// Encode records into canonical CSV text: header row plus one row per
/// record, every row (including the last) terminated with a single `\n`.
///
/// Quantity is emitted as bare decimal unless the general quoting rule forces
/// quotes; `updated_at` is rendered as RFC 3339 UTC. Byte-order marks are the
/// I/O collaborator's concern, never the codec's.
pub fn encode(lines: &[CountLine], opts: &EncodeOptions) -> String {
    let mut out = encode_row(opts.columns.header(), opts.delimiter);
    for line in lines {
        let quantity = line.quantity.to_string();
        let updated_at = to_rfc3339(line.updated_at);
        let fields: Vec<&str> = match opts.columns {
            ColumnSet::Full => vec![
                line.ean.as_str(),
                line.name.as_deref().unwrap_or(""),
                quantity.as_str(),
                line.location.as_deref().unwrap_or(""),
                line.note.as_deref().unwrap_or(""),
                updated_at.as_str(),
            ],
            ColumnSet::Compact => vec![
                line.ean.as_str(),
                line.name.as_deref().unwrap_or(""),
                quantity.as_str(),
                line.note.as_deref().unwrap_or(""),
            ],
        };
        out.push_str(&encode_row(&fields, opts.delimiter));
    }
    out
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    Unquoted,
    Quoted,
}

/// Lenient single-pass field scanner over one logical line.
///
/// A `"` toggles the quote state, except a doubled quote inside quotes which
/// emits one literal quote. Outside quotes any configured delimiter ends the
/// field. Malformed input (unterminated or stray quotes) never fails; the
/// remainder is kept as literal content. The trailing buffer is always
/// emitted, even when empty.
pub fn decode_line(line: &str, delimiters: &[char]) -> Vec<String> {
    let mut fields = Vec::new();
    let mut buf = String::new();
    let mut state = State::Unquoted;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if state == State::Quoted && chars.peek() == Some(&'"') {
                    buf.push('"');
                    chars.next();
                } else {
                    state = match state {
                        State::Unquoted => State::Quoted,
                        State::Quoted => State::Unquoted,
                    };
                }
            }
            c if state == State::Unquoted && delimiters.contains(&c) => {
                fields.push(std::mem::take(&mut buf));
            }
            c => buf.push(c),
        }
    }
    fields.push(buf);
    fields
}

/// Decode a whole CSV text into rows.
///
/// Logical lines are assembled with quote awareness, so quoted fields may
/// span physical lines. Blank and whitespace-only lines are skipped. No
/// header handling happens here; callers decide what row zero means.
pub fn decode(text: &str, delimiters: &[char]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for line in logical_lines(text) {
        if line.trim().is_empty() {
            continue;
        }
        rows.push(decode_line(&line, delimiters));
    }
    rows
}

/// Split on newlines that are not inside a quoted field. `\r\n` and bare
/// `\n` both terminate a line; a quoted `\n` stays part of the field.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut buf = String::new();
    let mut state = State::Unquoted;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if state == State::Quoted && chars.peek() == Some(&'"') {
                    buf.push_str("\"\"");
                    chars.next();
                } else {
                    state = match state {
                        State::Unquoted => State::Quoted,
                        State::Quoted => State::Unquoted,
                    };
                    buf.push('"');
                }
            }
            '\r' if state == State::Unquoted && chars.peek() == Some(&'\n') => {}
            '\n' if state == State::Unquoted => {
                lines.push(std::mem::take(&mut buf));
            }
            c => buf.push(c),
        }
    }
    if !buf.is_empty() {
        lines.push(buf);
    }
    lines
}
