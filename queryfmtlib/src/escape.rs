//! Escaping utilities for the delimiter-based and markup-based encodings.
//!
//! Three families live here, all pure functions:
//!
//! - **CSV quoting**: fields are quoted only when they need to be; internal
//!   quotes are doubled. The decoder is the exact inverse.
//! - **DSV escaping**: control characters, the backslash, and the separator
//!   itself become backslash escapes; fields are then joined with the raw
//!   separator. The decoder is the exact inverse.
//! - **XML text**: the five reserved characters are escaped; HTML character
//!   references in source values are decoded first so output is never
//!   double-encoded.

/// Quote a CSV field if it contains the separator, a double quote, or a
/// line break; otherwise return it bare. Internal quotes are doubled.
pub fn csv_field(field: &str, sep: char) -> String {
    let needs_quoting = field
        .chars()
        .any(|c| c == sep || c == '"' || c == '\n' || c == '\r');
    if !needs_quoting {
        return field.to_string();
    }

    let mut quoted = String::with_capacity(field.len() + 2);
    quoted.push('"');
    for c in field.chars() {
        if c == '"' {
            quoted.push('"');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Split one CSV record into its fields, undoing [`csv_field`] quoting.
///
/// The record may contain quoted fields with embedded separators, quotes,
/// and line breaks.
pub fn csv_split(record: &str, sep: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = record.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == sep {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }

    fields.push(current);
    fields
}

/// Escape one DSV field: `\n \r \t`, backspace, form feed, the backslash,
/// and the separator character all become backslash escapes.
pub fn dsv_escape(field: &str, sep: char) -> String {
    let mut escaped = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{0008}' => escaped.push_str("\\b"),
            '\u{000C}' => escaped.push_str("\\f"),
            c if c == sep => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Undo [`dsv_escape`]. Unknown escape sequences are kept verbatim.
pub fn dsv_unescape(field: &str, sep: char) -> String {
    let mut unescaped = String::with_capacity(field.len());
    let mut chars = field.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => unescaped.push('\\'),
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some('t') => unescaped.push('\t'),
            Some('b') => unescaped.push('\u{0008}'),
            Some('f') => unescaped.push('\u{000C}'),
            Some(c) if c == sep => unescaped.push(c),
            Some(c) => {
                unescaped.push('\\');
                unescaped.push(c);
            }
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

/// Escape the five XML-reserved characters in element content.
pub fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Decode HTML character references (named, decimal, hexadecimal) to raw
/// UTF-8. Applied to source values before XML output so escaping them
/// again does not double-encode.
pub fn decode_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        rest = &rest[start..];

        // A real reference terminates within a few characters
        let end = rest
            .char_indices()
            .take(12)
            .find(|&(_, c)| c == ';')
            .map(|(i, _)| i);
        let Some(end) = end else {
            decoded.push('&');
            rest = &rest[1..];
            continue;
        };

        let name = &rest[1..end];
        let replacement = match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            _ => decode_numeric_entity(name),
        };

        match replacement {
            Some(c) => {
                decoded.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

/// Decode `#123` / `#x1F` style numeric references.
fn decode_numeric_entity(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse().ok()?
    };
    char::from_u32(code)
}
