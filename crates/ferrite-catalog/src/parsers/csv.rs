//! Parser for comma-separated catalogue exports.
//!
//! ```text
//! # optional comment lines
//! name,price,manufacturer,package,...
//! IRFB4110,3.10,Infineon,TO-220,...
//! "BSC070N10, rev B",1.45,Infineon,TDSON-8,...
//! ```
//!
//! The first non-comment line is the header and is skipped. Blank lines and
//! lines starting with `#` are ignored. Double-quoted fields may contain
//! commas; a doubled quote inside a quoted field is a literal quote.

use super::{CatalogRow, ParseError};

/// Parse catalogue rows from a string.
pub fn parse_csv(content: &str) -> Result<Vec<CatalogRow>, ParseError> {
    let mut rows = Vec::new();
    let mut header_seen = false;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }

        let cells = split_fields(trimmed).map_err(|message| ParseError::FormatError {
            line: line_no,
            message,
        })?;
        rows.push(CatalogRow {
            line: line_no,
            cells,
        });
    }

    if !header_seen {
        return Err(ParseError::FormatError {
            line: 1,
            message: "Catalog has no header line".into(),
        });
    }

    Ok(rows)
}

fn split_fields(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            ('"', false) if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            (',', false) => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(format!("Unterminated quoted field in '{}'", line));
    }
    fields.push(field.trim().to_string());
    Ok(fields)
}
