// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! CSV parsing for the raw wine catalog.
//!
//! Comma-delimited format with a mandatory header:
//! `vinho_id,rotulo,ano_colheita,tipo`. Labels may be double-quoted and
//! quoted labels may contain commas.

use crate::error::{VinumError, VinumResult};
use crate::wine::types::{WineKind, WineRecord};

/// Expected header of the wine catalog.
pub const WINE_CSV_HEADER: &str = "vinho_id,rotulo,ano_colheita,tipo";

/// Parses wine catalog content into records.
///
/// ## Input
/// - `content`: CSV bytes (comma-delimited, header required unless empty)
/// - `file`: file name for error reporting
///
/// ## Output
/// - `Result<Vec<WineRecord>>`: parsed records (header excluded)
///
/// ## Error Conditions
/// - CsvError: malformed UTF-8, wrong header, wrong column count
/// - InvalidRecord: field violating a model invariant
pub fn parse_wine_csv(content: &[u8], file: &str) -> VinumResult<Vec<WineRecord>> {
    // Validate UTF-8
    let text = std::str::from_utf8(content).map_err(|e| VinumError::CsvError {
        file: file.to_string(),
        line: 0,
        reason: format!("invalid UTF-8: {}", e),
    })?;

    let mut records = Vec::new();
    let mut saw_header = false;

    for (line_num, line) in text.lines().enumerate() {
        let trimmed = line.trim();

        // Skip empty lines
        if trimmed.is_empty() {
            continue;
        }

        if !saw_header {
            if trimmed != WINE_CSV_HEADER {
                return Err(VinumError::CsvError {
                    file: file.to_string(),
                    line: line_num + 1,
                    reason: format!(
                        "expected header '{}', got '{}'",
                        WINE_CSV_HEADER, trimmed
                    ),
                });
            }
            saw_header = true;
            continue;
        }

        let record = parse_wine_row(trimmed, file, line_num + 1)?;
        records.push(record);
    }

    Ok(records)
}

/// Parses a single catalog row.
///
/// ## Input
/// - `line`: CSV line (comma-delimited, label optionally quoted)
/// - `file`: file name for error reporting
/// - `line_num`: line number for error reporting
pub fn parse_wine_row(line: &str, file: &str, line_num: usize) -> VinumResult<WineRecord> {
    let fields = split_fields(line);

    if fields.len() != 4 {
        return Err(VinumError::CsvError {
            file: file.to_string(),
            line: line_num,
            reason: format!("expected 4 columns, got {}", fields.len()),
        });
    }

    let wine_id: i32 = fields[0].trim().parse().map_err(|_| VinumError::CsvError {
        file: file.to_string(),
        line: line_num,
        reason: format!("vinho_id is not an integer: '{}'", fields[0]),
    })?;

    let harvest_year: i32 = fields[2].trim().parse().map_err(|_| VinumError::CsvError {
        file: file.to_string(),
        line: line_num,
        reason: format!("ano_colheita is not an integer: '{}'", fields[2]),
    })?;

    let kind = WineKind::parse(&fields[3])?;

    WineRecord::new(wine_id, fields[1].trim(), harvest_year, kind)
}

/// Split a CSV line on commas, honouring double-quoted fields.
///
/// A doubled quote inside a quoted field (`""`) yields a literal quote.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}
