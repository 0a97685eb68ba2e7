// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Command file parsing.
//!
//! ```text
//! FLH/3          <- header: tree degree (max keys per node)
//! INC:2018       <- insert all wines harvested in 2018
//! BUS=:2018      <- find all wines harvested in 2018
//! ```
//!
//! Blank lines are skipped. Anything else is an error naming the line.

use crate::error::{VinumError, VinumResult};

/// One executable command of a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `INC:<k>` — insert every source wine with harvest year `k`.
    Insert(i32),

    /// `BUS=:<k>` — retrieve every stored wine with harvest year `k`.
    Search(i32),
}

/// A parsed command file: the header's degree plus the command sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandScript {
    pub degree: u16,
    pub commands: Vec<Command>,
}

/// Parse a command file.
///
/// ## Input
/// - `content`: full command file text
///
/// ## Output
/// - `Ok(CommandScript)`: header degree and commands in file order
/// - `Err(VinumError::ParseError)`: missing or malformed header
/// - `Err(VinumError::InvalidCommand)`: unknown prefix or malformed key,
///   with the offending line number
pub fn parse_script(content: &str) -> VinumResult<CommandScript> {
    let mut lines = content.lines().enumerate();

    let (_, header) = lines.next().ok_or_else(|| VinumError::ParseError {
        reason: "command file is empty; expected FLH/<m> header".to_string(),
    })?;
    let degree = parse_header(header.trim())?;

    let mut commands = Vec::new();
    for (idx, line) in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        commands.push(parse_command(trimmed, idx + 1)?);
    }

    Ok(CommandScript { degree, commands })
}

fn parse_header(header: &str) -> VinumResult<u16> {
    let value = header
        .strip_prefix("FLH/")
        .ok_or_else(|| VinumError::ParseError {
            reason: format!("expected FLH/<m> header, got '{}'", header),
        })?;
    let degree: u16 = value.parse().map_err(|_| VinumError::ParseError {
        reason: format!("header degree is not an integer: '{}'", value),
    })?;
    if degree < 2 {
        return Err(VinumError::ParseError {
            reason: format!("header degree must be at least 2, got {}", degree),
        });
    }
    Ok(degree)
}

fn parse_command(line: &str, line_num: usize) -> VinumResult<Command> {
    if let Some(raw) = line.strip_prefix("INC:") {
        return Ok(Command::Insert(parse_key(raw, line_num)?));
    }
    if let Some(raw) = line.strip_prefix("BUS=:") {
        return Ok(Command::Search(parse_key(raw, line_num)?));
    }
    Err(VinumError::InvalidCommand {
        line: line_num,
        reason: format!("unknown prefix '{}'", line),
    })
}

fn parse_key(raw: &str, line_num: usize) -> VinumResult<i32> {
    raw.trim().parse().map_err(|_| VinumError::InvalidCommand {
        line: line_num,
        reason: format!("key is not an integer: '{}'", raw),
    })
}
