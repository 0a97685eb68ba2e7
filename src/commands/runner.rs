// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Script execution against the engine.
//!
//! Output mirrors the input: the echoed header, one `<command>/<count>`
//! line per command in order, and a final `H/<height>` line. A failing
//! command aborts the run before its output line is written.

use crate::commands::parser::{Command, CommandScript};
use crate::engine::Engine;
use crate::error::{VinumError, VinumResult};
use crate::wine::WineSource;
use log::info;
use std::io::Write;

/// Execute a parsed script, writing the result lines to `out`.
///
/// ## Input
/// - `engine`: initialised engine (its index degree matches the header)
/// - `source`: sorted wine catalog answering `INC` lookups
/// - `script`: parsed command file
/// - `out`: output sink (the out-file, or a buffer in tests)
pub fn run_script(
    engine: &mut Engine,
    source: &mut WineSource,
    script: &CommandScript,
    out: &mut dyn Write,
) -> VinumResult<()> {
    write_line(out, &format!("FLH/{}", script.degree))?;

    for command in &script.commands {
        match *command {
            Command::Insert(year) => {
                let wines = source.lookup_by_harvest_year(year)?;
                for wine in &wines {
                    engine.insert(wine)?;
                }
                info!("INC:{} inserted {} wine(s)", year, wines.len());
                write_line(out, &format!("INC:{}/{}", year, wines.len()))?;
            }
            Command::Search(year) => {
                let found = engine.search(year)?;
                info!("BUS=:{} found {} wine(s)", year, found.len());
                write_line(out, &format!("BUS=:{}/{}", year, found.len()))?;
            }
        }
    }

    write_line(out, &format!("H/{}", engine.height()))?;
    out.flush().map_err(|e| VinumError::IoError {
        operation: "flush_output".to_string(),
        reason: e.to_string(),
    })
}

fn write_line(out: &mut dyn Write, line: &str) -> VinumResult<()> {
    writeln!(out, "{}", line).map_err(|e| VinumError::IoError {
        operation: "write_output".to_string(),
        reason: e.to_string(),
    })
}
