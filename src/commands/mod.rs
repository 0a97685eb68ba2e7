// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Command script parsing and execution.
//!
//! Scripts are line-oriented: a mandatory `FLH/<m>` header naming the tree
//! degree, then `INC:<k>` (insert all wines of year `k`) and `BUS=:<k>`
//! (find all wines of year `k`) commands. The runner echoes the header,
//! emits one count line per command, and closes with the final tree
//! height.

pub mod parser;
pub mod runner;


// Re-export public API
pub use parser::{parse_script, Command, CommandScript};
pub use runner::run_script;
