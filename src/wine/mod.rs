// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Wine record model and source catalog.
//!
//! The engine indexes wines by harvest year. This module owns the record
//! type, the CSV parser for the raw catalog
//! (`vinho_id,rotulo,ano_colheita,tipo`), and the sorted fixed-width binary
//! source file that answers `lookup_by_harvest_year` via binary search.

pub mod csv_parser;
pub mod source;
pub mod types;


// Re-export public API
pub use csv_parser::parse_wine_csv;
pub use source::WineSource;
pub use types::{WineKind, WineRecord};
