// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Core wine record types.

use crate::error::{VinumError, VinumResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wine colour classification.
///
/// The raw catalog uses Portuguese tags (`tinto`, `branco`, `rose`/`rosé`);
/// parsing accepts all of them case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum WineKind {
    Red = 0,
    White = 1,
    Rose = 2,
}

impl WineKind {
    /// Parse a catalog tag into a wine kind.
    ///
    /// ## Input
    /// - `tag`: raw CSV field (`tinto`, `branco`, `rose` or `rosé`)
    ///
    /// ## Output
    /// - `Ok(WineKind)`: recognised tag
    /// - `Err(VinumError::InvalidRecord)`: anything else
    pub fn parse(tag: &str) -> VinumResult<Self> {
        match tag.trim().to_lowercase().as_str() {
            "tinto" => Ok(Self::Red),
            "branco" => Ok(Self::White),
            "rose" | "rosé" => Ok(Self::Rose),
            other => Err(VinumError::InvalidRecord {
                field: "tipo".to_string(),
                reason: format!("unknown wine kind '{}'", other),
            }),
        }
    }

    /// Stable single-byte tag used by the binary source file.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Inverse of [`WineKind::as_byte`].
    pub fn from_byte(byte: u8) -> VinumResult<Self> {
        match byte {
            0 => Ok(Self::Red),
            1 => Ok(Self::White),
            2 => Ok(Self::Rose),
            other => Err(VinumError::DeserializationError {
                reason: format!("invalid wine kind byte {}", other),
            }),
        }
    }
}

impl fmt::Display for WineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::White => write!(f, "white"),
            Self::Rose => write!(f, "rose"),
        }
    }
}

/// One wine of the source catalog.
///
/// ## Invariants
/// - `label` is non-empty and not all whitespace
/// - `harvest_year > 0`
///
/// Construct through [`WineRecord::new`] so the invariants hold for every
/// record that reaches the heap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WineRecord {
    pub wine_id: i32,
    pub label: String,
    pub harvest_year: i32,
    pub kind: WineKind,
}

impl WineRecord {
    /// Create a validated wine record.
    ///
    /// ## Input
    /// - `wine_id`: catalog identifier
    /// - `label`: display label, must contain a non-whitespace character
    /// - `harvest_year`: must be positive
    /// - `kind`: colour classification
    ///
    /// ## Output
    /// - `Ok(WineRecord)`: all invariants hold
    /// - `Err(VinumError::InvalidRecord)`: the offending field and reason
    pub fn new(
        wine_id: i32,
        label: impl Into<String>,
        harvest_year: i32,
        kind: WineKind,
    ) -> VinumResult<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(VinumError::InvalidRecord {
                field: "rotulo".to_string(),
                reason: "label must not be empty or whitespace".to_string(),
            });
        }
        if harvest_year <= 0 {
            return Err(VinumError::InvalidRecord {
                field: "ano_colheita".to_string(),
                reason: format!("harvest year must be positive, got {}", harvest_year),
            });
        }
        Ok(Self {
            wine_id,
            label,
            harvest_year,
            kind,
        })
    }
}
