// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error types for vinum operations.
//!
//! Provides structured error handling with detailed context for debugging.

use std::fmt;

/// Standard Result type for all vinum operations.
pub type VinumResult<T> = Result<T, VinumError>;

/// Error types for vinum operations.
#[derive(Debug, Clone)]
pub enum VinumError {
    /// Parse error (invalid format).
    ParseError { reason: String },

    /// Command file line with an unknown prefix or malformed payload.
    InvalidCommand { line: usize, reason: String },

    /// CSV parsing error in the wine source catalog.
    CsvError {
        file: String,
        line: usize,
        reason: String,
    },

    /// Wine record violating a model invariant.
    InvalidRecord { field: String, reason: String },

    /// Store initialisation failed (directory, file create, metadata read).
    StoreInit { path: String, reason: String },

    /// I/O error during file operations.
    IoError { operation: String, reason: String },

    /// Page id outside the allocated range of the heap file.
    PageOutOfRange { page_id: u32, last_page_id: u32 },

    /// Heap page failed framing or checksum validation.
    PageCorrupt { page_id: u32, reason: String },

    /// Encoded page exceeds the fixed page capacity.
    PageTooLarge {
        page_id: u32,
        encoded: u64,
        capacity: u64,
    },

    /// No further pages can be allocated within the heap file budget.
    HeapFull {
        page_id: u32,
        heap_size_bytes: u64,
    },

    /// Index node id not present in the index file.
    NodeNotFound { node_id: u32 },

    /// Index node record failed to decode.
    IndexCorrupt { node_id: u32, reason: String },

    /// B+-Tree degree below the supported minimum.
    InvalidDegree { degree: u16, min: u16 },

    /// Buffer pool has no resident frame and nothing canonical to load.
    PoolEmpty { pool: &'static str },

    /// Locator slot beyond the record count of its page.
    SlotOutOfRange {
        page_id: u32,
        slot: u32,
        record_count: u32,
    },

    /// Serialisation error.
    SerializationError { reason: String },

    /// Deserialisation error.
    DeserializationError { reason: String },

    /// Failure surfaced inside a B+-Tree operation.
    Tree {
        operation: &'static str,
        cause: Box<VinumError>,
    },
}

impl fmt::Display for VinumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseError { reason } => {
                write!(f, "Parse error: {}", reason)
            }
            Self::InvalidCommand { line, reason } => {
                write!(f, "Invalid command at line {}: {}", line, reason)
            }
            Self::CsvError { file, line, reason } => {
                write!(f, "CSV error in '{}' at line {}: {}", file, line, reason)
            }
            Self::InvalidRecord { field, reason } => {
                write!(f, "Invalid wine record ({}): {}", field, reason)
            }
            Self::StoreInit { path, reason } => {
                write!(f, "Store initialisation failed at '{}': {}", path, reason)
            }
            Self::IoError { operation, reason } => {
                write!(f, "I/O error during '{}': {}", operation, reason)
            }
            Self::PageOutOfRange {
                page_id,
                last_page_id,
            } => {
                write!(
                    f,
                    "Page {} out of range (valid: 1..={})",
                    page_id, last_page_id
                )
            }
            Self::PageCorrupt { page_id, reason } => {
                write!(f, "Corrupted heap page {}: {}", page_id, reason)
            }
            Self::PageTooLarge {
                page_id,
                encoded,
                capacity,
            } => {
                write!(
                    f,
                    "Page {} encodes to {} bytes, exceeding capacity {}",
                    page_id, encoded, capacity
                )
            }
            Self::HeapFull {
                page_id,
                heap_size_bytes,
            } => {
                write!(
                    f,
                    "Heap full: page {} does not fit within {} bytes",
                    page_id, heap_size_bytes
                )
            }
            Self::NodeNotFound { node_id } => {
                write!(f, "Index node {} not found", node_id)
            }
            Self::IndexCorrupt { node_id, reason } => {
                write!(f, "Corrupted index node {}: {}", node_id, reason)
            }
            Self::InvalidDegree { degree, min } => {
                write!(f, "Invalid B+-Tree degree: {} (minimum: {})", degree, min)
            }
            Self::PoolEmpty { pool } => {
                write!(f, "Buffer pool '{}' is empty and nothing can be loaded", pool)
            }
            Self::SlotOutOfRange {
                page_id,
                slot,
                record_count,
            } => {
                write!(
                    f,
                    "Slot {} out of range on page {} ({} records)",
                    slot, page_id, record_count
                )
            }
            Self::SerializationError { reason } => {
                write!(f, "Serialisation error: {}", reason)
            }
            Self::DeserializationError { reason } => {
                write!(f, "Deserialisation error: {}", reason)
            }
            Self::Tree { operation, cause } => {
                write!(f, "B+-Tree {} failed: {}", operation, cause)
            }
        }
    }
}

impl std::error::Error for VinumError {}

// Convenience conversion from std::io::Error
impl From<std::io::Error> for VinumError {
    fn from(err: std::io::Error) -> Self {
        VinumError::IoError {
            operation: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}
