// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Heap file metadata document.
//!
//! Persisted as JSON next to the heap file (`heap_metadata.ygg`) and
//! rewritten whenever a page write or allocation changes the store.
//!
//! ## Invariants
//! - `last_page_id == page_count` (pages are numbered 1..N contiguously)
//! - `page_count * page_size_bytes <= heap_size_bytes`

use crate::error::{VinumError, VinumResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Allocation state and timestamps of the heap file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeapFileMetadata {
    /// Highest allocated page id (pages are 1-based and contiguous).
    pub last_page_id: u32,

    /// Number of allocated pages; equals `last_page_id`.
    pub page_count: u32,

    /// Total byte budget of the heap file.
    pub heap_size_bytes: u64,

    /// Fixed page capacity the heap was created with. A reopen with a
    /// different page size would decode garbage, so the value is persisted
    /// and checked on startup.
    pub page_size_bytes: u64,

    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl HeapFileMetadata {
    /// Metadata for a freshly created heap with page 1 allocated.
    pub fn new(heap_size_bytes: u64, page_size_bytes: u64) -> Self {
        let now = Utc::now();
        Self {
            last_page_id: 1,
            page_count: 1,
            heap_size_bytes,
            page_size_bytes,
            created_at: now,
            last_modified_at: now,
        }
    }

    /// Load the metadata document.
    ///
    /// ## Error Conditions
    /// - `StoreInit`: unreadable file or malformed JSON
    pub fn load(path: &Path) -> VinumResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| VinumError::StoreInit {
            path: path.display().to_string(),
            reason: format!("cannot read heap metadata: {}", e),
        })?;
        serde_json::from_str(&content).map_err(|e| VinumError::StoreInit {
            path: path.display().to_string(),
            reason: format!("malformed heap metadata: {}", e),
        })
    }

    /// Rewrite the metadata document in place.
    pub fn save(&self, path: &Path) -> VinumResult<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| VinumError::SerializationError {
                reason: e.to_string(),
            })?;
        fs::write(path, content).map_err(|e| VinumError::IoError {
            operation: "write_heap_metadata".to_string(),
            reason: e.to_string(),
        })
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.last_modified_at = Utc::now();
    }
}
