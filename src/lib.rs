// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! vinum - a miniature wine-catalog database engine.
//!
//! Indexes a relation of wine records by harvest year and answers equality
//! queries and insertions under a strict two-frame memory budget. Records
//! live in a heap file of fixed-size pages; a persistent B+-Tree maps
//! `harvest_year -> (page_id, slot)` locators. At any moment at most one
//! data page and one index node are resident (per configured frame budget);
//! every other access goes through disk.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Engine                                        │
//! │   insert: catalog -> heap page -> B+-Tree     │
//! │   search: B+-Tree -> locators -> heap pages   │
//! ├───────────────┬───────────────────────────────┤
//! │ RecordCatalog │ BPlusTree                     │
//! ├───────────────┴───────────────────────────────┤
//! │ BufferPool (LRU, F_d data + F_i index frames) │
//! ├───────────────────────┬───────────────────────┤
//! │ HeapFileStore         │ IndexFileStore        │
//! │ heap.ygg              │ index.ygg             │
//! │ heap_metadata.ygg     │                       │
//! └───────────────────────┴───────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - **wine**: record model, CSV parsing, sorted binary source catalog
//! - **heap**: fixed-size page codec and heap file store
//! - **index**: B+-Tree nodes, node file store, and the tree itself
//! - **buffer**: the two-pool LRU buffer with dirty write-back
//! - **engine**: record placement and the insert/search façade
//! - **commands**: `FLH`/`INC`/`BUS=` script parsing and execution

pub mod buffer;
pub mod commands;
pub mod engine;
pub mod error;
pub mod heap;
pub mod index;
pub mod wine;


// Re-export commonly used types
pub use buffer::BufferPool;
pub use commands::{parse_script, run_script, Command, CommandScript};
pub use engine::{Engine, RecordCatalog};
pub use error::{VinumError, VinumResult};
pub use heap::{HeapFileMetadata, HeapFileStore, HeapPage};
pub use index::{BPlusNode, BPlusTree, IndexFileStore, Locator};
pub use wine::{WineKind, WineRecord, WineSource};
