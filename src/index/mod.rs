// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Persistent B+-Tree index over harvest years.
//!
//! Maps 32-bit harvest years to heap locators `(page_id, slot)`. Duplicate
//! keys are permitted and preserved; leaves are chained left-to-right so an
//! equality search can walk the run of equal keys across leaf boundaries.
//! Every node is one independently rewritable record of the index file
//! (`index.ygg`), and all node I/O of the tree goes through the buffer
//! pool's index frames.

pub mod node;
pub mod store;
pub mod tree;

#[cfg(test)]
mod node_test;

// Re-export public API
pub use node::{BPlusNode, InternalNode, LeafNode, Locator, NodeId};
pub use store::{IndexFileStore, IndexMetadata, INDEX_FILE};
pub use tree::BPlusTree;
