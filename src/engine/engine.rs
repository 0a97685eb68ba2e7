// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The engine façade.
//!
//! Routes an insert down through catalog, heap and index, and a search up
//! through index, pool and heap. Strictly synchronous and single-threaded;
//! an operation runs to completion or to a terminal error.
//!
//! An index failure after the heap append leaves the record in the heap:
//! this engine performs no compensation, and dependent behaviour relies on
//! that (see DESIGN.md).

use crate::buffer::BufferPool;
use crate::engine::catalog::RecordCatalog;
use crate::error::{VinumError, VinumResult};
use crate::index::{BPlusTree, Locator};
use crate::wine::WineRecord;
use log::{debug, info};

/// Single-user engine over one storage directory.
pub struct Engine {
    pool: BufferPool,
    catalog: RecordCatalog,
    tree: BPlusTree,
}

impl Engine {
    /// Build the engine over an initialised buffer pool. The tree degree
    /// comes from the index store's persisted metadata.
    pub fn new(pool: BufferPool) -> VinumResult<Self> {
        let degree = pool.index_store().degree();
        Ok(Self {
            pool,
            catalog: RecordCatalog::new(),
            tree: BPlusTree::new(degree)?,
        })
    }

    /// Insert one record: heap append first, then the year index entry.
    pub fn insert(&mut self, record: &WineRecord) -> VinumResult<Locator> {
        let locator = self.catalog.insert_record(&mut self.pool, record)?;
        self.tree
            .insert(&mut self.pool, record.harvest_year, locator)?;
        debug!(
            "inserted wine {} (year {}) at {}",
            record.wine_id, record.harvest_year, locator
        );
        Ok(locator)
    }

    /// Fetch every record with the given harvest year, in the order their
    /// locators appear in the leaf chain.
    pub fn search(&mut self, harvest_year: i32) -> VinumResult<Vec<WineRecord>> {
        let locators = self.tree.search(&mut self.pool, harvest_year)?;

        let mut records = Vec::with_capacity(locators.len());
        for locator in locators {
            let page = self.pool.load_page(locator.page_id)?;
            let record = page
                .record(locator.slot)
                .ok_or(VinumError::SlotOutOfRange {
                    page_id: locator.page_id,
                    slot: locator.slot,
                    record_count: page.record_count(),
                })?
                .clone();
            records.push(record);
        }

        debug!(
            "search year {}: {} record(s)",
            harvest_year,
            records.len()
        );
        Ok(records)
    }

    /// Current index height. No I/O.
    pub fn height(&self) -> u32 {
        self.tree.height(&self.pool)
    }

    /// Flush both pools and sync both files. Required before exit for any
    /// durability guarantee.
    pub fn flush_all(&mut self) -> VinumResult<()> {
        info!("flushing pools and syncing stores");
        self.pool.flush_all()
    }

    /// The underlying pool (tests and diagnostics).
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }
}
