// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Record-level placement protocol.
//!
//! Appends go to the "current" page (the MRU data frame, or page 1 when
//! nothing is resident) or to a freshly allocated page; intermediate pages
//! are never revisited for free space. That keeps placement a pure
//! function of the current frame state, which the engine's append-only
//! workload depends on.

use crate::buffer::BufferPool;
use crate::error::{VinumError, VinumResult};
use crate::heap::HeapPage;
use crate::index::Locator;
use crate::wine::WineRecord;
use log::debug;

/// Maps logical records to concrete slots on heap pages.
pub struct RecordCatalog;

impl RecordCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Append a record to the current page, or to a new page when the
    /// current one is full.
    ///
    /// ## Output
    /// - `Ok(Locator)`: the `(page_id, slot)` the record landed in
    /// - `Err(VinumError::PageTooLarge)`: the record cannot fit even an
    ///   empty page
    /// - `Err(VinumError::HeapFull)`: a new page was needed but the heap
    ///   budget is exhausted
    pub fn insert_record(
        &self,
        pool: &mut BufferPool,
        record: &WineRecord,
    ) -> VinumResult<Locator> {
        let mut page = pool.current_page()?.clone();

        if !pool.heap().page_has_space_for(&page, record) {
            // A record that cannot fit an empty page will never fit a
            // fresh one either; fail before burning an allocation.
            self.ensure_record_encodable(pool, record)?;
            page = pool.heap_mut().allocate_page()?;
            debug!(
                "current page full, record moves to fresh page {}",
                page.id()
            );
        }

        let slot = page.push(record.clone());
        let page_id = page.id();
        pool.put_page(page)?;
        pool.mark_page_dirty(page_id);

        Ok(Locator::new(page_id, slot))
    }

    fn ensure_record_encodable(
        &self,
        pool: &BufferPool,
        record: &WineRecord,
    ) -> VinumResult<()> {
        let probe = HeapPage::new(0);
        if pool.heap().page_has_space_for(&probe, record) {
            return Ok(());
        }

        let mut oversized = probe;
        oversized.push(record.clone());
        Err(VinumError::PageTooLarge {
            page_id: 0,
            encoded: oversized.encoded_len()?,
            capacity: pool.heap().page_size() as u64,
        })
    }
}

impl Default for RecordCatalog {
    fn default() -> Self {
        Self::new()
    }
}
