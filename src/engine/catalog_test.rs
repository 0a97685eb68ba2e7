// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Tests for the record placement protocol.

#[cfg(test)]
mod tests {
    use crate::buffer::BufferPool;
    use crate::engine::catalog::RecordCatalog;
    use crate::error::VinumError;
    use crate::heap::HeapFileStore;
    use crate::index::IndexFileStore;
    use crate::wine::{WineKind, WineRecord};
    use tempfile::TempDir;

    const PAGE_SIZE: usize = 128;

    fn pool(dir: &TempDir, heap_pages: u64) -> BufferPool {
        let heap =
            HeapFileStore::initialize(dir.path(), PAGE_SIZE, PAGE_SIZE as u64 * (heap_pages + 1))
                .unwrap();
        let index = IndexFileStore::initialize(dir.path(), 3).unwrap();
        BufferPool::new(heap, index, 1, 1).unwrap()
    }

    fn wine(id: i32, label: &str) -> WineRecord {
        WineRecord::new(id, label, 2010, WineKind::Red).unwrap()
    }

    #[test]
    fn test_first_record_lands_on_page_one_slot_zero() {
        let dir = TempDir::new().unwrap();
        let mut p = pool(&dir, 8);
        let catalog = RecordCatalog::new();

        let locator = catalog.insert_record(&mut p, &wine(1, "A")).unwrap();
        assert_eq!(locator.page_id, 1);
        assert_eq!(locator.slot, 0);
    }

    #[test]
    fn test_slots_increase_on_same_page() {
        let dir = TempDir::new().unwrap();
        let mut p = pool(&dir, 8);
        let catalog = RecordCatalog::new();

        let l0 = catalog.insert_record(&mut p, &wine(1, "A")).unwrap();
        let l1 = catalog.insert_record(&mut p, &wine(2, "B")).unwrap();
        assert_eq!((l0.page_id, l0.slot), (1, 0));
        assert_eq!((l1.page_id, l1.slot), (1, 1));
    }

    #[test]
    fn test_full_page_moves_to_fresh_page() {
        let dir = TempDir::new().unwrap();
        let mut p = pool(&dir, 8);
        let catalog = RecordCatalog::new();

        // Fill until a locator leaves page 1.
        let mut last = catalog.insert_record(&mut p, &wine(0, "Wine")).unwrap();
        let mut inserted = 1;
        while last.page_id == 1 {
            last = catalog
                .insert_record(&mut p, &wine(inserted, "Wine"))
                .unwrap();
            inserted += 1;
        }

        assert_eq!(last.page_id, 2);
        assert_eq!(last.slot, 0);
        // The pool honours its single-frame budget throughout.
        assert_eq!(p.resident_pages(), 1);

        // Page 1 kept its records across the eviction.
        let page1 = p.load_page(1).unwrap();
        assert_eq!(page1.record_count(), (inserted - 1) as u32);
    }

    #[test]
    fn test_record_never_fitting_any_page() {
        let dir = TempDir::new().unwrap();
        let mut p = pool(&dir, 8);
        let catalog = RecordCatalog::new();

        let oversized = wine(1, &"x".repeat(PAGE_SIZE * 2));
        let result = catalog.insert_record(&mut p, &oversized);
        match result {
            Err(VinumError::PageTooLarge {
                encoded, capacity, ..
            }) => {
                assert_eq!(capacity, PAGE_SIZE as u64);
                assert!(encoded > capacity);
            }
            other => panic!("expected PageTooLarge, got {:?}", other),
        }
        // No page was burned on the doomed record.
        assert_eq!(p.heap().metadata().last_page_id, 1);
    }

    #[test]
    fn test_heap_full_surfaces() {
        let dir = TempDir::new().unwrap();
        // Heap with room for pages 1..=2 only.
        let mut p = pool(&dir, 2);
        let catalog = RecordCatalog::new();

        let mut result = catalog.insert_record(&mut p, &wine(0, "Wine"));
        let mut inserted = 0;
        while result.is_ok() {
            inserted += 1;
            result = catalog.insert_record(&mut p, &wine(inserted, "Wine"));
        }

        assert!(matches!(result, Err(VinumError::HeapFull { .. })));
        // Both pages were filled before the failure.
        assert_eq!(p.heap().metadata().last_page_id, 2);
    }
}
