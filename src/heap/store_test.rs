// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Tests for the heap file store.

#[cfg(test)]
mod tests {
    use crate::error::VinumError;
    use crate::heap::page::HeapPage;
    use crate::heap::store::{HeapFileStore, HEAP_FILE, HEAP_METADATA_FILE};
    use crate::wine::{WineKind, WineRecord};
    use tempfile::TempDir;

    const PAGE_SIZE: usize = 256;
    const HEAP_SIZE: u64 = 256 * 8; // room for pages 1..=7 past the reserved offset

    fn wine(id: i32, year: i32) -> WineRecord {
        WineRecord::new(id, format!("Wine {}", id), year, WineKind::Red).unwrap()
    }

    fn open_store(dir: &TempDir) -> HeapFileStore {
        HeapFileStore::initialize(dir.path(), PAGE_SIZE, HEAP_SIZE).unwrap()
    }

    #[test]
    fn test_initialize_creates_sized_file_and_page_one() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let heap_len = std::fs::metadata(dir.path().join(HEAP_FILE)).unwrap().len();
        assert_eq!(heap_len, HEAP_SIZE);
        assert!(dir.path().join(HEAP_METADATA_FILE).exists());

        assert_eq!(store.metadata().last_page_id, 1);
        assert_eq!(store.metadata().page_count, 1);
        assert!(store.page_exists(1));
        assert!(!store.page_exists(0));
        assert!(!store.page_exists(2));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        let mut page = HeapPage::new(1);
        page.push(wine(1, 2010));
        page.push(wine(2, 2011));
        store.write_page(&page).unwrap();

        let loaded = store.read_page(1).unwrap();
        assert_eq!(loaded, page);
    }

    #[test]
    fn test_read_out_of_range() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        assert!(matches!(
            store.read_page(0),
            Err(VinumError::PageOutOfRange { page_id: 0, .. })
        ));
        assert!(matches!(
            store.read_page(5),
            Err(VinumError::PageOutOfRange { page_id: 5, .. })
        ));
    }

    #[test]
    fn test_write_out_of_range() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        let page = HeapPage::new(9);
        assert!(matches!(
            store.write_page(&page),
            Err(VinumError::PageOutOfRange { page_id: 9, .. })
        ));
    }

    #[test]
    fn test_allocate_contiguous_pages() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        let p2 = store.allocate_page().unwrap();
        let p3 = store.allocate_page().unwrap();
        assert_eq!(p2.id(), 2);
        assert_eq!(p3.id(), 3);
        assert_eq!(store.metadata().last_page_id, 3);
        assert_eq!(store.metadata().page_count, 3);

        // Freshly allocated pages read back empty.
        assert_eq!(store.read_page(3).unwrap().record_count(), 0);
    }

    #[test]
    fn test_allocate_until_heap_full() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        // Pages 1..=7 fit in 8 * PAGE_SIZE with offset 0 reserved.
        for expected in 2..=7u32 {
            assert_eq!(store.allocate_page().unwrap().id(), expected);
        }
        let result = store.allocate_page();
        assert!(matches!(result, Err(VinumError::HeapFull { page_id: 8, .. })));
        // A failed allocation leaves the counters untouched.
        assert_eq!(store.metadata().last_page_id, 7);
    }

    #[test]
    fn test_page_has_space_for() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        let mut page = store.read_page(1).unwrap();
        let record = wine(1, 2010);
        assert!(store.page_has_space_for(&page, &record));

        while store.page_has_space_for(&page, &record) {
            page.push(record.clone());
        }
        // The loop only stops once the next record would burst the page.
        assert!(page.encode(PAGE_SIZE).is_ok());
    }

    #[test]
    fn test_reopen_recovers_metadata() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = open_store(&dir);
            store.allocate_page().unwrap();
            let mut page = HeapPage::new(2);
            page.push(wine(7, 1999));
            store.write_page(&page).unwrap();
            store.flush().unwrap();
        }

        let mut reopened = open_store(&dir);
        assert_eq!(reopened.metadata().last_page_id, 2);
        let page = reopened.read_page(2).unwrap();
        assert_eq!(page.record(0).unwrap().wine_id, 7);
    }

    #[test]
    fn test_reopen_with_different_page_size_rejected() {
        let dir = TempDir::new().unwrap();
        {
            open_store(&dir);
        }
        let result = HeapFileStore::initialize(dir.path(), 512, HEAP_SIZE);
        assert!(matches!(result, Err(VinumError::StoreInit { .. })));
    }

    #[test]
    fn test_write_updates_modification_time() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let before = store.metadata().last_modified_at;

        std::thread::sleep(std::time::Duration::from_millis(5));
        let mut page = HeapPage::new(1);
        page.push(wine(1, 2010));
        store.write_page(&page).unwrap();

        assert!(store.metadata().last_modified_at > before);
        // The document on disk reflects the bump too.
        let on_disk =
            crate::heap::metadata::HeapFileMetadata::load(&dir.path().join(HEAP_METADATA_FILE))
                .unwrap();
        assert_eq!(on_disk.last_modified_at, store.metadata().last_modified_at);
    }

    #[test]
    fn test_tiny_heap_rejected() {
        let dir = TempDir::new().unwrap();
        let result = HeapFileStore::initialize(dir.path(), 256, 256);
        assert!(matches!(result, Err(VinumError::StoreInit { .. })));
    }
}
