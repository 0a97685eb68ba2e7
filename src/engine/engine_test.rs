// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Tests for the engine façade.

#[cfg(test)]
mod tests {
    use crate::buffer::BufferPool;
    use crate::engine::engine::Engine;
    use crate::heap::HeapFileStore;
    use crate::index::IndexFileStore;
    use crate::wine::{WineKind, WineRecord};
    use tempfile::TempDir;

    fn engine_with(dir: &TempDir, page_size: usize, degree: u16) -> Engine {
        let heap =
            HeapFileStore::initialize(dir.path(), page_size, page_size as u64 * 64).unwrap();
        let index = IndexFileStore::initialize(dir.path(), degree).unwrap();
        let pool = BufferPool::new(heap, index, 1, 1).unwrap();
        Engine::new(pool).unwrap()
    }

    fn wine(id: i32, label: &str, year: i32) -> WineRecord {
        WineRecord::new(id, label, year, WineKind::Red).unwrap()
    }

    #[test]
    fn test_insert_then_search() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_with(&dir, 4096, 3);

        engine.insert(&wine(1, "X", 2010)).unwrap();

        let found = engine.search(2010).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "X");
        assert_eq!(engine.height(), 0);
    }

    #[test]
    fn test_search_missing_year_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_with(&dir, 4096, 3);

        engine.insert(&wine(1, "X", 2010)).unwrap();
        assert!(engine.search(1999).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_years_return_all_records() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_with(&dir, 4096, 3);

        for i in 0..5 {
            engine
                .insert(&wine(i, &format!("Wine {}", i), 2018))
                .unwrap();
        }

        let found = engine.search(2018).unwrap();
        assert_eq!(found.len(), 5);
        let ids: Vec<i32> = found.iter().map(|w| w.wine_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert!(engine.height() >= 1);
    }

    #[test]
    fn test_search_reloads_evicted_pages() {
        // Small pages force the 1990 wines onto pages that are no longer
        // resident once the 1991 batch lands; the search must reload them.
        let dir = TempDir::new().unwrap();
        let mut engine = engine_with(&dir, 256, 4);

        let mut locators_1990 = Vec::new();
        for i in 0..5 {
            locators_1990.push(
                engine
                    .insert(&wine(i, &format!("Estate nineteen-ninety {}", i), 1990))
                    .unwrap(),
            );
        }
        for i in 0..5 {
            engine
                .insert(&wine(100 + i, &format!("Estate nineteen-ninety-one {}", i), 1991))
                .unwrap();
        }

        // The workload spilled past one page, so the 1990 records cannot
        // all share the currently resident page.
        assert!(engine.pool().heap().metadata().last_page_id > 1);
        assert_eq!(engine.pool().resident_pages(), 1);

        let found = engine.search(1990).unwrap();
        assert_eq!(found.len(), 5);
        assert!(found.iter().all(|w| w.harvest_year == 1990));

        let found91 = engine.search(1991).unwrap();
        assert_eq!(found91.len(), 5);
    }

    #[test]
    fn test_locators_remain_stable_under_appends() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_with(&dir, 256, 4);

        let first = engine.insert(&wine(1, "First estate label", 2000)).unwrap();
        for i in 0..12 {
            engine
                .insert(&wine(10 + i, &format!("Filler estate {}", i), 2001))
                .unwrap();
        }

        // The original record is still where its locator says.
        let page = engine.pool_mut().load_page(first.page_id).unwrap();
        assert_eq!(page.record(first.slot).unwrap().wine_id, 1);
    }

    #[test]
    fn test_flush_then_reopen_finds_records() {
        let dir = TempDir::new().unwrap();
        {
            let mut engine = engine_with(&dir, 4096, 3);
            engine.insert(&wine(1, "X", 2010)).unwrap();
            engine.flush_all().unwrap();
        }

        let mut engine = engine_with(&dir, 4096, 3);
        let found = engine.search(2010).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].wine_id, 1);
        assert_eq!(engine.height(), 0);
    }

    #[test]
    fn test_unflushed_state_is_not_guaranteed() {
        // Without flush_all the resident dirty frames may never reach
        // disk; after reopen the engine must still be structurally sound.
        let dir = TempDir::new().unwrap();
        {
            let mut engine = engine_with(&dir, 4096, 3);
            engine.insert(&wine(1, "X", 2010)).unwrap();
            // no flush
        }

        let mut engine = engine_with(&dir, 4096, 3);
        // The search completes without error whatever survived.
        let found = engine.search(2010).unwrap();
        assert!(found.len() <= 1);
    }

    #[test]
    fn test_mixed_years_across_pages() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_with(&dir, 256, 3);

        let years = [1990, 2005, 1990, 2010, 2005, 1990, 2020, 2010];
        for (i, year) in years.iter().enumerate() {
            engine
                .insert(&wine(i as i32, &format!("Estate number {}", i), *year))
                .unwrap();
        }

        assert_eq!(engine.search(1990).unwrap().len(), 3);
        assert_eq!(engine.search(2005).unwrap().len(), 2);
        assert_eq!(engine.search(2010).unwrap().len(), 2);
        assert_eq!(engine.search(2020).unwrap().len(), 1);
        assert_eq!(engine.search(1989).unwrap().len(), 0);
    }
}
