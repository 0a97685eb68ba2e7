// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Tests for the heap metadata document.

#[cfg(test)]
mod tests {
    use crate::heap::metadata::HeapFileMetadata;
    use tempfile::TempDir;

    #[test]
    fn test_new_metadata_counts_page_one() {
        let metadata = HeapFileMetadata::new(4096 * 10, 4096);
        assert_eq!(metadata.last_page_id, 1);
        assert_eq!(metadata.page_count, 1);
        assert_eq!(metadata.heap_size_bytes, 4096 * 10);
        assert_eq!(metadata.created_at, metadata.last_modified_at);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("heap_metadata.ygg");

        let mut metadata = HeapFileMetadata::new(1024, 256);
        metadata.last_page_id = 3;
        metadata.page_count = 3;
        metadata.save(&path).unwrap();

        let loaded = HeapFileMetadata::load(&path).unwrap();
        assert_eq!(loaded.last_page_id, 3);
        assert_eq!(loaded.page_count, 3);
        assert_eq!(loaded.heap_size_bytes, 1024);
        assert_eq!(loaded.page_size_bytes, 256);
        assert_eq!(loaded.created_at, metadata.created_at);
    }

    #[test]
    fn test_touch_advances_modification_time() {
        let mut metadata = HeapFileMetadata::new(1024, 256);
        let before = metadata.last_modified_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        metadata.touch();
        assert!(metadata.last_modified_at > before);
        assert_eq!(metadata.created_at, before.min(metadata.created_at));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = HeapFileMetadata::load(&dir.path().join("absent.ygg"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_malformed_json_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("heap_metadata.ygg");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(HeapFileMetadata::load(&path).is_err());
    }
}
