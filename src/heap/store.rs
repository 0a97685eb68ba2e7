// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Heap file store.
//!
//! Owns `heap.ygg` (created at its full configured size) and the metadata
//! document `heap_metadata.ygg`. Pages live at offsets `id * P` for
//! `id >= 1`; offset 0 is reserved and never written. The file is opened
//! read-write once per run and held under an exclusive advisory lock, so
//! no external writer can interleave.
//!
//! All page traffic of the engine goes through the buffer pool; the store
//! only exposes the page-level primitives the pool consumes plus the
//! allocation and free-space predicates of the record protocol.

use crate::error::{VinumError, VinumResult};
use crate::heap::metadata::HeapFileMetadata;
use crate::heap::page::{HeapPage, PAGE_HEADER_SIZE};
use crate::wine::WineRecord;
use fs2::FileExt;
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Heap file name inside the storage directory.
pub const HEAP_FILE: &str = "heap.ygg";

/// Heap metadata document name inside the storage directory.
pub const HEAP_METADATA_FILE: &str = "heap_metadata.ygg";

/// Fixed-size page store over the heap file.
pub struct HeapFileStore {
    dir: PathBuf,
    file: File,
    metadata: HeapFileMetadata,
    page_size: usize,
}

impl HeapFileStore {
    /// Create or open the heap store in `dir`.
    ///
    /// ## Input
    /// - `dir`: storage directory (created if absent)
    /// - `page_size`: fixed page capacity `P` in bytes
    /// - `heap_size_bytes`: total heap file budget
    ///
    /// ## Output
    /// - `Ok(HeapFileStore)`: file open read-write, metadata loaded, page 1
    ///   guaranteed to exist
    /// - `Err(VinumError::StoreInit)`: directory/file/metadata failure, a
    ///   nonsensical configuration, or a page-size mismatch with an
    ///   existing heap
    ///
    /// ## Side Effects
    /// - Fresh store: creates `heap.ygg` of exactly `heap_size_bytes`,
    ///   writes an empty page 1, persists the metadata document
    /// - Takes an exclusive advisory lock on `heap.ygg`
    pub fn initialize(dir: &Path, page_size: usize, heap_size_bytes: u64) -> VinumResult<Self> {
        if page_size <= PAGE_HEADER_SIZE {
            return Err(VinumError::StoreInit {
                path: dir.display().to_string(),
                reason: format!(
                    "page size {} leaves no room past the {}-byte header",
                    page_size, PAGE_HEADER_SIZE
                ),
            });
        }
        // Offset 0 is reserved, so the smallest usable heap holds page 1.
        if heap_size_bytes < 2 * page_size as u64 {
            return Err(VinumError::StoreInit {
                path: dir.display().to_string(),
                reason: format!(
                    "heap size {} cannot hold a single {}-byte page past the reserved offset",
                    heap_size_bytes, page_size
                ),
            });
        }

        std::fs::create_dir_all(dir).map_err(|e| VinumError::StoreInit {
            path: dir.display().to_string(),
            reason: format!("cannot create storage directory: {}", e),
        })?;

        let heap_path = dir.join(HEAP_FILE);
        let metadata_path = dir.join(HEAP_METADATA_FILE);

        if metadata_path.exists() {
            let metadata = HeapFileMetadata::load(&metadata_path)?;
            if metadata.page_size_bytes != page_size as u64 {
                return Err(VinumError::StoreInit {
                    path: heap_path.display().to_string(),
                    reason: format!(
                        "heap was created with {}-byte pages, reopened with {}",
                        metadata.page_size_bytes, page_size
                    ),
                });
            }

            let file = Self::open_locked(&heap_path)?;
            debug!(
                "opened heap at {} ({} pages)",
                heap_path.display(),
                metadata.page_count
            );
            Ok(Self {
                dir: dir.to_path_buf(),
                file,
                metadata,
                page_size,
            })
        } else {
            let file = Self::open_locked(&heap_path)?;
            file.set_len(heap_size_bytes)
                .map_err(|e| VinumError::StoreInit {
                    path: heap_path.display().to_string(),
                    reason: format!("cannot size heap file: {}", e),
                })?;

            let metadata = HeapFileMetadata::new(heap_size_bytes, page_size as u64);
            metadata.save(&metadata_path)?;

            let mut store = Self {
                dir: dir.to_path_buf(),
                file,
                metadata,
                page_size,
            };
            // Page 1 exists from the start; the catalog appends to it first.
            store.write_page(&HeapPage::new(1))?;

            info!(
                "created heap at {} ({} bytes, {}-byte pages)",
                heap_path.display(),
                heap_size_bytes,
                page_size
            );
            Ok(store)
        }
    }

    fn open_locked(path: &Path) -> VinumResult<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| VinumError::StoreInit {
                path: path.display().to_string(),
                reason: format!("cannot open heap file: {}", e),
            })?;
        file.try_lock_exclusive().map_err(|e| VinumError::StoreInit {
            path: path.display().to_string(),
            reason: format!("heap file is locked by another process: {}", e),
        })?;
        Ok(file)
    }

    /// Read and decode the page with the given id.
    ///
    /// ## Error Conditions
    /// - `PageOutOfRange`: id 0 or beyond `last_page_id`
    /// - `PageCorrupt`: framing or checksum failure
    /// - `IoError`: seek/read failure
    pub fn read_page(&mut self, id: u32) -> VinumResult<HeapPage> {
        self.check_in_range(id)?;

        self.file
            .seek(SeekFrom::Start(id as u64 * self.page_size as u64))
            .map_err(|e| VinumError::IoError {
                operation: format!("seek_page_{}", id),
                reason: e.to_string(),
            })?;

        let mut buf = vec![0u8; self.page_size];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| VinumError::IoError {
                operation: format!("read_page_{}", id),
                reason: e.to_string(),
            })?;

        HeapPage::decode(id, &buf)
    }

    /// Encode and write a page at its offset, then update the metadata
    /// document's modification timestamp on disk.
    ///
    /// ## Error Conditions
    /// - `PageOutOfRange`, `PageTooLarge`, `IoError`
    pub fn write_page(&mut self, page: &HeapPage) -> VinumResult<()> {
        self.check_in_range(page.id())?;

        let bytes = page.encode(self.page_size)?;
        self.file
            .seek(SeekFrom::Start(page.id() as u64 * self.page_size as u64))
            .map_err(|e| VinumError::IoError {
                operation: format!("seek_page_{}", page.id()),
                reason: e.to_string(),
            })?;
        self.file
            .write_all(&bytes)
            .map_err(|e| VinumError::IoError {
                operation: format!("write_page_{}", page.id()),
                reason: e.to_string(),
            })?;

        self.metadata.touch();
        self.metadata.save(&self.dir.join(HEAP_METADATA_FILE))?;

        debug!("wrote page {} ({} records)", page.id(), page.record_count());
        Ok(())
    }

    /// Allocate the next contiguous page and write it out empty.
    ///
    /// ## Output
    /// - `Ok(HeapPage)`: the freshly allocated empty page
    /// - `Err(VinumError::HeapFull)`: the page's full extent would exceed
    ///   the heap budget
    pub fn allocate_page(&mut self) -> VinumResult<HeapPage> {
        let new_id = self.metadata.last_page_id + 1;
        // The new page occupies [new_id * P, (new_id + 1) * P).
        if (new_id as u64 + 1) * self.page_size as u64 > self.metadata.heap_size_bytes {
            return Err(VinumError::HeapFull {
                page_id: new_id,
                heap_size_bytes: self.metadata.heap_size_bytes,
            });
        }

        self.metadata.last_page_id = new_id;
        self.metadata.page_count += 1;

        let page = HeapPage::new(new_id);
        self.write_page(&page)?;

        info!("allocated heap page {}", new_id);
        Ok(page)
    }

    /// Pure metadata check; id 0 is always absent.
    pub fn page_exists(&self, id: u32) -> bool {
        id != 0 && id <= self.metadata.last_page_id
    }

    /// Would `record` still fit on `page`?
    pub fn page_has_space_for(&self, page: &HeapPage, record: &WineRecord) -> bool {
        matches!(page.fits_with(record, self.page_size), Ok(true))
    }

    /// Force metadata and all written bytes to stable storage.
    pub fn flush(&mut self) -> VinumResult<()> {
        self.metadata.save(&self.dir.join(HEAP_METADATA_FILE))?;
        self.file.sync_all().map_err(|e| VinumError::IoError {
            operation: "sync_heap".to_string(),
            reason: e.to_string(),
        })
    }

    /// Current allocation state.
    pub fn metadata(&self) -> &HeapFileMetadata {
        &self.metadata
    }

    /// Fixed page capacity in bytes.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn check_in_range(&self, id: u32) -> VinumResult<()> {
        if id == 0 || id > self.metadata.last_page_id {
            return Err(VinumError::PageOutOfRange {
                page_id: id,
                last_page_id: self.metadata.last_page_id,
            });
        }
        Ok(())
    }
}
