// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Sorted fixed-width binary source catalog.
//!
//! `INC:<k>` inserts every wine whose harvest year equals `k`. To answer
//! that lookup without scanning the raw CSV, a pre-pass sorts the catalog
//! by harvest year into a fixed-width binary file that supports binary
//! search by record index.
//!
//! ## Record Layout (fixed width)
//!
//! ```text
//! Offset | Size | Field
//! -------|------|------------------------------
//! 0      | 4    | wine_id (i32 big-endian)
//! 4      | 4    | harvest_year (i32 big-endian)
//! 8      | 1    | kind (WineKind as u8)
//! 9      | 2    | label length (u16 big-endian)
//! 11     | 120  | label bytes (UTF-8, zero padded)
//! ```
//!
//! Total: 131 bytes per record. The file has no header; the record count
//! is the file length divided by the record width.

use crate::error::{VinumError, VinumResult};
use crate::wine::csv_parser::parse_wine_csv;
use crate::wine::types::{WineKind, WineRecord};
use log::{debug, info};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// File name of the sorted binary catalog inside the storage directory.
pub const SOURCE_FILE: &str = "wines.sorted.ygg";

/// Maximum label length the fixed-width form can carry.
pub const LABEL_CAPACITY: usize = 120;

/// Fixed byte width of one sorted record.
pub const SOURCE_RECORD_WIDTH: usize = 4 + 4 + 1 + 2 + LABEL_CAPACITY;

/// Sorted wine catalog with binary-search lookup by harvest year.
///
/// Built once per run by [`WineSource::prepare`]; lookups then touch at
/// most O(log n + hits) records of the sorted file.
pub struct WineSource {
    path: PathBuf,
    file: File,
    count: u64,
}

impl WineSource {
    /// Run the sorting pre-pass and open the resulting catalog.
    ///
    /// ## Input
    /// - `csv_path`: raw wine catalog (`vinho_id,rotulo,ano_colheita,tipo`)
    /// - `storage_dir`: directory receiving `wines.sorted.ygg`
    ///
    /// ## Output
    /// - `Ok(WineSource)`: sorted catalog ready for lookups
    /// - `Err(VinumError::StoreInit)`: CSV unreadable or file creation failed
    /// - `Err(VinumError::CsvError | InvalidRecord)`: malformed catalog row
    pub fn prepare(csv_path: &Path, storage_dir: &Path) -> VinumResult<Self> {
        let content = fs::read(csv_path).map_err(|e| VinumError::StoreInit {
            path: csv_path.display().to_string(),
            reason: format!("cannot read wine data: {}", e),
        })?;

        let mut records = parse_wine_csv(&content, &csv_path.display().to_string())?;
        // Stable sort keeps CSV order within one year.
        records.sort_by_key(|r| r.harvest_year);

        fs::create_dir_all(storage_dir).map_err(|e| VinumError::StoreInit {
            path: storage_dir.display().to_string(),
            reason: format!("cannot create storage directory: {}", e),
        })?;

        let path = storage_dir.join(SOURCE_FILE);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| VinumError::StoreInit {
                path: path.display().to_string(),
                reason: format!("cannot create sorted catalog: {}", e),
            })?;

        for record in &records {
            let encoded = encode_record(record)?;
            file.write_all(&encoded).map_err(|e| VinumError::IoError {
                operation: "write_sorted_catalog".to_string(),
                reason: e.to_string(),
            })?;
        }
        file.flush().map_err(|e| VinumError::IoError {
            operation: "flush_sorted_catalog".to_string(),
            reason: e.to_string(),
        })?;

        info!(
            "sorted {} wines from {} into {}",
            records.len(),
            csv_path.display(),
            path.display()
        );

        Ok(Self {
            path,
            file,
            count: records.len() as u64,
        })
    }

    /// Open an existing sorted catalog without re-running the pre-pass.
    pub fn open(path: &Path) -> VinumResult<Self> {
        let file = File::open(path).map_err(|e| VinumError::StoreInit {
            path: path.display().to_string(),
            reason: format!("cannot open sorted catalog: {}", e),
        })?;
        let len = file
            .metadata()
            .map_err(|e| VinumError::StoreInit {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .len();
        if len % SOURCE_RECORD_WIDTH as u64 != 0 {
            return Err(VinumError::StoreInit {
                path: path.display().to_string(),
                reason: format!(
                    "file length {} is not a multiple of the record width {}",
                    len, SOURCE_RECORD_WIDTH
                ),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            file,
            count: len / SOURCE_RECORD_WIDTH as u64,
        })
    }

    /// Number of records in the sorted catalog.
    pub fn len(&self) -> u64 {
        self.count
    }

    /// True when the catalog holds no wines.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Return every wine with the given harvest year, in file order.
    ///
    /// Binary search locates the first record whose year is not below `k`,
    /// then a forward scan collects the run of equal years.
    pub fn lookup_by_harvest_year(&mut self, year: i32) -> VinumResult<Vec<WineRecord>> {
        // Lower bound: first index with year(idx) >= year.
        let mut lo = 0u64;
        let mut hi = self.count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.read_year_at(mid)? < year {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        let mut matches = Vec::new();
        let mut idx = lo;
        while idx < self.count {
            let record = self.read_record_at(idx)?;
            if record.harvest_year != year {
                break;
            }
            matches.push(record);
            idx += 1;
        }

        debug!(
            "lookup year {} in {}: {} match(es)",
            year,
            self.path.display(),
            matches.len()
        );
        Ok(matches)
    }

    fn read_year_at(&mut self, idx: u64) -> VinumResult<i32> {
        let offset = idx * SOURCE_RECORD_WIDTH as u64 + 4;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| VinumError::IoError {
                operation: "seek_sorted_catalog".to_string(),
                reason: e.to_string(),
            })?;
        let mut buf = [0u8; 4];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| VinumError::IoError {
                operation: "read_sorted_catalog".to_string(),
                reason: e.to_string(),
            })?;
        Ok(i32::from_be_bytes(buf))
    }

    fn read_record_at(&mut self, idx: u64) -> VinumResult<WineRecord> {
        let offset = idx * SOURCE_RECORD_WIDTH as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| VinumError::IoError {
                operation: "seek_sorted_catalog".to_string(),
                reason: e.to_string(),
            })?;
        let mut buf = vec![0u8; SOURCE_RECORD_WIDTH];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| VinumError::IoError {
                operation: "read_sorted_catalog".to_string(),
                reason: e.to_string(),
            })?;
        decode_record(&buf)
    }
}

/// Encode one record into its fixed-width form.
fn encode_record(record: &WineRecord) -> VinumResult<Vec<u8>> {
    let label = record.label.as_bytes();
    if label.len() > LABEL_CAPACITY {
        return Err(VinumError::InvalidRecord {
            field: "rotulo".to_string(),
            reason: format!(
                "label is {} bytes, exceeding the fixed capacity of {}",
                label.len(),
                LABEL_CAPACITY
            ),
        });
    }

    let mut buf = vec![0u8; SOURCE_RECORD_WIDTH];
    buf[0..4].copy_from_slice(&record.wine_id.to_be_bytes());
    buf[4..8].copy_from_slice(&record.harvest_year.to_be_bytes());
    buf[8] = record.kind.as_byte();
    buf[9..11].copy_from_slice(&(label.len() as u16).to_be_bytes());
    buf[11..11 + label.len()].copy_from_slice(label);
    Ok(buf)
}

/// Decode one fixed-width record.
fn decode_record(buf: &[u8]) -> VinumResult<WineRecord> {
    let wine_id = i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let harvest_year = i32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let kind = WineKind::from_byte(buf[8])?;
    let label_len = u16::from_be_bytes([buf[9], buf[10]]) as usize;
    if label_len > LABEL_CAPACITY {
        return Err(VinumError::DeserializationError {
            reason: format!("label length {} exceeds capacity", label_len),
        });
    }
    let label =
        String::from_utf8(buf[11..11 + label_len].to_vec()).map_err(|e| {
            VinumError::DeserializationError {
                reason: format!("label is not valid UTF-8: {}", e),
            }
        })?;
    WineRecord::new(wine_id, label, harvest_year, kind)
}
