// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-size heap page codec.
//!
//! A heap page holds an ordered sequence of variable-length wine records
//! inside a fixed byte capacity `P`. The on-disk form is deterministic and
//! endian-portable: a 32-byte big-endian header followed by the bincode
//! encoding of the record list, zero-padded to exactly `P` bytes.
//!
//! ## Page Layout
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │ PageHeader (32 bytes)                           │
//! ├─────────────────────────────────────────────────┤
//! │ Data Section (P - 32 bytes)                     │
//! │   bincode(Vec<WineRecord>) + zero padding       │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## CRC32 Protection
//! - Checksum calculated over the full padded data section
//! - Validates data integrity on read
//! - Detects corruption from partial writes, hardware errors, etc.

use crate::error::{VinumError, VinumResult};
use crate::wine::WineRecord;

/// Magic bytes for heap page format validation.
pub const HEAP_MAGIC: u32 = 0xCE11_A4D0;

/// Page header size in bytes.
pub const PAGE_HEADER_SIZE: usize = 32;

/// Page header structure (32 bytes).
///
/// ## Memory Layout
/// ```text
/// Offset | Size | Field
/// -------|------|-------
/// 0      | 4    | magic (HEAP_MAGIC constant)
/// 4      | 2    | record_count (u16 big-endian)
/// 6      | 4    | data_len (u32 big-endian, bincode payload bytes)
/// 10     | 4    | checksum (CRC32 of padded data section)
/// 14     | 18   | _padding (reserved, zeroed)
/// ```
#[derive(Debug, Clone)]
pub struct PageHeader {
    /// Magic bytes for format validation.
    pub magic: u32,

    /// Number of records in the data section.
    pub record_count: u16,

    /// Length of the bincode payload before padding.
    pub data_len: u32,

    /// CRC32 checksum of the padded data section.
    pub checksum: u32,
}

impl PageHeader {
    /// Serialise header to a 32-byte array (big-endian fields).
    pub fn to_bytes(&self) -> [u8; PAGE_HEADER_SIZE] {
        let mut bytes = [0u8; PAGE_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.record_count.to_be_bytes());
        bytes[6..10].copy_from_slice(&self.data_len.to_be_bytes());
        bytes[10..14].copy_from_slice(&self.checksum.to_be_bytes());
        bytes
    }

    /// Deserialise header from a 32-byte slice.
    ///
    /// ## Error Conditions
    /// - Slice shorter than 32 bytes
    /// - Magic bytes other than `HEAP_MAGIC`
    pub fn from_bytes(page_id: u32, bytes: &[u8]) -> VinumResult<Self> {
        if bytes.len() < PAGE_HEADER_SIZE {
            return Err(VinumError::PageCorrupt {
                page_id,
                reason: format!(
                    "header must be {} bytes, got {}",
                    PAGE_HEADER_SIZE,
                    bytes.len()
                ),
            });
        }

        let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != HEAP_MAGIC {
            return Err(VinumError::PageCorrupt {
                page_id,
                reason: format!(
                    "invalid magic bytes: expected 0x{:X}, got 0x{:X}",
                    HEAP_MAGIC, magic
                ),
            });
        }

        let record_count = u16::from_be_bytes([bytes[4], bytes[5]]);
        let data_len = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let checksum = u32::from_be_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);

        Ok(Self {
            magic,
            record_count,
            data_len,
            checksum,
        })
    }
}

/// One fixed-size page of the heap file.
///
/// Holds the decoded record list; the page id is carried in memory only
/// (the file offset is the authority on disk). The dirty flag lives in the
/// buffer frame, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct HeapPage {
    id: u32,
    records: Vec<WineRecord>,
}

impl HeapPage {
    /// Create an empty page with the given id.
    pub fn new(id: u32) -> Self {
        Self {
            id,
            records: Vec::new(),
        }
    }

    /// Page identifier (1-based; 0 is reserved).
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Records in slot order.
    pub fn records(&self) -> &[WineRecord] {
        &self.records
    }

    /// Record at the given slot, if present.
    pub fn record(&self, slot: u32) -> Option<&WineRecord> {
        self.records.get(slot as usize)
    }

    /// Number of records on the page.
    pub fn record_count(&self) -> u32 {
        self.records.len() as u32
    }

    /// Append a record, returning the slot it landed in.
    ///
    /// The caller is responsible for checking capacity first (the encoded
    /// form is validated again on write).
    pub fn push(&mut self, record: WineRecord) -> u32 {
        self.records.push(record);
        self.records.len() as u32 - 1
    }

    /// Size of the encoded page before padding.
    pub fn encoded_len(&self) -> VinumResult<u64> {
        let payload =
            bincode::serialized_size(&self.records).map_err(|e| VinumError::SerializationError {
                reason: e.to_string(),
            })?;
        Ok(PAGE_HEADER_SIZE as u64 + payload)
    }

    /// Would the page still fit in `page_size` bytes with `record` appended?
    pub fn fits_with(&self, record: &WineRecord, page_size: usize) -> VinumResult<bool> {
        let mut probe: Vec<&WineRecord> = self.records.iter().collect();
        probe.push(record);
        let payload =
            bincode::serialized_size(&probe).map_err(|e| VinumError::SerializationError {
                reason: e.to_string(),
            })?;
        Ok(PAGE_HEADER_SIZE as u64 + payload <= page_size as u64)
    }

    /// Encode the page into exactly `page_size` bytes.
    ///
    /// ## Output
    /// - `Ok(Vec<u8>)`: header + payload + zero padding, `page_size` long
    /// - `Err(VinumError::PageTooLarge)`: encoded form exceeds the capacity
    /// - `Err(VinumError::SerializationError)`: bincode failure
    pub fn encode(&self, page_size: usize) -> VinumResult<Vec<u8>> {
        let payload =
            bincode::serialize(&self.records).map_err(|e| VinumError::SerializationError {
                reason: e.to_string(),
            })?;

        let encoded = PAGE_HEADER_SIZE as u64 + payload.len() as u64;
        if encoded > page_size as u64 {
            return Err(VinumError::PageTooLarge {
                page_id: self.id,
                encoded,
                capacity: page_size as u64,
            });
        }

        let mut data = payload;
        data.resize(page_size - PAGE_HEADER_SIZE, 0);

        let header = PageHeader {
            magic: HEAP_MAGIC,
            record_count: self.records.len() as u16,
            data_len: (encoded - PAGE_HEADER_SIZE as u64) as u32,
            checksum: crc32fast::hash(&data),
        };

        let mut bytes = Vec::with_capacity(page_size);
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(&data);
        Ok(bytes)
    }

    /// Decode a page from exactly `page_size` bytes read at its offset.
    ///
    /// ## Error Conditions
    /// - `PageCorrupt`: wrong length, bad magic, checksum mismatch,
    ///   payload length out of bounds, or record count mismatch
    pub fn decode(id: u32, bytes: &[u8]) -> VinumResult<Self> {
        let header = PageHeader::from_bytes(id, bytes)?;
        let data = &bytes[PAGE_HEADER_SIZE..];

        let computed = crc32fast::hash(data);
        if computed != header.checksum {
            return Err(VinumError::PageCorrupt {
                page_id: id,
                reason: format!(
                    "CRC32 mismatch: expected 0x{:X}, computed 0x{:X}",
                    header.checksum, computed
                ),
            });
        }

        let data_len = header.data_len as usize;
        if data_len > data.len() {
            return Err(VinumError::PageCorrupt {
                page_id: id,
                reason: format!(
                    "payload length {} exceeds data section of {} bytes",
                    data_len,
                    data.len()
                ),
            });
        }

        let records: Vec<WineRecord> =
            bincode::deserialize(&data[..data_len]).map_err(|e| VinumError::PageCorrupt {
                page_id: id,
                reason: format!("record list failed to decode: {}", e),
            })?;

        if records.len() != header.record_count as usize {
            return Err(VinumError::PageCorrupt {
                page_id: id,
                reason: format!(
                    "record count mismatch: header says {}, payload has {}",
                    header.record_count,
                    records.len()
                ),
            });
        }

        Ok(Self { id, records })
    }
}
