// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Index file store.
//!
//! Persists B+-Tree nodes as individually addressable records of
//! `index.ygg` plus a metadata block. The format is line-oriented text,
//! which keeps the file inspectable, but every line is space-padded to a
//! fixed width so a node can be rewritten in place with a single seek
//! instead of a file scan.
//!
//! ## File Layout
//! ```text
//! ROOT_ID=<id>                    ┐
//! NEXT_ID=<id>                    │ metadata block, each line padded
//! HEIGHT=<h>                      │ to 32 bytes, then a blank line
//! DEGREE=<m>                      ┘
//!
//! NODE 0 | LEAF=true | KEYS=2010,2011 | VALUES=1:0,1:1 | NEXT=null
//! NODE 1 | LEAF=false | KEYS=2011 | CHILDREN=0,2
//! ...
//! ```
//!
//! Node record `n` lives at `METADATA_BLOCK_SIZE + n * record_width`; the
//! record width is a function of the degree (worst-case key, locator and
//! child CSVs), so the degree is persisted and checked on reopen.

use crate::error::{VinumError, VinumResult};
use crate::index::node::{BPlusNode, InternalNode, LeafNode, Locator, NodeId};
use fs2::FileExt;
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Index file name inside the storage directory.
pub const INDEX_FILE: &str = "index.ygg";

/// Width of one metadata line including its newline.
const METADATA_LINE_WIDTH: usize = 32;

/// Metadata block: four padded lines plus the blank separator line.
pub const METADATA_BLOCK_SIZE: usize = 4 * METADATA_LINE_WIDTH + 1;

/// B+-Tree bookkeeping persisted at the head of the index file.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMetadata {
    /// Node id of the current root.
    pub root_id: NodeId,

    /// Next id to hand out; node ids are assigned monotonically.
    pub next_node_id: NodeId,

    /// Number of non-leaf levels; 0 when the root is a leaf.
    pub height: u32,

    /// Maximum keys per node before a split. Fixed for the file's lifetime
    /// because the record width derives from it.
    pub degree: u16,
}

/// Store for B+-Tree nodes and tree metadata.
pub struct IndexFileStore {
    path: PathBuf,
    file: File,
    metadata: IndexMetadata,
    record_width: usize,
}

impl IndexFileStore {
    /// Create or open the index store in `dir`.
    ///
    /// A fresh store starts as a single empty leaf: metadata
    /// `root_id=0, next_node_id=1, height=0` with node 0 persisted.
    ///
    /// ## Error Conditions
    /// - `InvalidDegree`: degree below 2
    /// - `StoreInit`: directory/file failure, malformed metadata, or a
    ///   degree mismatch with an existing index
    pub fn initialize(dir: &Path, degree: u16) -> VinumResult<Self> {
        if degree < 2 {
            return Err(VinumError::InvalidDegree { degree, min: 2 });
        }

        std::fs::create_dir_all(dir).map_err(|e| VinumError::StoreInit {
            path: dir.display().to_string(),
            reason: format!("cannot create storage directory: {}", e),
        })?;

        let path = dir.join(INDEX_FILE);
        let exists = path
            .metadata()
            .map(|m| m.len() >= METADATA_BLOCK_SIZE as u64)
            .unwrap_or(false);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| VinumError::StoreInit {
                path: path.display().to_string(),
                reason: format!("cannot open index file: {}", e),
            })?;
        file.try_lock_exclusive().map_err(|e| VinumError::StoreInit {
            path: path.display().to_string(),
            reason: format!("index file is locked by another process: {}", e),
        })?;

        if exists {
            let mut store = Self {
                path: path.clone(),
                file,
                metadata: IndexMetadata {
                    root_id: 0,
                    next_node_id: 1,
                    height: 0,
                    degree,
                },
                record_width: node_record_width(degree),
            };
            store.metadata = store.read_metadata()?;
            if store.metadata.degree != degree {
                return Err(VinumError::StoreInit {
                    path: path.display().to_string(),
                    reason: format!(
                        "index was created with degree {}, reopened with {}",
                        store.metadata.degree, degree
                    ),
                });
            }
            store.record_width = node_record_width(store.metadata.degree);
            debug!(
                "opened index at {} (root {}, {} nodes, height {})",
                path.display(),
                store.metadata.root_id,
                store.metadata.next_node_id,
                store.metadata.height
            );
            Ok(store)
        } else {
            let mut store = Self {
                path: path.clone(),
                file,
                metadata: IndexMetadata {
                    root_id: 0,
                    next_node_id: 1,
                    height: 0,
                    degree,
                },
                record_width: node_record_width(degree),
            };
            store.save_metadata()?;
            store.save_node(&BPlusNode::Leaf(LeafNode::new(0)))?;
            info!("created index at {} (degree {})", path.display(), degree);
            Ok(store)
        }
    }

    /// Load and decode the node with the given id.
    ///
    /// ## Error Conditions
    /// - `NodeNotFound`: id was never allocated
    /// - `IndexCorrupt`: record failed to decode
    /// - `IoError`: seek/read failure
    pub fn load_node(&mut self, id: NodeId) -> VinumResult<BPlusNode> {
        if !self.node_exists(id) {
            return Err(VinumError::NodeNotFound { node_id: id });
        }

        self.file
            .seek(SeekFrom::Start(self.node_offset(id)))
            .map_err(|e| VinumError::IoError {
                operation: format!("seek_node_{}", id),
                reason: e.to_string(),
            })?;
        let mut buf = vec![0u8; self.record_width];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| VinumError::IoError {
                operation: format!("read_node_{}", id),
                reason: e.to_string(),
            })?;

        let line = std::str::from_utf8(&buf)
            .map_err(|e| VinumError::IndexCorrupt {
                node_id: id,
                reason: format!("record is not valid UTF-8: {}", e),
            })?
            .trim_end();

        decode_node(id, line)
    }

    /// Rewrite the node's record in place (or write it for the first time
    /// after allocation).
    ///
    /// ## Error Conditions
    /// - `NodeNotFound`: id beyond the allocated range
    /// - `IoError`: seek/write failure
    pub fn save_node(&mut self, node: &BPlusNode) -> VinumResult<()> {
        let id = node.id();
        if !self.node_exists(id) {
            return Err(VinumError::NodeNotFound { node_id: id });
        }

        let line = encode_node(node);
        if line.len() >= self.record_width {
            return Err(VinumError::IndexCorrupt {
                node_id: id,
                reason: format!(
                    "encoded record is {} bytes, exceeding the {}-byte slot",
                    line.len(),
                    self.record_width
                ),
            });
        }

        let mut record = line.into_bytes();
        record.resize(self.record_width - 1, b' ');
        record.push(b'\n');

        self.file
            .seek(SeekFrom::Start(self.node_offset(id)))
            .map_err(|e| VinumError::IoError {
                operation: format!("seek_node_{}", id),
                reason: e.to_string(),
            })?;
        self.file
            .write_all(&record)
            .map_err(|e| VinumError::IoError {
                operation: format!("write_node_{}", id),
                reason: e.to_string(),
            })?;

        debug!("saved node {} ({} keys)", id, node.key_count());
        Ok(())
    }

    /// Hand out the next monotonic node id. The caller persists the node;
    /// `save_metadata` persists the bumped counter.
    pub fn allocate_node_id(&mut self) -> NodeId {
        let id = self.metadata.next_node_id;
        self.metadata.next_node_id += 1;
        id
    }

    /// Rewrite the metadata block, leaving node records untouched.
    pub fn save_metadata(&mut self) -> VinumResult<()> {
        let mut block = Vec::with_capacity(METADATA_BLOCK_SIZE);
        for line in [
            format!("ROOT_ID={}", self.metadata.root_id),
            format!("NEXT_ID={}", self.metadata.next_node_id),
            format!("HEIGHT={}", self.metadata.height),
            format!("DEGREE={}", self.metadata.degree),
        ] {
            let mut bytes = line.into_bytes();
            bytes.resize(METADATA_LINE_WIDTH - 1, b' ');
            bytes.push(b'\n');
            block.extend_from_slice(&bytes);
        }
        block.push(b'\n');

        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| VinumError::IoError {
                operation: "seek_index_metadata".to_string(),
                reason: e.to_string(),
            })?;
        self.file
            .write_all(&block)
            .map_err(|e| VinumError::IoError {
                operation: "write_index_metadata".to_string(),
                reason: e.to_string(),
            })
    }

    fn read_metadata(&mut self) -> VinumResult<IndexMetadata> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| VinumError::StoreInit {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        let mut buf = vec![0u8; METADATA_BLOCK_SIZE];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| VinumError::StoreInit {
                path: self.path.display().to_string(),
                reason: format!("cannot read index metadata: {}", e),
            })?;

        let text = std::str::from_utf8(&buf).map_err(|e| VinumError::StoreInit {
            path: self.path.display().to_string(),
            reason: format!("index metadata is not valid UTF-8: {}", e),
        })?;

        let mut lines = text.lines();
        let root_id = parse_metadata_line(lines.next(), "ROOT_ID", &self.path)?;
        let next_node_id = parse_metadata_line(lines.next(), "NEXT_ID", &self.path)?;
        let height = parse_metadata_line(lines.next(), "HEIGHT", &self.path)?;
        let degree: u32 = parse_metadata_line(lines.next(), "DEGREE", &self.path)?;

        Ok(IndexMetadata {
            root_id,
            next_node_id,
            height,
            degree: degree as u16,
        })
    }

    /// True when the id has been allocated.
    pub fn node_exists(&self, id: NodeId) -> bool {
        id < self.metadata.next_node_id
    }

    /// Force all written node records to stable storage.
    pub fn flush(&mut self) -> VinumResult<()> {
        self.file.sync_all().map_err(|e| VinumError::IoError {
            operation: "sync_index".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut IndexMetadata {
        &mut self.metadata
    }

    pub fn degree(&self) -> u16 {
        self.metadata.degree
    }

    fn node_offset(&self, id: NodeId) -> u64 {
        METADATA_BLOCK_SIZE as u64 + id as u64 * self.record_width as u64
    }
}

/// Fixed record width for a given degree.
///
/// Sized for the worst case the tree persists: `m` keys in a leaf (a node
/// is split immediately after reaching `m`, but both halves are written as
/// separate records) and `m + 1` children in an internal node.
fn node_record_width(degree: u16) -> usize {
    let m = degree as usize;
    let key_csv = m * 11 + m.saturating_sub(1);
    let child_csv = (m + 1) * 10 + m;
    let locator_csv = m * 21 + m.saturating_sub(1);
    let prefix = "NODE ".len() + 10 + " | LEAF=false".len() + " | KEYS=".len();
    let internal = prefix + key_csv + " | CHILDREN=".len() + child_csv;
    let leaf = prefix + key_csv + " | VALUES=".len() + locator_csv + " | NEXT=".len() + 10;
    internal.max(leaf) + 1
}

fn parse_metadata_line<T: std::str::FromStr>(
    line: Option<&str>,
    field: &str,
    path: &Path,
) -> VinumResult<T> {
    let line = line.ok_or_else(|| VinumError::StoreInit {
        path: path.display().to_string(),
        reason: format!("metadata block is missing '{}'", field),
    })?;
    let trimmed = line.trim_end();
    let value = trimmed
        .strip_prefix(field)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| VinumError::StoreInit {
            path: path.display().to_string(),
            reason: format!("expected '{}=<value>', got '{}'", field, trimmed),
        })?;
    value.parse().map_err(|_| VinumError::StoreInit {
        path: path.display().to_string(),
        reason: format!("'{}' is not a valid {}", value, field),
    })
}

/// Encode a node as its single-line record (without padding).
fn encode_node(node: &BPlusNode) -> String {
    match node {
        BPlusNode::Leaf(leaf) => {
            let next = match leaf.next_leaf {
                Some(id) => id.to_string(),
                None => "null".to_string(),
            };
            format!(
                "NODE {} | LEAF=true | KEYS={} | VALUES={} | NEXT={}",
                leaf.id,
                join_csv(leaf.keys.iter()),
                join_csv(leaf.locators.iter()),
                next
            )
        }
        BPlusNode::Internal(internal) => format!(
            "NODE {} | LEAF=false | KEYS={} | CHILDREN={}",
            internal.id,
            join_csv(internal.keys.iter()),
            join_csv(internal.children.iter())
        ),
    }
}

fn join_csv<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a node record line.
fn decode_node(id: NodeId, line: &str) -> VinumResult<BPlusNode> {
    let corrupt = |reason: String| VinumError::IndexCorrupt {
        node_id: id,
        reason,
    };

    let mut parts = line.split(" | ");

    let head = parts
        .next()
        .ok_or_else(|| corrupt("empty record".to_string()))?;
    let record_id: NodeId = head
        .strip_prefix("NODE ")
        .and_then(|rest| rest.trim().parse().ok())
        .ok_or_else(|| corrupt(format!("malformed record head '{}'", head)))?;
    if record_id != id {
        return Err(corrupt(format!(
            "record claims id {}, expected {}",
            record_id, id
        )));
    }

    let leaf_part = parts
        .next()
        .ok_or_else(|| corrupt("missing LEAF field".to_string()))?;
    let is_leaf = match leaf_part {
        "LEAF=true" => true,
        "LEAF=false" => false,
        other => return Err(corrupt(format!("malformed LEAF field '{}'", other))),
    };

    let keys_part = parts
        .next()
        .ok_or_else(|| corrupt("missing KEYS field".to_string()))?;
    let keys = parse_csv::<i32>(keys_part, "KEYS").map_err(&corrupt)?;

    if is_leaf {
        let values_part = parts
            .next()
            .ok_or_else(|| corrupt("missing VALUES field".to_string()))?;
        let locators = parse_locator_csv(values_part).map_err(&corrupt)?;

        let next_part = parts
            .next()
            .ok_or_else(|| corrupt("missing NEXT field".to_string()))?;
        let next_raw = next_part
            .strip_prefix("NEXT=")
            .ok_or_else(|| corrupt(format!("malformed NEXT field '{}'", next_part)))?;
        let next_leaf = match next_raw {
            "null" => None,
            value => Some(
                value
                    .parse()
                    .map_err(|_| corrupt(format!("malformed NEXT value '{}'", value)))?,
            ),
        };

        if keys.len() != locators.len() {
            return Err(corrupt(format!(
                "{} keys but {} locators",
                keys.len(),
                locators.len()
            )));
        }

        Ok(BPlusNode::Leaf(LeafNode {
            id,
            keys,
            locators,
            next_leaf,
        }))
    } else {
        let children_part = parts
            .next()
            .ok_or_else(|| corrupt("missing CHILDREN field".to_string()))?;
        let children = parse_csv::<NodeId>(children_part, "CHILDREN").map_err(&corrupt)?;

        if children.len() != keys.len() + 1 {
            return Err(corrupt(format!(
                "{} keys but {} children",
                keys.len(),
                children.len()
            )));
        }

        Ok(BPlusNode::Internal(InternalNode { id, keys, children }))
    }
}

fn parse_csv<T: std::str::FromStr>(part: &str, field: &str) -> Result<Vec<T>, String> {
    let csv = part
        .strip_prefix(field)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| format!("expected '{}=<csv>', got '{}'", field, part))?;
    if csv.is_empty() {
        return Ok(Vec::new());
    }
    csv.split(',')
        .map(|item| {
            item.parse()
                .map_err(|_| format!("malformed {} item '{}'", field, item))
        })
        .collect()
}

fn parse_locator_csv(part: &str) -> Result<Vec<Locator>, String> {
    let csv = part
        .strip_prefix("VALUES=")
        .ok_or_else(|| format!("expected 'VALUES=<csv>', got '{}'", part))?;
    if csv.is_empty() {
        return Ok(Vec::new());
    }
    csv.split(',')
        .map(|item| {
            let (page, slot) = item
                .split_once(':')
                .ok_or_else(|| format!("malformed locator '{}'", item))?;
            let page_id = page
                .parse()
                .map_err(|_| format!("malformed locator page '{}'", item))?;
            let slot = slot
                .parse()
                .map_err(|_| format!("malformed locator slot '{}'", item))?;
            Ok(Locator::new(page_id, slot))
        })
        .collect()
}
