// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! LRU frame pools with dirty write-back.
//!
//! A [`FramePool`] keeps at most `capacity` entities of one store resident.
//! Loads promote to most-recently-used; when the pool is full the
//! least-recently-used frame is evicted, written back first if dirty.
//! The data-page pool and the index-node pool are the same structure
//! instantiated over the two stores; [`BufferPool`] bundles them.
//!
//! ## Contract
//!
//! - At most one resident frame per id; mutation goes through that frame.
//! - Callers must not retain a frame reference across another pool
//!   operation, which may evict or replace it. The borrow checker enforces
//!   this: every accessor takes `&mut self`.
//! - Evicting a dirty frame performs exactly one store write; evicting a
//!   clean frame performs none.
//! - `flush` writes a resident frame back even when clean and clears its
//!   dirty flag; flushing is idempotent.
//!
//! ## Recency
//!
//! Recency and eviction order are delegated to [`lru::LruCache`]; `load`,
//! `put` and `get_current` count as uses, while `mark_dirty` and `flush`
//! peek without promoting. Ties are broken FIFO by insertion order, which
//! is what the cache degenerates to when nothing is re-touched.

use crate::error::{VinumError, VinumResult};
use crate::heap::{HeapFileStore, HeapPage};
use crate::index::{BPlusNode, IndexFileStore, NodeId};
use log::{debug, trace};
use lru::LruCache;
use std::num::NonZeroUsize;

/// A store that can back a frame pool.
///
/// `read`/`write` move whole entities; `first_id` names the canonical
/// entity `get_current` falls back to when nothing is resident (page 1
/// for the heap, the root node for the index).
pub trait FrameSource {
    type Entity: Clone;

    /// Pool label used in logs and errors.
    fn pool_name() -> &'static str;

    /// Identifier of an entity.
    fn entity_id(entity: &Self::Entity) -> u32;

    /// Canonical first entity to load into an empty pool, if any exists.
    fn first_id(&self) -> Option<u32>;

    /// Read the entity with the given id from the store.
    fn read(&mut self, id: u32) -> VinumResult<Self::Entity>;

    /// Write the entity back to the store.
    fn write(&mut self, entity: &Self::Entity) -> VinumResult<()>;
}

struct Frame<E> {
    entity: E,
    dirty: bool,
}

/// Bounded LRU cache of one store's entities.
pub struct FramePool<S: FrameSource> {
    source: S,
    frames: LruCache<u32, Frame<S::Entity>>,
}

impl<S: FrameSource> FramePool<S> {
    /// Create a pool with the given frame budget.
    ///
    /// ## Error Conditions
    /// - `ParseError`: zero capacity (the pool could never hold a frame)
    pub fn new(source: S, capacity: usize) -> VinumResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| VinumError::ParseError {
            reason: format!("{} pool needs at least one frame", S::pool_name()),
        })?;
        Ok(Self {
            source,
            frames: LruCache::new(capacity),
        })
    }

    /// The MRU frame, loading the canonical first entity when empty.
    ///
    /// ## Error Conditions
    /// - `PoolEmpty`: pool empty and the store has nothing to load
    pub fn get_current(&mut self) -> VinumResult<&S::Entity> {
        match self.frames.iter().next().map(|(id, _)| *id) {
            Some(id) => self.resident(id),
            None => match self.source.first_id() {
                Some(id) => self.load(id),
                None => Err(VinumError::PoolEmpty {
                    pool: S::pool_name(),
                }),
            },
        }
    }

    /// Return the entity with the given id, reading it from the store on a
    /// miss. Promotes the id to MRU either way; a miss on a full pool
    /// evicts the LRU frame first.
    pub fn load(&mut self, id: u32) -> VinumResult<&S::Entity> {
        if self.frames.contains(&id) {
            trace!("{} pool hit: {}", S::pool_name(), id);
            self.frames.promote(&id);
        } else {
            debug!("{} pool miss: loading {}", S::pool_name(), id);
            let entity = self.source.read(id)?;
            self.install(id, entity)?;
        }
        self.resident(id)
    }

    /// Install a caller-supplied entity at MRU, replacing the resident
    /// content when the id is already present (idempotent per id).
    pub fn put(&mut self, entity: S::Entity) -> VinumResult<()> {
        let id = S::entity_id(&entity);
        if let Some(frame) = self.frames.get_mut(&id) {
            frame.entity = entity;
        } else {
            self.install(id, entity)?;
        }
        Ok(())
    }

    /// Flag the resident frame as modified; no-op when not resident.
    /// Peeks without promoting: marking is not an access.
    pub fn mark_dirty(&mut self, id: u32) {
        if let Some(frame) = self.frames.peek_mut(&id) {
            frame.dirty = true;
        }
    }

    /// Write the resident frame back (even if clean) and clear its dirty
    /// flag; no-op when not resident. Does not evict or promote.
    pub fn flush_frame(&mut self, id: u32) -> VinumResult<()> {
        if let Some(frame) = self.frames.peek_mut(&id) {
            self.source.write(&frame.entity)?;
            frame.dirty = false;
        }
        Ok(())
    }

    /// Flush every resident frame, LRU first.
    pub fn flush_all(&mut self) -> VinumResult<()> {
        let ids: Vec<u32> = self.frames.iter().map(|(id, _)| *id).collect();
        for id in ids.into_iter().rev() {
            self.flush_frame(id)?;
        }
        Ok(())
    }

    /// Number of resident frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Is the id resident?
    pub fn contains(&self, id: u32) -> bool {
        self.frames.contains(&id)
    }

    /// Is the resident frame dirty? False when not resident.
    pub fn is_dirty(&self, id: u32) -> bool {
        self.frames.peek(&id).map(|f| f.dirty).unwrap_or(false)
    }

    /// Resident ids in recency order (LRU first).
    pub fn resident_ids(&self) -> Vec<u32> {
        self.frames.iter().map(|(id, _)| *id).rev().collect()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn resident(&self, id: u32) -> VinumResult<&S::Entity> {
        self.frames
            .peek(&id)
            .map(|frame| &frame.entity)
            .ok_or(VinumError::PoolEmpty {
                pool: S::pool_name(),
            })
    }

    fn install(&mut self, id: u32, entity: S::Entity) -> VinumResult<()> {
        // Pre-evict so a dirty victim is written back before the cache
        // drops it; a failed write-back leaves the victim resident.
        if self.frames.len() >= self.frames.cap().get() {
            self.evict_lru()?;
        }
        self.frames.push(
            id,
            Frame {
                entity,
                dirty: false,
            },
        );
        Ok(())
    }

    fn evict_lru(&mut self) -> VinumResult<()> {
        let victim = match self.frames.peek_lru() {
            Some((id, frame)) => {
                let id = *id;
                if frame.dirty {
                    debug!(
                        "{} pool evicting dirty frame {} (write-back)",
                        S::pool_name(),
                        id
                    );
                    self.source.write(&frame.entity)?;
                } else {
                    trace!("{} pool evicting clean frame {}", S::pool_name(), id);
                }
                id
            }
            None => return Ok(()),
        };

        self.frames.pop(&victim);
        Ok(())
    }
}

impl FrameSource for HeapFileStore {
    type Entity = HeapPage;

    fn pool_name() -> &'static str {
        "data"
    }

    fn entity_id(entity: &HeapPage) -> u32 {
        entity.id()
    }

    fn first_id(&self) -> Option<u32> {
        // Page 1 exists from store initialisation onwards.
        if self.metadata().page_count >= 1 {
            Some(1)
        } else {
            None
        }
    }

    fn read(&mut self, id: u32) -> VinumResult<HeapPage> {
        self.read_page(id)
    }

    fn write(&mut self, entity: &HeapPage) -> VinumResult<()> {
        self.write_page(entity)
    }
}

impl FrameSource for IndexFileStore {
    type Entity = BPlusNode;

    fn pool_name() -> &'static str {
        "index"
    }

    fn entity_id(entity: &BPlusNode) -> u32 {
        entity.id()
    }

    fn first_id(&self) -> Option<u32> {
        Some(self.metadata().root_id)
    }

    fn read(&mut self, id: u32) -> VinumResult<BPlusNode> {
        self.load_node(id)
    }

    fn write(&mut self, entity: &BPlusNode) -> VinumResult<()> {
        self.save_node(entity)
    }
}

/// The engine's two frame pools: data pages and index nodes.
///
/// Owns both stores; callers reach them through the accessors for
/// allocation and metadata, while all page/node traffic goes through the
/// pool methods.
pub struct BufferPool {
    data: FramePool<HeapFileStore>,
    index: FramePool<IndexFileStore>,
}

impl BufferPool {
    /// Build the pool pair over freshly initialised stores.
    pub fn new(
        heap: HeapFileStore,
        index: IndexFileStore,
        data_frames: usize,
        index_frames: usize,
    ) -> VinumResult<Self> {
        Ok(Self {
            data: FramePool::new(heap, data_frames)?,
            index: FramePool::new(index, index_frames)?,
        })
    }

    // --- data pool ---

    /// The MRU data page, loading page 1 when nothing is resident.
    pub fn current_page(&mut self) -> VinumResult<&HeapPage> {
        self.data.get_current()
    }

    pub fn load_page(&mut self, id: u32) -> VinumResult<&HeapPage> {
        self.data.load(id)
    }

    pub fn put_page(&mut self, page: HeapPage) -> VinumResult<()> {
        self.data.put(page)
    }

    pub fn mark_page_dirty(&mut self, id: u32) {
        self.data.mark_dirty(id);
    }

    pub fn flush_page(&mut self, id: u32) -> VinumResult<()> {
        self.data.flush_frame(id)
    }

    // --- index pool ---

    /// The MRU index node, loading the root when nothing is resident.
    pub fn current_node(&mut self) -> VinumResult<&BPlusNode> {
        self.index.get_current()
    }

    pub fn load_node(&mut self, id: NodeId) -> VinumResult<&BPlusNode> {
        self.index.load(id)
    }

    pub fn put_node(&mut self, node: BPlusNode) -> VinumResult<()> {
        self.index.put(node)
    }

    pub fn mark_node_dirty(&mut self, id: NodeId) {
        self.index.mark_dirty(id);
    }

    pub fn flush_node(&mut self, id: NodeId) -> VinumResult<()> {
        self.index.flush_frame(id)
    }

    // --- shutdown path ---

    /// Flush both pools and sync both files: data frames first, then index
    /// frames, then fsync. This is the required shutdown ordering; without
    /// it nothing survives process exit.
    pub fn flush_all(&mut self) -> VinumResult<()> {
        self.data.flush_all()?;
        self.index.flush_all()?;
        self.data.source_mut().flush()?;
        self.index.source_mut().flush()?;
        Ok(())
    }

    // --- store access (allocation, metadata) ---

    pub fn heap(&self) -> &HeapFileStore {
        self.data.source()
    }

    pub fn heap_mut(&mut self) -> &mut HeapFileStore {
        self.data.source_mut()
    }

    pub fn index_store(&self) -> &IndexFileStore {
        self.index.source()
    }

    pub fn index_store_mut(&mut self) -> &mut IndexFileStore {
        self.index.source_mut()
    }

    /// Resident data frames (never exceeds the configured budget).
    pub fn resident_pages(&self) -> usize {
        self.data.len()
    }

    /// Resident index frames (never exceeds the configured budget).
    pub fn resident_nodes(&self) -> usize {
        self.index.len()
    }
}
