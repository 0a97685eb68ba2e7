// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Persistent B+-Tree keyed by harvest year.
//!
//! The tree itself is stateless apart from its degree: the root id, node
//! counter and height live in the index store's metadata, and every node
//! travels through the buffer pool's index frames. With the typical
//! single-frame budget a descent continuously evicts the previous node,
//! so the tree works on owned copies and hands modified nodes back to the
//! pool (`put` + `mark_dirty`); write-back happens on eviction or flush.
//!
//! ## Search (equality)
//!
//! Descend with the first routing key `r` satisfying `key <= r` (equal
//! keys go left), which lands on the leftmost leaf whose range can contain
//! the key. Scan that leaf left-to-right collecting locators for the key;
//! if the leaf ends without a greater key, follow `next_leaf` and keep
//! collecting. Stop at the first greater key or the end of the chain.
//!
//! ## Insert
//!
//! Descend with the first routing key `r` satisfying `key < r` (equal keys
//! go right), insert into the leaf keeping keys non-decreasing, and split
//! any node whose key count reaches the degree. Splits push a separator to
//! the parent; a split of the root allocates a new internal root and
//! increments the height.

use crate::buffer::BufferPool;
use crate::error::{VinumError, VinumResult};
use crate::index::node::{BPlusNode, InternalNode, Locator, NodeId};
use log::debug;

/// B+-Tree over the index store, with node I/O through the buffer pool.
pub struct BPlusTree {
    degree: u16,
}

impl BPlusTree {
    /// Create a tree handle for an initialised index store.
    ///
    /// ## Error Conditions
    /// - `InvalidDegree`: degree below 2
    pub fn new(degree: u16) -> VinumResult<Self> {
        if degree < 2 {
            return Err(VinumError::InvalidDegree { degree, min: 2 });
        }
        Ok(Self { degree })
    }

    /// Collect every locator stored under `key`, in leaf-chain order.
    ///
    /// Read-only: touches no file content, only buffer frames.
    pub fn search(&self, pool: &mut BufferPool, key: i32) -> VinumResult<Vec<Locator>> {
        self.search_inner(pool, key)
            .map_err(|cause| VinumError::Tree {
                operation: "search",
                cause: Box::new(cause),
            })
    }

    /// Insert one `(key, locator)` pair. Duplicates accumulate; nothing is
    /// deduplicated.
    ///
    /// On an I/O failure mid-operation the tree is left in the state of
    /// whichever nodes were already handed to the pool; there is no
    /// in-memory rollback.
    pub fn insert(&mut self, pool: &mut BufferPool, key: i32, locator: Locator) -> VinumResult<()> {
        self.insert_inner(pool, key, locator)
            .map_err(|cause| VinumError::Tree {
                operation: "insert",
                cause: Box::new(cause),
            })
    }

    /// Cached tree height: number of non-leaf levels. No I/O.
    pub fn height(&self, pool: &BufferPool) -> u32 {
        pool.index_store().metadata().height
    }

    fn search_inner(&self, pool: &mut BufferPool, key: i32) -> VinumResult<Vec<Locator>> {
        // Descend to the leftmost candidate leaf.
        let mut node_id = pool.index_store().metadata().root_id;
        loop {
            match pool.load_node(node_id)? {
                BPlusNode::Internal(internal) => {
                    let child_idx = internal.route_for_search(key);
                    node_id = *internal.children.get(child_idx).ok_or_else(|| {
                        VinumError::IndexCorrupt {
                            node_id,
                            reason: format!("child index {} out of bounds", child_idx),
                        }
                    })?;
                }
                BPlusNode::Leaf(_) => break,
            }
        }

        // Walk the leaf chain collecting the run of equal keys.
        let mut results = Vec::new();
        let mut current = Some(node_id);
        while let Some(leaf_id) = current {
            let (saw_greater, next_leaf) = match pool.load_node(leaf_id)? {
                BPlusNode::Leaf(leaf) => {
                    let mut saw_greater = false;
                    for (k, locator) in leaf.keys.iter().zip(leaf.locators.iter()) {
                        if *k == key {
                            results.push(*locator);
                        } else if *k > key {
                            saw_greater = true;
                            break;
                        }
                    }
                    (saw_greater, leaf.next_leaf)
                }
                BPlusNode::Internal(_) => {
                    return Err(VinumError::IndexCorrupt {
                        node_id: leaf_id,
                        reason: "leaf chain points at an internal node".to_string(),
                    })
                }
            };

            if saw_greater {
                break;
            }
            current = next_leaf;
        }

        debug!("search key {}: {} locator(s)", key, results.len());
        Ok(results)
    }

    fn insert_inner(&mut self, pool: &mut BufferPool, key: i32, locator: Locator) -> VinumResult<()> {
        let before = pool.index_store().metadata().clone();
        let root_id = before.root_id;

        if let Some((separator, right_id)) = self.insert_into(pool, root_id, key, locator)? {
            // Root split: a new internal root adopts both halves.
            let new_root_id = pool.index_store_mut().allocate_node_id();
            let root = InternalNode::new(new_root_id, vec![separator], vec![root_id, right_id]);
            pool.put_node(BPlusNode::Internal(root))?;
            pool.mark_node_dirty(new_root_id);

            let metadata = pool.index_store_mut().metadata_mut();
            metadata.root_id = new_root_id;
            metadata.height += 1;
            debug!(
                "root split: new root {} (height {})",
                new_root_id,
                pool.index_store().metadata().height
            );
        }

        if *pool.index_store().metadata() != before {
            pool.index_store_mut().save_metadata()?;
        }
        Ok(())
    }

    /// Recursive descent. Returns `Some((separator, new_right_id))` when
    /// the visited node split and its parent must absorb the separator.
    fn insert_into(
        &mut self,
        pool: &mut BufferPool,
        node_id: NodeId,
        key: i32,
        locator: Locator,
    ) -> VinumResult<Option<(i32, NodeId)>> {
        // Owned copy: the frame reference would not survive the nested
        // pool operations below.
        let node = pool.load_node(node_id)?.clone();

        match node {
            BPlusNode::Leaf(mut leaf) => {
                leaf.insert(key, locator);

                if leaf.keys.len() >= self.degree as usize {
                    let new_id = pool.index_store_mut().allocate_node_id();
                    let (separator, right) = leaf.split(new_id);
                    debug!(
                        "leaf {} split -> {} (separator {})",
                        node_id, new_id, separator
                    );
                    pool.put_node(BPlusNode::Leaf(leaf))?;
                    pool.mark_node_dirty(node_id);
                    pool.put_node(BPlusNode::Leaf(right))?;
                    pool.mark_node_dirty(new_id);
                    Ok(Some((separator, new_id)))
                } else {
                    pool.put_node(BPlusNode::Leaf(leaf))?;
                    pool.mark_node_dirty(node_id);
                    Ok(None)
                }
            }
            BPlusNode::Internal(mut internal) => {
                let child_idx = internal.route_for_insert(key);
                let child_id = *internal.children.get(child_idx).ok_or_else(|| {
                    VinumError::IndexCorrupt {
                        node_id,
                        reason: format!("child index {} out of bounds", child_idx),
                    }
                })?;

                let split = self.insert_into(pool, child_id, key, locator)?;
                let Some((separator, new_child_id)) = split else {
                    return Ok(None);
                };

                internal.apply_split(child_idx, separator, new_child_id);

                if internal.keys.len() >= self.degree as usize {
                    let new_id = pool.index_store_mut().allocate_node_id();
                    let (promoted, right) = internal.split(new_id);
                    debug!(
                        "internal {} split -> {} (promoted {})",
                        node_id, new_id, promoted
                    );
                    pool.put_node(BPlusNode::Internal(internal))?;
                    pool.mark_node_dirty(node_id);
                    pool.put_node(BPlusNode::Internal(right))?;
                    pool.mark_node_dirty(new_id);
                    Ok(Some((promoted, new_id)))
                } else {
                    pool.put_node(BPlusNode::Internal(internal))?;
                    pool.mark_node_dirty(node_id);
                    Ok(None)
                }
            }
        }
    }
}
