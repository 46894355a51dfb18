//! Per-variant undo/redo history.
//!
//! Each (garment, side) scene has its own bucket of serialized documents.
//! The `present` entry always equals the last committed serialization for
//! that scene; undo and redo move documents between the two stacks around it.

use crate::serialization::SceneDocument;
use garmentkit_core::VariantKey;
use std::collections::{HashMap, VecDeque};

/// Default cap on each of the undo and redo stacks.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Undo/redo state for one scene.
#[derive(Debug, Clone, Default)]
pub struct HistoryBucket {
    undo: VecDeque<SceneDocument>,
    redo: VecDeque<SceneDocument>,
    present: Option<SceneDocument>,
}

impl HistoryBucket {
    /// Scene the variant currently shows. `None` until the bucket is seeded.
    pub fn present(&self) -> Option<&SceneDocument> {
        self.present.as_ref()
    }

    /// Number of snapshots [`HistoryManager::undo`] can step back through.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of undone snapshots that can be redone.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Undo entries, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &SceneDocument> {
        self.undo.iter()
    }
}

/// Result of a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The bucket had no present entry; nothing was pushed.
    Seeded,
    /// The previous present entry moved onto the undo stack.
    Recorded,
    /// Identical to the present entry.
    Unchanged,
}

fn push_capped(stack: &mut VecDeque<SceneDocument>, doc: SceneDocument, limit: usize) {
    stack.push_back(doc);
    while stack.len() > limit {
        stack.pop_front();
    }
}

/// History buckets keyed by variant.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    buckets: HashMap<VariantKey, HistoryBucket>,
    limit: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryManager {
    pub fn new(limit: usize) -> Self {
        Self {
            buckets: HashMap::new(),
            limit: limit.max(1),
        }
    }

    /// Maximum undo depth per variant.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// History of one variant, if it has any.
    pub fn bucket(&self, key: &VariantKey) -> Option<&HistoryBucket> {
        self.buckets.get(key)
    }

    /// Record a new serialization of `key`'s scene and clear its redo stack.
    pub fn commit(&mut self, key: &VariantKey, doc: SceneDocument) -> CommitOutcome {
        let limit = self.limit;
        let bucket = self.buckets.entry(key.clone()).or_default();

        let Some(present) = bucket.present.take() else {
            bucket.present = Some(doc);
            return CommitOutcome::Seeded;
        };

        if present.fingerprint() == doc.fingerprint() {
            bucket.present = Some(present);
            return CommitOutcome::Unchanged;
        }

        push_capped(&mut bucket.undo, present, limit);
        bucket.redo.clear();
        bucket.present = Some(doc);
        CommitOutcome::Recorded
    }

    /// Set `present` if the bucket has none. Returns whether it was seeded.
    pub fn seed(&mut self, key: &VariantKey, doc: SceneDocument) -> bool {
        let bucket = self.buckets.entry(key.clone()).or_default();
        if bucket.present.is_some() {
            return false;
        }
        bucket.present = Some(doc);
        true
    }

    /// The document [`HistoryManager::undo`] would make present.
    pub fn peek_undo(&self, key: &VariantKey) -> Option<&SceneDocument> {
        self.buckets.get(key)?.undo.back()
    }

    /// The document [`HistoryManager::redo`] would make present.
    pub fn peek_redo(&self, key: &VariantKey) -> Option<&SceneDocument> {
        self.buckets.get(key)?.redo.back()
    }

    /// Step back one commit, returning the document that is now present.
    pub fn undo(&mut self, key: &VariantKey) -> Option<SceneDocument> {
        let limit = self.limit;
        let bucket = self.buckets.get_mut(key)?;
        let previous = bucket.undo.pop_back()?;
        if let Some(current) = bucket.present.replace(previous.clone()) {
            push_capped(&mut bucket.redo, current, limit);
        }
        Some(previous)
    }

    /// Re-apply one undone commit, returning the document that is now present.
    pub fn redo(&mut self, key: &VariantKey) -> Option<SceneDocument> {
        let limit = self.limit;
        let bucket = self.buckets.get_mut(key)?;
        let next = bucket.redo.pop_back()?;
        if let Some(current) = bucket.present.replace(next.clone()) {
            push_capped(&mut bucket.undo, current, limit);
        }
        Some(next)
    }

    /// Whether `key` has an older snapshot to return to.
    pub fn can_undo(&self, key: &VariantKey) -> bool {
        self.buckets.get(key).is_some_and(|b| !b.undo.is_empty())
    }

    /// Whether `key` has an undone snapshot to replay.
    pub fn can_redo(&self, key: &VariantKey) -> bool {
        self.buckets.get(key).is_some_and(|b| !b.redo.is_empty())
    }

    /// Drop the history of one variant.
    pub fn clear(&mut self, key: &VariantKey) {
        self.buckets.remove(key);
    }

    /// Drop the buckets of both sides of a garment type.
    pub fn clear_garment(&mut self, garment: &str) {
        self.buckets.retain(|key, _| key.garment != garment);
    }
}
