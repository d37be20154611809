//! Block classification and per-chunk aggregation.
//!
//! Everything here is a pure function of its inputs: no shared state, safe to
//! call from any number of threads with the same `&Catalog`.

use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::world::block::{BlockId, BlockRecord};
use crate::world::chunk::ChunkColumn;
use crate::world::position::{BlockPos, ChunkPos};

/// Occurrence count per resolved block name.
///
/// Keys keep the order in which names were first resolved; that order is for
/// presentation only, counts do not depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BlockCountTable {
    counts: IndexMap<String, u64>,
}

impl BlockCountTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: &str) {
        self.add(name, 1);
    }

    pub fn add(&mut self, name: &str, count: u64) {
        match self.counts.get_mut(name) {
            Some(existing) => *existing += count,
            None => {
                self.counts.insert(name.to_string(), count);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.counts.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(name, &count)| (name.as_str(), count))
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Entries by descending count, ties broken by name.
    pub fn sorted_by_count(&self) -> Vec<(&str, u64)> {
        let mut rows: Vec<(&str, u64)> = self.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    /// Add every count of `other` into `self`.
    pub fn merge(&mut self, other: &BlockCountTable) {
        for (name, count) in other.iter() {
            self.add(name, count);
        }
    }
}

/// Count non-air blocks by catalog name.
pub fn count_by_name<'a>(
    blocks: impl IntoIterator<Item = &'a BlockRecord>,
    catalog: &Catalog,
) -> BlockCountTable {
    let mut table = BlockCountTable::new();
    for block in blocks {
        if block.is_air() {
            continue;
        }
        table.increment(&catalog.resolve_name(block.id, block.data.into()));
    }
    table
}

/// Number of blocks whose id and metadata both equal the query.
///
/// Strict filter: unlike name resolution there is no metadata-0 fallback.
pub fn count_matching<'a>(
    id: BlockId,
    metadata: u8,
    blocks: impl IntoIterator<Item = &'a BlockRecord>,
) -> u64 {
    blocks
        .into_iter()
        .filter(|b| b.id == id && b.data == metadata)
        .count() as u64
}

/// Positions of every block strictly matching `id`/`metadata`.
pub fn positions_matching<'a>(
    id: BlockId,
    metadata: u8,
    blocks: impl IntoIterator<Item = &'a BlockRecord>,
) -> impl Iterator<Item = BlockPos> {
    blocks
        .into_iter()
        .filter(move |b| b.id == id && b.data == metadata)
        .map(BlockRecord::pos)
}

/// Strict match count for each chunk, in input order.
pub fn count_matching_per_chunk<'a>(
    id: BlockId,
    metadata: u8,
    chunks: impl IntoIterator<Item = &'a ChunkColumn>,
) -> Vec<(ChunkPos, u64)> {
    chunks
        .into_iter()
        .map(|chunk| {
            let count = chunk
                .blocks()
                .filter(|b| b.id == id && b.data == metadata)
                .count() as u64;
            (chunk.pos(), count)
        })
        .collect()
}
