//! In-memory chunk index.
//!
//! Maps every observed biome/structure id to the positions where it was seen.
//! Filled by a scanner (region files, tests) and then queried as a [`Resolver`].

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::{BlockPos, Resolver, Target, TargetKind};

#[derive(Debug, Default)]
pub struct ChunkIndex {
    entries: HashMap<TargetKind, HashMap<String, Vec<BlockPos>>>,
}

impl ChunkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: TargetKind, name: &str, pos: BlockPos) {
        self.entries
            .entry(kind)
            .or_default()
            .entry(name.to_string())
            .or_default()
            .push(pos);
    }

    /// Closest recorded position on the X/Z plane that lies within `radius`.
    /// Equal distances resolve to the position recorded first.
    pub fn nearest(&self, target: &Target, origin: BlockPos, radius: u32) -> Option<BlockPos> {
        self.entries
            .get(&target.kind)?
            .get(target.name.as_str())?
            .iter()
            .filter(|pos| origin.within_radius(pos, radius))
            .min_by_key(|pos| origin.horizontal_distance_sq(pos))
            .copied()
    }

    /// Sorted ids seen for `kind`.
    pub fn names(&self, kind: TargetKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .get(&kind)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Total number of recorded positions.
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .flat_map(|m| m.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Resolver for ChunkIndex {
    async fn resolve(&self, target: &Target, origin: BlockPos, radius: u32) -> Result<Option<BlockPos>> {
        Ok(self.nearest(target, origin, radius))
    }
}
