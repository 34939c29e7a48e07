//! Fills a [`ChunkIndex`] from the region files of a saved world.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use biomescan_locate::{BlockPos, ChunkIndex, TargetKind};

use crate::{ChunkSummary, RegionFile, RegionPos, CHUNK_BLOCKS, REGION_SIZE};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub regions: usize,
    pub chunks: usize,
    pub skipped_chunks: usize,
}

/// Shortest horizontal distance from `origin` to any block of the region, squared.
fn region_distance_sq(region: RegionPos, origin: BlockPos) -> i128 {
    let (min_x, max_x, min_z, max_z) = region.block_bounds();
    let clamp = |v: i32, lo: i64, hi: i64| -> i128 {
        let v = v as i64;
        if v < lo {
            (lo - v) as i128
        } else if v > hi {
            (v - hi) as i128
        } else {
            0
        }
    };
    let dx = clamp(origin.x, min_x, max_x);
    let dz = clamp(origin.z, min_z, max_z);
    dx * dx + dz * dz
}

/// Region files in `region_dir` that could hold a chunk within `radius` of `origin`, sorted by position.
pub fn regions_within(region_dir: &Path, origin: BlockPos, radius: u32) -> Result<Vec<(RegionPos, PathBuf)>> {
    let r = radius as i128;
    let mut regions: Vec<(RegionPos, PathBuf)> = std::fs::read_dir(region_dir)
        .with_context(|| format!("Failed to list region directory {}", region_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            RegionPos::from_filename(name.to_str()?).map(|pos| (pos, entry.path()))
        })
        .filter(|(pos, _)| region_distance_sq(*pos, origin) <= r * r)
        .collect();
    regions.sort_by_key(|(pos, _)| (pos.x, pos.z));
    Ok(regions)
}

/// `(local_x, local_z, chunk_x, chunk_z)` of every chunk slot in `region` whose centre is within `radius`.
/// Regions too far out for i32 chunk coordinates yield nothing.
pub fn chunk_slots_within(region: RegionPos, origin: BlockPos, radius: u32) -> impl Iterator<Item = (i32, i32, i32, i32)> {
    let r = radius as i128;
    (0..REGION_SIZE)
        .flat_map(|local_z| (0..REGION_SIZE).map(move |local_x| (local_x, local_z)))
        .filter_map(move |(local_x, local_z)| {
            let chunk_x = region.x as i64 * REGION_SIZE as i64 + local_x as i64;
            let chunk_z = region.z as i64 * REGION_SIZE as i64 + local_z as i64;
            let center = |chunk: i64| (chunk * CHUNK_BLOCKS as i64 + (CHUNK_BLOCKS / 2) as i64) as i128;
            let dx = center(chunk_x) - origin.x as i128;
            let dz = center(chunk_z) - origin.z as i128;
            if dx * dx + dz * dz > r * r {
                return None;
            }
            Some((local_x, local_z, i32::try_from(chunk_x).ok()?, i32::try_from(chunk_z).ok()?))
        })
}

/// Index every chunk whose centre lies within `radius` blocks of `origin`.
///
/// Chunks that fail to decode are logged and skipped; unreadable region files abort the scan.
pub fn scan_world(region_dir: &Path, origin: BlockPos, radius: u32, index: &mut ChunkIndex) -> Result<ScanStats> {
    let mut stats = ScanStats::default();

    for (region_pos, path) in regions_within(region_dir, origin, radius)? {
        let region = RegionFile::open(&path)?;
        stats.regions += 1;

        for (local_x, local_z, chunk_x, chunk_z) in chunk_slots_within(region_pos, origin, radius) {
            let summary = match region.read_chunk(local_x, local_z).and_then(|nbt| {
                nbt.map(|nbt| ChunkSummary::from_nbt(&nbt)).transpose()
            }) {
                Ok(Some(summary)) => summary,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Skipping chunk ({}, {}) in {}: {:#}", chunk_x, chunk_z, path.display(), e);
                    stats.skipped_chunks += 1;
                    continue;
                }
            };
            if (summary.x, summary.z) != (chunk_x, chunk_z) {
                log::debug!(
                    "Chunk slot ({}, {}) holds NBT for ({}, {}), indexing by NBT coords",
                    chunk_x, chunk_z, summary.x, summary.z
                );
            }

            record_summary(&summary, index);
            stats.chunks += 1;
        }
    }

    log::info!(
        "Indexed {} chunks from {} regions in {} ({} skipped)",
        stats.chunks,
        stats.regions,
        region_dir.display(),
        stats.skipped_chunks
    );
    Ok(stats)
}

pub fn record_summary(summary: &ChunkSummary, index: &mut ChunkIndex) {
    for (section_y, name) in &summary.biomes {
        let (x, y, z) = summary.center(section_y * CHUNK_BLOCKS + CHUNK_BLOCKS / 2);
        index.record(TargetKind::Biome, name, BlockPos::new(x, y, z));
    }
    for (name, y) in &summary.structures {
        let (x, y, z) = summary.center(*y);
        index.record(TargetKind::Structure, name, BlockPos::new(x, y, z));
    }
}
