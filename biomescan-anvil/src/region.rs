use std::path::Path;

use anyhow::{Context, Result};

use crate::{unwrap_and_decompress_chunk, HEADER_BYTES, REGION_SIZE, SECTOR_BYTES};

/// A region file loaded into memory.
pub struct RegionFile {
    data: Vec<u8>,
}

impl RegionFile {
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read region file {}", path.display()))?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        // Empty files are written by the game for regions it never populated.
        if !data.is_empty() && (data.len() as u64) < HEADER_BYTES {
            anyhow::bail!("Region file truncated: {} bytes, header needs {}", data.len(), HEADER_BYTES);
        }
        Ok(Self { data })
    }

    /// `(sector offset, sector count)` for a chunk index (0..1024), or None if not allocated.
    pub fn location(&self, index: usize) -> Option<(u32, u8)> {
        if self.data.is_empty() || index >= (REGION_SIZE * REGION_SIZE) as usize {
            return None;
        }
        let entry = &self.data[index * 4..index * 4 + 4];
        let sector_id = ((entry[0] as u32) << 16) | ((entry[1] as u32) << 8) | entry[2] as u32;
        let sector_count = entry[3];
        if sector_id == 0 || sector_count == 0 {
            None
        } else {
            Some((sector_id, sector_count))
        }
    }

    /// Decompressed NBT for the chunk at local coordinates, or None if the chunk was never saved.
    pub fn read_chunk(&self, local_x: i32, local_z: i32) -> Result<Option<Vec<u8>>> {
        let index = ((local_z & 31) * REGION_SIZE + (local_x & 31)) as usize;
        let Some((sector_id, sector_count)) = self.location(index) else {
            return Ok(None);
        };

        let start = sector_id as u64 * SECTOR_BYTES;
        let end = (start + sector_count as u64 * SECTOR_BYTES).min(self.data.len() as u64);
        if start >= end || start < HEADER_BYTES {
            anyhow::bail!("Chunk ({}, {}) points outside the region file (sector {})", local_x, local_z, sector_id);
        }

        let blob = &self.data[start as usize..end as usize];
        let nbt = unwrap_and_decompress_chunk(blob)
            .with_context(|| format!("Failed to decode chunk ({}, {})", local_x, local_z))?;
        Ok(Some(nbt))
    }
}
