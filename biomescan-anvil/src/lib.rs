//! Minecraft Anvil region files (.mca), read side.
//!
//! - Bytes 0-4095: location table (1024 entries, `[offset:3][sectors:1]` big endian)
//! - Bytes 4096-8191: timestamp table
//! - Bytes 8192+: chunk blobs `[length:4][compression:1][data:length-1]`

use std::io::Read;

pub mod region;
pub mod scan;
pub mod summary;

pub use region::RegionFile;
pub use scan::{scan_world, ScanStats};
pub use summary::ChunkSummary;

pub const SECTOR_BYTES: u64 = 4096;
pub const HEADER_BYTES: u64 = 8192;

/// Chunks per region along one axis.
pub const REGION_SIZE: i32 = 32;

/// Blocks per chunk along one axis.
pub const CHUNK_BLOCKS: i32 = 16;

/// Compression types used in Minecraft Anvil format
pub mod compression {
    pub const GZIP: u8 = 1;
    pub const ZLIB: u8 = 2;
    pub const NONE: u8 = 3;
    pub const LZ4: u8 = 4;
    /// Flag bit: chunk payload lives in a separate `c.<x>.<z>.mcc` file.
    pub const EXTERNAL: u8 = 128;
}

#[inline]
pub fn chunk_to_region(chunk_coord: i32) -> i32 {
    chunk_coord.div_euclid(REGION_SIZE)
}

/// Region file coordinates (parsed from filename like "r.0.-1.mca").
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn from_filename(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() == 4 && parts[0] == "r" && parts[3] == "mca" {
            let x = parts[1].parse().ok()?;
            let z = parts[2].parse().ok()?;
            Some(Self { x, z })
        } else {
            None
        }
    }

    /// Inclusive block bounds on X and Z: `(min_x, max_x, min_z, max_z)`.
    /// Widened to i64 since any i32 region coordinate parses from a filename.
    pub fn block_bounds(&self) -> (i64, i64, i64, i64) {
        let span = (REGION_SIZE * CHUNK_BLOCKS) as i64;
        let (x, z) = (self.x as i64, self.z as i64);
        (x * span, x * span + span - 1, z * span, z * span + span - 1)
    }
}

/// Unwrap and decompress a chunk blob.
/// Supports GZip (1), ZLib (2), None (3), and LZ4 (4). Trailing sector padding is ignored.
pub fn unwrap_and_decompress_chunk(chunk_blob: &[u8]) -> anyhow::Result<Vec<u8>> {
    if chunk_blob.len() < 5 {
        anyhow::bail!("Chunk blob too short");
    }

    let length = u32::from_be_bytes([chunk_blob[0], chunk_blob[1], chunk_blob[2], chunk_blob[3]]) as usize;
    if length == 0 || 4 + length > chunk_blob.len() {
        anyhow::bail!("Chunk length {} does not fit blob of {} bytes", length, chunk_blob.len());
    }
    let compression_type = chunk_blob[4];
    let compressed_data = &chunk_blob[5..4 + length];

    if compression_type & compression::EXTERNAL != 0 {
        anyhow::bail!("External chunk storage (.mcc) is not supported");
    }

    match compression_type {
        compression::ZLIB => {
            let mut decoder = flate2::read::ZlibDecoder::new(compressed_data);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed)?;
            Ok(decompressed)
        },
        compression::GZIP => {
            let mut decoder = flate2::read::GzDecoder::new(compressed_data);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed)?;
            Ok(decompressed)
        },
        compression::NONE => {
            Ok(compressed_data.to_vec())
        },
        compression::LZ4 => {
            let mut decoder = lz4_java_wrc::Lz4BlockInput::new(compressed_data);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed)?;
            Ok(decompressed)
        },
        _ => anyhow::bail!("Unknown compression type: {}", compression_type),
    }
}

/// Chunk coordinates stored inside the NBT.
/// Modern chunks carry `xPos`/`zPos` at the root, older ones inside a `Level` compound.
pub fn chunk_coords(root: &fastnbt::Value) -> anyhow::Result<(i32, i32)> {
    let fastnbt::Value::Compound(root) = root else {
        anyhow::bail!("NBT Root is not a Compound");
    };

    if let (Some(x_tag), Some(z_tag)) = (root.get("xPos"), root.get("zPos")) {
        let x = x_tag.as_i64().ok_or_else(|| anyhow::anyhow!("xPos is not an int"))? as i32;
        let z = z_tag.as_i64().ok_or_else(|| anyhow::anyhow!("zPos is not an int"))? as i32;
        return Ok((x, z));
    }

    if let Some(fastnbt::Value::Compound(level)) = root.get("Level") {
        if let (Some(x_tag), Some(z_tag)) = (level.get("xPos"), level.get("zPos")) {
            let x = x_tag.as_i64().ok_or_else(|| anyhow::anyhow!("Level.xPos is not an int"))? as i32;
            let z = z_tag.as_i64().ok_or_else(|| anyhow::anyhow!("Level.zPos is not an int"))? as i32;
            return Ok((x, z));
        }
    }

    anyhow::bail!("Could not find xPos/zPos in NBT root or Level compound. Keys: {:?}", root.keys());
}
