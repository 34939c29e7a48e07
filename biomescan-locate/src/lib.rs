use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

pub mod index;
pub mod registry;

pub use index::ChunkIndex;
pub use registry::Registry;

/// Integer block coordinate in world space.
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Block position of an entity/issuer position. Each axis is truncated toward zero.
    pub fn from_vec3(x: f64, y: f64, z: f64) -> Self {
        Self::new(x as i32, y as i32, z as i32)
    }

    /// Squared distance on the X/Z plane.
    pub fn horizontal_distance_sq(&self, other: &BlockPos) -> i128 {
        let dx = self.x as i128 - other.x as i128;
        let dz = self.z as i128 - other.z as i128;
        dx * dx + dz * dz
    }

    pub fn within_radius(&self, other: &BlockPos, radius: u32) -> bool {
        let r = radius as i128;
        self.horizontal_distance_sq(other) <= r * r
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum TargetKind {
    Biome,
    Structure,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Biome => "biome",
            TargetKind::Structure => "structure",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A biome or structure id to search for. Names are unique per kind only.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
}

impl Target {
    pub fn biome(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: TargetKind::Biome }
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: TargetKind::Structure }
    }
}

/// Nearest-occurrence search over some world backend.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Find the nearest occurrence of `target` within `radius` blocks of `origin`.
    ///
    /// `Ok(None)` is a normal "not found". An `Err` means the backend itself failed.
    async fn resolve(&self, target: &Target, origin: BlockPos, radius: u32) -> Result<Option<BlockPos>>;
}
