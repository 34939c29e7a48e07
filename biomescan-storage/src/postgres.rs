use crate::nbt_json::index_document;
use anyhow::{Context, Result};
use async_trait::async_trait;
use biomescan_locate::{BlockPos, Resolver, Target, TargetKind};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

const CHUNK_BLOCKS: i64 = 16;

// Shared by both lookups: chunk-centre distance from ($2, $3), limited to $4 (radius squared).
const NEAREST_BIOME_SQL: &str = "
    SELECT x, z FROM (
        SELECT x, z, data,
               (x::bigint * 16 + 8 - $2::bigint) * (x::bigint * 16 + 8 - $2::bigint)
             + (z::bigint * 16 + 8 - $3::bigint) * (z::bigint * 16 + 8 - $3::bigint) AS dist
        FROM chunks_jsonb
    ) c
    WHERE dist <= $4::bigint
      AND jsonb_path_exists(data, '$.sections[*].biomes.palette[*] ? (@ == $name)', jsonb_build_object('name', $1::text))
    ORDER BY dist, x, z
    LIMIT 1";

const NEAREST_STRUCTURE_SQL: &str = "
    SELECT x, z FROM (
        SELECT x, z, data,
               (x::bigint * 16 + 8 - $2::bigint) * (x::bigint * 16 + 8 - $2::bigint)
             + (z::bigint * 16 + 8 - $3::bigint) * (z::bigint * 16 + 8 - $3::bigint) AS dist
        FROM chunks_jsonb
    ) c
    WHERE dist <= $4::bigint
      AND data->'structures'->'starts' ? $1::text
      AND data->'structures'->'starts'->$1::text->>'id' IS DISTINCT FROM 'INVALID'
    ORDER BY dist, x, z
    LIMIT 1";

fn nearest_sql(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Biome => NEAREST_BIOME_SQL,
        TargetKind::Structure => NEAREST_STRUCTURE_SQL,
    }
}

/// Block position reported for a match in chunk (`x`, `z`): its centre at the origin's height.
fn chunk_center(x: i32, z: i32, y: i32) -> BlockPos {
    BlockPos::new(
        (x as i64 * CHUNK_BLOCKS + CHUNK_BLOCKS / 2) as i32,
        y,
        (z as i64 * CHUNK_BLOCKS + CHUNK_BLOCKS / 2) as i32,
    )
}

pub struct PostgresIndex {
    pool: Pool,
}

impl PostgresIndex {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let mut cfg = Config::new();
        cfg.url = Some(connection_string.to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .context("Failed to create Postgres pool")?;

        // Ensure connections work and schema exists
        let index = Self { pool };
        index.init_schema().await?;

        Ok(index)
    }

    async fn init_schema(&self) -> Result<()> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        client.batch_execute("
            CREATE TABLE IF NOT EXISTS chunks_jsonb (
                x INT,
                z INT,
                data JSONB,
                updated_at TIMESTAMP DEFAULT NOW(),
                PRIMARY KEY (x, z)
            );
            CREATE INDEX IF NOT EXISTS idx_chunks_jsonb_data ON chunks_jsonb USING GIN (data);
        ").await.context("Failed to init jsonb schema")?;
        Ok(())
    }

    /// Store the searchable part of a chunk. `data` is raw (decompressed) NBT.
    pub async fn index_chunk(&self, x: i32, z: i32, data: &[u8]) -> Result<()> {
        let nbt_value: fastnbt::Value = fastnbt::from_bytes(data)
            .with_context(|| format!("Failed to parse NBT for ({}, {})", x, z))?;
        let json_value = index_document(&nbt_value);

        let client = self.pool.get().await.context("Failed to get DB connection")?;
        client.execute(
            "INSERT INTO chunks_jsonb (x, z, data, updated_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (x, z) DO UPDATE SET data = $3, updated_at = NOW()",
            &[&x, &z, &json_value],
        ).await.context("Failed to insert chunk jsonb")?;
        Ok(())
    }

    pub async fn count_chunks(&self) -> Result<u64> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let row = client.query_one("SELECT COUNT(*) FROM chunks_jsonb", &[]).await?;
        let count: i64 = row.get(0);
        Ok(count as u64)
    }
}

#[async_trait]
impl Resolver for PostgresIndex {
    async fn resolve(&self, target: &Target, origin: BlockPos, radius: u32) -> Result<Option<BlockPos>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;

        let origin_x = origin.x as i64;
        let origin_z = origin.z as i64;
        let radius_sq = (radius as i64).saturating_mul(radius as i64);
        let row = client
            .query_opt(
                nearest_sql(target.kind),
                &[&target.name, &origin_x, &origin_z, &radius_sq],
            )
            .await
            .with_context(|| format!("Nearest {} query failed for {}", target.kind, target.name))?;

        Ok(row.map(|row| {
            let x: i32 = row.get(0);
            let z: i32 = row.get(1);
            log::debug!("{} {} nearest chunk ({}, {})", target.kind, target.name, x, z);
            chunk_center(x, z, origin.y)
        }))
    }
}
