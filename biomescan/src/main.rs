use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use biomescan_anvil::scan::{chunk_slots_within, regions_within};
use biomescan_anvil::{scan_world, RegionFile};
use biomescan_locate::{BlockPos, ChunkIndex, Registry, Resolver};
use biomescan_report::RecordMode;
use biomescan_runner::command::{authorize, parse_radius};
use biomescan_runner::{CommandError, ConsoleSink, Dispatcher, Issuer, ValidateCommand};
use biomescan_storage::PostgresIndex;

#[derive(Parser)]
#[command(name = "biomescan", about = "Find the nearest biome and structure of every registered kind and write a report")]
pub struct Args {
    /// World directory (or its region/ folder)
    #[arg(short, long, env = "WORLD")]
    pub world: Option<PathBuf>,

    /// Storage mode: "memory" (scan region files) or "postgres" (JSONB chunk index)
    #[arg(long, env = "STORAGE", default_value = "memory")]
    pub storage: String,

    /// Search origin as X,Y,Z
    #[arg(long, default_value = "0,64,0", value_parser = parse_origin, allow_hyphen_values = true)]
    pub origin: (f64, f64, f64),

    /// Search radius in blocks (default 6400)
    #[arg(short, long, allow_hyphen_values = true)]
    pub radius: Option<String>,

    /// Registry JSON ({"biomes": [...], "structures": [...]}); vanilla ids when omitted
    #[arg(long, env = "REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Directory the report is written to
    #[arg(long, env = "REPORT_DIR", default_value = ".")]
    pub report_dir: PathBuf,

    /// Record real outcomes and coordinates instead of the legacy all-false rows
    #[arg(long, env = "ACCURATE_REPORT")]
    pub accurate: bool,

    /// Permission level of the console issuer
    #[arg(long, default_value_t = 4)]
    pub permission_level: u8,
}

fn parse_origin(raw: &str) -> Result<(f64, f64, f64), String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected X,Y,Z, got '{}'", raw));
    };
    let parse = |v: &str| v.parse::<f64>().map_err(|e| format!("bad coordinate '{}': {}", v, e));
    Ok((parse(*x)?, parse(*y)?, parse(*z)?))
}

fn region_dir(world: &Path) -> PathBuf {
    let nested = world.join("region");
    if nested.is_dir() { nested } else { world.to_path_buf() }
}

/// Push every chunk within the radius into the Postgres index.
async fn import_world(index: &PostgresIndex, world: &Path, origin: BlockPos, radius: u32) -> anyhow::Result<usize> {
    let dir = region_dir(world);
    let mut imported = 0;
    for (region_pos, path) in regions_within(&dir, origin, radius)? {
        let region = RegionFile::open(&path)?;
        for (local_x, local_z, chunk_x, chunk_z) in chunk_slots_within(region_pos, origin, radius) {
            match region.read_chunk(local_x, local_z) {
                Ok(Some(nbt)) => match index.index_chunk(chunk_x, chunk_z, &nbt).await {
                    Ok(()) => imported += 1,
                    Err(e) => log::warn!("Failed to index chunk ({}, {}): {:#}", chunk_x, chunk_z, e),
                },
                Ok(None) => {}
                Err(e) => log::warn!("Skipping chunk ({}, {}) in {}: {:#}", chunk_x, chunk_z, path.display(), e),
            }
        }
    }
    Ok(imported)
}

async fn connect_postgres() -> PostgresIndex {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://postgres:postgres@db:5432/biomescan".to_string());
    println!("Connecting to chunk index at {}...", database_url);

    // Retry loop for DB connection
    for i in 0..30 {
        match PostgresIndex::new(&database_url).await {
            Ok(index) => return index,
            Err(e) => {
                eprintln!("Failed to connect to storage: {}. Retrying {}/30 in 2s...", e, i + 1);
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
            }
        }
    }
    eprintln!("FATAL: Could not connect to storage after 30 retries.");
    std::process::exit(1);
}

/// Checks the invocation up front so a rejected command never scans or imports anything.
fn preflight(args: &Args) -> Result<(Issuer, String, u32), CommandError> {
    let issuer = Issuer {
        name: "console".to_string(),
        permission_level: args.permission_level,
        position: args.origin,
    };
    authorize(&issuer)?;
    let raw_radius = args.radius.clone().unwrap_or_default();
    let radius = parse_radius(&raw_radius)?;
    Ok((issuer, raw_radius, radius))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let (issuer, raw_radius, radius) = match preflight(&args) {
        Ok(checked) => checked,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let origin = issuer.block_pos();

    let registry = match &args.registry {
        Some(path) => Registry::load(path)?,
        None => Registry::vanilla(),
    };

    let resolver: Arc<dyn Resolver> = match args.storage.to_lowercase().as_str() {
        "postgres" | "pg" => {
            println!("Storage mode: POSTGRES (JSONB chunk index)");
            let index = connect_postgres().await;
            if let Some(world) = &args.world {
                let imported = import_world(&index, world, origin, radius).await?;
                println!("Imported {} chunks from {}", imported, world.display());
            }
            println!("Chunk index holds {} chunks", index.count_chunks().await?);
            Arc::new(index)
        }
        "memory" | _ => {
            let world = args
                .world
                .clone()
                .context("--world is required for memory storage")?;
            println!("Storage mode: MEMORY (scanning {})", world.display());
            let dir = region_dir(&world);
            let index = tokio::task::spawn_blocking(move || -> anyhow::Result<ChunkIndex> {
                let mut index = ChunkIndex::new();
                scan_world(&dir, origin, radius, &mut index)?;
                Ok(index)
            })
            .await??;
            Arc::new(index)
        }
    };

    let record_mode = if args.accurate { RecordMode::Accurate } else { RecordMode::Legacy };
    let dispatcher = Dispatcher::new(tokio::runtime::Handle::current(), 1);
    let command = ValidateCommand::new(Arc::new(registry), resolver, dispatcher, args.report_dir.clone(), record_mode);

    let handle = match command.execute(&issuer, &raw_radius, Arc::new(ConsoleSink)) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let summary = handle.await?;
    if summary.report_path.is_none() {
        std::process::exit(1);
    }
    Ok(())
}
