//! PostgreSQL chunk index.
//!
//! Chunks are stored as JSON (converted from NBT) in `chunks_jsonb`, and nearest-match
//! queries run as JSON path predicates inside the database.

pub mod nbt_json;
pub mod postgres;

pub use postgres::PostgresIndex;
