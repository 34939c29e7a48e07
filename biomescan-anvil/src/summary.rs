//! What a saved chunk tells us about biomes and structures.

use std::collections::HashMap;

use anyhow::Result;
use fastnbt::Value;

use crate::{chunk_coords, CHUNK_BLOCKS};

/// Fallback height for structure starts without a bounding box.
const DEFAULT_STRUCTURE_Y: i32 = 64;

/// Biome and structure ids found in one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkSummary {
    pub x: i32,
    pub z: i32,
    /// `(section y, biome id)`, first section each biome appears in, bottom up.
    pub biomes: Vec<(i32, String)>,
    /// `(structure id, block y)` for each structure start in this chunk.
    pub structures: Vec<(String, i32)>,
}

impl ChunkSummary {
    pub fn from_nbt(nbt_data: &[u8]) -> Result<Self> {
        let root: Value = fastnbt::from_bytes(nbt_data)?;
        Self::from_value(&root)
    }

    pub fn from_value(root: &Value) -> Result<Self> {
        let (x, z) = chunk_coords(root)?;
        let mut summary = Self { x, z, ..Default::default() };

        let Value::Compound(root) = root else {
            return Ok(summary);
        };
        // Pre-1.18 chunks keep everything under `Level`.
        let body = match root.get("Level") {
            Some(Value::Compound(level)) => level,
            _ => root,
        };

        if let Some(Value::List(sections)) = field(body, &["sections", "Sections"]) {
            let mut seen = Vec::new();
            let mut ordered: Vec<(i32, &str)> = Vec::new();
            for section in sections {
                let Value::Compound(section) = section else { continue };
                let Some(y) = section.get("Y").and_then(Value::as_i64) else { continue };
                let Some(Value::Compound(biomes)) = section.get("biomes") else { continue };
                let Some(Value::List(palette)) = biomes.get("palette") else { continue };
                for entry in palette {
                    if let Value::String(name) = entry {
                        ordered.push((y as i32, name.as_str()));
                    }
                }
            }
            ordered.sort_by_key(|(y, _)| *y);
            for (y, name) in ordered {
                if !seen.contains(&name) {
                    seen.push(name);
                    summary.biomes.push((y, name.to_string()));
                }
            }
        }

        if let Some(Value::Compound(structures)) = field(body, &["structures", "Structures"]) {
            if let Some(Value::Compound(starts)) = field(structures, &["starts", "Starts"]) {
                let mut names: Vec<&String> = starts.keys().collect();
                names.sort();
                for name in names {
                    let Some(Value::Compound(start)) = starts.get(name) else { continue };
                    if matches!(start.get("id"), Some(Value::String(id)) if id == "INVALID") {
                        continue;
                    }
                    summary.structures.push((name.clone(), start_height(start)));
                }
            }
        }

        Ok(summary)
    }

    /// Block position at the centre of this chunk at height `y`.
    pub fn center(&self, y: i32) -> (i32, i32, i32) {
        (
            self.x * CHUNK_BLOCKS + CHUNK_BLOCKS / 2,
            y,
            self.z * CHUNK_BLOCKS + CHUNK_BLOCKS / 2,
        )
    }
}

fn field<'a>(compound: &'a HashMap<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| compound.get(*name))
}

/// Minimum Y of the first child's bounding box (`BB: [minX, minY, minZ, maxX, maxY, maxZ]`).
fn start_height(start: &HashMap<String, Value>) -> i32 {
    let Some(Value::List(children)) = start.get("Children") else {
        return DEFAULT_STRUCTURE_Y;
    };
    children
        .iter()
        .find_map(|child| match child {
            Value::Compound(child) => match child.get("BB") {
                Some(Value::IntArray(bb)) => bb.iter().nth(1).copied(),
                _ => None,
            },
            _ => None,
        })
        .unwrap_or(DEFAULT_STRUCTURE_Y)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fastnbt::IntArray;

    fn compound(entries: Vec<(&str, Value)>) -> Value {
        Value::Compound(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn section(y: i8, biomes: &[&str]) -> Value {
        compound(vec![
            ("Y", Value::Byte(y)),
            (
                "biomes",
                compound(vec![(
                    "palette",
                    Value::List(biomes.iter().map(|b| Value::String(b.to_string())).collect()),
                )]),
            ),
        ])
    }

    /// Modern chunk NBT with the given biome palettes and structure starts.
    pub(crate) fn chunk_nbt(x: i32, z: i32, sections: &[(i8, &[&str])], starts: &[(&str, Option<i32>)]) -> Vec<u8> {
        let starts = starts
            .iter()
            .map(|(name, min_y)| {
                let mut start = vec![("id", Value::String(name.to_string()))];
                if let Some(min_y) = min_y {
                    let bb = IntArray::new(vec![0, *min_y, 0, 15, min_y + 10, 15]);
                    start.push(("Children", Value::List(vec![compound(vec![("BB", Value::IntArray(bb))])])));
                }
                (name.to_string(), compound(start))
            })
            .collect();

        let root = compound(vec![
            ("xPos", Value::Int(x)),
            ("zPos", Value::Int(z)),
            ("sections", Value::List(sections.iter().map(|(y, b)| section(*y, b)).collect())),
            ("structures", compound(vec![("starts", Value::Compound(starts))])),
        ]);
        fastnbt::to_bytes(&root).unwrap()
    }

    #[test]
    fn test_biomes_keep_lowest_section() {
        let nbt = chunk_nbt(
            2,
            -3,
            &[
                (4, &["minecraft:plains", "minecraft:river"]),
                (-4, &["minecraft:deep_dark", "minecraft:plains"]),
            ],
            &[],
        );
        let summary = ChunkSummary::from_nbt(&nbt).unwrap();
        assert_eq!((summary.x, summary.z), (2, -3));
        assert_eq!(
            summary.biomes,
            vec![
                (-4, "minecraft:deep_dark".to_string()),
                (-4, "minecraft:plains".to_string()),
                (4, "minecraft:river".to_string()),
            ]
        );
        assert!(summary.structures.is_empty());
    }

    #[test]
    fn test_structure_starts() {
        let nbt = chunk_nbt(
            0,
            0,
            &[],
            &[("minecraft:village_plains", Some(63)), ("minecraft:igloo", None), ("INVALID", None)],
        );
        let summary = ChunkSummary::from_nbt(&nbt).unwrap();
        assert_eq!(
            summary.structures,
            vec![
                ("minecraft:igloo".to_string(), DEFAULT_STRUCTURE_Y),
                ("minecraft:village_plains".to_string(), 63),
            ]
        );
    }

    #[test]
    fn test_center() {
        let summary = ChunkSummary { x: -1, z: 2, ..Default::default() };
        assert_eq!(summary.center(70), (-8, 70, 40));
    }

    #[test]
    fn test_garbage_nbt_is_error() {
        assert!(ChunkSummary::from_nbt(b"\x01\x02").is_err());
    }
}
