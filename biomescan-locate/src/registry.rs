use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::Target;

const VANILLA_BIOMES: &[&str] = &[
    "badlands", "bamboo_jungle", "basalt_deltas", "beach", "birch_forest", "cherry_grove",
    "cold_ocean", "crimson_forest", "dark_forest", "deep_cold_ocean", "deep_dark",
    "deep_frozen_ocean", "deep_lukewarm_ocean", "deep_ocean", "desert", "dripstone_caves",
    "end_barrens", "end_highlands", "end_midlands", "eroded_badlands", "flower_forest", "forest",
    "frozen_ocean", "frozen_peaks", "frozen_river", "grove", "ice_spikes", "jagged_peaks",
    "jungle", "lukewarm_ocean", "lush_caves", "mangrove_swamp", "meadow", "mushroom_fields",
    "nether_wastes", "ocean", "old_growth_birch_forest", "old_growth_pine_taiga",
    "old_growth_spruce_taiga", "plains", "river", "savanna", "savanna_plateau",
    "small_end_islands", "snowy_beach", "snowy_plains", "snowy_slopes", "snowy_taiga",
    "soul_sand_valley", "sparse_jungle", "stony_peaks", "stony_shore", "sunflower_plains",
    "swamp", "taiga", "the_end", "the_void", "warm_ocean", "warped_forest", "windswept_forest",
    "windswept_gravelly_hills", "windswept_hills", "windswept_savanna", "wooded_badlands",
];

const VANILLA_STRUCTURES: &[&str] = &[
    "ancient_city", "bastion_remnant", "buried_treasure", "desert_pyramid", "end_city",
    "fortress", "igloo", "jungle_pyramid", "mansion", "mineshaft", "mineshaft_mesa", "monument",
    "nether_fossil", "ocean_ruin_cold", "ocean_ruin_warm", "pillager_outpost", "ruined_portal",
    "ruined_portal_desert", "ruined_portal_jungle", "ruined_portal_mountain",
    "ruined_portal_nether", "ruined_portal_ocean", "ruined_portal_swamp", "shipwreck",
    "shipwreck_beached", "stronghold", "swamp_hut", "trail_ruins", "trial_chambers",
    "village_desert", "village_plains", "village_savanna", "village_snowy", "village_taiga",
];

/// Registered biome and structure ids, each list in registry order.
///
/// On disk: `{"biomes": ["minecraft:plains", ...], "structures": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub biomes: Vec<String>,
    #[serde(default)]
    pub structures: Vec<String>,
}

impl Registry {
    pub fn new(biomes: Vec<String>, structures: Vec<String>) -> Self {
        Self { biomes, structures }
    }

    /// Built-in vanilla registry (all dimensions).
    pub fn vanilla() -> Self {
        let namespaced = |ids: &[&str]| -> Vec<String> { ids.iter().map(|id| format!("minecraft:{id}")).collect() };
        Self {
            biomes: namespaced(VANILLA_BIOMES),
            structures: namespaced(VANILLA_STRUCTURES),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry {}", path.display()))?;
        let registry: Registry = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse registry {}", path.display()))?;
        log::debug!(
            "Loaded registry {} ({} biomes, {} structures)",
            path.display(),
            registry.biomes.len(),
            registry.structures.len()
        );
        Ok(registry)
    }

    /// Work list for one run: every biome, then every structure.
    pub fn targets(&self) -> Vec<Target> {
        self.biomes
            .iter()
            .map(Target::biome)
            .chain(self.structures.iter().map(Target::structure))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TargetKind;

    #[test]
    fn test_targets_biomes_first_in_order() {
        let registry = Registry::new(
            vec!["b:two".into(), "b:one".into()],
            vec!["s:zeta".into(), "s:alpha".into()],
        );
        let targets = registry.targets();
        let names: Vec<_> = targets.iter().map(|t| (t.kind, t.name.as_str())).collect();
        assert_eq!(
            names,
            vec![
                (TargetKind::Biome, "b:two"),
                (TargetKind::Biome, "b:one"),
                (TargetKind::Structure, "s:zeta"),
                (TargetKind::Structure, "s:alpha"),
            ]
        );
    }

    #[test]
    fn test_vanilla_is_namespaced() {
        let registry = Registry::vanilla();
        assert_eq!(registry.biomes.len(), VANILLA_BIOMES.len());
        assert!(registry.biomes.contains(&"minecraft:plains".to_string()));
        assert!(registry.structures.iter().all(|s| s.starts_with("minecraft:")));
    }

    #[test]
    fn test_load_missing_structures_defaults_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, r#"{"biomes": ["minecraft:beach"]}"#).unwrap();

        let registry = Registry::load(&path).unwrap();
        assert_eq!(registry.biomes, vec!["minecraft:beach".to_string()]);
        assert!(registry.structures.is_empty());
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Registry::load(&path).is_err());
    }
}
