use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use block_grid_core::{BlockCatalog, BlockTypeConfig, WorldConfig};
use serde::Deserialize;

/// Game manifest describing the world settings and the available block types.
#[derive(Debug, Deserialize)]
pub(crate) struct Manifest {
    /// Grid extent, scale and degradation cadence.
    #[serde(default)]
    pub(crate) world: WorldConfig,
    /// Block type definitions registered with the catalog.
    #[serde(default)]
    pub(crate) blocks: Vec<BlockTypeConfig>,
}

impl Manifest {
    /// Reads and parses the manifest stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read game manifest at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid game manifest at {}", path.display()))
    }

    /// Parses manifest contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let manifest: Self =
            toml::from_str(contents).context("failed to parse game manifest toml contents")?;
        let cell_size = manifest.world.cell_size;
        if !(cell_size.is_finite() && cell_size > 0.0) {
            bail!("world cell_size must be positive and finite, got {cell_size}");
        }
        Ok(manifest)
    }

    /// Validates the block definitions into a catalog.
    pub(crate) fn catalog(&self) -> Result<BlockCatalog> {
        BlockCatalog::from_configs(self.blocks.iter().cloned())
            .context("block catalog rejected the manifest definitions")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use block_grid_core::{BlockTypeId, ItemCategory};

    use super::*;

    const MANIFEST: &str = r#"
        [world]
        world_bounds = 64

        [[blocks]]
        id = "sand"
        durability = 30
        break_time_secs = 0.5
        damage_overlay = "soil"

        [blocks.degradation]
        amount = 10
        interval_secs = 1.0

        [[blocks]]
        id = "brick_wall"
        durability = 40
        break_time_secs = 1.0
        category = "wall_item"
        has_collision = false
    "#;

    #[test]
    fn parses_world_and_blocks_with_defaults() {
        let manifest = Manifest::parse(MANIFEST).expect("manifest parses");

        assert_eq!(manifest.world.world_bounds, 64);
        assert_eq!(manifest.world.cell_size, 1.0);
        assert_eq!(
            manifest.world.degradation_check_interval(),
            Duration::from_millis(100)
        );

        let catalog = manifest.catalog().expect("catalog validates");
        assert_eq!(catalog.len(), 2);

        let sand = catalog.lookup(&BlockTypeId::new("sand")).expect("sand");
        assert!(sand.placeable && sand.breakable && sand.has_collision);
        assert_eq!(sand.category, ItemCategory::Block);
        assert!(sand.degradable());
        let profile = sand.degradation.as_ref().expect("profile");
        assert!(profile.degrades_under_player);
        assert_eq!(profile.player_multiplier, 1.0);

        let wall = catalog.lookup(&BlockTypeId::new("brick_wall")).expect("wall");
        assert_eq!(wall.category, ItemCategory::WallItem);
        assert!(!wall.has_collision);
        assert!(!wall.degradable());
    }

    #[test]
    fn empty_manifest_uses_defaults() {
        let manifest = Manifest::parse("").expect("empty manifest parses");

        assert_eq!(manifest.world, WorldConfig::default());
        assert!(manifest.blocks.is_empty());
    }

    #[test]
    fn duplicate_ids_fail_catalog_validation() {
        let manifest = Manifest::parse(
            r#"
            [[blocks]]
            id = "stone"
            durability = 60
            break_time_secs = 2.0

            [[blocks]]
            id = "stone"
            durability = 10
            break_time_secs = 1.0
            "#,
        )
        .expect("syntactically valid");

        assert!(manifest.catalog().is_err());
    }

    #[test]
    fn non_positive_cell_size_is_rejected() {
        let error = Manifest::parse("[world]\ncell_size = 0.0").expect_err("zero cell size");

        assert!(error.to_string().contains("cell_size"));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let error = Manifest::parse("[[blocks]]\nid = ").expect_err("invalid toml");

        assert!(error.to_string().contains("failed to parse game manifest"));
    }
}
