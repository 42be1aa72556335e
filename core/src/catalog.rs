//! Static block-type configuration and the read-only catalog that serves it.

use std::{collections::BTreeMap, fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier naming a block type within the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockTypeId(String);

impl BlockTypeId {
    /// Creates a new identifier from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the textual form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockTypeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Inventory category of a placeable item, which selects its occupancy layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Solid item placed into the block layer.
    #[default]
    Block,
    /// Decorative item placed into the wall layer behind blocks.
    WallItem,
    /// Thin walkable item placed into the platform layer.
    Platform,
}

impl ItemCategory {
    /// Occupancy layer that items of this category are placed into.
    #[must_use]
    pub const fn layer(self) -> Layer {
        match self {
            Self::Block => Layer::Block,
            Self::WallItem => Layer::Wall,
            Self::Platform => Layer::Platform,
        }
    }
}

/// Independent occupancy maps sharing the same coordinate space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Solid, collidable blocks carrying health.
    Block,
    /// Decorations rendered behind the block layer.
    Wall,
    /// Platforms. Mirrors the wall layer's contract.
    Platform,
}

/// Parameters controlling self-damage while a player stands on a block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DegradationProfile {
    /// Health removed per application.
    pub amount: u32,
    /// Seconds between applications before the player multiplier is applied.
    pub interval_secs: f64,
    /// Whether the block degrades while a player stands on it.
    #[serde(default = "enabled")]
    pub degrades_under_player: bool,
    /// Speed-up applied to the interval while a player is present.
    #[serde(default = "unit_multiplier")]
    pub player_multiplier: f64,
}

impl DegradationProfile {
    /// Creates a profile that degrades under players at the plain interval.
    #[must_use]
    pub fn new(amount: u32, interval_secs: f64) -> Self {
        Self {
            amount,
            interval_secs,
            degrades_under_player: true,
            player_multiplier: 1.0,
        }
    }

    /// Overrides the player multiplier.
    #[must_use]
    pub fn with_player_multiplier(mut self, player_multiplier: f64) -> Self {
        self.player_multiplier = player_multiplier;
        self
    }

    /// Interval between applications once the player multiplier is applied.
    ///
    /// A non-positive or non-finite multiplier counts as `1.0`.
    #[must_use]
    pub fn effective_interval(&self) -> Duration {
        let multiplier = if self.player_multiplier > 0.0 && self.player_multiplier.is_finite() {
            self.player_multiplier
        } else {
            1.0
        };
        Duration::try_from_secs_f64(self.interval_secs / multiplier).unwrap_or(Duration::ZERO)
    }
}

/// Static configuration describing a single block type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockTypeConfig {
    /// Identifier used to look the type up.
    pub id: BlockTypeId,
    /// Health a freshly placed block starts with.
    pub durability: u32,
    /// Seconds of continuous breaking required to destroy the block.
    pub break_time_secs: f64,
    /// Whether the type may be placed at all.
    #[serde(default = "enabled")]
    pub placeable: bool,
    /// Whether the type accepts damage and breaking.
    #[serde(default = "enabled")]
    pub breakable: bool,
    /// Whether the visual collaborator should attach a collision body.
    #[serde(default = "enabled")]
    pub has_collision: bool,
    /// Category selecting the occupancy layer.
    #[serde(default)]
    pub category: ItemCategory,
    /// Self-damage parameters. Present only for degradable types.
    #[serde(default)]
    pub degradation: Option<DegradationProfile>,
    /// Depth offset applied by the visual collaborator to wall items.
    #[serde(default)]
    pub wall_z_offset: f32,
    /// Material family used for damage-stage overlays, if the type provides one.
    #[serde(default)]
    pub damage_overlay: Option<String>,
}

impl BlockTypeConfig {
    /// Creates a placeable, breakable, collidable block-layer type.
    #[must_use]
    pub fn new(id: impl Into<BlockTypeId>, durability: u32, break_time_secs: f64) -> Self {
        Self {
            id: id.into(),
            durability,
            break_time_secs,
            placeable: true,
            breakable: true,
            has_collision: true,
            category: ItemCategory::Block,
            degradation: None,
            wall_z_offset: 0.0,
            damage_overlay: None,
        }
    }

    /// Overrides the item category.
    #[must_use]
    pub fn with_category(mut self, category: ItemCategory) -> Self {
        self.category = category;
        self
    }

    /// Marks the type as degradable with the provided profile.
    #[must_use]
    pub fn with_degradation(mut self, profile: DegradationProfile) -> Self {
        self.degradation = Some(profile);
        self
    }

    /// Overrides the placeable flag.
    #[must_use]
    pub fn with_placeable(mut self, placeable: bool) -> Self {
        self.placeable = placeable;
        self
    }

    /// Overrides the breakable flag.
    #[must_use]
    pub fn with_breakable(mut self, breakable: bool) -> Self {
        self.breakable = breakable;
        self
    }

    /// Attaches a damage overlay material family.
    #[must_use]
    pub fn with_damage_overlay(mut self, overlay: impl Into<String>) -> Self {
        self.damage_overlay = Some(overlay.into());
        self
    }

    /// Duration of continuous breaking required to destroy the block.
    #[must_use]
    pub fn break_time(&self) -> Duration {
        Duration::try_from_secs_f64(self.break_time_secs).unwrap_or(Duration::ZERO)
    }

    /// Reports whether the type ages while a player stands on it.
    #[must_use]
    pub fn degradable(&self) -> bool {
        self.degradation.is_some()
    }
}

/// Reasons a catalog may be rejected while it is being assembled.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two entries share the same identifier.
    #[error("block type `{0}` is defined more than once")]
    DuplicateType(BlockTypeId),
    /// The entry starts with no health.
    #[error("block type `{0}` must have a positive durability")]
    ZeroDurability(BlockTypeId),
    /// The entry has a zero, negative or non-finite break time.
    #[error("block type `{0}` must have a positive, finite break time")]
    InvalidBreakTime(BlockTypeId),
    /// The degradation table has a zero amount or a non-positive interval.
    #[error("block type `{0}` has an invalid degradation profile")]
    InvalidDegradation(BlockTypeId),
}

/// Immutable lookup from block-type identifier to its configuration.
#[derive(Clone, Debug, Default)]
pub struct BlockCatalog {
    entries: BTreeMap<BlockTypeId, BlockTypeConfig>,
}

impl BlockCatalog {
    /// Assembles a catalog after validating every entry.
    pub fn from_configs(
        configs: impl IntoIterator<Item = BlockTypeConfig>,
    ) -> Result<Self, CatalogError> {
        let mut entries = BTreeMap::new();
        for config in configs {
            validate(&config)?;
            if entries.contains_key(&config.id) {
                return Err(CatalogError::DuplicateType(config.id));
            }
            let _ = entries.insert(config.id.clone(), config);
        }
        Ok(Self { entries })
    }

    /// Retrieves the configuration registered for the identifier.
    #[must_use]
    pub fn lookup(&self, id: &BlockTypeId) -> Option<&BlockTypeConfig> {
        self.entries.get(id)
    }

    /// Iterates over all entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockTypeConfig> {
        self.entries.values()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the catalog holds no types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate(config: &BlockTypeConfig) -> Result<(), CatalogError> {
    if config.durability == 0 {
        return Err(CatalogError::ZeroDurability(config.id.clone()));
    }
    if !(config.break_time_secs.is_finite() && config.break_time_secs > 0.0) {
        return Err(CatalogError::InvalidBreakTime(config.id.clone()));
    }
    if let Some(profile) = &config.degradation {
        let interval_valid = profile.interval_secs.is_finite() && profile.interval_secs > 0.0;
        if profile.amount == 0 || !interval_valid {
            return Err(CatalogError::InvalidDegradation(config.id.clone()));
        }
    }
    Ok(())
}

fn enabled() -> bool {
    true
}

fn unit_multiplier() -> f64 {
    1.0
}
