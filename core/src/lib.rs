#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the block grid engine.
//!
//! This crate defines the message surface that connects input adapters, the
//! authoritative world, and its collaborators. Adapters submit [`Command`]
//! values describing requested mutations, the world executes them via its
//! `apply` entry point and publishes [`Event`] values on an [`EventBus`] for
//! inventory, rendering and other listeners to react to.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod bus;
mod catalog;
mod collaborators;
mod space;

pub use glam::Vec3;

pub use bus::{Broadcast, EventBus, SubscriptionId};
pub use catalog::{
    BlockCatalog, BlockTypeConfig, BlockTypeId, CatalogError, DegradationProfile, ItemCategory,
    Layer,
};
pub use collaborators::{
    HeadlessVisuals, NoPlayer, PlayerProbe, VisualError, VisualFactory, VisualHandle,
};
pub use space::{GridCoord, GridRect, WorldAabb, WorldConfig};

/// Requests that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Places an item at the cell, routed to the layer of its category.
    RequestPlace {
        /// Cell targeted by the placement.
        cell: GridCoord,
        /// Type of item being placed.
        block_type: BlockTypeId,
    },
    /// Clears the cell, trying the block layer before the wall and platform layers.
    RequestRemove {
        /// Cell targeted by the removal.
        cell: GridCoord,
    },
    /// Starts (or restarts) the hold-to-break process on the cell's block.
    RequestBreakingStart {
        /// Cell whose block should be broken.
        cell: GridCoord,
    },
    /// Cancels the breaking process on the cell, if one is running.
    RequestBreakingStop {
        /// Cell whose breaking process should be cancelled.
        cell: GridCoord,
    },
    /// Reports the cell the player currently stands on.
    UpdatePlayerPresence {
        /// Cell under the player, or `None` when the player is not standing on a block.
        cell: Option<GridCoord>,
    },
    /// Applies instantaneous damage to the cell's block, e.g. from a tool.
    DamageBlock {
        /// Cell whose block receives the damage.
        cell: GridCoord,
        /// Health removed from the block.
        amount: u32,
    },
    /// Advances breaking and degradation by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events published by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an item was placed into a layer.
    BlockPlaced {
        /// Cell that received the item.
        cell: GridCoord,
        /// Layer the item occupies.
        layer: Layer,
        /// Type of the placed item.
        block_type: BlockTypeId,
    },
    /// Confirms that an item was removed from a layer, by any path.
    BlockRemoved {
        /// Cell that was cleared.
        cell: GridCoord,
        /// Layer the item occupied.
        layer: Layer,
        /// Type of the removed item.
        block_type: BlockTypeId,
    },
    /// Reports that a block lost health through direct damage or degradation.
    BlockDamaged {
        /// Cell of the damaged block.
        cell: GridCoord,
        /// Health requested to be removed.
        amount: u32,
        /// Health left afterwards. Zero means the block was destroyed.
        health: u32,
    },
    /// Announces that a breaking process started on a block.
    BreakingStarted {
        /// Cell being broken.
        cell: GridCoord,
        /// Time of continuous breaking required to destroy the block.
        total_break_time: Duration,
    },
    /// Announces that a breaking process reached a new visual stage.
    BreakingStageChanged {
        /// Cell being broken.
        cell: GridCoord,
        /// Progress in the range `0.0..=1.0`.
        damage_fraction: f32,
        /// Discrete stage derived from the progress.
        stage: DamageStage,
    },
    /// Announces that a breaking process destroyed its block.
    BreakingCompleted {
        /// Cell whose block was destroyed.
        cell: GridCoord,
        /// Type of the destroyed block.
        block_type: BlockTypeId,
    },
    /// Announces that a breaking process ended without destroying its block.
    BreakingCancelled {
        /// Cell whose breaking process was discarded.
        cell: GridCoord,
    },
}

/// Discrete bucketing of breaking progress that drives damage visuals.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DamageStage(u8);

impl DamageStage {
    /// Stage reported before any visible damage.
    pub const NONE: Self = Self(0);
    /// Final stage, reported once breaking completes.
    pub const MAX: Self = Self(4);

    /// Buckets a progress fraction into one of five stages.
    ///
    /// The fraction is clamped into `0.0..=1.0` first and the stage is capped
    /// at [`DamageStage::MAX`], so overshoot never yields a sixth stage.
    #[must_use]
    pub fn from_fraction(fraction: f32) -> Self {
        let clamped = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let bucket = (clamped * 5.0).floor() as u8;
        Self(bucket.min(Self::MAX.0))
    }

    /// Retrieves the numeric stage.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Reasons a world operation may be rejected. All of them are recoverable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum GridError {
    /// The cell lies beyond the configured world bounds.
    #[error("position lies outside the world bounds")]
    PositionOutOfBounds,
    /// The block type is not registered in the catalog.
    #[error("block type is not registered")]
    TypeNotFound,
    /// The block type may not be placed.
    #[error("block type is not placeable")]
    NotPlaceable,
    /// The block type may not be damaged or broken.
    #[error("block type is not breakable")]
    NotBreakable,
    /// The block layer already holds a block at the cell.
    #[error("cell is already occupied by a block")]
    CellOccupiedByBlock,
    /// The cell's volume overlaps the player.
    #[error("cell intersects the player")]
    IntersectsPlayer,
    /// The block layer is empty at the cell.
    #[error("no block at position")]
    NoBlockAtPosition,
    /// The wall layer is empty at the cell.
    #[error("no wall at position")]
    NoWallAtPosition,
    /// The visual collaborator could not back the cell with a handle.
    #[error("visual collaborator could not create a handle")]
    VisualUnavailable,
}

#[cfg(test)]
mod tests {
    use super::{BlockTypeId, DamageStage, GridCoord, GridError};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn grid_coord_round_trips_through_bincode() {
        assert_round_trip(&GridCoord::new(-12, 40));
    }

    #[test]
    fn block_type_id_round_trips_through_bincode() {
        assert_round_trip(&BlockTypeId::new("grass"));
    }

    #[test]
    fn grid_error_round_trips_through_bincode() {
        assert_round_trip(&GridError::CellOccupiedByBlock);
    }

    #[test]
    fn damage_stage_buckets_progress_into_fifths() {
        assert_eq!(DamageStage::from_fraction(0.0), DamageStage::NONE);
        assert_eq!(DamageStage::from_fraction(0.19).get(), 0);
        assert_eq!(DamageStage::from_fraction(0.2).get(), 1);
        assert_eq!(DamageStage::from_fraction(0.5).get(), 2);
        assert_eq!(DamageStage::from_fraction(0.99).get(), 4);
    }

    #[test]
    fn damage_stage_clamps_overshoot() {
        assert_eq!(DamageStage::from_fraction(1.0), DamageStage::MAX);
        assert_eq!(DamageStage::from_fraction(3.5), DamageStage::MAX);
        assert_eq!(DamageStage::from_fraction(-0.4), DamageStage::NONE);
        assert_eq!(DamageStage::from_fraction(f32::NAN), DamageStage::NONE);
    }
}
