#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative block grid state for the placement game.
//!
//! The [`World`] owns the occupancy store, the breaking table and the
//! degradation scheduler. Nothing else may write to them: adapters submit
//! [`Command`] values through [`apply`] (or call the façade methods
//! directly) and read state through the [`query`] module.

use std::{fmt, sync::Arc, time::Duration};

use block_grid_core::{
    BlockCatalog, BlockTypeId, Command, Event, EventBus, GridCoord, GridError, HeadlessVisuals,
    Layer, NoPlayer, PlayerProbe, VisualFactory, WorldConfig,
};
use log::{debug, trace, warn};

mod breaking;
mod degradation;
mod occupancy;

pub use breaking::{BreakingProgress, BreakingTable, TickResult};
pub use degradation::{DegradationHit, DegradationScheduler};
pub use occupancy::{BlockCell, DamageOutcome, DecorCell, DecorPlacement, OccupancyStore};

/// Item cleared by a removal request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Removal {
    /// A block was removed from the block layer.
    Block(BlockTypeId),
    /// A wall was removed from the wall layer.
    Wall(BlockTypeId),
    /// A platform was removed from the platform layer.
    Platform(BlockTypeId),
    /// Every layer was empty at the cell.
    Nothing,
}

/// Represents the authoritative block grid state.
pub struct World {
    store: OccupancyStore,
    breaking: BreakingTable,
    degradation: DegradationScheduler,
    player: Box<dyn PlayerProbe>,
    tick_index: u64,
}

impl World {
    /// Creates an empty world without a renderer or player attached.
    #[must_use]
    pub fn new(config: WorldConfig, catalog: Arc<BlockCatalog>) -> Self {
        Self::with_visuals(config, catalog, Box::new(HeadlessVisuals::new()))
    }

    /// Creates an empty world whose cells are backed by the provided visual collaborator.
    #[must_use]
    pub fn with_visuals(
        config: WorldConfig,
        catalog: Arc<BlockCatalog>,
        visuals: Box<dyn VisualFactory>,
    ) -> Self {
        let degradation = DegradationScheduler::new(config.degradation_check_interval());
        Self {
            store: OccupancyStore::new(config, catalog, visuals),
            breaking: BreakingTable::new(),
            degradation,
            player: Box::new(NoPlayer),
            tick_index: 0,
        }
    }

    /// Replaces the predicate consulted before placing blocks.
    pub fn set_player_probe(&mut self, probe: Box<dyn PlayerProbe>) {
        self.player = probe;
    }

    /// Read-only access to the occupancy store.
    #[must_use]
    pub fn store(&self) -> &OccupancyStore {
        &self.store
    }

    /// Places an item, routing it to the layer selected by its category.
    pub fn place(
        &mut self,
        cell: GridCoord,
        block_type: &BlockTypeId,
        bus: &mut dyn EventBus,
    ) -> Result<Layer, GridError> {
        if !self.store.config().contains(cell) {
            return Err(GridError::PositionOutOfBounds);
        }
        let layer = self
            .store
            .catalog()
            .lookup(block_type)
            .ok_or(GridError::TypeNotFound)?
            .category
            .layer();

        let replaced = match layer {
            Layer::Block => {
                let _ = self
                    .store
                    .place_block(cell, block_type, &*self.player)?;
                None
            }
            Layer::Wall => self.store.place_wall(cell, block_type)?.replaced,
            Layer::Platform => self.store.place_platform(cell, block_type)?.replaced,
        };

        if let Some(previous) = replaced {
            bus.publish(Event::BlockRemoved {
                cell,
                layer,
                block_type: previous,
            });
        }
        bus.publish(Event::BlockPlaced {
            cell,
            layer,
            block_type: block_type.clone(),
        });
        Ok(layer)
    }

    /// Clears the cell, trying the block, wall and platform layers in that order.
    pub fn remove(&mut self, cell: GridCoord, bus: &mut dyn EventBus) -> Removal {
        if let Ok(block_type) = self.remove_block(cell, bus) {
            return Removal::Block(block_type);
        }
        if let Ok(block_type) = self.remove_wall(cell, bus) {
            return Removal::Wall(block_type);
        }
        match self.store.remove_platform(cell) {
            Some(block_type) => {
                bus.publish(Event::BlockRemoved {
                    cell,
                    layer: Layer::Platform,
                    block_type: block_type.clone(),
                });
                Removal::Platform(block_type)
            }
            None => Removal::Nothing,
        }
    }

    /// Removes the block at the cell, cancelling any breaking process on it.
    pub fn remove_block(
        &mut self,
        cell: GridCoord,
        bus: &mut dyn EventBus,
    ) -> Result<BlockTypeId, GridError> {
        let block_type = self.store.remove_block(cell)?;
        self.block_removed(cell, &block_type, bus);
        Ok(block_type)
    }

    /// Removes the wall at the cell.
    pub fn remove_wall(
        &mut self,
        cell: GridCoord,
        bus: &mut dyn EventBus,
    ) -> Result<BlockTypeId, GridError> {
        let block_type = self
            .store
            .remove_wall(cell)
            .ok_or(GridError::NoWallAtPosition)?;
        bus.publish(Event::BlockRemoved {
            cell,
            layer: Layer::Wall,
            block_type: block_type.clone(),
        });
        Ok(block_type)
    }

    /// Applies instantaneous damage to the block at the cell.
    pub fn damage_block(
        &mut self,
        cell: GridCoord,
        amount: u32,
        bus: &mut dyn EventBus,
    ) -> Result<DamageOutcome, GridError> {
        let outcome = self.store.damage_block(cell, amount)?;
        match &outcome {
            DamageOutcome::Damaged(health) => bus.publish(Event::BlockDamaged {
                cell,
                amount,
                health: *health,
            }),
            DamageOutcome::Destroyed(block_type) => {
                bus.publish(Event::BlockDamaged {
                    cell,
                    amount,
                    health: 0,
                });
                self.block_removed(cell, block_type, bus);
            }
            DamageOutcome::NotBreakable => {
                debug!("block at {cell:?} is not breakable; ignoring {amount} damage");
            }
        }
        Ok(outcome)
    }

    /// Starts (or restarts) breaking the block at the cell.
    ///
    /// Returns the total break time of the block.
    pub fn start_breaking(
        &mut self,
        cell: GridCoord,
        bus: &mut dyn EventBus,
    ) -> Result<Duration, GridError> {
        let config = self
            .store
            .block_config(cell)
            .ok_or(GridError::NoBlockAtPosition)?;
        if !config.breakable {
            return Err(GridError::NotBreakable);
        }

        let total_break_time = config.break_time();
        self.breaking.start(cell, total_break_time);
        bus.publish(Event::BreakingStarted {
            cell,
            total_break_time,
        });
        Ok(total_break_time)
    }

    /// Cancels breaking at the cell. Returns `false` when nothing was being broken.
    pub fn stop_breaking(&mut self, cell: GridCoord, bus: &mut dyn EventBus) -> bool {
        if !self.breaking.cancel(cell) {
            return false;
        }
        bus.publish(Event::BreakingCancelled { cell });
        true
    }

    /// Records the cell the player stands on, replacing the previous one.
    pub fn set_player_presence(&mut self, cell: Option<GridCoord>) {
        self.degradation.set_presence(cell);
    }

    /// Advances breaking processes and the degradation scheduler by `dt`.
    pub fn tick(&mut self, dt: Duration, bus: &mut dyn EventBus) {
        self.tick_index = self.tick_index.saturating_add(1);
        bus.publish(Event::TimeAdvanced { dt });
        self.advance_breaking(dt, bus);
        self.advance_degradation(dt, bus);
    }

    fn advance_breaking(&mut self, dt: Duration, bus: &mut dyn EventBus) {
        for cell in self.breaking.cells() {
            let has_block = self.store.has_block(cell);
            debug_assert!(has_block, "breaking process outlived its block at {cell:?}");
            if !has_block {
                let _ = self.breaking.discard(cell);
                continue;
            }

            match self.breaking.tick(cell, dt) {
                Some(TickResult::StageChanged(stage)) => {
                    self.store.show_damage_stage(cell, stage);
                    let damage_fraction = self
                        .breaking
                        .progress(cell)
                        .map_or(0.0, BreakingProgress::damage_fraction);
                    bus.publish(Event::BreakingStageChanged {
                        cell,
                        damage_fraction,
                        stage,
                    });
                }
                Some(TickResult::Completed) => self.complete_breaking(cell, bus),
                Some(TickResult::StillBreaking) | None => {}
            }
        }
    }

    fn complete_breaking(&mut self, cell: GridCoord, bus: &mut dyn EventBus) {
        let _ = self.breaking.discard(cell);
        match self.store.remove_block(cell) {
            Ok(block_type) => {
                self.degradation.forget(cell);
                bus.publish(Event::BlockRemoved {
                    cell,
                    layer: Layer::Block,
                    block_type: block_type.clone(),
                });
                bus.publish(Event::BreakingCompleted { cell, block_type });
            }
            Err(error) => warn!("completed breaking at {cell:?} could not remove block: {error}"),
        }
    }

    fn advance_degradation(&mut self, dt: Duration, bus: &mut dyn EventBus) {
        let steps = self.degradation.advance(dt);
        let store = &self.store;
        let Some(hit) = self
            .degradation
            .step(steps, |cell| store.degradation_profile(cell).cloned())
        else {
            return;
        };

        trace!(
            "degrading block at {:?} by {} x{}",
            hit.cell,
            hit.amount,
            hit.applications
        );
        // Stops at the first application that leaves nothing left to degrade.
        for _ in 0..hit.applications {
            match self.damage_block(hit.cell, hit.amount, bus) {
                Ok(DamageOutcome::Damaged(_)) => {}
                Ok(DamageOutcome::Destroyed(_) | DamageOutcome::NotBreakable) => break,
                Err(error) => {
                    warn!("degradation at {:?} failed: {error}", hit.cell);
                    break;
                }
            }
        }
    }

    fn block_removed(&mut self, cell: GridCoord, block_type: &BlockTypeId, bus: &mut dyn EventBus) {
        self.degradation.forget(cell);
        bus.publish(Event::BlockRemoved {
            cell,
            layer: Layer::Block,
            block_type: block_type.clone(),
        });
        if self.breaking.cancel(cell) {
            bus.publish(Event::BreakingCancelled { cell });
        }
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("store", &self.store)
            .field("breaking", &self.breaking)
            .field("degradation", &self.degradation)
            .field("tick_index", &self.tick_index)
            .finish_non_exhaustive()
    }
}

/// Applies the provided command to the world, publishing resulting events on `bus`.
///
/// Rejected requests are not errors: they are logged and produce no events.
pub fn apply(world: &mut World, command: Command, bus: &mut dyn EventBus) {
    match command {
        Command::RequestPlace { cell, block_type } => {
            if let Err(error) = world.place(cell, &block_type, bus) {
                warn!("rejected placement of {block_type} at {cell:?}: {error}");
            }
        }
        Command::RequestRemove { cell } => {
            if world.remove(cell, bus) == Removal::Nothing {
                debug!("nothing to remove at {cell:?}");
            }
        }
        Command::RequestBreakingStart { cell } => {
            if let Err(error) = world.start_breaking(cell, bus) {
                debug!("ignored breaking request at {cell:?}: {error}");
            }
        }
        Command::RequestBreakingStop { cell } => {
            if !world.stop_breaking(cell, bus) {
                debug!("no breaking process to stop at {cell:?}");
            }
        }
        Command::UpdatePlayerPresence { cell } => world.set_player_presence(cell),
        Command::DamageBlock { cell, amount } => {
            if let Err(error) = world.damage_block(cell, amount, bus) {
                warn!("rejected {amount} damage at {cell:?}: {error}");
            }
        }
        Command::Tick { dt } => world.tick(dt, bus),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use block_grid_core::{
        BlockCatalog, BlockTypeId, GridCoord, GridRect, ItemCategory, Layer, WorldConfig,
    };

    use super::{BlockCell, BreakingProgress, DecorCell, World};

    /// Color of the cursor indicator shown over a candidate cell.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum IndicatorColor {
        /// A block is present and can be removed.
        Red,
        /// A wall is present and the selected wall item would replace it.
        Orange,
        /// The cell accepts the selected item.
        Green,
        /// The target is invalid.
        Gray,
    }

    /// Grid settings of the world.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        world.store.config()
    }

    /// Catalog the world resolves block types with.
    #[must_use]
    pub fn catalog(world: &World) -> &BlockCatalog {
        world.store.catalog()
    }

    /// Reports whether the block layer holds a block at the cell.
    #[must_use]
    pub fn has_block(world: &World, cell: GridCoord) -> bool {
        world.store.has_block(cell)
    }

    /// Reports whether the wall layer holds a wall at the cell.
    #[must_use]
    pub fn has_wall(world: &World, cell: GridCoord) -> bool {
        world.store.has_wall(cell)
    }

    /// Reports whether the platform layer holds a platform at the cell.
    #[must_use]
    pub fn has_platform(world: &World, cell: GridCoord) -> bool {
        world.store.has_platform(cell)
    }

    /// Block stored at the cell, if any.
    #[must_use]
    pub fn block_at(world: &World, cell: GridCoord) -> Option<&BlockCell> {
        world.store.block(cell)
    }

    /// Wall stored at the cell, if any.
    #[must_use]
    pub fn wall_at(world: &World, cell: GridCoord) -> Option<&DecorCell> {
        world.store.wall(cell)
    }

    /// Type of the block at the cell, if any.
    #[must_use]
    pub fn block_type(world: &World, cell: GridCoord) -> Option<&BlockTypeId> {
        world.store.block_type(cell)
    }

    /// Health of the block at the cell, if any.
    #[must_use]
    pub fn health(world: &World, cell: GridCoord) -> Option<u32> {
        world.store.health(cell)
    }

    /// Occupied cells of the layer in ascending coordinate order.
    #[must_use]
    pub fn positions(world: &World, layer: Layer) -> Vec<GridCoord> {
        world.store.positions(layer)
    }

    /// Occupied cells of the layer inside the rectangle.
    #[must_use]
    pub fn positions_in(world: &World, layer: Layer, rect: GridRect) -> Vec<GridCoord> {
        world.store.positions_in(layer, rect)
    }

    /// Number of blocks in the block layer.
    #[must_use]
    pub fn block_count(world: &World) -> usize {
        world.store.block_count()
    }

    /// Progress of the breaking process at the cell, if one exists.
    #[must_use]
    pub fn breaking_progress(world: &World, cell: GridCoord) -> Option<&BreakingProgress> {
        world.breaking.progress(cell)
    }

    /// Reports whether a breaking process is running at the cell.
    #[must_use]
    pub fn is_breaking(world: &World, cell: GridCoord) -> bool {
        world.breaking.is_breaking(cell)
    }

    /// Time accumulated toward the cell's next degradation, if it has a timer.
    #[must_use]
    pub fn degradation_timer(world: &World, cell: GridCoord) -> Option<Duration> {
        world.degradation.timer(cell)
    }

    /// Cell the player currently stands on, as last reported.
    #[must_use]
    pub fn player_presence(world: &World) -> Option<GridCoord> {
        world.degradation.presence()
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Derives the indicator color for a candidate cell.
    ///
    /// `valid` is the caller's own verdict on the target (e.g. within reach);
    /// `selected` is the item currently held, if any.
    #[must_use]
    pub fn target_indicator(
        world: &World,
        cell: GridCoord,
        valid: bool,
        selected: Option<&BlockTypeId>,
    ) -> IndicatorColor {
        if !valid || !world.store.config().contains(cell) {
            return IndicatorColor::Gray;
        }
        if world.store.has_block(cell) {
            return IndicatorColor::Red;
        }

        let Some(block_type) = selected else {
            return IndicatorColor::Green;
        };
        match world.store.catalog().lookup(block_type) {
            None => IndicatorColor::Gray,
            Some(config) if !config.placeable => IndicatorColor::Gray,
            Some(config)
                if config.category == ItemCategory::WallItem && world.store.has_wall(cell) =>
            {
                IndicatorColor::Orange
            }
            _ => IndicatorColor::Green,
        }
    }
}
