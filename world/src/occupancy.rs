//! Authoritative sparse storage for the block, wall and platform layers.

use std::{collections::BTreeMap, fmt, sync::Arc};

use block_grid_core::{
    BlockCatalog, BlockTypeConfig, BlockTypeId, DamageStage, DegradationProfile, GridCoord,
    GridError, GridRect, Layer, PlayerProbe, VisualFactory, VisualHandle, WorldConfig,
};

/// Block occupying a cell of the block layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockCell {
    block_type: BlockTypeId,
    health: u32,
    visual: VisualHandle,
}

impl BlockCell {
    /// Type of the block.
    #[must_use]
    pub fn block_type(&self) -> &BlockTypeId {
        &self.block_type
    }

    /// Remaining health. Always within `1..=durability`.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Handle of the render/collision pair backing the block.
    #[must_use]
    pub const fn visual(&self) -> VisualHandle {
        self.visual
    }
}

/// Item occupying a cell of the wall or platform layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecorCell {
    block_type: BlockTypeId,
    visual: VisualHandle,
}

impl DecorCell {
    /// Type of the item.
    #[must_use]
    pub fn block_type(&self) -> &BlockTypeId {
        &self.block_type
    }

    /// Handle of the render object backing the item.
    #[must_use]
    pub const fn visual(&self) -> VisualHandle {
        self.visual
    }
}

/// Result of applying damage to an existing block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The block survived with the provided health.
    Damaged(u32),
    /// The block ran out of health and was removed.
    Destroyed(BlockTypeId),
    /// The block's type ignores damage; nothing changed.
    NotBreakable,
}

/// Result of placing an item into the wall or platform layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecorPlacement {
    /// Handle created for the new item.
    pub visual: VisualHandle,
    /// Type of the item that previously occupied the cell, if any.
    pub replaced: Option<BlockTypeId>,
}

/// Sparse map from grid coordinate to block, wall and platform state.
///
/// Every layer is keyed independently, so a coordinate may hold a block, a
/// wall and a platform at the same time.
pub struct OccupancyStore {
    config: WorldConfig,
    catalog: Arc<BlockCatalog>,
    visuals: Box<dyn VisualFactory>,
    blocks: BTreeMap<GridCoord, BlockCell>,
    walls: BTreeMap<GridCoord, DecorCell>,
    platforms: BTreeMap<GridCoord, DecorCell>,
}

impl OccupancyStore {
    /// Creates an empty store backed by the provided catalog and visual collaborator.
    #[must_use]
    pub fn new(
        config: WorldConfig,
        catalog: Arc<BlockCatalog>,
        visuals: Box<dyn VisualFactory>,
    ) -> Self {
        Self {
            config,
            catalog,
            visuals,
            blocks: BTreeMap::new(),
            walls: BTreeMap::new(),
            platforms: BTreeMap::new(),
        }
    }

    /// Places a block of the provided type at the cell.
    ///
    /// The block starts at full durability and is backed by a freshly created
    /// visual handle, which is returned.
    pub fn place_block(
        &mut self,
        cell: GridCoord,
        block_type: &BlockTypeId,
        player: &dyn PlayerProbe,
    ) -> Result<VisualHandle, GridError> {
        let config = self.placeable_config(cell, block_type)?;
        if self.blocks.contains_key(&cell) {
            return Err(GridError::CellOccupiedByBlock);
        }
        if player.intersects_player(&self.config.cell_bounds(cell)) {
            return Err(GridError::IntersectsPlayer);
        }

        let durability = config.durability;
        let visual = self.create_visual(cell, Layer::Block, block_type)?;
        let _ = self.blocks.insert(
            cell,
            BlockCell {
                block_type: block_type.clone(),
                health: durability,
                visual,
            },
        );
        Ok(visual)
    }

    /// Removes the block at the cell, releasing its visual handle.
    pub fn remove_block(&mut self, cell: GridCoord) -> Result<BlockTypeId, GridError> {
        let removed = self
            .blocks
            .remove(&cell)
            .ok_or(GridError::NoBlockAtPosition)?;
        self.visuals.destroy_visual(removed.visual);
        Ok(removed.block_type)
    }

    /// Places a wall at the cell, replacing any wall already there.
    ///
    /// Walls ignore block occupancy and the player.
    pub fn place_wall(
        &mut self,
        cell: GridCoord,
        block_type: &BlockTypeId,
    ) -> Result<DecorPlacement, GridError> {
        self.place_decor(Decor::Wall, cell, block_type)
    }

    /// Removes the wall at the cell. Returns `None` when the cell holds no wall.
    pub fn remove_wall(&mut self, cell: GridCoord) -> Option<BlockTypeId> {
        self.remove_decor(Decor::Wall, cell)
    }

    /// Places a platform at the cell, replacing any platform already there.
    pub fn place_platform(
        &mut self,
        cell: GridCoord,
        block_type: &BlockTypeId,
    ) -> Result<DecorPlacement, GridError> {
        self.place_decor(Decor::Platform, cell, block_type)
    }

    /// Removes the platform at the cell. Returns `None` when the cell holds no platform.
    pub fn remove_platform(&mut self, cell: GridCoord) -> Option<BlockTypeId> {
        self.remove_decor(Decor::Platform, cell)
    }

    /// Subtracts `amount` from the block's health, removing it once health reaches zero.
    pub fn damage_block(
        &mut self,
        cell: GridCoord,
        amount: u32,
    ) -> Result<DamageOutcome, GridError> {
        let block = self
            .blocks
            .get_mut(&cell)
            .ok_or(GridError::NoBlockAtPosition)?;
        let breakable = self
            .catalog
            .lookup(&block.block_type)
            .map_or(false, |config| config.breakable);
        if !breakable {
            return Ok(DamageOutcome::NotBreakable);
        }

        block.health = block.health.saturating_sub(amount);
        if block.health > 0 {
            return Ok(DamageOutcome::Damaged(block.health));
        }

        let block_type = self.remove_block(cell)?;
        Ok(DamageOutcome::Destroyed(block_type))
    }

    /// Forwards a breaking stage to the visual collaborator for the cell's block.
    pub fn show_damage_stage(&mut self, cell: GridCoord, stage: DamageStage) {
        let Some(block) = self.blocks.get(&cell) else {
            return;
        };
        let overlay = self
            .catalog
            .lookup(&block.block_type)
            .and_then(|config| config.damage_overlay.as_deref());
        self.visuals.show_damage_stage(block.visual, stage, overlay);
    }

    /// Reports whether the block layer holds a block at the cell.
    #[must_use]
    pub fn has_block(&self, cell: GridCoord) -> bool {
        self.blocks.contains_key(&cell)
    }

    /// Reports whether the wall layer holds a wall at the cell.
    #[must_use]
    pub fn has_wall(&self, cell: GridCoord) -> bool {
        self.walls.contains_key(&cell)
    }

    /// Reports whether the platform layer holds a platform at the cell.
    #[must_use]
    pub fn has_platform(&self, cell: GridCoord) -> bool {
        self.platforms.contains_key(&cell)
    }

    /// Block stored at the cell, if any.
    #[must_use]
    pub fn block(&self, cell: GridCoord) -> Option<&BlockCell> {
        self.blocks.get(&cell)
    }

    /// Wall stored at the cell, if any.
    #[must_use]
    pub fn wall(&self, cell: GridCoord) -> Option<&DecorCell> {
        self.walls.get(&cell)
    }

    /// Platform stored at the cell, if any.
    #[must_use]
    pub fn platform(&self, cell: GridCoord) -> Option<&DecorCell> {
        self.platforms.get(&cell)
    }

    /// Type of the block at the cell, if any.
    #[must_use]
    pub fn block_type(&self, cell: GridCoord) -> Option<&BlockTypeId> {
        self.blocks.get(&cell).map(BlockCell::block_type)
    }

    /// Health of the block at the cell, if any.
    #[must_use]
    pub fn health(&self, cell: GridCoord) -> Option<u32> {
        self.blocks.get(&cell).map(BlockCell::health)
    }

    /// Configuration of the block at the cell, if any.
    #[must_use]
    pub fn block_config(&self, cell: GridCoord) -> Option<&BlockTypeConfig> {
        self.block_type(cell)
            .and_then(|block_type| self.catalog.lookup(block_type))
    }

    /// Degradation profile of the block at the cell, if it is degradable.
    #[must_use]
    pub fn degradation_profile(&self, cell: GridCoord) -> Option<&DegradationProfile> {
        self.block_config(cell)
            .and_then(|config| config.degradation.as_ref())
    }

    /// Occupied cells of the layer in ascending coordinate order.
    #[must_use]
    pub fn positions(&self, layer: Layer) -> Vec<GridCoord> {
        match layer {
            Layer::Block => self.blocks.keys().copied().collect(),
            Layer::Wall => self.walls.keys().copied().collect(),
            Layer::Platform => self.platforms.keys().copied().collect(),
        }
    }

    /// Occupied cells of the layer that fall inside the rectangle.
    #[must_use]
    pub fn positions_in(&self, layer: Layer, rect: GridRect) -> Vec<GridCoord> {
        let mut positions = self.positions(layer);
        positions.retain(|cell| rect.contains(*cell));
        positions
    }

    /// Number of blocks in the block layer.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Grid settings the store validates against.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Catalog the store resolves block types with.
    #[must_use]
    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    fn placeable_config(
        &self,
        cell: GridCoord,
        block_type: &BlockTypeId,
    ) -> Result<&BlockTypeConfig, GridError> {
        if !self.config.contains(cell) {
            return Err(GridError::PositionOutOfBounds);
        }
        let config = self
            .catalog
            .lookup(block_type)
            .ok_or(GridError::TypeNotFound)?;
        if !config.placeable {
            return Err(GridError::NotPlaceable);
        }
        Ok(config)
    }

    fn create_visual(
        &mut self,
        cell: GridCoord,
        layer: Layer,
        block_type: &BlockTypeId,
    ) -> Result<VisualHandle, GridError> {
        let config = self
            .catalog
            .lookup(block_type)
            .ok_or(GridError::TypeNotFound)?;
        let position = self.config.grid_to_world(cell);
        self.visuals
            .create_visual(cell, layer, position, config)
            .map_err(|_| GridError::VisualUnavailable)
    }

    fn place_decor(
        &mut self,
        decor: Decor,
        cell: GridCoord,
        block_type: &BlockTypeId,
    ) -> Result<DecorPlacement, GridError> {
        let _ = self.placeable_config(cell, block_type)?;
        let visual = self.create_visual(cell, decor.layer(), block_type)?;
        let replaced = self.remove_decor(decor, cell);
        let _ = self.decor_mut(decor).insert(
            cell,
            DecorCell {
                block_type: block_type.clone(),
                visual,
            },
        );
        Ok(DecorPlacement { visual, replaced })
    }

    fn remove_decor(&mut self, decor: Decor, cell: GridCoord) -> Option<BlockTypeId> {
        let removed = self.decor_mut(decor).remove(&cell)?;
        self.visuals.destroy_visual(removed.visual);
        Some(removed.block_type)
    }

    fn decor_mut(&mut self, decor: Decor) -> &mut BTreeMap<GridCoord, DecorCell> {
        match decor {
            Decor::Wall => &mut self.walls,
            Decor::Platform => &mut self.platforms,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Decor {
    Wall,
    Platform,
}

impl Decor {
    const fn layer(self) -> Layer {
        match self {
            Self::Wall => Layer::Wall,
            Self::Platform => Layer::Platform,
        }
    }
}

impl fmt::Debug for OccupancyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupancyStore")
            .field("config", &self.config)
            .field("blocks", &self.blocks)
            .field("walls", &self.walls)
            .field("platforms", &self.platforms)
            .finish_non_exhaustive()
    }
}
