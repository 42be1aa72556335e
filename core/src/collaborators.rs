//! Contracts for the rendering/collision and player collaborators.

use std::collections::BTreeSet;

use glam::Vec3;
use thiserror::Error;

use crate::{BlockTypeConfig, DamageStage, GridCoord, Layer, WorldAabb};

/// Opaque value identifying a render/collision object owned by a [`VisualFactory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(u64);

impl VisualHandle {
    /// Wraps a collaborator-specific handle value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the raw handle value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Failure reported by a [`VisualFactory`] that could not create a handle.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("visual collaborator could not create a handle: {reason}")]
pub struct VisualError {
    reason: String,
}

impl VisualError {
    /// Creates an error carrying a human readable reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Collaborator that owns the render and collision objects backing occupied cells.
///
/// The world only stores the returned handle and releases it when the cell
/// is cleared.
pub trait VisualFactory {
    /// Creates the render/collision pair for a freshly placed cell.
    fn create_visual(
        &mut self,
        cell: GridCoord,
        layer: Layer,
        position: Vec3,
        config: &BlockTypeConfig,
    ) -> Result<VisualHandle, VisualError>;

    /// Releases a handle previously returned by [`VisualFactory::create_visual`].
    fn destroy_visual(&mut self, handle: VisualHandle);

    /// Switches the handle to the material for the given breaking stage.
    fn show_damage_stage(
        &mut self,
        handle: VisualHandle,
        stage: DamageStage,
        overlay: Option<&str>,
    ) {
        let _ = (handle, stage, overlay);
    }
}

/// Handle allocator used when no renderer is attached.
#[derive(Debug, Default)]
pub struct HeadlessVisuals {
    next: u64,
    live: BTreeSet<VisualHandle>,
}

impl HeadlessVisuals {
    /// Creates an allocator with no live handles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles created and not yet destroyed.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl VisualFactory for HeadlessVisuals {
    fn create_visual(
        &mut self,
        _cell: GridCoord,
        _layer: Layer,
        _position: Vec3,
        _config: &BlockTypeConfig,
    ) -> Result<VisualHandle, VisualError> {
        let handle = VisualHandle::new(self.next);
        self.next = self.next.wrapping_add(1);
        let _ = self.live.insert(handle);
        Ok(handle)
    }

    fn destroy_visual(&mut self, handle: VisualHandle) {
        let _ = self.live.remove(&handle);
    }
}

/// Predicate reporting whether a world-space box overlaps the player.
pub trait PlayerProbe {
    /// Returns `true` when the box overlaps the player's collision volume.
    fn intersects_player(&self, bounds: &WorldAabb) -> bool;
}

/// Probe used when no player is present in the world.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPlayer;

impl PlayerProbe for NoPlayer {
    fn intersects_player(&self, _bounds: &WorldAabb) -> bool {
        false
    }
}

impl PlayerProbe for WorldAabb {
    fn intersects_player(&self, bounds: &WorldAabb) -> bool {
        self.intersects(bounds)
    }
}

impl PlayerProbe for Option<WorldAabb> {
    fn intersects_player(&self, bounds: &WorldAabb) -> bool {
        self.as_ref().is_some_and(|player| player.intersects(bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_visuals_track_live_handles() {
        let mut visuals = HeadlessVisuals::new();
        let config = BlockTypeConfig::new("stone", 10, 1.0);
        let first = visuals
            .create_visual(GridCoord::new(0, 0), Layer::Block, Vec3::ZERO, &config)
            .expect("headless never fails");
        let second = visuals
            .create_visual(GridCoord::new(1, 0), Layer::Wall, Vec3::X, &config)
            .expect("headless never fails");

        assert_ne!(first, second);
        assert_eq!(visuals.live_count(), 2);
        visuals.destroy_visual(first);
        visuals.destroy_visual(first);
        assert_eq!(visuals.live_count(), 1);
    }

    #[test]
    fn absent_player_never_intersects() {
        let bounds = WorldAabb::from_center(Vec3::ZERO, Vec3::splat(0.5));
        assert!(!NoPlayer.intersects_player(&bounds));
        assert!(!None::<WorldAabb>.intersects_player(&bounds));
        assert!(Some(bounds).intersects_player(&bounds));
    }
}
