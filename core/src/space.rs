//! Grid coordinates and the mapping between grid cells and world space.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

const DEFAULT_WORLD_BOUNDS: u32 = 1024;
const DEFAULT_CELL_SIZE: f32 = 1.0;
const DEFAULT_DEGRADATION_CHECK_INTERVAL_MS: u64 = 100;

/// Location of a single grid cell expressed as signed horizontal and vertical indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    x: i32,
    y: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// Inclusive rectangle of grid cells spanned by two corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    min: GridCoord,
    max: GridCoord,
}

impl GridRect {
    /// Creates a rectangle spanning both corners, in any order.
    #[must_use]
    pub fn from_corners(a: GridCoord, b: GridCoord) -> Self {
        Self {
            min: GridCoord::new(a.x().min(b.x()), a.y().min(b.y())),
            max: GridCoord::new(a.x().max(b.x()), a.y().max(b.y())),
        }
    }

    /// Corner with the smallest indices.
    #[must_use]
    pub const fn min(&self) -> GridCoord {
        self.min
    }

    /// Corner with the largest indices.
    #[must_use]
    pub const fn max(&self) -> GridCoord {
        self.max
    }

    /// Reports whether the cell lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, cell: GridCoord) -> bool {
        (self.min.x()..=self.max.x()).contains(&cell.x())
            && (self.min.y()..=self.max.y()).contains(&cell.y())
    }
}

/// Axis-aligned box expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldAabb {
    /// Corner with the smallest coordinates.
    pub min: Vec3,
    /// Corner with the largest coordinates.
    pub max: Vec3,
}

impl WorldAabb {
    /// Creates a box from its center and half extents.
    #[must_use]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Reports whether the two boxes overlap with a non-zero volume.
    ///
    /// Boxes that merely touch along a face do not intersect, so a player
    /// standing on top of a cell never blocks placement into it.
    #[must_use]
    pub fn intersects(&self, other: &WorldAabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

/// Static settings describing the extent and scale of the grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Largest absolute index accepted on either axis at placement time.
    pub world_bounds: u32,
    /// Edge length of a single cell measured in world units.
    pub cell_size: f32,
    /// Cadence at which the degradation scheduler re-evaluates, in milliseconds.
    pub degradation_check_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_bounds: DEFAULT_WORLD_BOUNDS,
            cell_size: DEFAULT_CELL_SIZE,
            degradation_check_interval_ms: DEFAULT_DEGRADATION_CHECK_INTERVAL_MS,
        }
    }
}

impl WorldConfig {
    /// Overrides the placement bounds.
    #[must_use]
    pub fn with_world_bounds(mut self, world_bounds: u32) -> Self {
        self.world_bounds = world_bounds;
        self
    }

    /// Overrides the cell edge length.
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Reports whether both indices of the cell lie within `world_bounds`.
    #[must_use]
    pub fn contains(&self, cell: GridCoord) -> bool {
        cell.x().unsigned_abs() <= self.world_bounds && cell.y().unsigned_abs() <= self.world_bounds
    }

    /// Projects a cell onto its world-space center. The depth axis is always zero.
    #[must_use]
    pub fn grid_to_world(&self, cell: GridCoord) -> Vec3 {
        let cell_size = self.effective_cell_size();
        Vec3::new(cell.x() as f32 * cell_size, cell.y() as f32 * cell_size, 0.0)
    }

    /// Snaps a world-space position onto the nearest cell.
    ///
    /// Halfway positions round away from zero, so `0.5` maps to `1` and
    /// `-0.5` maps to `-1`. The depth axis is ignored.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec3) -> GridCoord {
        let cell_size = self.effective_cell_size();
        GridCoord::new(
            (position.x / cell_size).round() as i32,
            (position.y / cell_size).round() as i32,
        )
    }

    /// Unit cube occupied by the cell in world space.
    #[must_use]
    pub fn cell_bounds(&self, cell: GridCoord) -> WorldAabb {
        let half = self.effective_cell_size() * 0.5;
        WorldAabb::from_center(self.grid_to_world(cell), Vec3::splat(half))
    }

    /// Cadence of the degradation scheduler. Never zero.
    #[must_use]
    pub fn degradation_check_interval(&self) -> Duration {
        Duration::from_millis(self.degradation_check_interval_ms.max(1))
    }

    fn effective_cell_size(&self) -> f32 {
        if self.cell_size > 0.0 && self.cell_size.is_finite() {
            self.cell_size
        } else {
            DEFAULT_CELL_SIZE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_to_grid_rounds_half_away_from_zero() {
        let config = WorldConfig::default();
        assert_eq!(config.world_to_grid(Vec3::new(0.5, -0.5, 0.0)), GridCoord::new(1, -1));
        assert_eq!(config.world_to_grid(Vec3::new(2.5, 1.49, 0.0)), GridCoord::new(3, 1));
        assert_eq!(config.world_to_grid(Vec3::new(-2.5, -1.51, 7.0)), GridCoord::new(-3, -2));
    }

    #[test]
    fn grid_to_world_scales_by_cell_size_and_flattens_depth() {
        let config = WorldConfig::default().with_cell_size(2.0);
        assert_eq!(config.grid_to_world(GridCoord::new(3, -4)), Vec3::new(6.0, -8.0, 0.0));
    }

    #[test]
    fn world_round_trip_holds_within_bounds() {
        let config = WorldConfig::default().with_world_bounds(64).with_cell_size(0.75);
        let bounds = config.world_bounds as i32;
        for x in -bounds..=bounds {
            for y in [-bounds, -1, 0, 1, bounds] {
                let cell = GridCoord::new(x, y);
                assert_eq!(config.world_to_grid(config.grid_to_world(cell)), cell);
            }
        }
    }

    #[test]
    fn degenerate_cell_size_still_round_trips() {
        for cell_size in [0.0, -2.0, f32::NAN] {
            let config = WorldConfig::default().with_cell_size(cell_size);
            let cell = GridCoord::new(7, -3);
            assert_eq!(config.grid_to_world(cell), Vec3::new(7.0, -3.0, 0.0));
            assert_eq!(config.world_to_grid(config.grid_to_world(cell)), cell);
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let config = WorldConfig::default().with_world_bounds(10);
        assert!(config.contains(GridCoord::new(-10, 10)));
        assert!(!config.contains(GridCoord::new(11, 0)));
        assert!(!config.contains(GridCoord::new(0, -11)));
        assert!(!config.contains(GridCoord::new(i32::MIN, 0)));
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let config = WorldConfig::default();
        let cell = config.cell_bounds(GridCoord::new(0, 0));
        let above = config.cell_bounds(GridCoord::new(0, 1));
        assert!(!cell.intersects(&above));

        let player = WorldAabb::from_center(Vec3::new(0.2, 0.4, 0.0), Vec3::new(0.3, 0.9, 0.3));
        assert!(cell.intersects(&player));
        assert!(above.intersects(&player));
    }

    #[test]
    fn rect_normalises_corners() {
        let rect = GridRect::from_corners(GridCoord::new(3, -1), GridCoord::new(-2, 4));
        assert_eq!(rect.min(), GridCoord::new(-2, -1));
        assert_eq!(rect.max(), GridCoord::new(3, 4));
        assert!(rect.contains(GridCoord::new(3, 4)));
        assert!(!rect.contains(GridCoord::new(4, 0)));
    }

    #[test]
    fn degradation_check_interval_is_never_zero() {
        let config = WorldConfig {
            degradation_check_interval_ms: 0,
            ..WorldConfig::default()
        };
        assert_eq!(config.degradation_check_interval(), Duration::from_millis(1));
    }
}
