//! Hold-to-break progress tracking, one timed process per targeted cell.

use std::{collections::BTreeMap, time::Duration};

use block_grid_core::{DamageStage, GridCoord};

/// Progress of a single breaking process.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreakingProgress {
    total_time: Duration,
    time_remaining: Duration,
    damage_fraction: f32,
    stage: DamageStage,
    active: bool,
}

impl BreakingProgress {
    fn started(total_time: Duration) -> Self {
        Self {
            total_time,
            time_remaining: total_time,
            damage_fraction: 0.0,
            stage: DamageStage::NONE,
            active: true,
        }
    }

    /// Time of continuous breaking required in total.
    #[must_use]
    pub const fn total_time(&self) -> Duration {
        self.total_time
    }

    /// Time of breaking still required.
    #[must_use]
    pub const fn time_remaining(&self) -> Duration {
        self.time_remaining
    }

    /// Progress in the range `0.0..=1.0`.
    #[must_use]
    pub const fn damage_fraction(&self) -> f32 {
        self.damage_fraction
    }

    /// Discrete stage derived from the progress.
    #[must_use]
    pub const fn stage(&self) -> DamageStage {
        self.stage
    }

    /// `false` once the process has completed.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }
}

/// Outcome of advancing a breaking process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickResult {
    /// Progress advanced without reaching a new stage.
    StillBreaking,
    /// Progress crossed into a new stage.
    StageChanged(DamageStage),
    /// The full break time elapsed. The caller removes the block and discards the entry.
    Completed,
}

/// Table of breaking processes keyed by cell.
///
/// Completion does not remove the entry; the owner discards it after
/// removing the block.
#[derive(Clone, Debug, Default)]
pub struct BreakingTable {
    entries: BTreeMap<GridCoord, BreakingProgress>,
}

impl BreakingTable {
    /// Creates a table with no running processes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts breaking the cell, resetting any process already running there.
    pub fn start(&mut self, cell: GridCoord, total_time: Duration) {
        let _ = self
            .entries
            .insert(cell, BreakingProgress::started(total_time));
    }

    /// Advances the cell's process by `delta`. Returns `None` when the cell is idle.
    pub fn tick(&mut self, cell: GridCoord, delta: Duration) -> Option<TickResult> {
        let progress = self.entries.get_mut(&cell)?;
        if !progress.active {
            return Some(TickResult::Completed);
        }

        progress.time_remaining = progress.time_remaining.saturating_sub(delta);
        progress.damage_fraction = if progress.total_time.is_zero() {
            1.0
        } else {
            let ratio = progress.time_remaining.as_secs_f32() / progress.total_time.as_secs_f32();
            (1.0 - ratio).clamp(0.0, 1.0)
        };

        if progress.time_remaining.is_zero() {
            progress.active = false;
            progress.damage_fraction = 1.0;
            progress.stage = DamageStage::MAX;
            return Some(TickResult::Completed);
        }

        let stage = DamageStage::from_fraction(progress.damage_fraction);
        if stage == progress.stage {
            return Some(TickResult::StillBreaking);
        }
        progress.stage = stage;
        Some(TickResult::StageChanged(stage))
    }

    /// Discards the cell's process without completing it. Returns `false` when idle.
    pub fn cancel(&mut self, cell: GridCoord) -> bool {
        self.entries.remove(&cell).is_some()
    }

    /// Removes the cell's entry, typically after completion.
    pub fn discard(&mut self, cell: GridCoord) -> Option<BreakingProgress> {
        self.entries.remove(&cell)
    }

    /// Progress of the cell's process, if one exists.
    #[must_use]
    pub fn progress(&self, cell: GridCoord) -> Option<&BreakingProgress> {
        self.entries.get(&cell)
    }

    /// Reports whether the cell has a running process.
    #[must_use]
    pub fn is_breaking(&self, cell: GridCoord) -> bool {
        self.entries.get(&cell).is_some_and(|progress| progress.active)
    }

    /// Cells with an entry, in ascending coordinate order.
    #[must_use]
    pub fn cells(&self) -> Vec<GridCoord> {
        self.entries.keys().copied().collect()
    }
}
