//! Periodic self-damage for degradable blocks while the player stands on them.

use std::{collections::BTreeMap, time::Duration};

use block_grid_core::{DegradationProfile, GridCoord};

/// Degradation damage due for a cell during a batch step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DegradationHit {
    /// Cell whose block should be damaged.
    pub cell: GridCoord,
    /// Health to remove per application.
    pub amount: u32,
    /// Number of applications that fell due during the batch.
    pub applications: u64,
}

/// Rate-limited scheduler that ages the block under the player.
///
/// Elapsed time is banked and released in fixed check intervals, so the cost
/// is independent of the frame rate. Presence is a single most-recent
/// position rather than a set.
#[derive(Clone, Debug)]
pub struct DegradationScheduler {
    check_interval: Duration,
    pending: Duration,
    timers: BTreeMap<GridCoord, u64>,
    presence: Option<GridCoord>,
}

impl DegradationScheduler {
    /// Creates a scheduler that evaluates once per `check_interval`.
    #[must_use]
    pub fn new(check_interval: Duration) -> Self {
        Self {
            check_interval,
            pending: Duration::ZERO,
            timers: BTreeMap::new(),
            presence: None,
        }
    }

    /// Fixed interval between batch steps.
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Replaces the tracked presence. `None` clears it without setting a new cell.
    pub fn set_presence(&mut self, cell: Option<GridCoord>) {
        self.presence = cell;
    }

    /// Cell the player currently stands on, if any.
    #[must_use]
    pub const fn presence(&self) -> Option<GridCoord> {
        self.presence
    }

    /// Time accumulated toward the cell's next application, if it has a timer.
    #[must_use]
    pub fn timer(&self, cell: GridCoord) -> Option<Duration> {
        let steps = *self.timers.get(&cell)?;
        let steps = u32::try_from(steps).unwrap_or(u32::MAX);
        Some(self.check_interval.saturating_mul(steps))
    }

    /// Drops the cell's timer and presence. Called whenever its block disappears.
    pub fn forget(&mut self, cell: GridCoord) {
        let _ = self.timers.remove(&cell);
        if self.presence == Some(cell) {
            self.presence = None;
        }
    }

    /// Banks `dt` and returns how many batch steps are now due.
    pub fn advance(&mut self, dt: Duration) -> u64 {
        self.pending = self.pending.saturating_add(dt);
        let interval = self.check_interval.as_nanos();
        if interval == 0 {
            return 0;
        }
        let pending = self.pending.as_nanos();
        self.pending = duration_from_nanos(pending % interval);
        u64::try_from(pending / interval).unwrap_or(u64::MAX)
    }

    /// Runs `steps` batch steps at once.
    ///
    /// `profile_of` resolves the degradation profile of the block occupying a
    /// cell, returning `None` for empty or non-degradable cells. Each step
    /// adds one check interval to the presence cell's timer; every time the
    /// timer reaches the effective interval it resets and one application
    /// falls due.
    pub fn step<F>(&mut self, steps: u64, profile_of: F) -> Option<DegradationHit>
    where
        F: FnOnce(GridCoord) -> Option<DegradationProfile>,
    {
        if steps == 0 {
            return None;
        }
        let cell = self.presence?;
        let profile = profile_of(cell)?;
        if !profile.degrades_under_player {
            return None;
        }

        let per_application =
            steps_per_application(profile.effective_interval(), self.check_interval);
        let timer = self.timers.entry(cell).or_insert(0);
        let banked = timer.saturating_add(steps);
        *timer = banked % per_application;
        let applications = banked / per_application;
        (applications > 0).then_some(DegradationHit {
            cell,
            amount: profile.amount,
            applications,
        })
    }
}

/// Whole check intervals needed before the timer reaches `effective`.
fn steps_per_application(effective: Duration, check_interval: Duration) -> u64 {
    let check = check_interval.as_nanos();
    if check == 0 {
        return 1;
    }
    let steps = effective.as_nanos().div_ceil(check).max(1);
    u64::try_from(steps).unwrap_or(u64::MAX)
}

fn duration_from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    // Remainder is below one second, so it fits.
    let subsec = (nanos % NANOS_PER_SEC) as u32;
    Duration::new(secs, subsec)
}
