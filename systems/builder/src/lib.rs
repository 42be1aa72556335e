#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system translating per-frame player input into world requests.

use block_grid_core::{BlockTypeId, Command, Event, GridCoord, Layer};

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Indicates whether the player confirmed a placement on this frame.
    pub place_action: bool,
    /// Indicates whether the player requested removal on this frame.
    pub remove_action: bool,
    /// Indicates whether the break button is held down on this frame.
    pub break_held: bool,
    /// Cell currently targeted by the cursor, if any.
    pub cursor_cell: Option<GridCoord>,
    /// Cell the player stands on, if any.
    pub player_cell: Option<GridCoord>,
}

/// System that turns input edges into placement, removal and breaking commands.
///
/// Holding the break button emits a single start request for the targeted
/// cell; moving the cursor while holding stops the old cell and starts the
/// new one, and releasing stops it. A hold that outlives its breaking
/// process, or that waits over a cell until a block appears there, requests
/// breaking again.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    held: Option<GridCoord>,
    breaking: bool,
    retry: bool,
    player_cell: Option<GridCoord>,
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            held: None,
            breaking: false,
            retry: false,
            player_cell: None,
        }
    }

    /// Consumes world events and adapter-derived input to emit commands.
    ///
    /// `events` holds everything the world published since the previous
    /// call; `selected` is the item currently held by the player.
    pub fn handle(
        &mut self,
        events: &[Event],
        input: BuilderInput,
        selected: Option<&BlockTypeId>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            self.observe(event);
        }

        if input.player_cell != self.player_cell {
            self.player_cell = input.player_cell;
            out.push(Command::UpdatePlayerPresence {
                cell: input.player_cell,
            });
        }

        if input.place_action {
            if let (Some(cell), Some(block_type)) = (input.cursor_cell, selected) {
                out.push(Command::RequestPlace {
                    cell,
                    block_type: block_type.clone(),
                });
            }
        }

        if input.remove_action {
            if let Some(cell) = input.cursor_cell {
                out.push(Command::RequestRemove { cell });
            }
        }

        let target = if input.break_held {
            input.cursor_cell
        } else {
            None
        };
        if target == self.held {
            if let (true, Some(cell)) = (self.retry, target) {
                out.push(Command::RequestBreakingStart { cell });
            }
            self.retry = false;
            return;
        }
        if let (true, Some(previous)) = (self.breaking, self.held) {
            out.push(Command::RequestBreakingStop { cell: previous });
        }
        if let Some(cell) = target {
            out.push(Command::RequestBreakingStart { cell });
        }
        self.held = target;
        self.breaking = false;
        self.retry = false;
    }

    fn observe(&mut self, event: &Event) {
        let Some(held) = self.held else {
            return;
        };
        match event {
            Event::BreakingStarted { cell, .. } if *cell == held => self.breaking = true,
            Event::BreakingCompleted { cell, .. } | Event::BreakingCancelled { cell }
                if *cell == held =>
            {
                self.breaking = false;
                self.retry = true;
            }
            Event::BlockPlaced {
                cell,
                layer: Layer::Block,
                ..
            } if *cell == held && !self.breaking => self.retry = true,
            _ => {}
        }
    }
}
