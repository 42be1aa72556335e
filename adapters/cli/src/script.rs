use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use block_grid_core::{BlockTypeId, Command, GridCoord};

/// Single action replayed against the world.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Step {
    /// Command submitted to the world unchanged.
    Command(Command),
    /// Moves the player's body to the given cell, or out of the grid.
    Player(Option<GridCoord>),
    /// Holds the break button over the given cell, or releases it.
    Hold(Option<GridCoord>),
}

/// Parsed script line together with its 1-based source line number.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScriptLine {
    /// Line number in the script source.
    pub(crate) number: usize,
    /// Action described by the line.
    pub(crate) step: Step,
}

/// Parses a replay script.
///
/// Each non-empty line holds one action; `#` starts a comment. Recognised
/// actions:
///
/// ```text
/// place X Y TYPE      remove X Y        damage X Y AMOUNT
/// break X Y           stop X Y          presence X Y | presence none
/// player X Y | none   hold X Y          release
/// tick SECONDS [COUNT]
/// ```
pub(crate) fn parse(source: &str) -> Result<Vec<ScriptLine>> {
    let mut lines = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let steps = parse_line(content)
            .with_context(|| format!("script line {number}: `{content}`"))?;
        lines.extend(steps.into_iter().map(|step| ScriptLine { number, step }));
    }
    Ok(lines)
}

fn parse_line(content: &str) -> Result<Vec<Step>> {
    let mut tokens = content.split_whitespace();
    let verb = tokens.next().ok_or_else(|| anyhow!("missing action"))?;
    let args: Vec<&str> = tokens.collect();

    let step = match (verb, args.as_slice()) {
        ("place", [x, y, block_type]) => Step::Command(Command::RequestPlace {
            cell: coord(x, y)?,
            block_type: BlockTypeId::new(*block_type),
        }),
        ("remove", [x, y]) => Step::Command(Command::RequestRemove { cell: coord(x, y)? }),
        ("break", [x, y]) => Step::Command(Command::RequestBreakingStart { cell: coord(x, y)? }),
        ("stop", [x, y]) => Step::Command(Command::RequestBreakingStop { cell: coord(x, y)? }),
        ("damage", [x, y, amount]) => Step::Command(Command::DamageBlock {
            cell: coord(x, y)?,
            amount: amount
                .parse()
                .with_context(|| format!("invalid damage amount `{amount}`"))?,
        }),
        ("presence", args) => Step::Command(Command::UpdatePlayerPresence {
            cell: optional_coord(args)?,
        }),
        ("player", args) => Step::Player(optional_coord(args)?),
        ("hold", [x, y]) => Step::Hold(Some(coord(x, y)?)),
        ("release", []) => Step::Hold(None),
        ("tick", [seconds]) => return Ok(vec![tick(seconds)?]),
        ("tick", [seconds, count]) => {
            let count: usize = count
                .parse()
                .with_context(|| format!("invalid tick count `{count}`"))?;
            let step = tick(seconds)?;
            return Ok(vec![step; count]);
        }
        (verb, _) => bail!("unrecognised action `{verb}` or wrong number of arguments"),
    };
    Ok(vec![step])
}

fn coord(x: &str, y: &str) -> Result<GridCoord> {
    let x = x.parse().with_context(|| format!("invalid x coordinate `{x}`"))?;
    let y = y.parse().with_context(|| format!("invalid y coordinate `{y}`"))?;
    Ok(GridCoord::new(x, y))
}

fn optional_coord(args: &[&str]) -> Result<Option<GridCoord>> {
    match args {
        ["none"] => Ok(None),
        [x, y] => coord(x, y).map(Some),
        _ => bail!("expected `X Y` or `none`"),
    }
}

fn tick(seconds: &str) -> Result<Step> {
    let secs: f64 = seconds
        .parse()
        .with_context(|| format!("invalid tick length `{seconds}`"))?;
    let dt = Duration::try_from_secs_f64(secs)
        .with_context(|| format!("tick length `{seconds}` is not a valid duration"))?;
    Ok(Step::Command(Command::Tick { dt }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_action() {
        let script = parse(
            "place 0 -1 grass\n\
             remove 3 4\n\
             break 1 1\n\
             stop 1 1\n\
             damage 2 0 15\n\
             presence 0 -1\n\
             presence none\n\
             player 5 5\n\
             player none\n\
             hold 1 1\n\
             release\n\
             tick 0.25\n",
        )
        .expect("script parses");

        let steps: Vec<Step> = script.into_iter().map(|line| line.step).collect();
        assert_eq!(
            steps,
            vec![
                Step::Command(Command::RequestPlace {
                    cell: GridCoord::new(0, -1),
                    block_type: BlockTypeId::new("grass"),
                }),
                Step::Command(Command::RequestRemove {
                    cell: GridCoord::new(3, 4),
                }),
                Step::Command(Command::RequestBreakingStart {
                    cell: GridCoord::new(1, 1),
                }),
                Step::Command(Command::RequestBreakingStop {
                    cell: GridCoord::new(1, 1),
                }),
                Step::Command(Command::DamageBlock {
                    cell: GridCoord::new(2, 0),
                    amount: 15,
                }),
                Step::Command(Command::UpdatePlayerPresence {
                    cell: Some(GridCoord::new(0, -1)),
                }),
                Step::Command(Command::UpdatePlayerPresence { cell: None }),
                Step::Player(Some(GridCoord::new(5, 5))),
                Step::Player(None),
                Step::Hold(Some(GridCoord::new(1, 1))),
                Step::Hold(None),
                Step::Command(Command::Tick {
                    dt: Duration::from_millis(250),
                }),
            ]
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let script = parse("# setup\n\n  place 1 2 stone  # trailing\n").expect("script parses");

        assert_eq!(script.len(), 1);
        assert_eq!(script[0].number, 3, "line numbers follow the source");
    }

    #[test]
    fn repeated_ticks_expand() {
        let script = parse("tick 0.1 3").expect("script parses");

        assert_eq!(script.len(), 3);
        assert!(script.iter().all(|line| line.number == 1));
    }

    #[test]
    fn errors_name_the_offending_line() {
        let error = parse("place 0 0 grass\nplace zero 0 grass").expect_err("bad coordinate");

        assert!(
            format!("{error:#}").contains("script line 2"),
            "unexpected message: {error:#}",
        );
    }

    #[test]
    fn unknown_actions_and_negative_ticks_are_rejected() {
        assert!(parse("jump 1 1").is_err());
        assert!(parse("remove 1").is_err());
        assert!(parse("tick -1").is_err());
    }
}
