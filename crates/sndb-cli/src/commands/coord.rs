use serde::Serialize;
use sndb_core::{Axis, parse_coordinate};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CoordArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ParsedCoordinate<'a> {
    text: &'a str,
    axis: Axis,
    degrees: f64,
}

/// Handle `sndb coord`.
pub fn handle(args: &CoordArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let axis = Axis::from(args.axis);
    let degrees = parse_coordinate(&args.text, axis)?;
    output(
        &ParsedCoordinate {
            text: &args.text,
            axis,
            degrees,
        },
        flags.format,
    )
}
