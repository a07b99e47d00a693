use std::fs;

use serde::Serialize;
use tradepie_core::{render_svg, ChartDimensions, PieLayout};

use crate::cli::ChartArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
struct ChartResponseData {
    output: String,
    width: u32,
    height: u32,
    slices: usize,
    total: f64,
}

pub fn run(args: &ChartArgs, context: &Context) -> Result<CommandResult, CliError> {
    let dimensions = ChartDimensions::new(args.width, args.height)?;
    let snapshot = context.cached_snapshot()?;
    let layout = PieLayout::from_snapshot(&snapshot, dimensions);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.output, render_svg(&layout))?;
    tracing::info!(path = %args.output.display(), slices = layout.slices.len(), "chart written");

    let empty = layout.is_empty();
    let data = serde_json::to_value(ChartResponseData {
        output: args.output.display().to_string(),
        width: dimensions.width(),
        height: dimensions.height(),
        slices: layout.slices.len(),
        total: layout.total,
    })?;

    let mut result = CommandResult::ok(data);
    if empty {
        result = result.with_warning("snapshot has no priced records; chart is empty");
    }
    Ok(result)
}
