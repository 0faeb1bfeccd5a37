//! CSV export for simulation traces.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::{SimulationTrace, TimeGrid};

/// Column header for CSV trace export.
const HEADER: &str = "sample,time_h,flow_m3h,level_m,power_kw,energy_kwh,cost";

/// Exports a simulation trace to a CSV file at the given path.
///
/// Writes a header row followed by one data row per sample. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `trace` - Complete simulation trace
/// * `grid` - Grid the trace was produced on
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(trace: &SimulationTrace, grid: &TimeGrid, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(trace, grid, buf)
}

/// Writes a simulation trace as CSV to any writer.
///
/// Rows stop at the shorter of the trace and the grid.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(trace: &SimulationTrace, grid: &TimeGrid, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for s in (0..trace.len()).map_while(|k| trace.sample(grid, k)) {
        wtr.write_record(&[
            s.index.to_string(),
            format!("{:.6}", s.time_h),
            format!("{:.4}", s.flow_m3h),
            format!("{:.6}", s.level_m),
            format!("{:.4}", s.power_kw),
            format!("{:.6}", s.energy_kwh),
            format!("{:.6}", s.cost),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
