use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::analysis::{round_to, OccupancyTable};
use crate::geography::Trail;

/// The details block printed for a selected trail.
pub fn trail_details(trail: &Trail) -> String {
    format!(
        "Trail details----------------------\n\
         Name: {}\n\
         Description: {}\n\
         Difficulty: {}\n\
         Time: {}\n\
         Length: {} km\n\
         More information: {}\n",
        trail.name,
        trail.description,
        trail.difficulty,
        trail.completion,
        round_to(trail.length_km(), 2),
        trail.url,
    )
}

fn cell_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes one row per crossed cell and a closing `Avg` row.
pub fn write_occupancy_csv<W: Write>(table: &OccupancyTable, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    let mut header = vec!["cell".to_owned()];
    header.extend(table.names.iter().cloned());
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![row.cell.to_string()];
        record.extend(row.percent.iter().map(|v| cell_value(*v)));
        wtr.write_record(&record)?;
    }

    let mut averages = vec!["Avg".to_owned()];
    averages.extend(table.averages.iter().map(|v| cell_value(*v)));
    wtr.write_record(&averages)?;

    wtr.flush()?;
    Ok(())
}

pub fn save_occupancy_csv(table: &OccupancyTable, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_occupancy_csv(table, file)?;
    tracing::info!("occupancy data written to {}", path.display());
    Ok(())
}
