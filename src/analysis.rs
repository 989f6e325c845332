//! Trail and grid intersection, ranking and occupancy statistics.
//!
//! The geometric test itself is `geo::Intersects`; bounding rectangles only
//! skip pairs that cannot touch.

use geo::Intersects;
use geo_types::{MultiLineString, Rect};
use itertools::Itertools;

use crate::config::RankingLimits;
use crate::geography::grid::descending;
use crate::geography::{GridCell, OccupancyGrid, Trail, TrailNetwork, TrailSelection};
use crate::species::SpeciesCatalogue;

fn may_touch(a: Option<Rect<f64>>, b: Option<Rect<f64>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.intersects(&b),
        _ => false,
    }
}

fn cell_meets_lines(cell: &GridCell, lines: &MultiLineString<f64>) -> bool {
    cell.geometry
        .0
        .iter()
        .any(|polygon| lines.0.iter().any(|line| polygon.intersects(line)))
}

pub fn cell_meets_trail(cell: &GridCell, trail: &Trail) -> bool {
    may_touch(cell.bounds, trail.bounds) && cell_meets_lines(cell, &trail.geometry)
}

/// Indices of the grid cells crossed by any trail of the selection.
pub fn cells_crossed_by(grid: &OccupancyGrid, selection: &TrailSelection) -> Vec<usize> {
    grid.cells()
        .iter()
        .filter(|cell| {
            selection
                .trails()
                .iter()
                .any(|trail| cell_meets_trail(cell, trail))
        })
        .map(|cell| cell.index)
        .collect()
}

/// Trails crossing one walked cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellCheck {
    /// Position in the walk, 0 for the best cell.
    pub rank: usize,
    pub cell: usize,
    pub trails: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrailRanking {
    pub checks: Vec<CellCheck>,
    /// Distinct trail indices, in order of first appearance.
    pub trails: Vec<usize>,
}

/// Walks the grid from the best cell for `species` down, collecting the
/// trails that cross each cell until `max_trails` distinct trails are known
/// or `max_cells` cells have been checked.
pub fn rank_trails_for_species(
    grid: &OccupancyGrid,
    network: &TrailNetwork,
    species: usize,
    limits: &RankingLimits,
) -> TrailRanking {
    let mut ranking = TrailRanking::default();
    for (rank, cell) in grid
        .cells_by_occupancy(species)
        .into_iter()
        .take(limits.max_cells)
        .enumerate()
    {
        let trails: Vec<usize> = network
            .trails()
            .iter()
            .filter(|trail| cell_meets_trail(cell, trail))
            .map(|trail| trail.index)
            .collect();
        tracing::debug!(
            "Trail in grid {}: {}",
            rank + 1,
            if trails.is_empty() { "no" } else { "yes" }
        );
        ranking.checks.push(CellCheck {
            rank,
            cell: cell.index,
            trails,
        });

        ranking.trails = ranking
            .checks
            .iter()
            .flat_map(|check| check.trails.iter().copied())
            .unique()
            .take(limits.max_trails)
            .collect();
        if ranking.trails.len() >= limits.max_trails {
            break;
        }
    }
    ranking
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Occupancy of the crossed cells as percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyRow {
    pub cell: usize,
    pub percent: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyTable {
    /// Species codes, one per column.
    pub species: Vec<String>,
    /// Common names, one per column.
    pub names: Vec<String>,
    pub rows: Vec<OccupancyRow>,
    /// Column means, rounded to two decimals.
    pub averages: Vec<Option<f64>>,
}

pub fn occupancy_table(
    grid: &OccupancyGrid,
    cells: &[usize],
    catalogue: &SpeciesCatalogue,
) -> OccupancyTable {
    let species = grid.species().to_vec();
    let names = species
        .iter()
        .map(|code| catalogue.display_name(code).to_owned())
        .collect();

    let rows: Vec<OccupancyRow> = cells
        .iter()
        .filter_map(|index| grid.cells().get(*index))
        .map(|cell| OccupancyRow {
            cell: cell.index,
            percent: (0..species.len())
                .map(|column| cell.value(column).map(|v| v * 100.0))
                .collect(),
        })
        .collect();

    let averages = (0..species.len())
        .map(|column| {
            let values: Vec<f64> = rows.iter().filter_map(|row| row.percent[column]).collect();
            if values.is_empty() {
                None
            } else {
                Some(round_to(values.iter().sum::<f64>() / values.len() as f64, 2))
            }
        })
        .collect();

    OccupancyTable {
        species,
        names,
        rows,
        averages,
    }
}

impl OccupancyTable {
    /// The `n` species with the highest average, as (common name, percent).
    /// Species without any value sort last.
    pub fn top(&self, n: usize) -> Vec<(&str, Option<f64>)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.averages.iter().copied())
            .sorted_by(|a, b| descending(a.1, b.1))
            .take(n)
            .collect()
    }
}

/// Scales values to [0, 1] between their minimum and maximum.
/// A constant column maps to 0.
pub fn normalise(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present = values.iter().flatten().copied();
    let (min, max) = match present.minmax() {
        itertools::MinMaxResult::NoElements => return vec![None; values.len()],
        itertools::MinMaxResult::OneElement(v) => (v, v),
        itertools::MinMaxResult::MinMax(min, max) => (min, max),
    };
    let range = max - min;
    values
        .iter()
        .map(|value| {
            value.map(|v| if range > 0.0 { (v - min) / range } else { 0.0 })
        })
        .collect()
}
