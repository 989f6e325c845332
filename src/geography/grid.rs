use std::cmp::Ordering;
use std::path::Path;

use anyhow::Result;
use geo::BoundingRect;
use geo_types::{MultiPolygon, Rect};
use shapefile::{dbase, Shape};

use super::map_load::{self, get_numeric_entry};
use super::total_bounds;
use crate::species::SpeciesCatalogue;

#[derive(Debug, Clone)]
pub struct GridCell {
    /// Position of the cell in the grid file.
    pub index: usize,
    pub geometry: MultiPolygon<f64>,
    pub bounds: Option<Rect<f64>>,
    /// Occupancy fraction per species column of the grid.
    pub occupancy: Vec<Option<f64>>,
}

impl GridCell {
    pub fn new(index: usize, geometry: MultiPolygon<f64>, occupancy: Vec<Option<f64>>) -> Self {
        let bounds = geometry.bounding_rect();
        GridCell {
            index,
            geometry,
            bounds,
            occupancy,
        }
    }

    pub fn value(&self, species: usize) -> Option<f64> {
        self.occupancy.get(species).copied().flatten()
    }
}

/// Polygon grid with one occupancy column per species.
#[derive(Debug, Clone, Default)]
pub struct OccupancyGrid {
    species: Vec<String>,
    cells: Vec<GridCell>,
}

impl OccupancyGrid {
    pub fn new(species: Vec<String>, cells: Vec<GridCell>) -> Self {
        OccupancyGrid { species, cells }
    }

    /// Reads the grid, keeping the catalogue codes that appear as attributes.
    pub fn from_shapefile(path: &Path, catalogue: &SpeciesCatalogue) -> Result<Self> {
        Self::from_records(map_load::read_shapes(path)?, catalogue)
    }

    /// Null shapes become cells without geometry so indices follow the file.
    pub fn from_records(
        records: Vec<(Shape, dbase::Record)>,
        catalogue: &SpeciesCatalogue,
    ) -> Result<Self> {
        let codes: Vec<&str> = catalogue.codes().collect();
        let mut cells = Vec::new();
        for (index, (shape, record)) in records.into_iter().enumerate() {
            let geometry = map_load::collect_polygons(&shape, "grid")?.unwrap_or_else(|| MultiPolygon::new(vec![]));
            let occupancy = codes
                .iter()
                .map(|code| get_numeric_entry!(*code, record))
                .collect();
            cells.push(GridCell::new(index, geometry, occupancy));
        }

        let present: Vec<bool> = (0..codes.len())
            .map(|column| cells.iter().any(|cell: &GridCell| cell.occupancy[column].is_some()))
            .collect();
        for cell in &mut cells {
            let mut column = 0;
            cell.occupancy.retain(|_| {
                let keep = present[column];
                column += 1;
                keep
            });
        }
        let species: Vec<String> = codes
            .iter()
            .zip(&present)
            .filter(|(_, present)| **present)
            .map(|(code, _)| code.to_string())
            .collect();

        tracing::info!(
            "grid: {} cells, {} of {} catalogue species present",
            cells.len(),
            species.len(),
            codes.len()
        );
        Ok(OccupancyGrid { species, cells })
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn species_index(&self, code: &str) -> Option<usize> {
        self.species.iter().position(|s| s == code)
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn column(&self, species: usize) -> Vec<Option<f64>> {
        self.cells.iter().map(|cell| cell.value(species)).collect()
    }

    /// Cells by descending occupancy of `species`, missing values last.
    /// Ties keep file order.
    pub fn cells_by_occupancy(&self, species: usize) -> Vec<&GridCell> {
        let mut sorted: Vec<&GridCell> = self.cells.iter().collect();
        sorted.sort_by(|a, b| descending(a.value(species), b.value(species)));
        sorted
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        total_bounds(self.cells.iter().filter_map(|cell| cell.bounds))
    }
}

pub(crate) fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
