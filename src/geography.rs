use std::path::Path;

use anyhow::Result;
use geo::BoundingRect;
use geo_types::{coord, MultiLineString, MultiPolygon, Rect};

use crate::config::DataPaths;
use map_load::get_numeric_entry;

/// Attribute holding the land-use class.
pub const LAND_USE_FIELD: &str = "gridcode";

pub mod grid;
pub mod map_load;
pub mod projection;
pub mod trails;

pub use grid::{GridCell, OccupancyGrid};
pub use trails::{Trail, TrailNetwork, TrailSelection};

#[derive(Debug, Clone, Default)]
pub struct PolygonLayer {
    pub shapes: Vec<MultiPolygon<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct LineLayer {
    pub shapes: Vec<MultiLineString<f64>>,
}

/// Polygons sharing one land-use code.
#[derive(Debug, Clone, PartialEq)]
pub struct LandUseClass {
    pub code: f64,
    pub shapes: Vec<MultiPolygon<f64>>,
}

/// Land-use polygons grouped by class, codes ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandUseLayer {
    pub classes: Vec<LandUseClass>,
}

/// Decoration drawn under every static map.
#[derive(Debug, Clone, Default)]
pub struct Basemap {
    pub outline: PolygonLayer,
    pub land_use: LandUseLayer,
    pub lakes: PolygonLayer,
    pub rivers: LineLayer,
}

impl PolygonLayer {
    pub fn from_shapefile(path: &Path, layer: &str) -> Result<Self> {
        let mut shapes = Vec::new();
        for (shape, _) in map_load::read_shapes(path)? {
            if let Some(polygons) = map_load::collect_polygons(&shape, layer)? {
                shapes.push(polygons);
            }
        }
        Ok(PolygonLayer { shapes })
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        total_bounds(self.shapes.iter().filter_map(|s| s.bounding_rect()))
    }
}

impl LineLayer {
    pub fn from_shapefile(path: &Path, layer: &str) -> Result<Self> {
        let mut shapes = Vec::new();
        for (shape, _) in map_load::read_shapes(path)? {
            if let Some(lines) = map_load::collect_lines(&shape, layer)? {
                shapes.push(lines);
            }
        }
        Ok(LineLayer { shapes })
    }
}

impl LandUseLayer {
    pub fn new(mut shapes: Vec<(f64, MultiPolygon<f64>)>) -> Self {
        shapes.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut classes: Vec<LandUseClass> = Vec::new();
        for (code, shape) in shapes {
            match classes.last_mut() {
                Some(class) if class.code == code => class.shapes.push(shape),
                _ => classes.push(LandUseClass {
                    code,
                    shapes: vec![shape],
                }),
            }
        }
        LandUseLayer { classes }
    }

    /// Features without a class code are dropped.
    pub fn from_shapefile(path: &Path) -> Result<Self> {
        let mut shapes = Vec::new();
        for (shape, record) in map_load::read_shapes(path)? {
            let Some(code) = get_numeric_entry!(LAND_USE_FIELD, record) else {
                continue;
            };
            if let Some(polygons) = map_load::collect_polygons(&shape, "land use")? {
                shapes.push((code, polygons));
            }
        }
        Ok(LandUseLayer::new(shapes))
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Basemap {
    /// Loads the outline, plus lakes and rivers when their files exist.
    pub fn load(paths: &DataPaths) -> Result<Self> {
        let outline = PolygonLayer::from_shapefile(&paths.outline, "outline")?;

        let lakes = if paths.lakes.exists() {
            PolygonLayer::from_shapefile(&paths.lakes, "lakes")?
        } else {
            tracing::warn!("{} not found, drawing without lakes", paths.lakes.display());
            PolygonLayer::default()
        };
        let rivers = if paths.rivers.exists() {
            LineLayer::from_shapefile(&paths.rivers, "rivers")?
        } else {
            tracing::warn!("{} not found, drawing without rivers", paths.rivers.display());
            LineLayer::default()
        };

        tracing::info!(
            "basemap: {} outline, {} lake and {} river features",
            outline.shapes.len(),
            lakes.shapes.len(),
            rivers.shapes.len()
        );
        Ok(Basemap {
            outline,
            land_use: LandUseLayer::default(),
            lakes,
            rivers,
        })
    }

    /// Adds the land-use layer when its file exists.
    pub fn with_land_use(mut self, path: &Path) -> Result<Self> {
        if path.exists() {
            self.land_use = LandUseLayer::from_shapefile(path)?;
            tracing::info!("land use: {} classes", self.land_use.classes.len());
        } else {
            tracing::warn!("{} not found, drawing without land use", path.display());
        }
        Ok(self)
    }
}

/// Smallest rectangle holding every rectangle given.
pub fn total_bounds<I>(rects: I) -> Option<Rect<f64>>
where
    I: IntoIterator<Item = Rect<f64>>,
{
    rects.into_iter().reduce(|a, b| {
        Rect::new(
            coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
            coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
        )
    })
}

/// Whether the rectangle fits in longitude/latitude degrees.
pub fn is_geographic(bounds: &Rect<f64>) -> bool {
    bounds.min().x >= -180.0
        && bounds.max().x <= 180.0
        && bounds.min().y >= -90.0
        && bounds.max().y <= 90.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    #[test]
    fn total_bounds_merges_rects() {
        let bounds = total_bounds([
            Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }),
            Rect::new(coord! { x: -2.0, y: 0.5 }, coord! { x: 0.5, y: 3.0 }),
        ])
        .unwrap();

        assert_eq!(bounds.min(), coord! { x: -2.0, y: 0.0 });
        assert_eq!(bounds.max(), coord! { x: 1.0, y: 3.0 });
        assert!(total_bounds(Vec::new()).is_none());
    }

    #[test]
    fn land_use_groups_by_sorted_code() {
        let square = |x: f64| {
            MultiPolygon::new(vec![geo_types::polygon![
                (x: x, y: 0.0),
                (x: x + 1.0, y: 0.0),
                (x: x + 1.0, y: 1.0),
            ]])
        };

        let layer = LandUseLayer::new(vec![(3.0, square(0.0)), (1.0, square(1.0)), (3.0, square(2.0))]);

        let codes: Vec<f64> = layer.classes.iter().map(|c| c.code).collect();
        assert_eq!(codes, [1.0, 3.0]);
        assert_eq!(layer.classes[1].shapes, [square(0.0), square(2.0)]);
    }

    #[test]
    fn projected_bounds_are_not_geographic() {
        let nztm = Rect::new(
            coord! { x: 1_089_000.0, y: 4_747_000.0 },
            coord! { x: 2_089_000.0, y: 6_223_000.0 },
        );
        let lon_lat = Rect::new(coord! { x: 166.4, y: -47.3 }, coord! { x: 178.6, y: -34.4 });

        assert!(!is_geographic(&nztm));
        assert!(is_geographic(&lon_lat));
    }
}
