use anyhow::{Context, Result};
use geo::MapCoords;
use geo_types::{coord, Coord};
use proj4rs::proj::Proj;

/// New Zealand Transverse Mercator 2000, the CRS of the bundled datasets.
pub const NZTM2000: &str = "+proj=tmerc +lat_0=0 +lon_0=173 +k=0.9996 +x_0=1600000 \
     +y_0=10000000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs";

const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Converts projected coordinates to WGS84 longitude/latitude in degrees.
pub struct ToLonLat {
    source: Proj,
    target: Proj,
}

impl ToLonLat {
    pub fn from_proj_string(definition: &str) -> Result<Self> {
        let source = Proj::from_proj_string(definition)
            .with_context(|| format!("unsupported projection {definition:?}"))?;
        let target = Proj::from_proj_string(WGS84)?;
        Ok(ToLonLat { source, target })
    }

    pub fn coord(&self, c: Coord<f64>) -> Result<Coord<f64>> {
        let mut point = (c.x, c.y, 0.0);
        proj4rs::transform::transform(&self.source, &self.target, &mut point)
            .with_context(|| format!("projecting ({}, {})", c.x, c.y))?;
        // geographic output comes back in radians
        Ok(coord! { x: point.0.to_degrees(), y: point.1.to_degrees() })
    }

    pub fn geometry<G>(&self, geometry: &G) -> Result<G::Output>
    where
        G: MapCoords<f64, f64>,
    {
        geometry.try_map_coords(|c| self.coord(c))
    }
}
