use std::path::Path;

use anyhow::{Context, Result};
use geo_types::{LineString, MultiLineString, MultiPolygon, Polygon};
use shapefile::{dbase, PolygonRing, Shape};

use crate::error::Error;

macro_rules! get_char_entry {
    ($attr:expr, $record:ident) => {
        if let Some(shapefile::dbase::FieldValue::Character(Some(entry))) = $record.get($attr) {
            entry.trim().to_owned()
        } else {
            String::new()
        }
    };
}

macro_rules! get_numeric_entry {
    ($attr:expr, $record:ident) => {
        match $record.get($attr) {
            Some(shapefile::dbase::FieldValue::Numeric(Some(entry))) => Some(*entry),
            Some(shapefile::dbase::FieldValue::Float(Some(entry))) => Some(*entry as f64),
            Some(shapefile::dbase::FieldValue::Double(entry)) => Some(*entry),
            Some(shapefile::dbase::FieldValue::Integer(entry)) => Some(*entry as f64),
            _ => None,
        }
    };
}

pub(crate) use get_char_entry;
pub(crate) use get_numeric_entry;

macro_rules! collect_polygon {
    ($polygon:ident) => {{
        let mut polygons: Vec<Polygon<f64>> = Vec::new();
        for ring in $polygon.rings() {
            match ring {
                PolygonRing::Outer(points) => {
                    let exterior: LineString<f64> =
                        points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>().into();
                    polygons.push(Polygon::new(exterior, vec![]));
                }
                PolygonRing::Inner(points) => {
                    let interior: LineString<f64> =
                        points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>().into();
                    // a hole before any shell is kept as a shell of its own
                    match polygons.last_mut() {
                        Some(polygon) => polygon.interiors_push(interior),
                        None => polygons.push(Polygon::new(interior, vec![])),
                    }
                }
            }
        }
        MultiPolygon::new(polygons)
    }};
}

macro_rules! collect_polyline {
    ($polyline:ident) => {
        MultiLineString::new(
            $polyline
                .parts()
                .iter()
                .map(|part| part.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>().into())
                .collect(),
        )
    };
}

pub fn read_shapes(path: &Path) -> Result<Vec<(Shape, dbase::Record)>> {
    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("opening shapefile {}", path.display()))?;
    let mut shapes = Vec::new();
    for shape_record in reader.iter_shapes_and_records() {
        let shape_record =
            shape_record.with_context(|| format!("reading {}", path.display()))?;
        shapes.push(shape_record);
    }
    tracing::debug!("read {} records from {}", shapes.len(), path.display());
    Ok(shapes)
}

/// Converts a polygon shape, `None` for a null shape.
pub fn collect_polygons(shape: &Shape, layer: &str) -> Result<Option<MultiPolygon<f64>>> {
    let polygons = match shape {
        Shape::Polygon(p) => collect_polygon!(p),
        Shape::PolygonM(p) => collect_polygon!(p),
        Shape::PolygonZ(p) => collect_polygon!(p),
        Shape::NullShape => return Ok(None),
        other => return Err(unexpected(layer, other).into()),
    };
    Ok(Some(polygons))
}

/// Converts a polyline shape, `None` for a null shape.
pub fn collect_lines(shape: &Shape, layer: &str) -> Result<Option<MultiLineString<f64>>> {
    let lines = match shape {
        Shape::Polyline(p) => collect_polyline!(p),
        Shape::PolylineM(p) => collect_polyline!(p),
        Shape::PolylineZ(p) => collect_polyline!(p),
        Shape::NullShape => return Ok(None),
        other => return Err(unexpected(layer, other).into()),
    };
    Ok(Some(lines))
}

fn unexpected(layer: &str, shape: &Shape) -> Error {
    Error::UnexpectedShape {
        layer: layer.to_owned(),
        shape: format!("{:?}", shape.shapetype()),
    }
}
