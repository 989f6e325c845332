use std::path::Path;

use anyhow::Result;
use geo::{BoundingRect, EuclideanLength};
use geo_types::{MultiLineString, Rect};

use super::map_load::{self, get_char_entry, get_numeric_entry};
use super::total_bounds;
use crate::config::TrailFields;
use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Trail {
    /// Position of the trail in the trail file.
    pub index: usize,
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub completion: String,
    pub url: String,
    /// Length in metres.
    pub length: f64,
    pub geometry: MultiLineString<f64>,
    pub bounds: Option<Rect<f64>>,
}

impl Trail {
    pub fn new(index: usize, name: &str, geometry: MultiLineString<f64>) -> Self {
        let length = geometry.euclidean_length();
        let bounds = geometry.bounding_rect();
        Trail {
            index,
            name: name.to_owned(),
            description: String::new(),
            difficulty: String::new(),
            completion: String::new(),
            url: String::new(),
            length,
            geometry,
            bounds,
        }
    }

    pub fn length_km(&self) -> f64 {
        self.length / 1000.0
    }

    /// Length of the drawn geometry, in map units.
    pub fn geometry_length(&self) -> f64 {
        self.geometry.euclidean_length()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrailNetwork {
    trails: Vec<Trail>,
}

/// Every trail sharing a name; their union is what gets analysed.
/// Only built by [`TrailNetwork::select`], so never empty.
#[derive(Debug, Clone)]
pub struct TrailSelection<'a> {
    name: String,
    first: &'a Trail,
    trails: Vec<&'a Trail>,
}

impl TrailNetwork {
    pub fn new(trails: Vec<Trail>) -> Self {
        TrailNetwork { trails }
    }

    pub fn from_shapefile(path: &Path, fields: &TrailFields) -> Result<Self> {
        let mut trails = Vec::new();
        for (index, (shape, record)) in map_load::read_shapes(path)?.into_iter().enumerate() {
            let geometry = map_load::collect_lines(&shape, "trails")?
                .unwrap_or_else(|| MultiLineString::new(vec![]));
            let mut trail = Trail::new(index, &get_char_entry!(fields.name.as_str(), record), geometry);
            trail.description = get_char_entry!(fields.description.as_str(), record);
            trail.difficulty = get_char_entry!(fields.difficulty.as_str(), record);
            trail.completion = get_char_entry!(fields.completion.as_str(), record);
            trail.url = get_char_entry!(fields.url.as_str(), record);
            // the drawn length stands in when the attribute is missing
            if let Some(length) = get_numeric_entry!(fields.length.as_str(), record) {
                trail.length = length;
            }
            trails.push(trail);
        }
        tracing::info!("trails: {} loaded from {}", trails.len(), path.display());
        Ok(TrailNetwork { trails })
    }

    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    pub fn get(&self, index: usize) -> Option<&Trail> {
        self.trails.get(index)
    }

    pub fn len(&self) -> usize {
        self.trails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trails.is_empty()
    }

    pub fn select(&self, name: &str) -> Result<TrailSelection<'_>, Error> {
        let trails: Vec<&Trail> = self.trails.iter().filter(|t| t.name == name).collect();
        let first = *trails
            .first()
            .ok_or_else(|| Error::UnknownTrail(name.to_owned()))?;
        Ok(TrailSelection {
            name: name.to_owned(),
            first,
            trails,
        })
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        total_bounds(self.trails.iter().filter_map(|t| t.bounds))
    }
}

impl<'a> TrailSelection<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trails(&self) -> &[&'a Trail] {
        &self.trails
    }

    /// The record whose attributes describe the selection.
    pub fn first(&self) -> &'a Trail {
        self.first
    }
}
