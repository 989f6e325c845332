use std::path::Path;

use anyhow::{Context, Result};
use geo::MapCoords;
use geo_types::Rect;
use geojson::{Feature, FeatureCollection, JsonObject};
use serde_derive::Serialize;
use serde_json::json;

use super::palette::{hex, Palette};
use crate::analysis::{normalise, round_to};
use crate::geography::projection::ToLonLat;
use crate::geography::{is_geographic, OccupancyGrid, TrailNetwork};

/// Trails shorter than this, in map units, are left off the web map.
const MIN_TRAIL_LENGTH: f64 = 0.001;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8"/>
<title>__TITLE__</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"/>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map { height: 100%; margin: 0; } th { text-align: left; padding-right: 8px; }</style>
</head>
<body>
<div id="map"></div>
<script>
const layers = __LAYERS__;
const geographic = __GEOGRAPHIC__;

function esc(value) {
    const div = document.createElement('div');
    div.textContent = value === undefined || value === null ? '' : String(value);
    return div.innerHTML;
}

function copyToClipboard(text) {
    navigator.clipboard.writeText(text).then(() => alert('Copied to clipboard: ' + text));
}

const map = geographic
    ? L.map('map').setView([-40, 174], 5)
    : L.map('map', { crs: L.CRS.Simple, minZoom: -20 });
if (geographic) {
    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
        attribution: '&copy; OpenStreetMap contributors'
    }).addTo(map);
}

const bounds = L.latLngBounds([]);
for (const layer of layers) {
    const geo = L.geoJSON(layer.data, {
        style: f => Object.assign({}, layer.style,
            layer.fillProperty ? { fillColor: f.properties[layer.fillProperty] } : {}),
        onEachFeature: (f, l) => {
            const rows = layer.tooltip
                .map(([field, alias]) => '<tr><th>' + esc(alias) + '</th><td>' + esc(f.properties[field]) + '</td></tr>')
                .join('');
            l.bindTooltip('<table>' + rows + '</table>', { sticky: false });
            if (layer.copyField) {
                l.on('click', () => copyToClipboard(f.properties[layer.copyField]));
            }
        }
    }).addTo(map);
    if (geo.getBounds().isValid()) {
        bounds.extend(geo.getBounds());
    }
}
if (bounds.isValid()) {
    map.fitBounds(bounds);
}
</script>
</body>
</html>
"#;

/// How layer coordinates reach Leaflet.
pub enum WebCoords {
    /// Already longitude/latitude.
    LonLat,
    /// Projected, converted to longitude/latitude on the way out.
    Reprojected(ToLonLat),
    /// Unknown CRS, shown on a flat plane without tiles.
    Plane,
}

impl WebCoords {
    /// Data whose bounds fit in degrees is taken as longitude/latitude;
    /// anything else is reprojected from `crs`, or left flat when `crs` is empty.
    pub fn choose(crs: &str, bounds: Option<Rect<f64>>) -> Result<Self> {
        if bounds.map_or(false, |b| is_geographic(&b)) {
            return Ok(WebCoords::LonLat);
        }
        if crs.trim().is_empty() {
            tracing::warn!("no CRS configured, web map drawn without tiles");
            return Ok(WebCoords::Plane);
        }
        Ok(WebCoords::Reprojected(ToLonLat::from_proj_string(crs)?))
    }

    pub fn is_geographic(&self) -> bool {
        !matches!(self, WebCoords::Plane)
    }

    fn geojson<G>(&self, geometry: &G) -> Result<geojson::Value>
    where
        G: MapCoords<f64, f64, Output = G>,
        for<'g> geojson::Value: From<&'g G>,
    {
        Ok(match self {
            WebCoords::Reprojected(projection) => geojson::Value::from(&projection.geometry(geometry)?),
            WebCoords::LonLat | WebCoords::Plane => geojson::Value::from(geometry),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebLayer {
    pub data: FeatureCollection,
    /// Leaflet path options.
    pub style: serde_json::Value,
    /// (property, label) pairs shown on hover.
    pub tooltip: Vec<(String, String)>,
    /// Property holding a per-feature fill colour.
    pub fill_property: Option<String>,
    /// Property copied to the clipboard on click.
    pub copy_field: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WebMap {
    pub title: String,
    pub geographic: bool,
    pub layers: Vec<WebLayer>,
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn feature(geometry: geojson::Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geometry)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn tooltip(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(field, alias)| (field.to_string(), alias.to_string()))
        .collect()
}

/// Red trail lines with their details on hover; a click copies the name.
pub fn trail_layer(network: &TrailNetwork, coords: &WebCoords) -> Result<WebLayer> {
    let features = network
        .trails()
        .iter()
        .filter(|trail| trail.geometry_length() > MIN_TRAIL_LENGTH)
        .map(|trail| {
            let mut properties = JsonObject::new();
            properties.insert("name".to_owned(), json!(trail.name));
            properties.insert("difficulty".to_owned(), json!(trail.difficulty));
            properties.insert("completion".to_owned(), json!(trail.completion));
            properties.insert(
                "length".to_owned(),
                json!(format!("{} km", round_to(trail.length_km(), 2))),
            );
            Ok(feature(coords.geojson(&trail.geometry)?, properties))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(WebLayer {
        data: collection(features),
        style: json!({ "weight": 3, "color": "red" }),
        tooltip: tooltip(&[
            ("name", "Trail name"),
            ("difficulty", "Difficulty"),
            ("completion", "Completion time"),
            ("length", "Trail length"),
        ]),
        fill_property: None,
        copy_field: Some("name".to_owned()),
    })
}

/// Grid cells shaded by occupancy of one species.
pub fn occupancy_layer(
    grid: &OccupancyGrid,
    species: usize,
    label: &str,
    palette: &Palette,
    coords: &WebCoords,
) -> Result<WebLayer> {
    let shades = normalise(&grid.column(species));
    let features = grid
        .cells()
        .iter()
        .zip(shades)
        .map(|(cell, shade)| {
            let mut properties = JsonObject::new();
            properties.insert("cell".to_owned(), json!(cell.index));
            properties.insert(
                "occupancy".to_owned(),
                json!(cell.value(species).map(|v| round_to(v, 4))),
            );
            properties.insert("fill".to_owned(), json!(hex(palette.sample_or_no_data(shade))));
            Ok(feature(coords.geojson(&cell.geometry)?, properties))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(WebLayer {
        data: collection(features),
        style: json!({ "weight": 0.5, "color": "#444444", "fillOpacity": 0.7 }),
        tooltip: vec![
            ("cell".to_owned(), "Grid cell".to_owned()),
            ("occupancy".to_owned(), label.to_owned()),
        ],
        fill_property: Some("fill".to_owned()),
        copy_field: None,
    })
}

impl WebMap {
    /// Uses web tiles unless the layers sit on a flat plane.
    pub fn new(title: &str, coords: &WebCoords, layers: Vec<WebLayer>) -> Self {
        WebMap {
            title: title.to_owned(),
            geographic: coords.is_geographic(),
            layers,
        }
    }

    pub fn to_html(&self) -> Result<String> {
        // keep "</script>" inside the data from closing the script element
        let layers = serde_json::to_string(&self.layers)?.replace("</", "<\\/");
        let title = self
            .title
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        Ok(TEMPLATE
            .replace("__TITLE__", &title)
            .replace("__GEOGRAPHIC__", if self.geographic { "true" } else { "false" })
            .replace("__LAYERS__", &layers))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_html()?)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("web map written to {}", path.display());
        Ok(())
    }
}
