//! Static maps are drawn with plotters into SVG; interactive maps are HTML
//! pages that hand the GeoJSON to Leaflet.

pub mod palette;
pub mod static_map;
pub mod web_map;

pub use static_map::{MapFrame, StaticMap, Style, Table};
pub use web_map::{WebCoords, WebLayer, WebMap};
