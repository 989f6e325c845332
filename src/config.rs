use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_derive::Deserialize;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[clap(value_enum, short, long, ignore_case=true, default_value_t=LogLevel::Error)]
    pub log_level: LogLevel,

    /// Dataset and output settings.
    #[clap(short, long, default_value = "birdtrails.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Draw the country outline.
    Outline,
    /// Draw the occupancy grid with the whole trail network.
    Overview,
    /// List species codes and common names.
    Species,
    /// Show which species are most present along a trail.
    ByTrail {
        /// Trail name, e.g. "Milford Track". Prompted for when omitted.
        name: Option<String>,
        /// Export the occupancy data of the crossed grid cells.
        #[clap(long, conflicts_with = "no_csv")]
        csv: bool,
        /// Skip the occupancy export without asking.
        #[clap(long)]
        no_csv: bool,
    },
    /// Find the trails crossing the best grid cells for a species.
    ByBird {
        /// Species code, e.g. "kiwbro". Prompted for when omitted.
        code: Option<String>,
    },
    /// Write an interactive map of the trail network.
    TrailMap,
    /// Write an interactive occupancy map for a species.
    Explore {
        /// Species code. Prompted for when omitted.
        code: Option<String>,
    },
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub data: DataPaths,
    pub trail_fields: TrailFields,
    pub ranking: RankingLimits,
    pub map: MapSettings,
    pub web: WebSettings,
    pub output: OutputSettings,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DataPaths {
    pub outline: PathBuf,
    /// Polygons classed by a `gridcode` attribute.
    pub land_use: PathBuf,
    pub lakes: PathBuf,
    pub rivers: PathBuf,
    pub grid: PathBuf,
    pub trails: PathBuf,
    pub species: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            outline: "data/NZ_outline.shp".into(),
            land_use: "data/lu/LandUse.shp".into(),
            lakes: "data/Lakes.shp".into(),
            rivers: "data/Rivers.shp".into(),
            grid: "data/SpeciesData.shp".into(),
            trails: "data/Trails.shp".into(),
            species: "data/SpeciesAttributes.csv".into(),
        }
    }
}

/// Attribute names of the trail shapefile.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TrailFields {
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub completion: String,
    pub url: String,
    pub length: String,
}

impl Default for TrailFields {
    fn default() -> Self {
        TrailFields {
            name: "name".to_owned(),
            description: "introduct".to_owned(),
            difficulty: "difficulty".to_owned(),
            completion: "completion".to_owned(),
            url: "staticLink".to_owned(),
            length: "SHAPE_Leng".to_owned(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct RankingLimits {
    /// Grid cells walked, best occupancy first.
    pub max_cells: usize,
    /// Distinct trails kept.
    pub max_trails: usize,
    /// Species listed in the trail overview table.
    pub top_species: usize,
}

impl Default for RankingLimits {
    fn default() -> Self {
        RankingLimits {
            max_cells: 50,
            max_trails: 15,
            top_species: 15,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct MapSettings {
    pub width: u32,
    /// Margin around the outline, in map units.
    pub padding: f64,
    /// Full scale bar length, in map units.
    pub scale_bar: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        MapSettings {
            width: 1200,
            padding: 5000.0,
            scale_bar: 200_000.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WebSettings {
    /// PROJ definition of projected datasets; empty when unknown.
    pub crs: String,
}

impl Default for WebSettings {
    fn default() -> Self {
        WebSettings {
            crs: crate::geography::projection::NZTM2000.to_owned(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings { dir: "user".into() }
    }
}

impl Settings {
    /// Reads settings from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("{} not found, using default settings", path.display());
            return Ok(Settings::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Settings::from_toml(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output.dir.join(file_name)
    }
}
