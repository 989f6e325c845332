use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use plotters::style::{BLACK, RED, WHITE};

use crate::analysis::{cells_crossed_by, normalise, occupancy_table, rank_trails_for_species, round_to};
use crate::config::{Command, Settings};
use crate::error::Error;
use crate::geography::{Basemap, OccupancyGrid, TrailNetwork, TrailSelection};
use crate::prompt::Prompter;
use crate::render::palette::{BU_PU, ORANGES};
use crate::render::static_map::{CORAL, GRAY, LIGHT_GREEN, ROYAL_BLUE};
use crate::render::{web_map, MapFrame, StaticMap, Style, Table, WebCoords, WebMap};
use crate::species::SpeciesCatalogue;

pub fn run<R: BufRead, W: Write>(
    command: &Command,
    settings: &Settings,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    match command {
        Command::Outline => outline(settings, prompter),
        Command::Overview => overview(settings, prompter),
        Command::Species => {
            let catalogue = SpeciesCatalogue::from_path(&settings.data.species)?;
            write!(prompter.output(), "{}", catalogue.listing())?;
            Ok(())
        }
        Command::ByTrail { name, csv, no_csv } => {
            let export = match (*csv, *no_csv) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            by_trail(settings, name.as_deref(), export, prompter)
        }
        Command::ByBird { code } => by_bird(settings, code.as_deref(), prompter),
        Command::TrailMap => trail_map(settings, prompter),
        Command::Explore { code } => explore(settings, code.as_deref(), prompter),
    }
}

fn output_path(settings: &Settings, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(&settings.output.dir)?;
    Ok(settings.output_path(file_name))
}

fn frame_for(settings: &Settings, basemap: &Basemap, grid: Option<&OccupancyGrid>) -> Result<MapFrame> {
    let bounds = basemap
        .outline
        .bounds()
        .or_else(|| grid.and_then(|g| g.bounds()))
        .ok_or_else(|| anyhow!("nothing to draw: the outline and grid are empty"))?;
    Ok(MapFrame::around(bounds, settings.map.padding, settings.map.width))
}

fn species_column<R: BufRead, W: Write>(
    code: Option<&str>,
    catalogue: &SpeciesCatalogue,
    grid: &OccupancyGrid,
    prompter: &mut Prompter<R, W>,
) -> Result<usize> {
    match code {
        Some(code) => grid
            .species_index(code)
            .ok_or_else(|| Error::UnknownSpecies(code.to_owned()).into()),
        None => prompter.choose_species(catalogue, grid),
    }
}

fn trail_selection<'a, R: BufRead, W: Write>(
    name: Option<&str>,
    network: &'a TrailNetwork,
    prompter: &mut Prompter<R, W>,
) -> Result<TrailSelection<'a>> {
    match name {
        Some(name) => Ok(network.select(name)?),
        None => prompter.choose_trail(network),
    }
}

pub fn outline<R: BufRead, W: Write>(settings: &Settings, prompter: &mut Prompter<R, W>) -> Result<()> {
    let basemap = Basemap::load(&settings.data)?;
    let frame = frame_for(settings, &basemap, None)?;

    let mut map = StaticMap::new("Country outline", frame, settings.map);
    map.add_basemap(&basemap, WHITE);

    let path = output_path(settings, "outline.svg")?;
    map.save(&path)?;
    writeln!(prompter.output(), "\nMap saved as {}", path.display())?;
    Ok(())
}

pub fn overview<R: BufRead, W: Write>(settings: &Settings, prompter: &mut Prompter<R, W>) -> Result<()> {
    let basemap = Basemap::load(&settings.data)?.with_land_use(&settings.data.land_use)?;
    let catalogue = SpeciesCatalogue::from_path(&settings.data.species)?;
    let grid = OccupancyGrid::from_shapefile(&settings.data.grid, &catalogue)?;
    let network = TrailNetwork::from_shapefile(&settings.data.trails, &settings.trail_fields)?;
    let frame = frame_for(settings, &basemap, Some(&grid))?;

    let mut map = StaticMap::new("Species grid and trails", frame, settings.map);
    map.add_basemap(&basemap, WHITE);
    for cell in grid.cells() {
        map.add_area(&cell.geometry, Style::filled(CORAL, BLACK, 1).with_alpha(0.75));
    }
    for trail in network.trails() {
        map.add_line(&trail.geometry, Style::outline(ROYAL_BLUE, 1));
    }
    map.add_legend("Species grid", CORAL).add_legend("Walking trail", ROYAL_BLUE);

    let path = output_path(settings, "overview.svg")?;
    map.save(&path)?;
    writeln!(prompter.output(), "\nMap saved as {}", path.display())?;
    Ok(())
}

/// Species most present in the grid cells a trail crosses.
pub fn by_trail<R: BufRead, W: Write>(
    settings: &Settings,
    name: Option<&str>,
    export: Option<bool>,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let network = TrailNetwork::from_shapefile(&settings.data.trails, &settings.trail_fields)?;
    let selection = trail_selection(name, &network, prompter)?;
    let export = match export {
        Some(export) => export,
        None => prompter.confirm("Export a .csv with the bird occupancy data for this trail?")?,
    };

    let catalogue = SpeciesCatalogue::from_path(&settings.data.species)?;
    let grid = OccupancyGrid::from_shapefile(&settings.data.grid, &catalogue)?;
    let basemap = Basemap::load(&settings.data)?;

    let crossed = cells_crossed_by(&grid, &selection);
    tracing::info!("{} crosses {} grid cells", selection.name(), crossed.len());
    let out = prompter.output();
    writeln!(out, "Intersected grid sectors:\n{:?}", crossed)?;
    writeln!(out, "\n{}", crate::report::trail_details(selection.first()))?;

    let table = occupancy_table(&grid, &crossed, &catalogue);
    let top = table.top(settings.ranking.top_species);

    let mut map = StaticMap::new(
        &format!("{} bird occupancy", selection.name()),
        frame_for(settings, &basemap, Some(&grid))?,
        settings.map,
    );
    map.add_basemap(&basemap, LIGHT_GREEN);
    for cell in grid.cells() {
        map.add_area(&cell.geometry, Style::outline(GRAY, 1).with_alpha(0.75));
    }
    for cell in crossed.iter().filter_map(|index| grid.cells().get(*index)) {
        map.add_area(&cell.geometry, Style::outline(BLACK, 1));
    }
    for trail in selection.trails() {
        map.add_line(&trail.geometry, Style::outline(RED, 2));
    }
    map.set_table(Table {
        headers: ("Occupancy".to_owned(), "Species".to_owned()),
        rows: top
            .iter()
            .map(|(species, average)| {
                let average = average.map_or_else(|| "no data".to_owned(), |a| format!("{a}%"));
                (average, species.to_string())
            })
            .collect(),
    });
    map.add_legend("Grid square intersects walking trail", BLACK)
        .add_legend("Grid square does not intersect walking trail", GRAY);

    let path = output_path(settings, &format!("{} overview.svg", selection.name()))?;
    map.save(&path)?;
    let out = prompter.output();
    writeln!(out, "\nOverview map saved\n{}", path.display())?;

    if export {
        let path = output_path(settings, &format!("{} occupancy data.csv", selection.name()))?;
        crate::report::save_occupancy_csv(&table, &path)?;
        writeln!(out, "\nOccupancy data saved\n{}", path.display())?;
    } else {
        writeln!(out, "\nOccupancy data not requested.")?;
    }
    Ok(())
}

/// Trails crossing the best grid cells for a species.
pub fn by_bird<R: BufRead, W: Write>(
    settings: &Settings,
    code: Option<&str>,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let catalogue = SpeciesCatalogue::from_path(&settings.data.species)?;
    let grid = OccupancyGrid::from_shapefile(&settings.data.grid, &catalogue)?;
    let species = species_column(code, &catalogue, &grid, prompter)?;
    let code = &grid.species()[species];
    let common_name = catalogue.display_name(code);

    let network = TrailNetwork::from_shapefile(&settings.data.trails, &settings.trail_fields)?;
    let basemap = Basemap::load(&settings.data)?;

    let out = prompter.output();
    writeln!(out, "\nChecking high occupancy grids for trails\n")?;
    let ranking = rank_trails_for_species(&grid, &network, species, &settings.ranking);
    for check in &ranking.checks {
        let found = if check.trails.is_empty() { "no" } else { "yes" };
        writeln!(out, "Trail in grid {}: {}", check.rank + 1, found)?;
    }
    writeln!(
        out,
        "\nIdentified track IDs in order of presence in higher bird occupancy area\n{:?}",
        ranking.trails
    )?;

    let mut map = StaticMap::new(
        &format!("{common_name} occupancy with trails"),
        frame_for(settings, &basemap, Some(&grid))?,
        settings.map,
    );
    map.add_basemap(&basemap, WHITE);
    let shades = normalise(&grid.column(species));
    for (cell, shade) in grid.cells().iter().zip(shades) {
        let fill = BU_PU.sample_or_no_data(shade);
        map.add_area(&cell.geometry, Style::filled(fill, BLACK, 1).with_alpha(0.9));
    }
    let ranked: Vec<_> = ranking
        .trails
        .iter()
        .filter_map(|index| network.get(*index))
        .collect();
    for trail in &ranked {
        map.add_line(&trail.geometry, Style::outline(RED, 2));
    }
    map.set_table(Table {
        headers: ("Length".to_owned(), "Walk".to_owned()),
        rows: ranked
            .iter()
            .map(|trail| (format!("{}km", round_to(trail.length_km(), 1)), trail.name.clone()))
            .collect(),
    });
    map.add_legend("Highest occupancy", BU_PU.sample(1.0))
        .add_legend("Lowest occupancy", BU_PU.sample(0.0))
        .add_legend("Walking trail", RED);

    let path = output_path(settings, &format!("{common_name} species map.svg"))?;
    map.save(&path)?;
    writeln!(prompter.output(), "\nOverview map saved\n{}", path.display())?;
    Ok(())
}

pub fn trail_map<R: BufRead, W: Write>(settings: &Settings, prompter: &mut Prompter<R, W>) -> Result<()> {
    let network = TrailNetwork::from_shapefile(&settings.data.trails, &settings.trail_fields)?;
    let coords = WebCoords::choose(&settings.web.crs, network.bounds())?;
    let map = WebMap::new("Trails", &coords, vec![web_map::trail_layer(&network, &coords)?]);

    let path = output_path(settings, "Trail_maps.html")?;
    map.save(&path)?;
    writeln!(prompter.output(), "Map saved as {}", path.display())?;
    Ok(())
}

pub fn explore<R: BufRead, W: Write>(
    settings: &Settings,
    code: Option<&str>,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let catalogue = SpeciesCatalogue::from_path(&settings.data.species)?;
    let grid = OccupancyGrid::from_shapefile(&settings.data.grid, &catalogue)?;
    let species = species_column(code, &catalogue, &grid, prompter)?;
    let code = &grid.species()[species];
    let common_name = catalogue.display_name(code);

    let coords = WebCoords::choose(&settings.web.crs, grid.bounds())?;
    let map = WebMap::new(
        &format!("{common_name} occupancy"),
        &coords,
        vec![web_map::occupancy_layer(&grid, species, common_name, &ORANGES, &coords)?],
    );

    let path = output_path(settings, &format!("{code}_map.html"))?;
    map.save(&path)?;
    writeln!(prompter.output(), "Map saved as {}", path.display())?;
    Ok(())
}
