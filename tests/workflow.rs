use std::convert::TryInto;
use std::fs;
use std::path::Path;

use birdtrails::commands;
use birdtrails::config::{Command, Settings};
use birdtrails::geography::Basemap;
use birdtrails::prompt::Prompter;
use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing, Polyline, Writer};
use tempfile::TempDir;

const ORIGIN_X: f64 = 1_200_000.0;
const ORIGIN_Y: f64 = 5_000_000.0;
const CELL: f64 = 10_000.0;

fn square(x: f64, y: f64, size: f64) -> Polygon {
    Polygon::new(PolygonRing::Outer(vec![
        Point::new(x, y),
        Point::new(x, y + size),
        Point::new(x + size, y + size),
        Point::new(x + size, y),
        Point::new(x, y),
    ]))
}

fn write_grid(path: &Path) {
    let table = TableWriterBuilder::new()
        .add_numeric_field("kea".try_into().unwrap(), 10, 4)
        .add_numeric_field("tui".try_into().unwrap(), 10, 4);
    let mut writer = Writer::from_path(path, table).unwrap();
    let occupancy = [(0.2, 0.9), (0.9, 0.1), (0.6, 0.5)];
    for (index, (kea, tui)) in occupancy.iter().enumerate() {
        let mut record = Record::default();
        record.insert("kea".to_owned(), FieldValue::Numeric(Some(*kea)));
        record.insert("tui".to_owned(), FieldValue::Numeric(Some(*tui)));
        let cell = square(ORIGIN_X + index as f64 * CELL, ORIGIN_Y, CELL);
        writer.write_shape_and_record(&cell, &record).unwrap();
    }
}

fn write_trails(path: &Path) {
    let table = TableWriterBuilder::new()
        .add_character_field("name".try_into().unwrap(), 50)
        .add_character_field("difficulty".try_into().unwrap(), 50)
        .add_numeric_field("SHAPE_Leng".try_into().unwrap(), 12, 2);
    let mut writer = Writer::from_path(path, table).unwrap();
    let mid_y = ORIGIN_Y + CELL / 2.0;
    let trails = [
        // inside cell 0
        ("Alpha Track", vec![(ORIGIN_X + 1000.0, mid_y), (ORIGIN_X + 4000.0, mid_y)], 3000.0),
        // from cell 1 into cell 2
        ("Beta Track", vec![(ORIGIN_X + 15_000.0, mid_y), (ORIGIN_X + 25_000.0, mid_y)], 10_000.0),
    ];
    for (name, points, length) in trails {
        let mut record = Record::default();
        record.insert("name".to_owned(), FieldValue::Character(Some(name.to_owned())));
        record.insert("difficulty".to_owned(), FieldValue::Character(Some("Easy".to_owned())));
        record.insert("SHAPE_Leng".to_owned(), FieldValue::Numeric(Some(length)));
        let line = Polyline::new(points.into_iter().map(|(x, y)| Point::new(x, y)).collect());
        writer.write_shape_and_record(&line, &record).unwrap();
    }
}

fn write_outline(path: &Path) {
    let table = TableWriterBuilder::new().add_character_field("name".try_into().unwrap(), 20);
    let mut writer = Writer::from_path(path, table).unwrap();
    let mut record = Record::default();
    record.insert("name".to_owned(), FieldValue::Character(Some("land".to_owned())));
    let land = square(ORIGIN_X - CELL, ORIGIN_Y - CELL, 5.0 * CELL);
    writer.write_shape_and_record(&land, &record).unwrap();
}

fn write_land_use(path: &Path) {
    let table = TableWriterBuilder::new().add_numeric_field("gridcode".try_into().unwrap(), 4, 0);
    let mut writer = Writer::from_path(path, table).unwrap();
    for (index, code) in [3.0, 1.0].iter().enumerate() {
        let mut record = Record::default();
        record.insert("gridcode".to_owned(), FieldValue::Numeric(Some(*code)));
        let patch = square(ORIGIN_X + index as f64 * 2.0 * CELL, ORIGIN_Y - CELL / 2.0, CELL);
        writer.write_shape_and_record(&patch, &record).unwrap();
    }
}

/// Writes the datasets into a temporary directory that is removed on drop.
fn fixture() -> (TempDir, Settings) {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();

    write_grid(&dir.join("SpeciesData.shp"));
    write_trails(&dir.join("Trails.shp"));
    write_outline(&dir.join("NZ_outline.shp"));
    write_land_use(&dir.join("LandUse.shp"));
    fs::write(
        dir.join("SpeciesAttributes.csv"),
        "Code,Common_name\nkea,Kea\ntui,Tui\nkiwbro,North Island brown kiwi\n",
    )
    .unwrap();

    let mut settings = Settings::default();
    settings.data.grid = dir.join("SpeciesData.shp");
    settings.data.trails = dir.join("Trails.shp");
    settings.data.outline = dir.join("NZ_outline.shp");
    settings.data.lakes = dir.join("Lakes.shp");
    settings.data.rivers = dir.join("Rivers.shp");
    settings.data.species = dir.join("SpeciesAttributes.csv");
    settings.output.dir = dir.join("user");
    settings.data.land_use = dir.join("LandUse.shp");
    settings.map.width = 400;
    (tmp, settings)
}

fn printed<R>(prompter: &mut Prompter<R, Vec<u8>>) -> String
where
    R: std::io::BufRead,
{
    String::from_utf8(prompter.output().clone()).unwrap()
}

#[test]
fn by_trail_writes_map_and_occupancy_csv() {
    let (tmp, settings) = fixture();
    let dir = tmp.path();
    let mut prompter = Prompter::new("Beta\nBeta Track\ny\n".as_bytes(), Vec::new());

    commands::by_trail(&settings, None, None, &mut prompter).unwrap();

    let output = printed(&mut prompter);
    assert!(output.contains("Intersected grid sectors:\n[1, 2]"));
    assert!(output.contains("Length: 10 km"));

    let map = fs::read_to_string(dir.join("user/Beta Track overview.svg")).unwrap();
    assert!(map.contains("Beta Track bird occupancy"));
    assert!(map.contains("Occupancy"));

    let csv = fs::read_to_string(dir.join("user/Beta Track occupancy data.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "cell,Kea,Tui");
    assert_eq!(lines.len(), 4);
    assert!(lines[3].starts_with("Avg,75,30"));
}

#[test]
fn by_bird_ranks_trails_from_the_best_cells() {
    let (tmp, settings) = fixture();
    let dir = tmp.path();
    let mut prompter = Prompter::new("".as_bytes(), Vec::new());

    commands::by_bird(&settings, Some("kea"), &mut prompter).unwrap();

    let output = printed(&mut prompter);
    // kea is best in cell 1 (Beta), then cell 2 (Beta), then cell 0 (Alpha)
    assert!(output.contains("Trail in grid 1: yes"));
    assert!(output.contains("area\n[1, 0]"));
    let map = fs::read_to_string(dir.join("user/Kea species map.svg")).unwrap();
    assert!(map.contains("Kea occupancy with trails"));
    assert!(map.contains("Alpha Track"));
}

#[test]
fn unknown_species_code_is_rejected() {
    let (tmp, settings) = fixture();
    let dir = tmp.path();
    let mut prompter = Prompter::new("".as_bytes(), Vec::new());

    let err = commands::by_bird(&settings, Some("kiwbro"), &mut prompter).unwrap_err();

    assert!(err.to_string().contains("kiwbro"));
    assert!(!dir.join("user").exists());
}

#[test]
fn web_maps_are_written() {
    let (tmp, settings) = fixture();
    let dir = tmp.path();
    let mut prompter = Prompter::new("list\ntui\n".as_bytes(), Vec::new());

    commands::trail_map(&settings, &mut prompter).unwrap();
    commands::explore(&settings, None, &mut prompter).unwrap();

    let trails = fs::read_to_string(dir.join("user/Trail_maps.html")).unwrap();
    assert!(trails.contains("Alpha Track"));
    assert!(trails.contains("const geographic = true;"));
    assert!(!trails.contains("1201000"));
    let tui = fs::read_to_string(dir.join("user/tui_map.html")).unwrap();
    assert!(tui.contains("<title>Tui occupancy</title>"));

    let output = printed(&mut prompter);
    assert!(output.contains("kiwbro   North Island brown kiwi"));
}

#[test]
fn outline_and_overview_maps_are_written() {
    let (tmp, settings) = fixture();
    let dir = tmp.path();
    let mut prompter = Prompter::new("".as_bytes(), Vec::new());

    commands::outline(&settings, &mut prompter).unwrap();
    commands::overview(&settings, &mut prompter).unwrap();

    assert!(dir.join("user/outline.svg").exists());
    let overview = fs::read_to_string(dir.join("user/overview.svg")).unwrap();
    assert!(overview.contains("Walking trail"));
    assert!(overview.contains("Land use 1"));
    assert!(overview.contains("Land use 3"));
}

#[test]
fn web_maps_without_a_crs_stay_flat() {
    let (tmp, mut settings) = fixture();
    settings.web.crs = String::new();
    let mut prompter = Prompter::new("".as_bytes(), Vec::new());

    commands::trail_map(&settings, &mut prompter).unwrap();

    let trails = fs::read_to_string(tmp.path().join("user/Trail_maps.html")).unwrap();
    assert!(trails.contains("const geographic = false;"));
    assert!(trails.contains("1201000"));
}

#[test]
fn csv_flags_skip_the_export_question() {
    let (tmp, settings) = fixture();
    let dir = tmp.path();
    let csv = dir.join("user/Beta Track occupancy data.csv");

    let mut prompter = Prompter::new("".as_bytes(), Vec::new());
    let skip = Command::ByTrail {
        name: Some("Beta Track".to_owned()),
        csv: false,
        no_csv: true,
    };
    commands::run(&skip, &settings, &mut prompter).unwrap();

    assert!(printed(&mut prompter).contains("Occupancy data not requested."));
    assert!(!csv.exists());

    let mut prompter = Prompter::new("".as_bytes(), Vec::new());
    let export = Command::ByTrail {
        name: Some("Beta Track".to_owned()),
        csv: true,
        no_csv: false,
    };
    commands::run(&export, &settings, &mut prompter).unwrap();

    assert!(!printed(&mut prompter).contains("(y/n)"));
    assert!(fs::read_to_string(&csv).unwrap().starts_with("cell,Kea,Tui"));
}

#[test]
fn missing_water_layers_leave_them_empty() {
    let (_tmp, settings) = fixture();

    let basemap = Basemap::load(&settings.data).unwrap();

    assert_eq!(basemap.outline.shapes.len(), 1);
    assert!(basemap.lakes.shapes.is_empty());
    assert!(basemap.rivers.shapes.is_empty());
    assert!(basemap.land_use.is_empty());
}
