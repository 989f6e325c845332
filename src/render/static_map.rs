use std::path::Path;

use anyhow::Result;
use geo::orient::{Direction, Orient};
use geo_types::{coord, LineString, MultiLineString, MultiPolygon, Rect};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::palette;
use crate::config::MapSettings;
use crate::geography::Basemap;

pub const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
pub const PALE_TURQUOISE: RGBColor = RGBColor(175, 238, 238);
pub const GRAY: RGBColor = RGBColor(128, 128, 128);
pub const CORAL: RGBColor = RGBColor(255, 127, 80);
pub const ROYAL_BLUE: RGBColor = RGBColor(65, 105, 225);

const TITLE_HEIGHT: u32 = 40;
const MARGIN: u32 = 10;
const FONT: &str = "sans-serif";

type MapChart<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Map extent and image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFrame {
    pub extent: Rect<f64>,
    pub width: u32,
    pub height: u32,
}

impl MapFrame {
    /// Pads `bounds` by `padding` map units and sizes the image to keep its
    /// aspect ratio.
    pub fn around(bounds: Rect<f64>, padding: f64, width: u32) -> Self {
        let extent = Rect::new(
            coord! { x: bounds.min().x - padding, y: bounds.min().y - padding },
            coord! { x: bounds.max().x + padding, y: bounds.max().y + padding },
        );
        let aspect = if extent.width() > 0.0 {
            extent.height() / extent.width()
        } else {
            1.0
        };
        // at least 200px tall, at most four widths; the cap wins on narrow maps
        let map_height = (width as f64 * aspect).round().max(200.0).min(4.0 * width as f64) as u32;
        MapFrame {
            extent,
            width,
            height: map_height + TITLE_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub fill: Option<RGBAColor>,
    pub stroke: Option<RGBAColor>,
    pub stroke_width: u32,
}

impl Style {
    pub fn filled(fill: RGBColor, stroke: RGBColor, stroke_width: u32) -> Self {
        Style {
            fill: Some(fill.to_rgba()),
            stroke: Some(stroke.to_rgba()),
            stroke_width,
        }
    }

    pub fn outline(stroke: RGBColor, stroke_width: u32) -> Self {
        Style {
            fill: None,
            stroke: Some(stroke.to_rgba()),
            stroke_width,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.fill = self.fill.map(|c| c.mix(alpha));
        self.stroke = self.stroke.map(|c| c.mix(alpha));
        self
    }
}

enum Feature<'a> {
    Area(&'a MultiPolygon<f64>, Style),
    Line(&'a MultiLineString<f64>, Style),
}

/// Two-column table drawn in the upper left corner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: (String, String),
    pub rows: Vec<(String, String)>,
}

/// A static map, drawn back to front in the order features were added.
pub struct StaticMap<'a> {
    title: String,
    frame: MapFrame,
    settings: MapSettings,
    features: Vec<Feature<'a>>,
    table: Option<Table>,
    legend: Vec<(String, RGBColor)>,
}

fn ring_points(ring: &LineString<f64>) -> Vec<(f64, f64)> {
    ring.0.iter().map(|c| (c.x, c.y)).collect()
}

/// One ring that walks the shell and then each hole, returning to the start
/// of the shell in between. With the shell counter-clockwise and the holes
/// clockwise the holes stay unfilled under the nonzero rule.
fn fill_points(polygon: &geo_types::Polygon<f64>) -> Vec<(f64, f64)> {
    let polygon = polygon.orient(Direction::Default);
    let mut points = ring_points(polygon.exterior());
    let Some(&start) = points.first() else {
        return points;
    };
    for hole in polygon.interiors() {
        if hole.0.is_empty() {
            continue;
        }
        points.extend(ring_points(hole));
        points.push(start);
    }
    points
}

impl<'a> StaticMap<'a> {
    pub fn new(title: &str, frame: MapFrame, settings: MapSettings) -> Self {
        StaticMap {
            title: title.to_owned(),
            frame,
            settings,
            features: Vec::new(),
            table: None,
            legend: Vec::new(),
        }
    }

    pub fn add_area(&mut self, shape: &'a MultiPolygon<f64>, style: Style) -> &mut Self {
        self.features.push(Feature::Area(shape, style));
        self
    }

    pub fn add_line(&mut self, shape: &'a MultiLineString<f64>, style: Style) -> &mut Self {
        self.features.push(Feature::Line(shape, style));
        self
    }

    /// Outline, land use when loaded, lakes and rivers.
    pub fn add_basemap(&mut self, basemap: &'a Basemap, land: RGBColor) -> &mut Self {
        for shape in &basemap.outline.shapes {
            self.add_area(shape, Style::filled(land, BLACK, 1));
        }
        for (index, class) in basemap.land_use.classes.iter().enumerate() {
            let color = palette::category(index);
            let style = Style {
                fill: Some(color.to_rgba()),
                stroke: None,
                stroke_width: 0,
            };
            for shape in &class.shapes {
                self.add_area(shape, style);
            }
            self.add_legend(&format!("Land use {}", class.code), color);
        }
        for shape in &basemap.lakes.shapes {
            self.add_area(
                shape,
                Style {
                    fill: Some(PALE_TURQUOISE.to_rgba()),
                    stroke: None,
                    stroke_width: 0,
                },
            );
        }
        for shape in &basemap.rivers.shapes {
            self.add_line(shape, Style::outline(PALE_TURQUOISE, 1));
        }
        self
    }

    pub fn set_table(&mut self, table: Table) -> &mut Self {
        self.table = Some(table);
        self
    }

    pub fn add_legend(&mut self, label: &str, color: RGBColor) -> &mut Self {
        self.legend.push((label.to_owned(), color));
        self
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let root = SVGBackend::new(path, (self.frame.width, self.frame.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let (title_area, map_area) = root.split_vertically(TITLE_HEIGHT);

        let title_style = TextStyle::from((FONT, 22).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        title_area.draw_text(
            &self.title,
            &title_style,
            ((self.frame.width / 2) as i32, (TITLE_HEIGHT / 2) as i32),
        )?;

        let extent = self.frame.extent;
        let mut chart = ChartBuilder::on(&map_area)
            .margin(MARGIN)
            .build_cartesian_2d(extent.min().x..extent.max().x, extent.min().y..extent.max().y)?;

        for feature in &self.features {
            match feature {
                Feature::Area(shape, style) => {
                    if let Some(fill) = style.fill {
                        chart.draw_series(
                            shape.0.iter().map(|p| Polygon::new(fill_points(p), fill.filled())),
                        )?;
                    }
                    if let Some(stroke) = style.stroke {
                        let stroke = stroke.stroke_width(style.stroke_width);
                        chart.draw_series(
                            shape
                                .0
                                .iter()
                                .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
                                .map(|ring| PathElement::new(ring_points(ring), stroke)),
                        )?;
                    }
                }
                Feature::Line(shape, style) => {
                    if let Some(stroke) = style.stroke {
                        let stroke = stroke.stroke_width(style.stroke_width);
                        chart.draw_series(
                            shape.0.iter().map(|line| PathElement::new(ring_points(line), stroke)),
                        )?;
                    }
                }
            }
        }

        self.draw_scale_bar(&mut chart)?;
        if let Some(table) = &self.table {
            draw_table(&map_area, table)?;
        }
        self.draw_legend(&map_area)?;

        root.present()?;
        tracing::info!("map written to {}", path.display());
        Ok(())
    }

    /// Black and white bar near the top right corner, labelled in km.
    fn draw_scale_bar(&self, chart: &mut MapChart<'_, '_>) -> Result<()> {
        let extent = self.frame.extent;
        let length = self.settings.scale_bar;
        let half = length / 2.0;
        let x = extent.min().x + extent.width() * 0.92;
        let y = extent.min().y + extent.height() * 0.95;

        let bars = [
            (x, x - length, BLACK, 9),
            (x, x - half, BLACK, 6),
            (x - half, x - length, WHITE, 6),
        ];
        chart
            .draw_series(bars.iter().map(|(from, to, color, width)| {
                PathElement::new(vec![(*from, y), (*to, y)], color.stroke_width(*width))
            }))?;

        let label_y = y - length * 0.21;
        let labels = [
            (format!("{} km", length / 1000.0), x),
            (format!("{} km", half / 1000.0), x - length * 0.5125),
            ("0 km".to_owned(), x - length * 1.0225),
        ];
        chart
            .draw_series(
                labels
                    .into_iter()
                    .map(|(text, label_x)| Text::new(text, (label_x, label_y), (FONT, 11).into_font())),
            )?;
        Ok(())
    }

    fn draw_legend(&self, area: &DrawingArea<SVGBackend<'_>, Shift>) -> Result<()> {
        let (width, height) = area.dim_in_pixel();
        let row_height = 22;
        let left = width as i32 - 240;
        let top = height as i32 - MARGIN as i32 - row_height * self.legend.len() as i32;
        let text_style = TextStyle::from((FONT, 13).into_font()).pos(Pos::new(HPos::Left, VPos::Center));

        for (row, (label, color)) in self.legend.iter().enumerate() {
            let y = top + row as i32 * row_height;
            area.draw(&Rectangle::new([(left, y), (left + 14, y + 14)], color.filled()))?;
            area.draw(&Rectangle::new([(left, y), (left + 14, y + 14)], BLACK.stroke_width(1)))?;
            area.draw_text(label, &text_style, (left + 22, y + 7))?;
        }
        Ok(())
    }
}

fn draw_table(area: &DrawingArea<SVGBackend<'_>, Shift>, table: &Table) -> Result<()> {
    let left = 2 * MARGIN as i32;
    let second = left + 90;
    let row_height = 18;
    let header = TextStyle::from((FONT, 13).into_font().style(FontStyle::Bold));
    let body = TextStyle::from((FONT, 12).into_font());

    let mut y = 2 * MARGIN as i32;
    area.draw_text(&table.headers.0, &header, (left, y))?;
    area.draw_text(&table.headers.1, &header, (second, y))?;
    for (first, other) in &table.rows {
        y += row_height;
        area.draw_text(first, &body, (left, y))?;
        area.draw_text(other, &body, (second, y))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    #[test]
    fn frame_pads_bounds_and_keeps_aspect() {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 90_000.0, y: 190_000.0 });

        let frame = MapFrame::around(bounds, 5000.0, 500);

        assert_eq!(frame.extent.min(), coord! { x: -5000.0, y: -5000.0 });
        assert_eq!(frame.extent.max(), coord! { x: 95_000.0, y: 195_000.0 });
        assert_eq!(frame.height, 1000 + TITLE_HEIGHT);
    }

    #[test]
    fn frame_height_is_clamped() {
        let flat = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 100.0, y: 0.0 });

        assert_eq!(MapFrame::around(flat, 0.0, 800).height, 200 + TITLE_HEIGHT);
    }

    #[test]
    fn narrow_frames_do_not_panic() {
        let square = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 100.0, y: 100.0 });

        let frame = MapFrame::around(square, 0.0, 40);

        assert_eq!(frame.height, 160 + TITLE_HEIGHT);
    }

    fn square_with_hole() -> geo_types::Polygon<f64> {
        polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 100.0, y: 0.0),
                (x: 100.0, y: 100.0),
                (x: 0.0, y: 100.0),
            ],
            interiors: [[
                (x: 40.0, y: 40.0),
                (x: 60.0, y: 40.0),
                (x: 60.0, y: 60.0),
                (x: 40.0, y: 60.0),
            ]],
        )
    }

    #[test]
    fn fill_ring_walks_holes_against_the_shell() {
        let points = fill_points(&square_with_hole());

        // closed shell, closed hole, back to the shell start
        assert_eq!(points.len(), 11);
        assert_eq!(points[0], points[4]);
        assert_eq!(points[10], points[0]);
        assert!(points[5..10].contains(&(40.0, 40.0)));

        let area = |ring: &[(f64, f64)]| {
            ring.windows(2)
                .map(|w| w[0].0 * w[1].1 - w[1].0 * w[0].1)
                .sum::<f64>()
                / 2.0
        };
        assert!(area(&points[..5]) > 0.0);
        assert!(area(&points[5..10]) < 0.0);
    }

    #[test]
    fn holes_are_left_unfilled_in_the_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hole.svg");
        let shape = MultiPolygon::new(vec![square_with_hole()]);
        let frame = MapFrame::around(
            Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 100.0, y: 100.0 }),
            0.0,
            400,
        );

        let mut map = StaticMap::new("Hole", frame, MapSettings::default());
        map.add_area(&shape, Style::filled(RED, BLACK, 1));
        map.save(&path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        let polygons: Vec<&str> = svg.split("<polygon").skip(1).collect();
        assert_eq!(polygons.len(), 1);
        let points = polygons[0].split("points=\"").nth(1).unwrap();
        let points = &points[..points.find('"').unwrap()];
        assert_eq!(points.matches(',').count(), 11);
    }
}
