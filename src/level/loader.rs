//! GeoGebra archive ingestion
//!
//! A level source is a `.ggb` file: a zip archive containing one
//! `geogebra.xml` geometry description. Labeled point elements carry the
//! coordinates; `Circle`, `Segment` and `Polygon` construction commands
//! reference them by label and become holes, walls and the map bounds.
//!
//! The source uses a mathematical Y axis (up is positive). All coordinates
//! are flipped once, here at the ingestion boundary, into the simulation's
//! screen-space convention where Y grows downward.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use glam::Vec2;
use roxmltree::{Document, Node};

use super::{Hole, Level, LevelFormatError};
use crate::consts::{DEFAULT_GOAL_RADIUS, DEFAULT_PLAYER_RADIUS, WALL_THICKNESS};
use crate::sim::Rect;

/// Archive entry holding the geometry description
const GEOMETRY_ENTRY: &str = "geogebra.xml";

/// Loaded levels keyed by source path
///
/// Loading is idempotent per key: the first load constructs the `Level`,
/// later loads get the shared instance. The map lock is held for the whole
/// construction, so a duplicate concurrent load waits for the in-flight one
/// instead of racing it. Failed loads cache nothing.
#[derive(Default)]
pub struct LevelCache {
    levels: Mutex<HashMap<PathBuf, Arc<Level>>>,
}

impl LevelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or fetch the cached) level at `path`
    pub fn load(&self, path: &Path) -> Result<Arc<Level>, LevelFormatError> {
        let mut levels = self
            .levels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(level) = levels.get(path) {
            return Ok(Arc::clone(level));
        }

        let bytes = std::fs::read(path)?;
        let level = Arc::new(parse_level(path.to_string_lossy().into_owned(), &bytes)?);
        log::info!(
            "loaded level {}: {} walls, {} holes, {}x{} map",
            level.id,
            level.walls.len(),
            level.holes.len(),
            level.map_width,
            level.map_height
        );
        levels.insert(path.to_path_buf(), Arc::clone(&level));
        Ok(level)
    }
}

/// Convert a source-space coordinate pair into screen space (Y down)
#[inline]
fn screen_space(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, -y)
}

/// Parse raw `.ggb` archive bytes into a validated `Level`
pub fn parse_level(id: String, bytes: &[u8]) -> Result<Level, LevelFormatError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    match archive.by_name(GEOMETRY_ENTRY) {
        Ok(mut entry) => {
            entry
                .read_to_string(&mut xml)
                .map_err(LevelFormatError::Io)?;
        }
        Err(zip::result::ZipError::FileNotFound) => return Err(LevelFormatError::MissingGeometry),
        Err(err) => return Err(err.into()),
    }

    let doc = Document::parse(&xml)?;
    let points = collect_points(&doc)?;

    let mut holes = Vec::new();
    let mut walls = Vec::new();
    let mut bounds = None;

    for command in doc.descendants().filter(|n| n.has_tag_name("command")) {
        match command.attribute("name") {
            Some("Circle") => holes.push(hole_from_command(command, &points)?),
            Some("Segment") => walls.push(wall_from_command(command, &points)?),
            Some("Polygon") if bounds.is_none() => {
                bounds = Some(bounds_from_command(command, &points)?);
            }
            _ => {}
        }
    }

    let (bounds_min, bounds_max) = bounds.ok_or(LevelFormatError::MissingBounds)?;
    let map_width = bounds_max.x - bounds_min.x;
    let map_height = bounds_max.y - bounds_min.y;

    // Enclose the playfield with four boundary walls of the fixed thickness.
    walls.push(Rect::new(bounds_min, map_width, WALL_THICKNESS));
    walls.push(Rect::new(
        Vec2::new(bounds_min.x, bounds_max.y),
        map_width,
        WALL_THICKNESS,
    ));
    walls.push(Rect::new(bounds_min, WALL_THICKNESS, map_height));
    walls.push(Rect::new(
        Vec2::new(bounds_max.x, bounds_min.y),
        WALL_THICKNESS,
        map_height,
    ));

    let start_position = *points
        .get("START")
        .ok_or(LevelFormatError::MissingNamedPoint("START"))?;
    let goal_position = *points
        .get("GOAL")
        .ok_or(LevelFormatError::MissingNamedPoint("GOAL"))?;

    Ok(Level {
        id,
        holes,
        walls,
        map_width,
        map_height,
        start_position,
        goal_position,
        goal_radius: DEFAULT_GOAL_RADIUS,
        player_radius: DEFAULT_PLAYER_RADIUS,
    })
}

/// Gather all labeled point elements, Y-flipped into screen space
fn collect_points<'doc>(
    doc: &'doc Document,
) -> Result<HashMap<&'doc str, Vec2>, LevelFormatError> {
    let mut points = HashMap::new();
    for element in doc.descendants().filter(|n| n.has_tag_name("element")) {
        if element.attribute("type") != Some("point") {
            continue;
        }
        let Some(label) = element.attribute("label") else {
            continue;
        };
        let Some(coords) = element.children().find(|c| c.has_tag_name("coords")) else {
            return Err(LevelFormatError::InvalidCoordinates(label.to_owned()));
        };
        let x = parse_coord(coords, "x", label)?;
        let y = parse_coord(coords, "y", label)?;
        points.insert(label, screen_space(x, y));
    }
    Ok(points)
}

fn parse_coord(coords: Node, axis: &str, label: &str) -> Result<f32, LevelFormatError> {
    coords
        .attribute(axis)
        .and_then(|value| value.parse::<f32>().ok())
        .ok_or_else(|| LevelFormatError::InvalidCoordinates(label.to_owned()))
}

/// Labels in a command's `<input a0=".." a1=".." ..>` element, in order
fn command_inputs<'doc>(command: Node<'doc, 'doc>) -> Vec<&'doc str> {
    command
        .children()
        .find(|n| n.has_tag_name("input"))
        .map(|input| {
            (0..)
                .map_while(|i| input.attribute(format!("a{i}").as_str()))
                .collect()
        })
        .unwrap_or_default()
}

fn resolve<'doc>(
    points: &HashMap<&'doc str, Vec2>,
    label: &str,
) -> Result<Vec2, LevelFormatError> {
    points
        .get(label)
        .copied()
        .ok_or_else(|| LevelFormatError::UnknownPoint(label.to_owned()))
}

/// `Circle(center, pointOnRadius)` -> hole
fn hole_from_command(
    command: Node,
    points: &HashMap<&str, Vec2>,
) -> Result<Hole, LevelFormatError> {
    let inputs = command_inputs(command);
    let [center_label, radius_label] = inputs[..] else {
        return Err(LevelFormatError::MalformedConstruction("Circle"));
    };
    let position = resolve(points, center_label)?;
    let on_radius = resolve(points, radius_label)?;
    Ok(Hole {
        position,
        radius: (on_radius - position).length(),
    })
}

/// `Segment(p0, p1)` -> axis-aligned wall rectangle
///
/// Endpoints are ordered canonically (lower x, then lower y, first); the
/// degenerate axis of the 1-D segment gets the fixed wall thickness so the
/// result is always a physics-resolvable rectangle.
fn wall_from_command(
    command: Node,
    points: &HashMap<&str, Vec2>,
) -> Result<Rect, LevelFormatError> {
    let inputs = command_inputs(command);
    let [label0, label1] = inputs[..] else {
        return Err(LevelFormatError::MalformedConstruction("Segment"));
    };
    let p0 = resolve(points, label0)?;
    let p1 = resolve(points, label1)?;

    if p0 == p1 {
        return Err(LevelFormatError::ZeroLengthSegment(
            label0.to_owned(),
            label1.to_owned(),
        ));
    }
    if p0.x != p1.x && p0.y != p1.y {
        return Err(LevelFormatError::SlantedSegment(
            label0.to_owned(),
            label1.to_owned(),
        ));
    }

    let p0_first = p0.x < p1.x || p0.y < p1.y;
    let start = if p0_first { p0 } else { p1 };
    let end = if p0_first { p1 } else { p0 };

    let width = end.x - start.x;
    let height = end.y - start.y;
    if width < 0.0 || height < 0.0 {
        return Err(LevelFormatError::NegativeExtent(
            label0.to_owned(),
            label1.to_owned(),
        ));
    }

    Ok(Rect::new(
        start,
        if width == 0.0 { WALL_THICKNESS } else { width },
        if height == 0.0 { WALL_THICKNESS } else { height },
    ))
}

/// `Polygon(p0, p1, p2, p3)` -> map bounding rectangle (min, max corners)
fn bounds_from_command(
    command: Node,
    points: &HashMap<&str, Vec2>,
) -> Result<(Vec2, Vec2), LevelFormatError> {
    let inputs = command_inputs(command);
    if inputs.len() < 4 {
        return Err(LevelFormatError::MalformedConstruction("Polygon"));
    }

    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for label in &inputs[..4] {
        let p = resolve(points, label)?;
        min = min.min(p);
        max = max.max(p);
    }
    Ok((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn point(label: &str, x: f32, y: f32) -> String {
        format!(
            r#"<element type="point" label="{label}"><coords x="{x}" y="{y}" z="1"/></element>"#
        )
    }

    fn command(name: &str, inputs: &[&str]) -> String {
        let attrs: String = inputs
            .iter()
            .enumerate()
            .map(|(i, label)| format!(r#" a{i}="{label}""#))
            .collect();
        format!(r#"<command name="{name}"><input{attrs}/></command>"#)
    }

    fn geometry_xml(body: &str) -> String {
        format!(r#"<?xml version="1.0"?><geogebra><construction>{body}</construction></geogebra>"#)
    }

    fn archive(entry_name: &str, xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(entry_name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// A minimal valid level: 100x60 bounds, one wall, one hole
    fn base_body() -> String {
        [
            point("P0", 0.0, 0.0),
            point("P1", 100.0, 0.0),
            point("P2", 100.0, -60.0),
            point("P3", 0.0, -60.0),
            point("A", 10.0, -10.0),
            point("B", 40.0, -10.0),
            point("C", 60.0, -30.0),
            point("D", 64.0, -30.0),
            point("START", 5.0, -5.0),
            point("GOAL", 90.0, -50.0),
            command("Polygon", &["P0", "P1", "P2", "P3"]),
            command("Segment", &["A", "B"]),
            command("Circle", &["C", "D"]),
        ]
        .join("")
    }

    #[test]
    fn test_screen_space_flips_y() {
        assert_eq!(screen_space(3.0, 4.0), Vec2::new(3.0, -4.0));
        assert_eq!(screen_space(0.0, -2.5), Vec2::new(0.0, 2.5));
    }

    #[test]
    fn test_parses_complete_level() {
        let bytes = archive(GEOMETRY_ENTRY, &geometry_xml(&base_body()));
        let level = parse_level("test".into(), &bytes).unwrap();

        assert_eq!(level.map_width, 100.0);
        assert_eq!(level.map_height, 60.0);
        // One segment wall plus four synthesized boundary walls.
        assert_eq!(level.walls.len(), 5);
        assert_eq!(level.holes.len(), 1);
        assert_eq!(level.holes[0].position, Vec2::new(60.0, 30.0));
        assert!((level.holes[0].radius - 4.0).abs() < 1e-5);
        // Y axis is flipped on ingestion.
        assert_eq!(level.start_position, Vec2::new(5.0, 5.0));
        assert_eq!(level.goal_position, Vec2::new(90.0, 50.0));
        assert_eq!(level.player_radius, DEFAULT_PLAYER_RADIUS);
        assert_eq!(level.goal_radius, DEFAULT_GOAL_RADIUS);
    }

    #[test]
    fn test_horizontal_segment_becomes_thin_rect() {
        let bytes = archive(GEOMETRY_ENTRY, &geometry_xml(&base_body()));
        let level = parse_level("test".into(), &bytes).unwrap();
        let wall = &level.walls[0];
        // A (10, 10) to B (40, 10) in screen space, degenerate Y thickened.
        assert_eq!(wall.min_x, 10.0);
        assert_eq!(wall.min_y, 10.0);
        assert_eq!(wall.width, 30.0);
        assert_eq!(wall.height, WALL_THICKNESS);
    }

    #[test]
    fn test_polygon_corner_order_is_irrelevant() {
        let labels = ["P0", "P1", "P2", "P3"];
        let reference = {
            let bytes = archive(GEOMETRY_ENTRY, &geometry_xml(&base_body()));
            let level = parse_level("ref".into(), &bytes).unwrap();
            (level.map_width, level.map_height, level.walls[1..].to_vec())
        };

        // All 24 orderings of the four corner points derive identical
        // bounds and boundary walls.
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    for l in 0..4 {
                        let perm = [i, j, k, l];
                        let mut seen = [false; 4];
                        for &idx in &perm {
                            seen[idx] = true;
                        }
                        if seen != [true; 4] {
                            continue;
                        }
                        let permuted: Vec<&str> = perm.iter().map(|&idx| labels[idx]).collect();
                        let body = base_body().replace(
                            &command("Polygon", &labels),
                            &command("Polygon", &permuted),
                        );
                        let bytes = archive(GEOMETRY_ENTRY, &geometry_xml(&body));
                        let level = parse_level("perm".into(), &bytes).unwrap();
                        assert_eq!(level.map_width, reference.0);
                        assert_eq!(level.map_height, reference.1);
                        assert_eq!(level.walls[1..], reference.2[..]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_rejects_zero_length_segment() {
        let body = base_body() + &command("Segment", &["A", "A"]);
        let bytes = archive(GEOMETRY_ENTRY, &geometry_xml(&body));
        let err = parse_level("test".into(), &bytes).unwrap_err();
        assert!(matches!(err, LevelFormatError::ZeroLengthSegment(a, b) if a == "A" && b == "A"));
    }

    #[test]
    fn test_rejects_slanted_segment() {
        let body = base_body() + &point("S0", 0.0, 0.0) + &point("S1", 5.0, -3.0)
            + &command("Segment", &["S0", "S1"]);
        let bytes = archive(GEOMETRY_ENTRY, &geometry_xml(&body));
        let err = parse_level("test".into(), &bytes).unwrap_err();
        assert!(matches!(err, LevelFormatError::SlantedSegment(..)));
    }

    #[test]
    fn test_rejects_unknown_point_reference() {
        let body = base_body() + &command("Segment", &["A", "NOPE"]);
        let bytes = archive(GEOMETRY_ENTRY, &geometry_xml(&body));
        let err = parse_level("test".into(), &bytes).unwrap_err();
        assert!(matches!(err, LevelFormatError::UnknownPoint(label) if label == "NOPE"));
    }

    #[test]
    fn test_rejects_missing_start() {
        let body = base_body().replace(&point("START", 5.0, -5.0), "");
        let bytes = archive(GEOMETRY_ENTRY, &geometry_xml(&body));
        let err = parse_level("test".into(), &bytes).unwrap_err();
        assert!(matches!(err, LevelFormatError::MissingNamedPoint("START")));
    }

    #[test]
    fn test_rejects_missing_bounds() {
        let body = base_body().replace(&command("Polygon", &["P0", "P1", "P2", "P3"]), "");
        let bytes = archive(GEOMETRY_ENTRY, &geometry_xml(&body));
        let err = parse_level("test".into(), &bytes).unwrap_err();
        assert!(matches!(err, LevelFormatError::MissingBounds));
    }

    #[test]
    fn test_rejects_archive_without_geometry_entry() {
        let bytes = archive("other.xml", &geometry_xml(&base_body()));
        let err = parse_level("test".into(), &bytes).unwrap_err();
        assert!(matches!(err, LevelFormatError::MissingGeometry));
    }

    #[test]
    fn test_rejects_garbage_bytes() {
        let err = parse_level("test".into(), b"not a zip archive").unwrap_err();
        assert!(matches!(err, LevelFormatError::Archive(_)));
    }

    #[test]
    fn test_cache_returns_shared_instance() {
        let path = std::env::temp_dir().join(format!(
            "tilt-maze-cache-test-{}.ggb",
            std::process::id()
        ));
        std::fs::write(&path, archive(GEOMETRY_ENTRY, &geometry_xml(&base_body()))).unwrap();

        let cache = LevelCache::new();
        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        std::fs::remove_file(&path).ok();
    }
}
