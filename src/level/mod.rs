//! Level model: the immutable obstacle set the physics operates on
//!
//! A `Level` is built once by the loader, shared read-only for the lifetime
//! of a play session, and cached by source key so repeated loads are
//! idempotent.

pub mod loader;

pub use loader::LevelCache;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::Rect;

/// A circular hole the marble can fall into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub position: Vec2,
    /// Strictly positive
    pub radius: f32,
}

/// Immutable playfield geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Source key the level was loaded from
    pub id: String,
    pub holes: Vec<Hole>,
    pub walls: Vec<Rect>,
    pub map_width: f32,
    pub map_height: f32,
    pub start_position: Vec2,
    pub goal_position: Vec2,
    pub goal_radius: f32,
    pub player_radius: f32,
}

/// Why a level source could not be turned into a `Level`
///
/// Unrecoverable per load attempt: nothing partial is cached, the caller
/// decides whether to retry with the same or a different source.
#[derive(Debug)]
pub enum LevelFormatError {
    /// Reading the archive from disk failed
    Io(std::io::Error),
    /// The file is not a readable zip archive
    Archive(zip::result::ZipError),
    /// The archive has no `geogebra.xml` entry
    MissingGeometry,
    /// The geometry description is not well-formed XML
    Xml(roxmltree::Error),
    /// A labeled point has missing or unparsable coordinates
    InvalidCoordinates(String),
    /// A construction command is missing required inputs
    MalformedConstruction(&'static str),
    /// A construction references a point label that does not exist
    UnknownPoint(String),
    /// Both endpoints of a wall segment coincide
    ZeroLengthSegment(String, String),
    /// A wall segment is neither horizontal nor vertical
    SlantedSegment(String, String),
    /// Canonical ordering produced a negative wall extent
    NegativeExtent(String, String),
    /// No `Polygon` construction to derive the map bounds from
    MissingBounds,
    /// A required named point (`START` or `GOAL`) is absent
    MissingNamedPoint(&'static str),
}

impl std::fmt::Display for LevelFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelFormatError::Io(err) => write!(f, "failed to read level archive: {err}"),
            LevelFormatError::Archive(err) => write!(f, "level archive is invalid: {err}"),
            LevelFormatError::MissingGeometry => {
                write!(f, "level archive has no geogebra.xml entry")
            }
            LevelFormatError::Xml(err) => write!(f, "level geometry is malformed: {err}"),
            LevelFormatError::InvalidCoordinates(label) => {
                write!(f, "point {label:?} has invalid coordinates")
            }
            LevelFormatError::MalformedConstruction(name) => {
                write!(f, "{name} construction is missing required inputs")
            }
            LevelFormatError::UnknownPoint(label) => {
                write!(f, "construction references unknown point {label:?}")
            }
            LevelFormatError::ZeroLengthSegment(a, b) => {
                write!(f, "wall segment from {a:?} to {b:?} has zero length")
            }
            LevelFormatError::SlantedSegment(a, b) => {
                write!(
                    f,
                    "wall segment from {a:?} to {b:?} is not horizontal or vertical"
                )
            }
            LevelFormatError::NegativeExtent(a, b) => {
                write!(f, "wall segment from {a:?} to {b:?} has negative dimensions")
            }
            LevelFormatError::MissingBounds => {
                write!(f, "level has no Polygon construction for the map bounds")
            }
            LevelFormatError::MissingNamedPoint(label) => {
                write!(f, "level has no point labeled {label:?}")
            }
        }
    }
}

impl std::error::Error for LevelFormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LevelFormatError::Io(err) => Some(err),
            LevelFormatError::Archive(err) => Some(err),
            LevelFormatError::Xml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LevelFormatError {
    fn from(err: std::io::Error) -> Self {
        LevelFormatError::Io(err)
    }
}

impl From<zip::result::ZipError> for LevelFormatError {
    fn from(err: zip::result::ZipError) -> Self {
        LevelFormatError::Archive(err)
    }
}

impl From<roxmltree::Error> for LevelFormatError {
    fn from(err: roxmltree::Error) -> Self {
        LevelFormatError::Xml(err)
    }
}
