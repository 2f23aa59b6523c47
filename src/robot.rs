//! Robots and the data source they are read from.
//!
//! A robot data file is either a single robot document, repeated at every position,
//! or a `{"swarm": [...]}` list paired with positions index-for-index (wrapping
//! around the list when there are more positions than documents).

use std::path::{Path, PathBuf};

use glam::IVec3;
use rand::Rng;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::component::{BodySpec, Color};
use crate::error::StructuralError;
use crate::tree::ComponentTree;

/// Display colours a robot may be tinted with.
pub const ROBOT_PALETTE: [(&str, [u8; 4]); 5] = [
    ("Blue", [46, 62, 184, 100]),
    ("Green", [50, 168, 68, 100]),
    ("Red", [168, 60, 50, 100]),
    ("Orange", [245, 129, 47, 100]),
    ("Purple", [112, 28, 186, 100]),
];

/// One robot as described in the data file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RobotDocument {
    /// Numeric ids are accepted and kept in their string form.
    #[serde(deserialize_with = "deserialize_robot_id")]
    pub id: String,

    pub body: BodySpec,

    /// Controller description. Never interpreted here.
    #[serde(default)]
    pub brain: Value,
}

fn deserialize_robot_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("invalid robot id: {other}"))),
    }
}

/// A robot ready for assembly.
#[derive(Clone, Debug)]
pub struct Robot {
    pub id: String,
    pub tree: ComponentTree,
    /// Placement on the terrain. Only `x` and `y` are used; `z` is kept as given.
    pub position: IVec3,
    pub brain: Value,
    /// Chosen once at construction.
    pub color: Color,
}

impl Robot {
    /// Builds the component tree and picks a display colour from `rng`.
    pub fn new<R: Rng + ?Sized>(
        document: &RobotDocument,
        position: IVec3,
        rng: &mut R,
    ) -> Result<Self, StructuralError> {
        Self::with_color(document, position, pick_color(rng))
    }

    pub fn with_color(
        document: &RobotDocument,
        position: IVec3,
        color: Color,
    ) -> Result<Self, StructuralError> {
        Ok(Self {
            id: document.id.clone(),
            tree: ComponentTree::build(&document.body)?,
            position,
            brain: document.brain.clone(),
            color,
        })
    }
}

pub fn pick_color<R: Rng + ?Sized>(rng: &mut R) -> Color {
    let (_, rgba) = ROBOT_PALETTE[rng.gen_range(0..ROBOT_PALETTE.len())];
    Color::from_rgba8(rgba)
}

/// Contents of a robot data file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RobotSource {
    /// Distinct robots, one per position (wrapping).
    Swarm { swarm: Vec<RobotDocument> },
    /// One robot repeated at every position.
    Single(RobotDocument),
}

impl RobotSource {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn is_swarm(&self) -> bool {
        matches!(self, RobotSource::Swarm { .. })
    }

    /// The document used for robot `index`.
    pub fn document(&self, index: usize) -> Option<&RobotDocument> {
        match self {
            RobotSource::Single(doc) => Some(doc),
            RobotSource::Swarm { swarm } if swarm.is_empty() => None,
            RobotSource::Swarm { swarm } => swarm.get(index % swarm.len()),
        }
    }
}

/// Robot documents plus the positions to place them at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RobotData {
    source: Option<RobotSource>,
    positions: Option<Vec<IVec3>>,
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    #[serde(default)]
    pub position_path: Option<PathBuf>,
}

impl RobotData {
    pub fn new(source: RobotSource, positions: Vec<IVec3>) -> Self {
        Self {
            source: Some(source),
            positions: Some(positions),
            data_path: None,
            position_path: None,
        }
    }

    /// Reads the data and position files. Unreadable or malformed files leave the
    /// data invalid rather than failing here.
    pub fn load(data_path: &Path, position_path: &Path) -> Self {
        let source = match std::fs::read_to_string(data_path) {
            Ok(text) => match RobotSource::from_json(&text) {
                Ok(source) => Some(source),
                Err(e) => {
                    tracing::warn!("Failed to parse robot data '{}': {}", data_path.display(), e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read robot data '{}': {}", data_path.display(), e);
                None
            }
        };

        let positions = match std::fs::read_to_string(position_path) {
            Ok(text) => Some(parse_positions(&text)),
            Err(e) => {
                tracing::warn!(
                    "Failed to read positions '{}': {}",
                    position_path.display(),
                    e
                );
                None
            }
        };

        Self {
            source,
            positions,
            data_path: Some(data_path.to_path_buf()),
            position_path: Some(position_path.to_path_buf()),
        }
    }

    pub fn valid(&self) -> bool {
        self.source.is_some() && self.positions.is_some()
    }

    pub fn source(&self) -> Option<&RobotSource> {
        self.source.as_ref()
    }

    pub fn positions(&self) -> &[IVec3] {
        self.positions.as_deref().unwrap_or(&[])
    }

    /// True when every robot shares one document.
    pub fn heterogeneous(&self) -> bool {
        !self.source.as_ref().is_some_and(RobotSource::is_swarm)
    }

    /// Document and position for robot `index`. Either half is `None` when missing.
    pub fn get(&self, index: usize) -> (Option<&RobotDocument>, Option<IVec3>) {
        let document = self.source.as_ref().and_then(|s| s.document(index));
        let position = self
            .positions
            .as_ref()
            .and_then(|p| p.get(index).copied());
        (document, position)
    }
}

/// Parses `x y z` integer triples, one per line. Malformed lines are skipped.
pub fn parse_positions(text: &str) -> Vec<IVec3> {
    text.lines()
        .filter_map(|line| {
            let coords: Vec<i32> = line
                .split_whitespace()
                .map(str::parse::<i32>)
                .collect::<Result<Vec<_>, _>>()
                .ok()?;
            match coords.as_slice() {
                [x, y, z] => Some(IVec3::new(*x, *y, *z)),
                _ => None,
            }
        })
        .collect()
}
