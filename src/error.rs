//! Error taxonomy for tree construction, assembly, placement and environment builds.
//!
//! Structural and placement errors are recovered where they occur (the offending
//! part, edge or robot is skipped). Configuration and missing-data errors abort the
//! whole build attempt and surface to the caller through [`EnvironmentError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::component::ComponentKind;

/// A malformed body description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// No part carries the root flag.
    #[error("no root component found")]
    NoRoot,

    /// More than one part carries the root flag.
    #[error("multiple root components: {}", ids.join(", "))]
    MultipleRoots { ids: Vec<String> },

    /// The part's `type` does not name a known component kind.
    #[error("component '{id}' has unknown type '{kind}'")]
    UnknownKind { id: String, kind: String },

    /// A connection references a component id that was never constructed.
    #[error("no connection found for {src} -> {dest}")]
    UnknownEndpoint { src: String, dest: String },

    /// A connection uses a slot index outside `0..=3`.
    #[error("component '{src}' has no slot {slot}")]
    InvalidSlot { src: String, slot: i64 },

    /// A part declares an orientation outside `0..=3`.
    #[error("component '{id}' has invalid orientation {orientation}")]
    InvalidOrientation { id: String, orientation: i64 },

    /// Two parts share the same id.
    #[error("duplicate component id '{id}'")]
    DuplicateId { id: String },

    /// A second connection targets a slot that already holds a child.
    #[error("slot {slot} of component '{src}' is already occupied")]
    SlotOccupied { src: String, slot: u8 },

    /// Wheels and sensors cannot carry children.
    #[error("component '{src}' is a terminal {kind} and cannot carry children")]
    TerminalParent { src: String, kind: ComponentKind },

    /// The destination already hangs off another component.
    #[error("component '{dest}' already has a parent")]
    MultipleParents { dest: String },

    /// A connection from a component to itself.
    #[error("component '{id}' cannot connect to itself")]
    SelfConnection { id: String },

    /// A connection whose destination is the root part.
    #[error("root component '{dest}' cannot be a child")]
    RootAsChild { dest: String },
}

/// Failure to assemble a single robot into a model instance.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The geometry provider has no asset for this kind.
    #[error("no geometry found for {kind}")]
    GeometryNotFound { kind: ComponentKind },

    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// The robot document could not be turned into a robot.
    #[error("invalid robot: {reason}")]
    InvalidRobot { reason: String },
}

/// A robot whose assembled footprint cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("Robot [id = {id}]: collision detected with [id = {other}]")]
    Collision { id: String, other: String },

    #[error("Robot [id = {id}]: Out of Bounds")]
    OutOfBounds { id: String },
}

/// Errors that abort an environment operation.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("invalid robot data file: {}", display_path(.path))]
    InvalidData { path: Option<PathBuf> },

    #[error("invalid environment configuration: {}", display_path(.path))]
    InvalidConfig { path: Option<PathBuf> },

    #[error("position not-found/invalid [Robot ID: {index}]")]
    PositionMissing { index: usize },

    #[error("data not found for Robot ID: {index}")]
    DataMissing { index: usize },

    #[error("unable to detect filepaths to rebuild from")]
    NoRebuildPaths,

    #[error("environment '{name}' not found")]
    EnvironmentNotFound { name: String },

    #[error("no data to save")]
    NothingToSave,

    #[error("no environment name given")]
    MissingName,

    #[error("robot id [{id}] not found")]
    RobotNotFound { id: String },

    #[error("no environment loaded")]
    NoEnvironment,

    #[error("build cancelled before robot {index}")]
    Cancelled { index: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EnvironmentError {
    /// Status code reported alongside the message. Every environment failure is non-zero.
    pub fn status(&self) -> i32 {
        1
    }

    /// True for errors raised while walking the batch (as opposed to validating inputs).
    pub fn is_data_missing(&self) -> bool {
        matches!(
            self,
            Self::PositionMissing { .. } | Self::DataMissing { .. }
        )
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string())
}
