//! The environment: a terrain plus every robot placed on it.
//!
//! [`Environment`] drives the batch build. For each declared robot it fetches the
//! document and position, assembles the robot, and validates the result against the
//! robots already placed and the terrain bounds.
//!
//! Two failure policies apply inside one build:
//! - a missing position or document aborts the whole build, leaving the environment empty;
//! - a robot that cannot be built or placed is logged and skipped, and the build continues.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use glam::IVec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::builder::{AssemblyConfig, ModelInstance, RobotAssembler};
use crate::error::EnvironmentError;
use crate::geometry::{GeometryCatalog, GeometryProvider};
use crate::logger::Logger;
use crate::placement::{Terrain, validate_placement};
use crate::robot::{Robot, RobotData, RobotDocument};
use crate::scene::Scene;
use crate::storage::{EnvironmentStore, SavedEnvironment};

/// Terrain size and robot count, read from a three-line text file:
///
/// ```text
/// 100.0   terrain half-extent along x
/// 100.0   terrain half-extent along y
/// 12      number of robots
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub x: f32,
    pub y: f32,
    pub num_robots: usize,
    valid: bool,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl EnvironmentConfig {
    /// A valid config for a `2x × 2y` terrain holding `num_robots` robots.
    pub fn new(x: f32, y: f32, num_robots: usize) -> Self {
        Self {
            x,
            y,
            num_robots,
            valid: true,
            path: None,
        }
    }

    /// Parses the three fields. Missing or non-numeric fields yield an invalid config.
    /// A negative robot count is accepted and places no robots.
    pub fn parse(text: &str) -> Self {
        let mut lines = text.split('\n').map(str::trim);
        let x = lines.next().and_then(|l| l.parse::<f32>().ok());
        let y = lines.next().and_then(|l| l.parse::<f32>().ok());
        let num_robots = lines
            .next()
            .and_then(|l| l.parse::<i64>().ok())
            .map(|n| usize::try_from(n).unwrap_or(0));

        match (x, y, num_robots) {
            (Some(x), Some(y), Some(num_robots)) => Self::new(x, y, num_robots),
            _ => Self::invalid(),
        }
    }

    /// Reads and parses `path`. An unreadable file yields an invalid config.
    pub fn load(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) => {
                tracing::warn!("Failed to read config '{}': {}", path.display(), e);
                Self::invalid()
            }
        };
        config.path = Some(path.to_path_buf());
        config
    }

    fn invalid() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            num_robots: 0,
            valid: false,
            path: None,
        }
    }

    pub fn valid(&self) -> bool {
        self.valid
    }
}

/// Lifecycle of an [`Environment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvironmentState {
    Empty,
    Building,
    Ready,
}

/// Outcome of a completed build.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildSummary {
    /// Robots actually placed.
    pub placed: usize,
    /// Robots skipped because they could not be built or placed.
    pub errors: usize,
    pub elapsed: Duration,
}

impl BuildSummary {
    /// Elapsed wall time in seconds, rounded to milliseconds.
    pub fn elapsed_secs(&self) -> f64 {
        (self.elapsed.as_secs_f64() * 1000.0).round() / 1000.0
    }
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Added {} Robot(s) in {:.3}s",
            self.placed,
            self.elapsed.as_secs_f64()
        )?;
        if self.errors > 0 {
            write!(f, " [{} Errors: View Log for Details]", self.errors)?;
        }
        Ok(())
    }
}

/// Result of [`Environment::clear`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    NothingToClear,
}

impl fmt::Display for ClearOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearOutcome::Cleared => f.write_str("Environment Cleared"),
            ClearOutcome::NothingToClear => f.write_str("No environment to clear"),
        }
    }
}

/// Shared flag for stopping a long build between robots.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Input files of the last successful [`Environment::open`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourcePaths {
    pub config: PathBuf,
    pub position: PathBuf,
    pub data: PathBuf,
}

/// Builds, holds and tears down a swarm of placed robots.
pub struct Environment<G: GeometryProvider = GeometryCatalog> {
    scene: Scene,
    geometry: G,
    assembler: RobotAssembler,
    logger: Logger,
    rng: StdRng,
    store: EnvironmentStore,
    cancel: Option<CancelToken>,

    state: EnvironmentState,
    name: Option<String>,
    config: Option<EnvironmentConfig>,
    data: Option<RobotData>,
    terrain: Option<Terrain>,
    robots: Vec<ModelInstance>,
    render_time: Option<Duration>,
    paths: Option<SourcePaths>,
}

impl Default for Environment<GeometryCatalog> {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment<GeometryCatalog> {
    /// An empty environment using the built-in component geometry.
    pub fn new() -> Self {
        Self::with_geometry(GeometryCatalog::default())
    }
}

impl<G: GeometryProvider> Environment<G> {
    /// An empty environment drawing component shapes from `geometry`.
    pub fn with_geometry(geometry: G) -> Self {
        Self {
            scene: Scene::new(),
            geometry,
            assembler: RobotAssembler::default(),
            logger: Logger::new(),
            rng: StdRng::from_entropy(),
            store: EnvironmentStore::default(),
            cancel: None,
            state: EnvironmentState::Empty,
            name: None,
            config: None,
            data: None,
            terrain: None,
            robots: Vec::new(),
            render_time: None,
            paths: None,
        }
    }

    /// Replaces the assembly constants.
    pub fn with_assembly_config(mut self, config: AssemblyConfig) -> Self {
        self.assembler = RobotAssembler::new(config);
        self
    }

    /// Seeds the robot colour picker.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Sets where environments are saved and loaded.
    pub fn with_store(mut self, store: EnvironmentStore) -> Self {
        self.store = store;
        self
    }

    /// Starts from an existing log history.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Lets another thread stop a running build between robots.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    // --- Accessors ---

    pub fn state(&self) -> EnvironmentState {
        self.state
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn config(&self) -> Option<&EnvironmentConfig> {
        self.config.as_ref()
    }

    pub fn data(&self) -> Option<&RobotData> {
        self.data.as_ref()
    }

    pub fn terrain(&self) -> Option<&Terrain> {
        self.terrain.as_ref()
    }

    /// Placed robots in placement order.
    pub fn robots(&self) -> &[ModelInstance] {
        &self.robots
    }

    pub fn robot(&self, id: &str) -> Option<&ModelInstance> {
        self.robots.iter().find(|r| r.id == id)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut Logger {
        &mut self.logger
    }

    pub fn store(&self) -> &EnvironmentStore {
        &self.store
    }

    pub fn render_time(&self) -> Option<Duration> {
        self.render_time
    }

    pub fn source_paths(&self) -> Option<&SourcePaths> {
        self.paths.as_ref()
    }

    /// True when a config and robot data are loaded and both are valid.
    pub fn is_valid(&self) -> bool {
        matches!((&self.config, &self.data), (Some(c), Some(d)) if c.valid() && d.valid())
    }

    // --- Commands ---

    /// Builds an environment from a config file, a positions file and a robot data file.
    /// Anything currently built is cleared first.
    pub fn open(
        &mut self,
        config_path: &Path,
        position_path: &Path,
        data_path: &Path,
    ) -> Result<BuildSummary, EnvironmentError> {
        let config = EnvironmentConfig::load(config_path);
        let data = RobotData::load(data_path, position_path);

        let summary = self.open_with(None, data, config)?;
        self.paths = Some(SourcePaths {
            config: config_path.to_path_buf(),
            position: position_path.to_path_buf(),
            data: data_path.to_path_buf(),
        });
        Ok(summary)
    }

    /// Builds an environment from already-parsed inputs. Anything currently built is
    /// cleared first.
    pub fn open_with(
        &mut self,
        name: Option<String>,
        data: RobotData,
        config: EnvironmentConfig,
    ) -> Result<BuildSummary, EnvironmentError> {
        self.clear();
        self.build(name, data, config)
    }

    /// Replays the last successful [`open`](Self::open).
    pub fn rebuild(&mut self) -> Result<BuildSummary, EnvironmentError> {
        let Some(paths) = self.paths.clone() else {
            return Err(EnvironmentError::NoRebuildPaths);
        };
        self.open(&paths.config, &paths.position, &paths.data)
    }

    /// Removes every robot and the terrain and forgets the loaded inputs.
    pub fn clear(&mut self) -> ClearOutcome {
        let had_environment = self.terrain.is_some() || !self.robots.is_empty();

        for robot in self.robots.drain(..) {
            self.scene.remove(robot.root);
        }
        if let Some(node) = self.terrain.take().and_then(|t| t.node) {
            self.scene.remove(node);
        }
        self.name = None;
        self.data = None;
        self.config = None;
        self.render_time = None;
        self.state = EnvironmentState::Empty;

        if had_environment {
            ClearOutcome::Cleared
        } else {
            ClearOutcome::NothingToClear
        }
    }

    /// Saves the current inputs under `name`, or under the current name when `None`.
    pub fn save(&mut self, name: Option<&str>) -> Result<PathBuf, EnvironmentError> {
        let (Some(config), Some(data)) = (&self.config, &self.data) else {
            return Err(EnvironmentError::NothingToSave);
        };
        let name = match name {
            Some(name) => name.trim_matches(|c| c == '"' || c == '\'').to_string(),
            None => self.name.clone().ok_or(EnvironmentError::MissingName)?,
        };

        let state = SavedEnvironment {
            name: name.clone(),
            data: data.clone(),
            config: config.clone(),
        };
        let path = self.store.save(&state)?;
        self.name = Some(name);
        self.logger.log(format!("\"{}\" saved.", state.name));
        Ok(path)
    }

    /// Rebuilds a saved environment by name.
    pub fn load(&mut self, name: &str) -> Result<BuildSummary, EnvironmentError> {
        let saved = self.store.load(name)?;
        self.open_with(Some(saved.name), saved.data, saved.config)
    }

    /// Names of all saved environments.
    pub fn list(&self) -> Result<Vec<String>, EnvironmentError> {
        self.store.list()
    }

    /// Shows only the robot with `id`.
    pub fn focus(&mut self, id: &str) -> Result<(), EnvironmentError> {
        if !self.is_valid() || self.robot(id).is_none() {
            return Err(EnvironmentError::RobotNotFound { id: id.to_string() });
        }
        for robot in &self.robots {
            self.scene.set_visible(robot.root, robot.id == id);
        }
        Ok(())
    }

    /// Shows every robot again.
    pub fn unfocus(&mut self) {
        for robot in &self.robots {
            self.scene.set_visible(robot.root, true);
        }
    }

    pub fn hide(&mut self) -> Result<(), EnvironmentError> {
        self.set_all_visible(false)
    }

    pub fn show(&mut self) -> Result<(), EnvironmentError> {
        self.set_all_visible(true)
    }

    fn set_all_visible(&mut self, visible: bool) -> Result<(), EnvironmentError> {
        let Some(terrain_node) = self.terrain.as_ref().and_then(|t| t.node) else {
            return Err(EnvironmentError::NoEnvironment);
        };
        self.scene.set_visible(terrain_node, visible);
        for robot in &self.robots {
            self.scene.set_visible(robot.root, visible);
        }
        Ok(())
    }

    // --- Build loop ---

    fn build(
        &mut self,
        name: Option<String>,
        data: RobotData,
        config: EnvironmentConfig,
    ) -> Result<BuildSummary, EnvironmentError> {
        if !data.valid() {
            let err = EnvironmentError::InvalidData {
                path: data.data_path.clone(),
            };
            self.logger.error(err.to_string());
            return Err(err);
        }
        if !config.valid() {
            let err = EnvironmentError::InvalidConfig {
                path: config.path.clone(),
            };
            self.logger.error(err.to_string());
            return Err(err);
        }

        self.state = EnvironmentState::Building;
        let start = Instant::now();
        let terrain = Terrain::spawn(
            &mut self.scene,
            config.x,
            config.y,
            self.assembler.config().ground_height,
        );

        let mut errors = 0;
        for index in 0..config.num_robots {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                return Err(self.abort(terrain, EnvironmentError::Cancelled { index }));
            }

            let (document, position) = data.get(index);
            let Some(position) = position else {
                return Err(self.abort(terrain, EnvironmentError::PositionMissing { index }));
            };
            let Some(document) = document else {
                return Err(self.abort(terrain, EnvironmentError::DataMissing { index }));
            };

            if !self.add_robot(&terrain, document, position) {
                errors += 1;
            }
        }

        let elapsed = start.elapsed();
        let summary = BuildSummary {
            placed: self.robots.len(),
            errors,
            elapsed,
        };

        self.terrain = Some(terrain);
        self.name = name;
        self.data = Some(data);
        self.config = Some(config);
        self.render_time = Some(elapsed);
        self.state = EnvironmentState::Ready;
        self.logger.log(summary.to_string());
        Ok(summary)
    }

    /// Builds and validates one robot. Returns false when the robot was skipped.
    fn add_robot(&mut self, terrain: &Terrain, document: &RobotDocument, position: IVec3) -> bool {
        let robot = match Robot::new(document, position, &mut self.rng) {
            Ok(robot) => robot,
            Err(e) => {
                self.logger
                    .error(format!("Robot [id = {}]: {}", document.id, e));
                return false;
            }
        };
        for issue in robot.tree.issues() {
            self.logger
                .error(format!("Robot [id = {}]: {}", robot.id, issue));
        }

        let id = robot.id.clone();
        let candidate = match self
            .assembler
            .assemble(robot, &mut self.scene, &self.geometry)
        {
            Ok(candidate) => candidate,
            Err(e) => {
                self.logger.error(format!("Robot [id = {}]: {}", id, e));
                return false;
            }
        };

        match validate_placement(&candidate, &self.robots, terrain) {
            Ok(()) => {
                self.scene.attach_to_root(candidate.root);
                self.logger.log(format!("Added Robot [id = {}]", id));
                self.robots.push(candidate);
                true
            }
            Err(e) => {
                self.scene.remove(candidate.root);
                self.logger.error(e.to_string());
                false
            }
        }
    }

    /// Throws away a partial build and returns the environment to `Empty`.
    fn abort(&mut self, terrain: Terrain, err: EnvironmentError) -> EnvironmentError {
        for robot in self.robots.drain(..) {
            self.scene.remove(robot.root);
        }
        if let Some(node) = terrain.node {
            self.scene.remove(node);
        }
        self.state = EnvironmentState::Empty;
        self.logger.error(err.to_string());
        err
    }
}
