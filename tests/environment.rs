// tests/environment.rs
use std::path::{Path, PathBuf};

use glam::IVec3;
use pretty_assertions::assert_eq;
use robogen_swarm::{
    BodySpec, BuildSummary, CancelToken, ClearOutcome, ComponentKind, ConnectionSpec, Environment,
    EnvironmentConfig, EnvironmentError, EnvironmentState, EnvironmentStore, PartSpec,
    RobotData, RobotDocument, RobotSource,
};
use tempfile::TempDir;

const CUBE: &str = r#"{
    "id": "cube",
    "body": {
        "part": [{"id": "core", "type": "CoreComponent", "root": true, "orientation": 0}],
        "connection": []
    }
}"#;

fn document(id: &str, bricks: usize) -> RobotDocument {
    let mut part = vec![PartSpec::new("core", ComponentKind::Core, 0).root()];
    let mut connection = Vec::new();
    for slot in 0..bricks {
        let id = format!("brick{slot}");
        part.push(PartSpec::new(&id, ComponentKind::FixedBrick, 0));
        connection.push(ConnectionSpec::new("core", id, slot as i64));
    }
    RobotDocument {
        id: id.to_string(),
        body: BodySpec { part, connection },
        brain: serde_json::Value::Null,
    }
}

fn cubes(positions: &[[i32; 2]]) -> RobotData {
    RobotData::new(
        RobotSource::Single(document("cube", 0)),
        positions
            .iter()
            .map(|[x, y]| IVec3::new(*x, *y, 0))
            .collect(),
    )
}

fn env() -> Environment {
    Environment::new().with_seed(7)
}

struct Inputs {
    _dir: TempDir,
    config: PathBuf,
    position: PathBuf,
    data: PathBuf,
}

fn write_inputs(config: &str, positions: &str, data: &str) -> Inputs {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, text: &str| -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    };
    let config = write("config.txt", config);
    let position = write("positions.txt", positions);
    let data = write("robots.json", data);
    Inputs {
        _dir: dir,
        config,
        position,
        data,
    }
}

fn open(env: &mut Environment, inputs: &Inputs) -> Result<BuildSummary, EnvironmentError> {
    env.open(&inputs.config, &inputs.position, &inputs.data)
}

#[test]
fn test_builds_every_robot() {
    let mut env = env();
    let summary = env
        .open_with(
            None,
            cubes(&[[0, 0], [10, 0], [0, 10]]),
            EnvironmentConfig::new(50.0, 50.0, 3),
        )
        .unwrap();

    assert_eq!(summary.placed, 3);
    assert_eq!(summary.errors, 0);
    assert!(summary.to_string().starts_with("Added 3 Robot(s) in "));
    assert_eq!(env.state(), EnvironmentState::Ready);
    assert_eq!(env.robots().len(), 3);
    assert!(env.terrain().is_some());
    assert!(env.render_time().is_some());
    assert!(env.is_valid());

    // Terrain plus three robots hang off the scene root.
    assert_eq!(env.scene().root_children().len(), 4);
    for robot in env.robots() {
        assert!(env.scene().is_attached_to_root(robot.root));
    }
    assert_eq!(env.logger().errors().count(), 0);
}

#[test]
fn test_collision_skips_one_robot() {
    let mut env = env();
    let summary = env
        .open_with(
            None,
            cubes(&[[0, 0], [10, 0], [1, 1], [0, 10]]),
            EnvironmentConfig::new(50.0, 50.0, 4),
        )
        .unwrap();

    assert_eq!(summary.placed, 3);
    assert_eq!(summary.errors, 1);
    assert!(
        summary
            .to_string()
            .ends_with(" [1 Errors: View Log for Details]")
    );
    assert_eq!(env.state(), EnvironmentState::Ready);

    let placed: Vec<IVec3> = env.robots().iter().map(|r| r.robot.position).collect();
    assert_eq!(
        placed,
        vec![IVec3::new(0, 0, 0), IVec3::new(10, 0, 0), IVec3::new(0, 10, 0)]
    );

    let errors: Vec<String> = env.logger().errors().map(|m| m.text.clone()).collect();
    assert_eq!(
        errors,
        vec!["Robot [id = cube]: collision detected with [id = cube]".to_string()]
    );
}

#[test]
fn test_out_of_bounds_robot_is_skipped() {
    let mut env = env();
    let summary = env
        .open_with(
            None,
            cubes(&[[0, 0], [49, 0]]),
            EnvironmentConfig::new(50.0, 50.0, 2),
        )
        .unwrap();

    assert_eq!(summary.placed, 1);
    assert_eq!(summary.errors, 1);
    // The rejected robot's nodes are gone from the scene.
    assert_eq!(env.scene().root_children().len(), 2);
}

#[test]
fn test_missing_position_aborts_build() {
    let mut env = env();
    let err = env
        .open_with(
            None,
            cubes(&[[0, 0], [10, 0]]),
            EnvironmentConfig::new(50.0, 50.0, 3),
        )
        .unwrap_err();

    assert!(matches!(err, EnvironmentError::PositionMissing { index: 2 }));
    assert_eq!(env.state(), EnvironmentState::Empty);
    assert!(env.robots().is_empty());
    assert!(env.terrain().is_none());
    assert!(env.scene().is_empty());
    assert!(
        env.logger()
            .errors()
            .any(|m| m.text == "position not-found/invalid [Robot ID: 2]")
    );
}

#[test]
fn test_empty_swarm_aborts_build() {
    let mut env = env();
    let data = RobotData::new(RobotSource::Swarm { swarm: vec![] }, vec![IVec3::ZERO]);
    let err = env
        .open_with(None, data, EnvironmentConfig::new(50.0, 50.0, 1))
        .unwrap_err();

    assert!(matches!(err, EnvironmentError::DataMissing { index: 0 }));
    assert_eq!(env.state(), EnvironmentState::Empty);
    assert!(env.scene().is_empty());
}

#[test]
fn test_swarm_documents_wrap_around() {
    let mut env = env();
    let data = RobotData::new(
        RobotSource::Swarm {
            swarm: vec![document("small", 0), document("big", 2)],
        },
        vec![
            IVec3::new(-30, 0, 0),
            IVec3::new(-10, 0, 0),
            IVec3::new(10, 0, 0),
            IVec3::new(30, 0, 0),
        ],
    );
    assert!(!data.heterogeneous());

    let summary = env
        .open_with(None, data, EnvironmentConfig::new(50.0, 50.0, 4))
        .unwrap();

    assert_eq!(summary.placed, 4);
    let ids: Vec<&str> = env.robots().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["small", "big", "small", "big"]);
    let parts: Vec<usize> = env.robots().iter().map(|r| r.components.len()).collect();
    assert_eq!(parts, vec![1, 3, 1, 3]);
}

#[test]
fn test_broken_robot_counts_as_error() {
    let mut env = env();
    let mut rootless = document("rootless", 0);
    rootless.body.part[0].root = false;
    let data = RobotData::new(
        RobotSource::Swarm {
            swarm: vec![document("ok", 0), rootless],
        },
        vec![IVec3::new(-10, 0, 0), IVec3::new(10, 0, 0)],
    );

    let summary = env
        .open_with(None, data, EnvironmentConfig::new(50.0, 50.0, 2))
        .unwrap();

    assert_eq!(summary.placed, 1);
    assert_eq!(summary.errors, 1);
    assert!(
        env.logger()
            .errors()
            .any(|m| m.text == "Robot [id = rootless]: no root component found")
    );
}

#[test]
fn test_structural_issue_logged_once() {
    let mut env = env();
    let mut dangling = document("dangling", 1);
    dangling
        .body
        .connection
        .push(ConnectionSpec::new("core", "ghost", 2));
    let data = RobotData::new(RobotSource::Single(dangling), vec![IVec3::ZERO]);

    let summary = env
        .open_with(None, data, EnvironmentConfig::new(50.0, 50.0, 1))
        .unwrap();

    // The issue does not stop the robot from being placed.
    assert_eq!(summary.placed, 1);
    assert_eq!(summary.errors, 0);
    let errors: Vec<String> = env.logger().errors().map(|m| m.text.clone()).collect();
    assert_eq!(
        errors,
        vec!["Robot [id = dangling]: no connection found for core -> ghost".to_string()]
    );
}

#[test]
fn test_negative_robot_count_builds_empty_terrain() {
    let mut env = env();
    let summary = env
        .open_with(None, cubes(&[[0, 0]]), EnvironmentConfig::parse("10\n10\n-3\n"))
        .unwrap();

    assert_eq!(summary.placed, 0);
    assert_eq!(env.state(), EnvironmentState::Ready);
    assert!(env.terrain().is_some());
}

#[test]
fn test_open_from_files_and_rebuild() {
    let inputs = write_inputs("50\n50\n3\n", "0 0 0\n10 0 0\n0 10 0\n", CUBE);
    let mut env = env();

    let first = open(&mut env, &inputs).unwrap();
    assert_eq!(first.placed, 3);
    let paths = env.source_paths().unwrap();
    assert_eq!(paths.data, inputs.data);
    assert_eq!(env.data().unwrap().data_path.as_deref(), Some(inputs.data.as_path()));

    let nodes = env.scene().len();
    let second = env.rebuild().unwrap();
    assert_eq!(second.placed, first.placed);
    assert_eq!(second.errors, first.errors);
    assert_eq!(env.scene().len(), nodes);
}

#[test]
fn test_invalid_inputs_are_rejected() {
    let bad_config = write_inputs("50\nwide\n3\n", "0 0 0\n", CUBE);
    let mut env = env();
    assert!(matches!(
        open(&mut env, &bad_config),
        Err(EnvironmentError::InvalidConfig { path: Some(_) })
    ));
    assert!(env.source_paths().is_none());

    let bad_data = write_inputs("50\n50\n1\n", "0 0 0\n", "{ not json");
    let err = open(&mut env, &bad_data).unwrap_err();
    assert!(matches!(err, EnvironmentError::InvalidData { .. }));
    assert_eq!(err.status(), 1);
    assert_eq!(env.state(), EnvironmentState::Empty);

    let missing = Path::new("/nonexistent/robots.json");
    let err = env
        .open(&bad_data.config, &bad_data.position, missing)
        .unwrap_err();
    assert!(matches!(err, EnvironmentError::InvalidData { .. }));
}

#[test]
fn test_clear_resets_everything() {
    let mut env = env();
    env.open_with(
        Some("arena".to_string()),
        cubes(&[[0, 0]]),
        EnvironmentConfig::new(50.0, 50.0, 1),
    )
    .unwrap();
    assert_eq!(env.name(), Some("arena"));

    assert_eq!(env.clear(), ClearOutcome::Cleared);
    assert_eq!(env.state(), EnvironmentState::Empty);
    assert!(env.scene().is_empty());
    assert!(env.terrain().is_none());
    assert!(env.robots().is_empty());
    assert_eq!(env.name(), None);
    assert!(env.config().is_none());
    assert!(env.data().is_none());
    assert!(!env.is_valid());

    assert_eq!(env.clear(), ClearOutcome::NothingToClear);
    assert_eq!(ClearOutcome::Cleared.to_string(), "Environment Cleared");
}

#[test]
fn test_focus_and_visibility() {
    let mut env = env();
    assert!(matches!(env.hide(), Err(EnvironmentError::NoEnvironment)));

    let data = RobotData::new(
        RobotSource::Swarm {
            swarm: vec![document("a", 0), document("b", 0)],
        },
        vec![IVec3::new(-10, 0, 0), IVec3::new(10, 0, 0)],
    );
    env.open_with(None, data, EnvironmentConfig::new(50.0, 50.0, 2))
        .unwrap();

    env.focus("b").unwrap();
    let a = env.robot("a").unwrap().root;
    let b = env.robot("b").unwrap().root;
    assert!(!env.scene().is_visible(a));
    assert!(env.scene().is_visible(b));

    assert!(matches!(
        env.focus("zzz"),
        Err(EnvironmentError::RobotNotFound { .. })
    ));

    env.unfocus();
    assert!(env.scene().is_visible(a));

    env.hide().unwrap();
    let terrain = env.terrain().and_then(|t| t.node).unwrap();
    assert!(!env.scene().is_visible(terrain));
    assert!(!env.scene().is_visible(b));
    env.show().unwrap();
    assert!(env.scene().is_visible(terrain));
}

#[test]
fn test_cancelled_build_is_discarded() {
    let token = CancelToken::new();
    token.cancel();
    let mut env = env().with_cancel_token(token.clone());

    let err = env
        .open_with(None, cubes(&[[0, 0]]), EnvironmentConfig::new(50.0, 50.0, 1))
        .unwrap_err();
    assert!(matches!(err, EnvironmentError::Cancelled { index: 0 }));
    assert!(env.scene().is_empty());

    token.reset();
    assert_eq!(
        env.open_with(None, cubes(&[[0, 0]]), EnvironmentConfig::new(50.0, 50.0, 1))
            .unwrap()
            .placed,
        1
    );
}

#[test]
fn test_save_load_through_environment() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = env().with_store(EnvironmentStore::new(dir.path()));

    assert!(matches!(env.save(Some("x")), Err(EnvironmentError::NothingToSave)));

    env.open_with(
        None,
        cubes(&[[0, 0], [10, 10]]),
        EnvironmentConfig::new(50.0, 50.0, 2),
    )
    .unwrap();
    assert!(matches!(env.save(None), Err(EnvironmentError::MissingName)));

    let path = env.save(Some("\"arena\"")).unwrap();
    assert_eq!(path, dir.path().join("arena.json"));
    assert_eq!(env.name(), Some("arena"));
    assert_eq!(env.list().unwrap(), vec!["arena".to_string()]);

    let mut other = Environment::new().with_store(EnvironmentStore::new(dir.path()));
    let summary = other.load("arena").unwrap();
    assert_eq!(summary.placed, 2);
    assert_eq!(other.name(), Some("arena"));
    assert_eq!(other.config(), env.config());

    assert!(matches!(
        other.load("missing"),
        Err(EnvironmentError::EnvironmentNotFound { .. })
    ));
}
