// tests/placement.rs
use glam::IVec3;
use pretty_assertions::assert_eq;
use robogen_swarm::{
    BodySpec, Color, ComponentKind, GeometryCatalog, ModelInstance, PartSpec, PlacementError,
    Robot, RobotAssembler, RobotDocument, Scene, Terrain, validate_placement,
};

fn cube_at(scene: &mut Scene, id: &str, x: i32, y: i32) -> ModelInstance {
    let document = RobotDocument {
        id: id.to_string(),
        body: BodySpec {
            part: vec![PartSpec::new("core", ComponentKind::Core, 0).root()],
            connection: vec![],
        },
        brain: serde_json::Value::Null,
    };
    let robot = Robot::with_color(
        &document,
        IVec3::new(x, y, 0),
        Color::from_rgba8([50, 168, 68, 100]),
    )
    .unwrap();
    RobotAssembler::default()
        .assemble(robot, scene, &GeometryCatalog::default())
        .unwrap()
}

#[test]
fn test_separate_robots_are_accepted() {
    let mut scene = Scene::new();
    let terrain = Terrain::new(50.0, 50.0);
    let a = cube_at(&mut scene, "a", 0, 0);
    let b = cube_at(&mut scene, "b", 10, 0);

    assert!(!a.collides(&b));
    assert_eq!(validate_placement(&b, &[a], &terrain), Ok(()));
}

#[test]
fn test_overlapping_footprints_collide() {
    let mut scene = Scene::new();
    let terrain = Terrain::new(50.0, 50.0);
    let a = cube_at(&mut scene, "a", 0, 0);
    let b = cube_at(&mut scene, "b", 3, 3);

    assert!(a.collides(&b));
    assert!(b.collides(&a));
    assert_eq!(
        validate_placement(&b, &[a], &terrain),
        Err(PlacementError::Collision {
            id: "b".to_string(),
            other: "a".to_string()
        })
    );
}

#[test]
fn test_collision_reported_before_bounds() {
    let mut scene = Scene::new();
    let terrain = Terrain::new(10.0, 10.0);
    let a = cube_at(&mut scene, "a", 9, 0);
    let b = cube_at(&mut scene, "b", 9, 1);

    assert!(!b.in_bounds(&terrain));
    assert!(matches!(
        validate_placement(&b, &[a], &terrain),
        Err(PlacementError::Collision { .. })
    ));
}

#[test]
fn test_robot_past_terrain_edge_is_rejected() {
    let mut scene = Scene::new();
    let terrain = Terrain::new(20.0, 20.0);
    let edge = cube_at(&mut scene, "edge", 18, 0);

    assert_eq!(
        validate_placement(&edge, &[], &terrain),
        Err(PlacementError::OutOfBounds {
            id: "edge".to_string()
        })
    );
    assert_eq!(
        PlacementError::OutOfBounds {
            id: "edge".to_string()
        }
        .to_string(),
        "Robot [id = edge]: Out of Bounds"
    );
}
