//! Base geometry for each component kind.
//!
//! Assembly asks a [`GeometryProvider`] for the unscaled shape of every part. The
//! shipped [`GeometryCatalog`] covers all kinds with cuboids in model units; a catalog
//! can also be read from a JSON file mapping kind names to full extents:
//!
//! ```json
//! { "CoreComponent": [45, 45, 45], "ActiveHinge": [50, 24, 25] }
//! ```

use std::collections::HashMap;
use std::path::Path;

use bevy_math::primitives::Cuboid;

use crate::component::ComponentKind;
use crate::error::{AssemblyError, EnvironmentError};

/// Source of component base geometry.
pub trait GeometryProvider {
    /// Unscaled geometry for `kind`, or [`AssemblyError::GeometryNotFound`].
    fn load_geometry(&self, kind: ComponentKind) -> Result<Cuboid, AssemblyError>;
}

/// Kind-to-cuboid lookup table.
#[derive(Clone, Debug)]
pub struct GeometryCatalog {
    shapes: HashMap<ComponentKind, Cuboid>,
}

impl Default for GeometryCatalog {
    /// The built-in table: full extents (x, y, z) in model units, x along the mount axis.
    fn default() -> Self {
        let table = [
            (ComponentKind::Core, [45.0, 45.0, 45.0]),
            (ComponentKind::FixedBrick, [35.0, 35.0, 35.0]),
            (ComponentKind::ActiveHinge, [50.0, 24.0, 25.0]),
            (ComponentKind::PassiveHinge, [40.0, 24.0, 25.0]),
            (ComponentKind::ActiveWheel, [12.0, 60.0, 60.0]),
            (ComponentKind::PassiveWheel, [10.0, 50.0, 50.0]),
            (ComponentKind::IrSensor, [12.0, 26.0, 16.0]),
            (ComponentKind::TouchSensor, [20.0, 30.0, 12.0]),
            (ComponentKind::LightSensor, [12.0, 20.0, 16.0]),
        ];
        Self {
            shapes: table
                .into_iter()
                .map(|(kind, [x, y, z])| (kind, Cuboid::new(x, y, z)))
                .collect(),
        }
    }
}

impl GeometryCatalog {
    /// A catalog with no shapes at all.
    pub fn empty() -> Self {
        Self {
            shapes: HashMap::new(),
        }
    }

    pub fn with(mut self, kind: ComponentKind, shape: Cuboid) -> Self {
        self.shapes.insert(kind, shape);
        self
    }

    pub fn without(mut self, kind: ComponentKind) -> Self {
        self.shapes.remove(&kind);
        self
    }

    /// Parses a catalog. Kinds absent from the JSON keep their built-in shape.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let extents: HashMap<ComponentKind, [f32; 3]> = serde_json::from_str(text)?;
        Ok(extents
            .into_iter()
            .fold(Self::default(), |catalog, (kind, [x, y, z])| {
                catalog.with(kind, Cuboid::new(x, y, z))
            }))
    }

    pub fn load(path: &Path) -> Result<Self, EnvironmentError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }
}

impl GeometryProvider for GeometryCatalog {
    fn load_geometry(&self, kind: ComponentKind) -> Result<Cuboid, AssemblyError> {
        self.shapes
            .get(&kind)
            .copied()
            .ok_or(AssemblyError::GeometryNotFound { kind })
    }
}

impl<G: GeometryProvider + ?Sized> GeometryProvider for &G {
    fn load_geometry(&self, kind: ComponentKind) -> Result<Cuboid, AssemblyError> {
        (**self).load_geometry(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_builtin_covers_every_kind() {
        let catalog = GeometryCatalog::default();
        for kind in ComponentKind::ALL {
            assert!(catalog.load_geometry(kind).is_ok(), "{kind} missing");
        }
    }

    #[test]
    fn test_json_overrides_builtin() {
        let catalog = GeometryCatalog::from_json(r#"{"FixedBrick": [10, 20, 30]}"#).unwrap();
        let brick = catalog.load_geometry(ComponentKind::FixedBrick).unwrap();
        assert_eq!(brick.half_size, Vec3::new(5.0, 10.0, 15.0));
        assert!(catalog.load_geometry(ComponentKind::Core).is_ok());
    }

    #[test]
    fn test_json_rejects_unknown_kind() {
        assert!(GeometryCatalog::from_json(r#"{"Thruster": [1, 1, 1]}"#).is_err());
    }

    #[test]
    fn test_missing_kind_is_not_found() {
        let catalog = GeometryCatalog::default().without(ComponentKind::IrSensor);
        assert!(matches!(
            catalog.load_geometry(ComponentKind::IrSensor),
            Err(AssemblyError::GeometryNotFound {
                kind: ComponentKind::IrSensor
            })
        ));
    }
}
