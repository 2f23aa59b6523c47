//! Component kinds and the body description they are read from.
//!
//! A robot body is a flat list of [`PartSpec`]s plus a list of [`ConnectionSpec`]s
//! (Robogen body format). Each part names a [`ComponentKind`], whose geometric traits
//! drive how the part is mounted during assembly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of discrete attachment slots a component exposes.
pub const SLOT_COUNT: usize = 4;

/// Every kind of rigid part a robot body can be made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    #[serde(rename = "CoreComponent")]
    Core,
    FixedBrick,
    ActiveHinge,
    PassiveHinge,
    ActiveWheel,
    PassiveWheel,
    IrSensor,
    TouchSensor,
    LightSensor,
}

/// Static geometric/rendering traits of a [`ComponentKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindTraits {
    /// Exposes a connection slot that pluggable parts slide into.
    pub provides_slot: bool,
    /// Plugs into a slot of its parent.
    pub pluggable: bool,
    /// Mount orientation is fixed; the part's own orientation is never applied.
    pub direction_locked: bool,
    /// Cannot carry children.
    pub terminal: bool,
    /// Base RGBA colour (0-255).
    pub color: [u8; 4],
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 9] = [
        ComponentKind::Core,
        ComponentKind::FixedBrick,
        ComponentKind::ActiveHinge,
        ComponentKind::PassiveHinge,
        ComponentKind::ActiveWheel,
        ComponentKind::PassiveWheel,
        ComponentKind::IrSensor,
        ComponentKind::TouchSensor,
        ComponentKind::LightSensor,
    ];

    /// Static trait table entry for this kind.
    pub const fn traits(self) -> KindTraits {
        use ComponentKind::*;
        const fn brick(color: [u8; 4]) -> KindTraits {
            KindTraits {
                provides_slot: true,
                pluggable: false,
                direction_locked: false,
                terminal: false,
                color,
            }
        }
        const fn mounted(terminal: bool, color: [u8; 4]) -> KindTraits {
            KindTraits {
                provides_slot: false,
                pluggable: true,
                direction_locked: true,
                terminal,
                color,
            }
        }
        match self {
            Core => brick([50, 168, 68, 100]),
            FixedBrick => brick([168, 60, 50, 100]),
            ActiveHinge => mounted(false, [89, 20, 66, 0]),
            PassiveHinge => mounted(false, [112, 28, 186, 100]),
            ActiveWheel => mounted(true, [46, 62, 184, 100]),
            PassiveWheel => mounted(true, [255, 128, 0, 0]),
            IrSensor => mounted(true, [255, 215, 0, 0]),
            TouchSensor | LightSensor => mounted(true, [112, 28, 186, 100]),
        }
    }

    /// True for parts exposing a slot that pluggable parts slide into.
    pub const fn provides_slot(self) -> bool {
        self.traits().provides_slot
    }

    /// True for parts that plug into their parent's slot.
    pub const fn pluggable(self) -> bool {
        self.traits().pluggable
    }

    /// True when the part's own orientation is never applied.
    pub const fn direction_locked(self) -> bool {
        self.traits().direction_locked
    }

    /// True for wheels and sensors, which cannot carry children.
    pub const fn is_terminal(self) -> bool {
        self.traits().terminal
    }

    /// Base display colour.
    pub fn color(self) -> Color {
        Color::from_rgba8(self.traits().color)
    }

    /// The Robogen `type` string for this kind.
    pub const fn name(self) -> &'static str {
        match self {
            ComponentKind::Core => "CoreComponent",
            ComponentKind::FixedBrick => "FixedBrick",
            ComponentKind::ActiveHinge => "ActiveHinge",
            ComponentKind::PassiveHinge => "PassiveHinge",
            ComponentKind::ActiveWheel => "ActiveWheel",
            ComponentKind::PassiveWheel => "PassiveWheel",
            ComponentKind::IrSensor => "IrSensor",
            ComponentKind::TouchSensor => "TouchSensor",
            ComponentKind::LightSensor => "LightSensor",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a `type` string names no known kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl FromStr for ComponentKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// RGBA colour with channels normalised to `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color(pub [f32; 4]);

impl Color {
    /// Converts 0-255 channels.
    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        Self(rgba.map(|c| c as f32 / 255.0))
    }

    /// Scales RGB by `1 - amount`, keeping alpha.
    pub fn darken(&self, amount: f32) -> [f32; 4] {
        self.scaled(1.0 - amount)
    }

    /// Scales RGB by `1 + amount`, keeping alpha.
    pub fn lighten(&self, amount: f32) -> [f32; 4] {
        self.scaled(1.0 + amount)
    }

    fn scaled(&self, factor: f32) -> [f32; 4] {
        let [r, g, b, a] = self.0;
        let round3 = |x: f32| (x * factor * 1000.0).round() / 1000.0;
        [round3(r), round3(g), round3(b), a]
    }
}

/// Surface description handed to the scene alongside geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub shininess: f32,
    pub refractive_index: f32,
    pub diffuse: [f32; 4],
    pub emission: [f32; 4],
    pub specular: [f32; 4],
}

impl Material {
    /// The standard component finish.
    pub fn component(color: Color) -> Self {
        Self {
            shininess: 8.0,
            refractive_index: 0.8,
            diffuse: color.darken(0.9),
            emission: color.darken(0.6),
            specular: color.lighten(1.2),
        }
    }

    /// The matte finish used for the terrain slab.
    pub fn terrain(color: Color) -> Self {
        Self {
            shininess: 15.0,
            refractive_index: 0.5,
            diffuse: color.darken(0.9),
            emission: color.darken(0.7),
            specular: color.lighten(0.2),
        }
    }
}

// --- Body description (Robogen JSON) ---

/// One entry of the body's `part` list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    pub id: String,

    /// Robogen kind name, e.g. `"ActiveHinge"`. Kept as a string so unknown
    /// kinds can be reported and skipped instead of failing the whole document.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub root: bool,

    /// Raw orientation in quarter turns (`0..=3`).
    #[serde(default)]
    pub orientation: i64,
}

/// One entry of the body's `connection` list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub src: String,
    pub dest: String,

    #[serde(rename = "srcSlot")]
    pub src_slot: i64,

    #[serde(rename = "destSlot", default, skip_serializing_if = "Option::is_none")]
    pub dest_slot: Option<i64>,
}

/// The `body` object of a robot document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    #[serde(default)]
    pub part: Vec<PartSpec>,
    #[serde(default)]
    pub connection: Vec<ConnectionSpec>,
}

impl PartSpec {
    /// A non-root part of `kind`.
    pub fn new(id: impl Into<String>, kind: ComponentKind, orientation: i64) -> Self {
        Self {
            id: id.into(),
            kind: kind.name().to_string(),
            root: false,
            orientation,
        }
    }

    /// Marks the part as the robot's root.
    pub fn root(mut self) -> Self {
        self.root = true;
        self
    }
}

impl ConnectionSpec {
    /// A connection from `src_slot` of `src` to `dest`.
    pub fn new(src: impl Into<String>, dest: impl Into<String>, src_slot: i64) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
            src_slot,
            dest_slot: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in ComponentKind::ALL {
            assert_eq!(kind.name().parse::<ComponentKind>(), Ok(kind));
        }
        assert!("Thruster".parse::<ComponentKind>().is_err());
    }

    #[test]
    fn test_trait_table() {
        assert!(ComponentKind::Core.provides_slot());
        assert!(ComponentKind::FixedBrick.provides_slot());
        assert!(!ComponentKind::ActiveHinge.provides_slot());

        assert!(ComponentKind::PassiveHinge.pluggable());
        assert!(ComponentKind::LightSensor.direction_locked());
        assert!(!ComponentKind::Core.direction_locked());

        assert!(ComponentKind::ActiveWheel.is_terminal());
        assert!(ComponentKind::IrSensor.is_terminal());
        assert!(!ComponentKind::ActiveHinge.is_terminal());
        assert!(!ComponentKind::FixedBrick.is_terminal());
    }

    #[test]
    fn test_material_from_core_color() {
        let material = Material::component(ComponentKind::Core.color());
        // 50/255 * 0.1 rounded to 3 places
        assert_eq!(material.diffuse[0], 0.02);
        assert_eq!(material.diffuse[3], 100.0 / 255.0);
        assert_eq!(material.shininess, 8.0);
    }

    #[test]
    fn test_part_spec_deserializes_robogen_fields() {
        let part: PartSpec = serde_json::from_str(
            r#"{"id": "Core", "type": "CoreComponent", "root": true, "orientation": 0}"#,
        )
        .unwrap();
        assert!(part.root);
        assert_eq!(part.kind, "CoreComponent");

        let conn: ConnectionSpec =
            serde_json::from_str(r#"{"src": "Core", "dest": "Hinge", "srcSlot": 2, "destSlot": 0}"#)
                .unwrap();
        assert_eq!(conn.src_slot, 2);
        assert_eq!(conn.dest_slot, Some(0));
    }
}
