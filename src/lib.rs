//! # robogen-swarm
//!
//! Assembly and placement engine for swarms of modular robots described in the
//! [Robogen](https://robogen.org) body format.
//!
//! A robot body is a flat list of typed parts plus a connection list. This crate turns
//! it into a rooted component tree, assembles every component into a scene graph by
//! composing slot rotations and offsets, and places the assembled robot on a bounded
//! terrain, rejecting robots that collide with one another or leave the terrain. The
//! [`Environment`] runs this for a whole swarm, tolerating individual robot failures.

pub mod builder;
pub mod component;
pub mod environment;
pub mod error;
pub mod geometry;
pub mod logger;
pub mod placement;
pub mod robot;
pub mod scene;
pub mod storage;
pub mod tree;

pub use builder::*;
pub use component::*;
pub use environment::*;
pub use error::*;
pub use geometry::*;
pub use logger::*;
pub use placement::*;
pub use robot::*;
pub use scene::*;
pub use storage::*;
pub use tree::*;
