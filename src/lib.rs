//! Procedural room building for a text world laid out on an integer lattice.
//!
//! Rooms live in a directed exit graph ([`rooms::RoomGraph`]) and, once the coordinate system is
//! initialized, at unique lattice points ([`coords::CoordIndex`]). The generators in
//! [`map_types`] place whole blocks of rooms at once; [`deletion`] removes them again.

pub mod audit;
pub mod block;
pub mod commands;
pub mod config;
pub mod coords;
pub mod deletion;
pub mod direction;
pub mod error;
pub mod graph;
pub mod map_types;
pub mod rooms;
pub mod sampling;
pub mod store;
pub mod world;

pub use config::BuilderConfig;
pub use direction::Direction;
pub use error::{BuildError, Result};
pub use rooms::{RoomGraph, RoomId};
pub use store::{AttributeStore, MemoryStore, RonFileStore};
pub use world::World;
