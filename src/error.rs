use crate::{direction::Direction, rooms::RoomId, store::StoreError};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

/// Every failure here aborts only the operation that raised it. Whatever was built before the
/// failure stays in place and stays consistent.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown direction '{0}'; use n, ne, e, se, s, sw, w, nw or their long forms")]
    UnknownDirection(String),
    #[error("direction '{0}' is not allowed here; use north, east, south or west")]
    InvalidDirection(Direction),
    #[error("room {occupant} already exists at coordinates ({x}, {y}, {z})")]
    CoordinateOccupied {
        x: i32,
        y: i32,
        z: i32,
        occupant: RoomId,
    },
    #[error("room {room} already has an exit {direction}")]
    DuplicateExit { room: RoomId, direction: Direction },
    #[error("invalid room count {0}; counts must be at least 1 and fit on the map")]
    InvalidCount(usize),
    #[error("there is no map {direction} of ({x}, {y}, {z})")]
    OutOfRange {
        x: i32,
        y: i32,
        z: i32,
        direction: Direction,
    },
    #[error("no rooms found in block {0}")]
    UnknownBlock(u32),
    #[error("you cannot delete block {block} while you are standing in it")]
    CannotDeleteCurrentLocation { block: u32 },
    #[error("the coordinate system hasn't been initialized; use initcoords first")]
    NotInitialized,
    #[error("the coordinate system is already initialized")]
    AlreadyInitialized,
    #[error("no such room {0}")]
    UnknownRoom(RoomId),
    #[error("invalid builder config: {0}")]
    Config(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
