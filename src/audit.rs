//! Consistency checks between the coordinate index and the exit graph.

use crate::{
    direction::{Direction, ALL_DIRECTIONS},
    error::{BuildError, Result},
    rooms::RoomId,
    store::AttributeStore,
    world::World,
};

use ilattice3::Point;

#[derive(Clone, Debug, PartialEq)]
pub enum ExitStatus {
    /// The destination sits exactly one step away in the exit's direction.
    Valid(Point),
    NonAdjacent(Point),
    Unplaced,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExitCheck {
    pub key: String,
    pub destination: RoomId,
    pub status: ExitStatus,
}

#[derive(Clone, Debug)]
pub struct RoomCheck {
    pub room: RoomId,
    pub name: String,
    pub block: Option<u32>,
    pub at: Point,
    pub exits: Vec<ExitCheck>,
}

/// Checks every exit of `room` against the coordinates of both ends.
pub fn check_room<S: AttributeStore>(world: &World<S>, room: RoomId) -> Result<RoomCheck> {
    let at = world.require_coords(room)?;
    let (name, block) = world
        .rooms
        .room(room)
        .map(|r| (r.name.clone(), r.block))
        .ok_or(BuildError::UnknownRoom(room))?;

    let exits = world
        .rooms
        .exits_from(room)
        .into_iter()
        .map(|e| {
            let status = match world.rooms.locate(e.destination) {
                None => ExitStatus::Unplaced,
                Some(dest) => {
                    let matches = match (e.exit.direction(), Direction::between(at, dest)) {
                        (Some(named), Some(actual)) => named == actual,
                        // Non-compass exits only need adjacency.
                        (None, actual) => actual.is_some(),
                        (Some(_), None) => false,
                    };
                    if matches {
                        ExitStatus::Valid(dest)
                    } else {
                        ExitStatus::NonAdjacent(dest)
                    }
                }
            };

            ExitCheck {
                key: e.exit.key.clone(),
                destination: e.destination,
                status,
            }
        })
        .collect();

    Ok(RoomCheck {
        room,
        name,
        block,
        at,
        exits,
    })
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Violation {
    /// The coordinate index doesn't round-trip for this room.
    BrokenIndex(RoomId),
    /// The index holds a room the graph doesn't.
    DanglingCoordinate(RoomId),
    /// A compass exit between placed rooms doesn't match their displacement.
    MisplacedExit {
        source: RoomId,
        destination: RoomId,
        key: String,
    },
    DuplicateDirection { room: RoomId, direction: Direction },
    /// The room says it belongs to a block whose tag it doesn't carry.
    UntaggedMember { room: RoomId, block: u32 },
}

/// Every breach of the world's structural invariants. Empty means consistent.
pub fn audit<S: AttributeStore>(world: &World<S>) -> Vec<Violation> {
    let mut violations = Vec::new();
    let coords = world.rooms.coords();

    for (room, at) in coords.entries().into_iter() {
        if coords.lookup(at) != Some(room) {
            violations.push(Violation::BrokenIndex(room));
        }
        if !world.rooms.contains(room) {
            violations.push(Violation::DanglingCoordinate(room));
        }
    }

    for e in world.rooms.all_exits().into_iter() {
        let direction = match e.exit.direction() {
            Some(d) => d,
            None => continue,
        };
        if let (Some(a), Some(b)) = (
            world.rooms.locate(e.source),
            world.rooms.locate(e.destination),
        ) {
            if Direction::between(a, b) != Some(direction) {
                violations.push(Violation::MisplacedExit {
                    source: e.source,
                    destination: e.destination,
                    key: e.exit.key.clone(),
                });
            }
        }
    }

    for room in world.rooms.room_ids().into_iter() {
        if let Some(block) = world.rooms.room(room).and_then(|r| r.block) {
            if !world.members_of(block).contains(&room) {
                violations.push(Violation::UntaggedMember { room, block });
            }
        }

        let exits = world.rooms.exits_from(room);
        for d in ALL_DIRECTIONS.iter() {
            let matching = exits
                .iter()
                .filter(|e| e.exit.answers_to(d.short_name()) || e.exit.answers_to(d.long_name()))
                .count();
            if matching > 1 {
                violations.push(Violation::DuplicateDirection {
                    room,
                    direction: *d,
                });
            }
        }
    }

    violations
}
