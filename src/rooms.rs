//! Rooms and the one-way exits between them.
//!
//! Rooms are nodes of a `StableGraph` and exits are its directed edges. Room ids are handed out
//! sequentially and never reused, so they stay valid after deletions even though the graph
//! recycles node slots.

use crate::{
    coords::CoordIndex,
    direction::{Direction, NameForm},
    error::{BuildError, Result},
};

use fnv::FnvHashMap;
use ilattice3::Point;
use petgraph::{
    graph::NodeIndex,
    stable_graph::StableGraph,
    visit::{EdgeRef, IntoEdgeReferences},
    Incoming, Outgoing,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub block: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Exit {
    pub key: String,
    pub aliases: Vec<String>,
}

impl Exit {
    pub fn for_direction(direction: Direction, primary: NameForm) -> Self {
        let alias_form = match primary {
            NameForm::Short => NameForm::Long,
            NameForm::Long => NameForm::Short,
        };

        Exit {
            key: direction.name(primary).to_string(),
            aliases: vec![direction.name(alias_form).to_string()],
        }
    }

    pub fn answers_to(&self, word: &str) -> bool {
        self.key.eq_ignore_ascii_case(word)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(word))
    }

    /// The compass direction named by the key or any alias.
    pub fn direction(&self) -> Option<Direction> {
        std::iter::once(&self.key)
            .chain(self.aliases.iter())
            .find_map(|w| Direction::resolve(w).ok())
    }
}

/// A borrowed view of one exit with its endpoints.
#[derive(Clone, Copy, Debug)]
pub struct ExitRef<'a> {
    pub source: RoomId,
    pub destination: RoomId,
    pub exit: &'a Exit,
}

/// What `remove_room` tore down.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Removal {
    pub rooms: usize,
    pub exits: usize,
}

impl std::ops::AddAssign for Removal {
    fn add_assign(&mut self, other: Self) {
        self.rooms += other.rooms;
        self.exits += other.exits;
    }
}

/// Serialized form of the graph, persisted alongside the coordinate map.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RoomSnapshot {
    pub next_room_id: u32,
    pub rooms: Vec<Room>,
    pub exits: Vec<(RoomId, RoomId, Exit)>,
}

#[derive(Clone, Debug)]
pub struct RoomGraph {
    graph: StableGraph<Room, Exit>,
    nodes: FnvHashMap<RoomId, NodeIndex>,
    next_room_id: u32,
    coords: CoordIndex,
}

impl Default for RoomGraph {
    fn default() -> Self {
        RoomGraph {
            graph: StableGraph::new(),
            nodes: FnvHashMap::default(),
            next_room_id: 1,
            coords: CoordIndex::new(),
        }
    }
}

impl RoomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coords(&self) -> &CoordIndex {
        &self.coords
    }

    pub fn coords_mut(&mut self) -> &mut CoordIndex {
        &mut self.coords
    }

    pub fn graph(&self) -> &StableGraph<Room, Exit> {
        &self.graph
    }

    pub fn node(&self, id: RoomId) -> Option<NodeIndex> {
        self.nodes.get(&id).cloned()
    }

    pub fn contains(&self, id: RoomId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.node(id).and_then(|n| self.graph.node_weight(n))
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        let n = self.node(id)?;

        self.graph.node_weight_mut(n)
    }

    pub fn room_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn exit_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<_> = self.nodes.keys().cloned().collect();
        ids.sort();

        ids
    }

    pub fn locate(&self, id: RoomId) -> Option<Point> {
        self.coords.locate(id)
    }

    /// Creates a room, placing it at `at` when given. Nothing is created if the placement fails.
    pub fn create_room(&mut self, name: &str, at: Option<Point>) -> Result<RoomId> {
        let id = RoomId(self.next_room_id);
        if let Some(p) = at {
            self.coords.place(id, p)?;
        }
        self.next_room_id += 1;
        let n = self.graph.add_node(Room {
            id,
            name: name.to_string(),
            block: None,
        });
        self.nodes.insert(id, n);

        Ok(id)
    }

    /// The id the next `create_room` call will hand out.
    pub fn peek_next_id(&self) -> RoomId {
        RoomId(self.next_room_id)
    }

    pub fn exits_from(&self, id: RoomId) -> Vec<ExitRef<'_>> {
        let n = match self.node(id) {
            Some(n) => n,
            None => return Vec::new(),
        };

        self.graph
            .edges_directed(n, Outgoing)
            .map(|e| ExitRef {
                source: id,
                destination: self.graph[e.target()].id,
                exit: e.weight(),
            })
            .collect()
    }

    pub fn all_exits(&self) -> Vec<ExitRef<'_>> {
        (&self.graph)
            .edge_references()
            .map(|e| ExitRef {
                source: self.graph[e.source()].id,
                destination: self.graph[e.target()].id,
                exit: e.weight(),
            })
            .collect()
    }

    pub fn has_exit(&self, id: RoomId, direction: Direction) -> bool {
        self.exits_from(id).iter().any(|e| {
            e.exit.answers_to(direction.short_name()) || e.exit.answers_to(direction.long_name())
        })
    }

    /// Adds a one-way exit keyed by the long form of `direction`.
    pub fn link_exit(&mut self, from: RoomId, to: RoomId, direction: Direction) -> Result<()> {
        self.link_exit_named(from, to, direction, NameForm::Long)
    }

    /// Adds a one-way exit keyed by `direction` spelled in `primary` form, aliased by the other.
    pub fn link_exit_named(
        &mut self,
        from: RoomId,
        to: RoomId,
        direction: Direction,
        primary: NameForm,
    ) -> Result<()> {
        let src = self.node(from).ok_or(BuildError::UnknownRoom(from))?;
        let dst = self.node(to).ok_or(BuildError::UnknownRoom(to))?;
        if self.has_exit(from, direction) {
            return Err(BuildError::DuplicateExit {
                room: from,
                direction,
            });
        }
        self.graph
            .add_edge(src, dst, Exit::for_direction(direction, primary));

        Ok(())
    }

    /// Links `from -> to` through `direction` and, only if that succeeded, `to -> from` through
    /// the opposite. A blocked return exit leaves the forward exit standing.
    ///
    /// Returns the number of exits created.
    pub fn link_bidirectional(
        &mut self,
        from: RoomId,
        to: RoomId,
        direction: Direction,
    ) -> Result<usize> {
        self.link_bidirectional_named(from, to, direction, NameForm::Long)
    }

    pub fn link_bidirectional_named(
        &mut self,
        from: RoomId,
        to: RoomId,
        direction: Direction,
        primary: NameForm,
    ) -> Result<usize> {
        self.link_exit_named(from, to, direction, primary)?;
        match self.link_exit(to, from, direction.opposite()) {
            Ok(()) => Ok(2),
            Err(BuildError::DuplicateExit { .. }) => {
                log::warn!(
                    "Return exit {} from {} to {} is blocked; leaving a one-way exit",
                    direction.opposite(),
                    to,
                    from
                );
                Ok(1)
            }
            Err(e) => Err(e),
        }
    }

    /// Like `link_bidirectional`, but an existing forward exit is a silent skip.
    pub fn link_if_none(&mut self, from: RoomId, to: RoomId, direction: Direction) -> Result<usize> {
        self.link_if_none_named(from, to, direction, NameForm::Long)
    }

    pub fn link_if_none_named(
        &mut self,
        from: RoomId,
        to: RoomId,
        direction: Direction,
        primary: NameForm,
    ) -> Result<usize> {
        if self.has_exit(from, direction) {
            return Ok(0);
        }

        self.link_bidirectional_named(from, to, direction, primary)
    }

    /// Removes the room, every exit leaving it, every exit leading into it, and its coordinate.
    /// Removing a room that is already gone removes nothing.
    pub fn remove_room(&mut self, id: RoomId) -> Removal {
        self.coords.remove(id);
        let n = match self.nodes.remove(&id) {
            Some(n) => n,
            None => return Removal::default(),
        };

        let outgoing = self.graph.edges_directed(n, Outgoing).count();
        // Self-loops are counted once, as outgoing.
        let incoming = self
            .graph
            .neighbors_directed(n, Incoming)
            .filter(|m| *m != n)
            .count();
        self.graph.remove_node(n);

        Removal {
            rooms: 1,
            exits: outgoing + incoming,
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        let mut rooms: Vec<Room> = self
            .graph
            .node_indices()
            .map(|n| self.graph[n].clone())
            .collect();
        rooms.sort_by_key(|r| r.id);

        RoomSnapshot {
            next_room_id: self.next_room_id,
            rooms,
            exits: self
                .all_exits()
                .into_iter()
                .map(|e| (e.source, e.destination, e.exit.clone()))
                .collect(),
        }
    }

    /// Rebuilds the graph. Coordinates of rooms missing from the snapshot are dropped.
    pub fn restore(snapshot: RoomSnapshot, coords: CoordIndex) -> Self {
        let mut rooms = RoomGraph::new();
        rooms.next_room_id = snapshot.next_room_id.max(1);
        for room in snapshot.rooms.into_iter() {
            rooms.next_room_id = rooms.next_room_id.max(room.id.0 + 1);
            let id = room.id;
            let n = rooms.graph.add_node(room);
            rooms.nodes.insert(id, n);
        }
        for (source, destination, exit) in snapshot.exits.into_iter() {
            match (rooms.node(source), rooms.node(destination)) {
                (Some(s), Some(d)) => {
                    rooms.graph.add_edge(s, d, exit);
                }
                _ => log::warn!(
                    "Dropping exit '{}' from {} to {}: endpoint missing",
                    exit.key,
                    source,
                    destination
                ),
            }
        }
        for (id, p) in coords.entries().into_iter() {
            if rooms.contains(id) {
                // Entries come from a bijection, so this can't collide.
                let _ = rooms.coords.place(id, p);
            } else {
                log::warn!(
                    "Dropping stale coordinates ({}, {}, {}) of missing room {}",
                    p.x,
                    p.y,
                    p.z,
                    id
                );
            }
        }

        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32, z: i32) -> Point {
        [x, y, z].into()
    }

    #[test]
    fn create_room_with_coordinate_is_atomic() {
        let mut rooms = RoomGraph::new();
        let a = rooms.create_room("A", Some(p(0, 0, 0))).unwrap();

        assert!(matches!(
            rooms.create_room("B", Some(p(0, 0, 0))),
            Err(BuildError::CoordinateOccupied { occupant, .. }) if occupant == a
        ));
        assert_eq!(rooms.room_count(), 1);
        assert_eq!(rooms.coords().len(), 1);

        // The failed attempt didn't burn an id.
        let b = rooms.create_room("B", None).unwrap();
        assert_eq!(b, RoomId(a.0 + 1));
        assert_eq!(rooms.locate(b), None);
    }

    #[test]
    fn link_exit_uses_other_form_as_alias() {
        let mut rooms = RoomGraph::new();
        let a = rooms.create_room("A", None).unwrap();
        let b = rooms.create_room("B", None).unwrap();

        rooms.link_exit_named(a, b, Direction::North, NameForm::Short).unwrap();
        let exits = rooms.exits_from(a);
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].exit.key, "n");
        assert_eq!(exits[0].exit.aliases, vec!["north".to_string()]);
        assert_eq!(exits[0].destination, b);
        assert_eq!(exits[0].exit.direction(), Some(Direction::North));
    }

    #[test]
    fn duplicate_direction_is_rejected_regardless_of_form() {
        let mut rooms = RoomGraph::new();
        let a = rooms.create_room("A", None).unwrap();
        let b = rooms.create_room("B", None).unwrap();
        let c = rooms.create_room("C", None).unwrap();

        rooms.link_exit_named(a, b, Direction::East, NameForm::Short).unwrap();
        assert!(rooms.has_exit(a, Direction::East));
        assert!(matches!(
            rooms.link_exit(a, c, Direction::East),
            Err(BuildError::DuplicateExit { direction: Direction::East, .. })
        ));
        assert_eq!(rooms.exit_count(), 1);
    }

    #[test]
    fn bidirectional_link_keeps_forward_when_return_is_blocked() {
        let mut rooms = RoomGraph::new();
        let a = rooms.create_room("A", None).unwrap();
        let b = rooms.create_room("B", None).unwrap();
        let c = rooms.create_room("C", None).unwrap();
        rooms.link_exit(b, c, Direction::South).unwrap();

        assert_eq!(rooms.link_bidirectional(a, b, Direction::North).unwrap(), 1);
        assert!(rooms.has_exit(a, Direction::North));
        let back = rooms.exits_from(b);
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].destination, c);
    }

    #[test]
    fn failed_forward_link_skips_return() {
        let mut rooms = RoomGraph::new();
        let a = rooms.create_room("A", None).unwrap();
        let b = rooms.create_room("B", None).unwrap();
        let c = rooms.create_room("C", None).unwrap();
        rooms.link_exit(a, c, Direction::West).unwrap();

        assert!(rooms.link_bidirectional(a, b, Direction::West).is_err());
        assert!(rooms.exits_from(b).is_empty());
        assert_eq!(rooms.link_if_none(a, b, Direction::West).unwrap(), 0);
    }

    #[test]
    fn remove_room_takes_both_directions_and_coordinate() {
        let mut rooms = RoomGraph::new();
        let a = rooms.create_room("A", Some(p(0, 0, 0))).unwrap();
        let b = rooms.create_room("B", Some(p(0, 1, 0))).unwrap();
        let c = rooms.create_room("C", Some(p(1, 1, 0))).unwrap();
        rooms.link_bidirectional(a, b, Direction::North).unwrap();
        rooms.link_bidirectional(b, c, Direction::East).unwrap();

        let removal = rooms.remove_room(b);
        assert_eq!(removal, Removal { rooms: 1, exits: 4 });
        assert_eq!(rooms.exit_count(), 0);
        assert!(!rooms.coords().is_occupied(p(0, 1, 0)));
        assert!(rooms.exits_from(a).is_empty());

        assert_eq!(rooms.remove_room(b), Removal::default());
    }

    #[test]
    fn snapshot_restores_rooms_exits_and_coordinates() {
        let mut rooms = RoomGraph::new();
        let a = rooms.create_room("A", Some(p(0, 0, 0))).unwrap();
        let b = rooms.create_room("B", Some(p(1, 0, 0))).unwrap();
        rooms.link_bidirectional(a, b, Direction::East).unwrap();

        let mut coords = rooms.coords().clone();
        // A stale entry for a room that no longer exists.
        coords.place(RoomId(99), p(5, 5, 5)).unwrap();
        let restored = RoomGraph::restore(rooms.snapshot(), coords);

        assert_eq!(restored.room_count(), 2);
        assert_eq!(restored.exit_count(), 2);
        assert_eq!(restored.locate(b), Some(p(1, 0, 0)));
        assert_eq!(restored.coords().lookup(p(5, 5, 5)), None);
        assert_eq!(restored.peek_next_id(), RoomId(3));
    }
}
