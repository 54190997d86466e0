use crate::{
    config::MazeConfig,
    direction::{Direction, NameForm},
    error::{BuildError, Result},
    map_types::grid::connect_to_neighbors,
    rooms::{RoomGraph, RoomId},
    sampling::{coin_flip, shuffled_directions},
    store::AttributeStore,
    world::World,
};

use fnv::FnvHashSet;
use ilattice3::Point;
use rand::prelude::*;

/// A randomly grown cluster of rooms hanging off an existing room.
#[derive(Clone, Debug)]
pub struct MazeSpec {
    /// The room the maze grows from. It must have coordinates.
    pub from: RoomId,
    /// Where the first maze room goes, relative to `from`.
    pub direction: Direction,
    /// Spelling of the entrance exit's key.
    pub entrance_form: NameForm,
    pub count: usize,
    pub connect_external: bool,
}

#[derive(Clone, Debug)]
pub struct MazeOutcome {
    pub block: u32,
    /// In placement order.
    pub rooms: Vec<RoomId>,
    pub requested: usize,
    pub exits_created: usize,
}

impl MazeOutcome {
    /// True when the maze ran out of free cells before reaching the requested size.
    pub fn stopped_early(&self) -> bool {
        self.rooms.len() < self.requested
    }
}

impl MazeSpec {
    pub fn generate<S: AttributeStore>(&self, world: &mut World<S>) -> Result<MazeOutcome> {
        if self.count == 0 {
            return Err(BuildError::InvalidCount(self.count));
        }
        let origin = world.require_coords(self.from)?;
        let first_at = self.direction.try_step(origin)?;
        if let Some(occupant) = world.rooms.coords().lookup(first_at) {
            return Err(BuildError::CoordinateOccupied {
                x: first_at.x,
                y: first_at.y,
                z: first_at.z,
                occupant,
            });
        }

        let block = world.next_block()?;
        let tuning = world.config.maze.clone();
        log::debug!(
            "Generating maze block {} of {} rooms {} of {}",
            block,
            self.count,
            self.direction,
            self.from
        );

        let first = world.create_block_room(block, first_at)?;
        let mut exits_created = 0;
        if world.rooms.has_exit(self.from, self.direction) {
            log::warn!(
                "{} already has an exit {}; maze entrance left unlinked",
                self.from,
                self.direction
            );
        } else {
            exits_created += world.rooms.link_bidirectional_named(
                self.from,
                first,
                self.direction,
                self.entrance_form,
            )?;
        }

        let mut placed = vec![first];
        let mut members: FnvHashSet<RoomId> = placed.iter().cloned().collect();
        while placed.len() < self.count {
            let slot = find_free_slot(&world.rooms, &placed, &tuning, &mut world.rng);
            let (anchor, direction, at) = match slot {
                Some(slot) => slot,
                None => {
                    log::debug!(
                        "Maze block {} stopped early after {} of {} rooms",
                        block,
                        placed.len(),
                        self.count
                    );
                    break;
                }
            };

            let room = world.create_block_room(block, at)?;
            exits_created += world.rooms.link_if_none(anchor, room, direction)?;
            placed.push(room);
            members.insert(room);

            if coin_flip(&mut world.rng, tuning.extra_link_chance) {
                exits_created += add_extra_link(world, room, at, &members, tuning.extra_link_tries)?;
            }
        }

        if self.connect_external {
            for room in placed.iter() {
                if let Some(at) = world.rooms.locate(*room) {
                    exits_created += connect_to_neighbors(world, *room, at, &members)?;
                }
            }
        }

        log::info!(
            "Built maze block {}: {} of {} rooms, {} exits",
            block,
            placed.len(),
            self.count,
            exits_created
        );

        Ok(MazeOutcome {
            block,
            rooms: placed,
            requested: self.count,
            exits_created,
        })
    }
}

/// Tries up to `max_placement_attempts` distinct random anchors from `placed`, checking every
/// direction of each in random order, and returns the first free cell found.
fn find_free_slot(
    rooms: &RoomGraph,
    placed: &[RoomId],
    tuning: &MazeConfig,
    rng: &mut impl Rng,
) -> Option<(RoomId, Direction, Point)> {
    let anchors: Vec<RoomId> = placed
        .choose_multiple(rng, tuning.max_placement_attempts)
        .cloned()
        .collect();
    for anchor in anchors.into_iter() {
        let base = match rooms.locate(anchor) {
            Some(p) => p,
            None => continue,
        };
        for direction in shuffled_directions(rng).iter() {
            let at = match direction.step(base) {
                Some(at) => at,
                None => continue,
            };
            if !rooms.coords().is_occupied(at) {
                return Some((anchor, *direction, at));
            }
        }
    }

    None
}

/// Tries up to `tries` random directions from `room` for a maze neighbor it isn't linked to yet.
fn add_extra_link<S: AttributeStore>(
    world: &mut World<S>,
    room: RoomId,
    at: Point,
    members: &FnvHashSet<RoomId>,
    tries: usize,
) -> Result<usize> {
    let directions = shuffled_directions(&mut world.rng);
    for d in directions.iter().take(tries) {
        let neighbor = match d.step(at).and_then(|p| world.rooms.coords().lookup(p)) {
            Some(n) if members.contains(&n) => n,
            _ => continue,
        };
        if world.rooms.has_exit(room, *d) {
            continue;
        }
        log::debug!("Extra maze link {} {} to {}", room, d, neighbor);

        return world.rooms.link_bidirectional(room, neighbor, *d);
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audit::audit, config::BuilderConfig, store::MemoryStore};

    fn open_world(config: BuilderConfig) -> (World<MemoryStore>, RoomId) {
        let mut world = World::open(MemoryStore::new(), config).unwrap();
        let origin = world.rooms.create_room("Origin", None).unwrap();
        world
            .rooms
            .coords_mut()
            .initialize(origin, [1000, 1000, 1000].into())
            .unwrap();

        (world, origin)
    }

    fn seeded_world(seed: u64) -> (World<MemoryStore>, RoomId) {
        open_world(BuilderConfig {
            seed: Some(seed),
            ..BuilderConfig::default()
        })
    }

    fn maze(from: RoomId, direction: Direction, count: usize) -> MazeSpec {
        MazeSpec {
            from,
            direction,
            entrance_form: NameForm::Long,
            count,
            connect_external: false,
        }
    }

    /// Fills every empty cell within `radius` of the origin, except `free`, with unlinked rooms.
    fn wall_off(world: &mut World<MemoryStore>, free: &[(i32, i32)], radius: i32) {
        for x in 1000 - radius..=1000 + radius {
            for y in 1000 - radius..=1000 + radius {
                let p: Point = [x, y, 1000].into();
                if free.contains(&(x, y)) || world.rooms.coords().is_occupied(p) {
                    continue;
                }
                world.rooms.create_room("Wall", Some(p)).unwrap();
            }
        }
    }

    #[test]
    fn maze_places_requested_rooms_and_stays_consistent() {
        for seed in 0..20 {
            let (mut world, origin) = seeded_world(seed);
            let outcome = maze(origin, Direction::North, 12).generate(&mut world).unwrap();

            assert_eq!(outcome.rooms.len(), 12);
            assert!(!outcome.stopped_early());
            assert_eq!(
                world.rooms.locate(outcome.rooms[0]),
                Some([1000, 1001, 1000].into())
            );
            assert_eq!(world.members_of(outcome.block).len(), 12);
            assert!(world.block_is_connected(outcome.block));
            assert!(audit(&world).is_empty(), "seed {}", seed);
        }
    }

    #[test]
    fn open_space_never_stops_early() {
        for seed in 0..20 {
            let (mut world, origin) = seeded_world(seed);
            let outcome = maze(origin, Direction::East, 40).generate(&mut world).unwrap();

            assert_eq!(outcome.rooms.len(), 40, "seed {}", seed);
            assert!(world.block_is_connected(outcome.block));
        }
    }

    #[test]
    fn one_free_cell_beside_any_anchor_is_found() {
        for seed in 0..10 {
            let (mut world, origin) = seeded_world(seed);
            // Bent corridor: north twice, then northeast from the second room.
            wall_off(&mut world, &[(1000, 1001), (1000, 1002), (1001, 1003)], 3);

            let outcome = maze(origin, Direction::North, 3).generate(&mut world).unwrap();
            assert_eq!(outcome.rooms.len(), 3, "seed {}", seed);
            assert!(!outcome.stopped_early());
            assert_eq!(
                world.rooms.locate(outcome.rooms[2]),
                Some([1001, 1003, 1000].into())
            );
        }
    }

    #[test]
    fn entrance_is_linked_both_ways() {
        let (mut world, origin) = seeded_world(5);
        let mut spec = maze(origin, Direction::NorthWest, 1);
        spec.entrance_form = NameForm::Short;
        let outcome = spec.generate(&mut world).unwrap();
        let first = outcome.rooms[0];

        let forward = world.rooms.exits_from(origin);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].exit.key, "nw");
        assert_eq!(forward[0].destination, first);
        let back = world.rooms.exits_from(first);
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].exit.key, "southeast");
        assert_eq!(back[0].exit.aliases, vec!["se".to_string()]);
    }

    #[test]
    fn occupied_start_fails_without_consuming_a_block() {
        let (mut world, origin) = seeded_world(1);
        world
            .rooms
            .create_room("Squatter", Some([1001, 1000, 1000].into()))
            .unwrap();

        assert!(matches!(
            maze(origin, Direction::East, 3).generate(&mut world),
            Err(BuildError::CoordinateOccupied { x: 1001, .. })
        ));
        assert_eq!(world.next_block().unwrap(), 1);
    }

    #[test]
    fn unplaced_origin_is_not_initialized() {
        let mut world = World::open(MemoryStore::new(), BuilderConfig::default()).unwrap();
        let limbo = world.rooms.create_room("Limbo", None).unwrap();

        assert!(matches!(
            maze(limbo, Direction::East, 3).generate(&mut world),
            Err(BuildError::NotInitialized)
        ));
    }

    #[test]
    fn boxed_in_first_room_stops_at_one() {
        let (mut world, origin) = seeded_world(2);
        wall_off(&mut world, &[(1000, 1001)], 2);

        let outcome = maze(origin, Direction::North, 5).generate(&mut world).unwrap();
        assert_eq!(outcome.rooms.len(), 1);
        assert!(outcome.stopped_early());
        assert_eq!(world.members_of(outcome.block).len(), 1);
    }

    #[test]
    fn corridor_of_three_stops_at_three() {
        for seed in 0..10 {
            let (mut world, origin) = seeded_world(seed);
            // Only a three-cell corridor north of the origin is free.
            wall_off(&mut world, &[(1000, 1001), (1000, 1002), (1000, 1003)], 4);

            let outcome = maze(origin, Direction::North, 5).generate(&mut world).unwrap();
            assert_eq!(outcome.rooms.len(), 3, "seed {}", seed);
            assert_eq!(outcome.requested, 5);
            assert!(outcome.stopped_early());
            assert!(world.block_is_connected(outcome.block));
            assert!(audit(&world).is_empty());
        }
    }

    #[test]
    fn extra_links_only_join_maze_rooms() {
        let (mut world, origin) = open_world(BuilderConfig {
            seed: Some(11),
            maze: MazeConfig {
                extra_link_chance: 1.0,
                extra_link_tries: 8,
                ..MazeConfig::default()
            },
            ..BuilderConfig::default()
        });

        let outcome = maze(origin, Direction::South, 15).generate(&mut world).unwrap();
        let members = world.members_of(outcome.block);
        for room in outcome.rooms.iter() {
            for e in world.rooms.exits_from(*room) {
                assert!(members.contains(&e.destination) || e.destination == origin);
            }
        }
        // A tree of the maze plus its entrance has exactly two exits per room; extra links add
        // more.
        assert_eq!(outcome.rooms.len(), 15);
        assert!(world.rooms.exit_count() > 2 * outcome.rooms.len());
        assert!(audit(&world).is_empty());
    }

    #[test]
    fn connect_reaches_outside_neighbors() {
        let (mut world, origin) = seeded_world(3);
        let outside = world
            .rooms
            .create_room("Outside", Some([1001, 1002, 1000].into()))
            .unwrap();
        let mut spec = maze(origin, Direction::North, 1);
        spec.connect_external = true;

        let outcome = spec.generate(&mut world).unwrap();
        let first = outcome.rooms[0];
        assert!(world.rooms.has_exit(first, Direction::NorthEast));
        assert!(world.rooms.has_exit(outside, Direction::SouthWest));
        // The origin is already linked through the entrance, so it's skipped.
        assert_eq!(world.rooms.exits_from(first).len(), 2);
        assert!(audit(&world).is_empty());
    }
}
