use crate::{
    direction::{Direction, NameForm, ALL_DIRECTIONS},
    error::{BuildError, Result},
    rooms::RoomId,
    store::AttributeStore,
    world::World,
};

use fnv::FnvHashSet;
use ilattice3::Point;
use std::convert::TryFrom;

/// A rectangle of rooms spanned by two cardinal directions.
#[derive(Clone, Debug)]
pub struct GridSpec {
    /// Coordinate of the first cell.
    pub start: Point,
    pub first: Direction,
    /// Spelling of the keys of exits along `first`.
    pub first_form: NameForm,
    pub first_count: usize,
    pub second: Direction,
    pub second_form: NameForm,
    pub second_count: usize,
    /// Also link boundary rooms to pre-existing neighbors outside the grid.
    pub connect_external: bool,
}

#[derive(Clone, Debug)]
pub struct GridOutcome {
    pub block: u32,
    /// Row-major: `rooms[i * second_count + j]`.
    pub rooms: Vec<RoomId>,
    pub exits_created: usize,
}

impl GridSpec {
    pub fn validate(&self) -> Result<()> {
        for d in [self.first, self.second].iter() {
            if !d.is_cardinal() {
                return Err(BuildError::InvalidDirection(*d));
            }
        }
        // Collinear directions would fold the grid onto itself.
        if self.second == self.first || self.second == self.first.opposite() {
            return Err(BuildError::InvalidDirection(self.second));
        }
        for n in [self.first_count, self.second_count].iter() {
            if *n == 0 {
                return Err(BuildError::InvalidCount(*n));
            }
        }
        if self.first_count.checked_mul(self.second_count).is_none() {
            return Err(BuildError::InvalidCount(
                self.first_count.max(self.second_count),
            ));
        }
        // The two directions move along different axes, so the grid fits iff both far edges do.
        let edges = [
            (self.first, self.first_count),
            (self.second, self.second_count),
        ];
        for (d, n) in edges.iter() {
            let reach = i32::try_from(*n - 1)
                .ok()
                .and_then(|n| d.advance(self.start, n));
            if reach.is_none() {
                return Err(self.out_of_range(*d));
            }
        }

        Ok(())
    }

    /// Coordinate of cell `(i, j)`, or `None` if it falls off the lattice.
    pub fn cell(&self, i: usize, j: usize) -> Option<Point> {
        let i = i32::try_from(i).ok()?;
        let j = i32::try_from(j).ok()?;

        self.first
            .advance(self.start, i)
            .and_then(|p| self.second.advance(p, j))
    }

    fn out_of_range(&self, direction: Direction) -> BuildError {
        BuildError::OutOfRange {
            x: self.start.x,
            y: self.start.y,
            z: self.start.z,
            direction,
        }
    }

    /// Fills the grid cell by cell. A collision aborts with `CoordinateOccupied`; rooms placed
    /// before it stay in the world, tagged with the block.
    pub fn generate<S: AttributeStore>(&self, world: &mut World<S>) -> Result<GridOutcome> {
        self.validate()?;
        let block = world.next_block()?;
        log::debug!(
            "Generating {}x{} grid {} then {} as block {}",
            self.first_count,
            self.second_count,
            self.first,
            self.second,
            block
        );

        let mut rooms = Vec::new();
        for i in 0..self.first_count {
            for j in 0..self.second_count {
                let at = self.cell(i, j).ok_or_else(|| self.out_of_range(self.first))?;
                match world.create_block_room(block, at) {
                    Ok(id) => rooms.push(id),
                    Err(e) => {
                        log::warn!(
                            "Grid block {} aborted after placing {} rooms: {}",
                            block,
                            rooms.len(),
                            e
                        );
                        return Err(e);
                    }
                }
            }
        }

        let at = |i: usize, j: usize| rooms[i * self.second_count + j];
        let mut exits_created = 0;
        for i in 0..self.first_count {
            for j in 0..self.second_count {
                if i > 0 {
                    exits_created += world.rooms.link_if_none_named(
                        at(i - 1, j),
                        at(i, j),
                        self.first,
                        self.first_form,
                    )?;
                }
                if j > 0 {
                    exits_created += world.rooms.link_if_none_named(
                        at(i, j - 1),
                        at(i, j),
                        self.second,
                        self.second_form,
                    )?;
                }
            }
        }

        if self.connect_external {
            let members: FnvHashSet<RoomId> = rooms.iter().cloned().collect();
            for i in 0..self.first_count {
                for j in 0..self.second_count {
                    let on_boundary = i == 0
                        || j == 0
                        || i + 1 == self.first_count
                        || j + 1 == self.second_count;
                    if !on_boundary {
                        continue;
                    }
                    if let Some(p) = self.cell(i, j) {
                        exits_created += connect_to_neighbors(world, at(i, j), p, &members)?;
                    }
                }
            }
        }

        log::info!(
            "Built grid block {}: {} rooms, {} exits",
            block,
            rooms.len(),
            exits_created
        );

        Ok(GridOutcome {
            block,
            rooms,
            exits_created,
        })
    }
}

/// Links `room` to every placed neighbor that isn't in `exclude`, skipping directions it already
/// has an exit for. Returns the number of exits created.
pub fn connect_to_neighbors<S: AttributeStore>(
    world: &mut World<S>,
    room: RoomId,
    at: Point,
    exclude: &FnvHashSet<RoomId>,
) -> Result<usize> {
    let mut created = 0;
    for d in ALL_DIRECTIONS.iter() {
        let neighbor = match d.step(at).and_then(|p| world.rooms.coords().lookup(p)) {
            Some(n) if !exclude.contains(&n) => n,
            _ => continue,
        };
        created += world.rooms.link_if_none(room, neighbor, *d)?;
    }

    Ok(created)
}
