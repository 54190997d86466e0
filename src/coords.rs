use crate::{
    direction::Direction,
    error::{BuildError, Result},
    rooms::RoomId,
    store::AttributeStore,
};

use fnv::FnvHashMap;
use ilattice3::Point;

pub const COORD_MAP_KEY: &str = "coord_map";

/// True iff `b - a` is exactly one compass direction's unit vector.
pub fn adjacent(a: Point, b: Point) -> bool {
    Direction::between(a, b).is_some()
}

/// Bijection between lattice points and the rooms placed on them.
#[derive(Clone, Debug, Default)]
pub struct CoordIndex {
    by_point: FnvHashMap<Point, RoomId>,
    by_room: FnvHashMap<RoomId, Point>,
}

impl CoordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_room.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_room.is_empty()
    }

    /// Places the first room of the whole coordinate system.
    pub fn initialize(&mut self, room: RoomId, origin: Point) -> Result<()> {
        if !self.is_empty() || self.by_room.contains_key(&room) {
            return Err(BuildError::AlreadyInitialized);
        }
        self.place(room, origin)
    }

    pub fn lookup(&self, p: Point) -> Option<RoomId> {
        self.by_point.get(&p).cloned()
    }

    pub fn locate(&self, room: RoomId) -> Option<Point> {
        self.by_room.get(&room).cloned()
    }

    pub fn is_occupied(&self, p: Point) -> bool {
        self.by_point.contains_key(&p)
    }

    pub fn place(&mut self, room: RoomId, p: Point) -> Result<()> {
        if let Some(occupant) = self.lookup(p) {
            return Err(BuildError::CoordinateOccupied {
                x: p.x,
                y: p.y,
                z: p.z,
                occupant,
            });
        }
        // A room never holds two coordinates.
        if let Some(old) = self.by_room.insert(room, p) {
            self.by_point.remove(&old);
        }
        self.by_point.insert(p, room);

        Ok(())
    }

    /// No-op when `room` was never placed.
    pub fn remove(&mut self, room: RoomId) -> Option<Point> {
        let p = self.by_room.remove(&room)?;
        self.by_point.remove(&p);

        Some(p)
    }

    /// Placed rooms, ordered by room id.
    pub fn entries(&self) -> Vec<(RoomId, Point)> {
        let mut entries: Vec<_> = self.by_room.iter().map(|(r, p)| (*r, *p)).collect();
        entries.sort_by_key(|(r, _)| *r);

        entries
    }

    /// Inclusive `(min, max)` corners of the occupied region.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let mut points = self.by_point.keys();
        let first = *points.next()?;
        let (mut min, mut max) = (first, first);
        for p in points {
            min = [min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)].into();
            max = [max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)].into();
        }

        Some((min, max))
    }

    pub fn save(&self, store: &mut impl AttributeStore) -> Result<()> {
        let entries: Vec<(RoomId, [i32; 3])> = self
            .entries()
            .into_iter()
            .map(|(r, p)| (r, [p.x, p.y, p.z]))
            .collect();
        let text = ron::ser::to_string(&entries).map_err(crate::store::StoreError::from)?;
        store.set_attribute(COORD_MAP_KEY, text)?;

        Ok(())
    }

    pub fn load(store: &impl AttributeStore) -> Result<Self> {
        let mut index = Self::new();
        let text = match store.attribute(COORD_MAP_KEY) {
            Some(t) => t,
            None => return Ok(index),
        };
        let entries: Vec<(RoomId, [i32; 3])> =
            ron::de::from_str(&text).map_err(crate::store::StoreError::from)?;
        for (room, p) in entries.into_iter() {
            index.place(room, p.into())?;
        }

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn p(x: i32, y: i32, z: i32) -> Point {
        [x, y, z].into()
    }

    #[test]
    fn place_and_lookup_are_inverse() {
        let mut index = CoordIndex::new();
        index.place(RoomId(1), p(0, 0, 0)).unwrap();
        index.place(RoomId(2), p(1, 0, 0)).unwrap();

        for (room, point) in index.entries() {
            assert_eq!(index.lookup(point), Some(room));
            assert_eq!(index.locate(room), Some(point));
        }
        assert!(index.is_occupied(p(1, 0, 0)));
        assert!(!index.is_occupied(p(2, 0, 0)));
    }

    #[test]
    fn place_rejects_occupied_coordinates() {
        let mut index = CoordIndex::new();
        index.place(RoomId(1), p(3, 3, 3)).unwrap();

        match index.place(RoomId(2), p(3, 3, 3)) {
            Err(BuildError::CoordinateOccupied { occupant, .. }) => {
                assert_eq!(occupant, RoomId(1))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(index.locate(RoomId(2)), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn initialize_only_once() {
        let mut index = CoordIndex::new();
        index.initialize(RoomId(1), p(1000, 1000, 1000)).unwrap();

        assert!(matches!(
            index.initialize(RoomId(2), p(0, 0, 0)),
            Err(BuildError::AlreadyInitialized)
        ));
        assert!(matches!(
            index.initialize(RoomId(1), p(0, 0, 0)),
            Err(BuildError::AlreadyInitialized)
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut index = CoordIndex::new();
        index.place(RoomId(9), p(1, 2, 3)).unwrap();

        assert_eq!(index.remove(RoomId(9)), Some(p(1, 2, 3)));
        assert_eq!(index.remove(RoomId(9)), None);
        assert!(index.is_empty());
        assert!(!index.is_occupied(p(1, 2, 3)));
    }

    #[test]
    fn adjacency_covers_eight_neighbors_in_plane() {
        let a = p(10, 10, 10);
        let mut count = 0;
        for dx in -2..=2 {
            for dy in -2..=2 {
                for dz in -1..=1 {
                    if adjacent(a, p(10 + dx, 10 + dy, 10 + dz)) {
                        count += 1;
                    }
                }
            }
        }
        assert_eq!(count, 8);
    }

    #[test]
    fn bounds_track_extremes() {
        let mut index = CoordIndex::new();
        assert_eq!(index.bounds(), None);
        index.place(RoomId(1), p(0, 5, 1)).unwrap();
        index.place(RoomId(2), p(-3, 7, 1)).unwrap();
        index.place(RoomId(3), p(2, 6, 0)).unwrap();
        assert_eq!(index.bounds(), Some((p(-3, 5, 0), p(2, 7, 1))));

        index.remove(RoomId(2));
        assert_eq!(index.bounds(), Some((p(0, 5, 0), p(2, 6, 1))));
    }

    #[test]
    fn save_then_load_restores_mapping() {
        let mut store = MemoryStore::new();
        let mut index = CoordIndex::new();
        index.place(RoomId(1), p(1000, 1000, 1000)).unwrap();
        index.place(RoomId(4), p(1000, 1001, 1000)).unwrap();
        index.save(&mut store).unwrap();

        let loaded = CoordIndex::load(&store).unwrap();
        assert_eq!(loaded.entries(), index.entries());
    }
}
