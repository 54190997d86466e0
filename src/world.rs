//! The process-wide builder state: room graph, coordinate index, block registry and the store
//! they persist through. Generators and the deletion engine all operate on a `World`.

use crate::{
    block::BlockRegistry,
    config::BuilderConfig,
    coords::CoordIndex,
    error::{BuildError, Result},
    graph::{induced_subgraph, is_strongly_connected},
    rooms::{RoomGraph, RoomId, RoomSnapshot},
    sampling::small_rng,
    store::{AttributeStore, StoreError},
};

use fnv::FnvHashSet;
use ilattice3::Point;
use rand::rngs::SmallRng;
use std::collections::BTreeSet;

pub const ROOMS_KEY: &str = "rooms";

pub struct World<S> {
    pub rooms: RoomGraph,
    pub blocks: BlockRegistry,
    pub store: S,
    pub config: BuilderConfig,
    pub rng: SmallRng,
}

impl<S: AttributeStore> World<S> {
    /// Restores whatever `store` holds, or starts empty.
    pub fn open(store: S, config: BuilderConfig) -> Result<Self> {
        config.validate()?;
        let coords = CoordIndex::load(&store)?;
        let snapshot: RoomSnapshot = match store.attribute(ROOMS_KEY) {
            Some(text) => ron::de::from_str(&text).map_err(StoreError::from)?,
            None => RoomSnapshot::default(),
        };
        let rooms = RoomGraph::restore(snapshot, coords);
        log::info!(
            "Opened world with {} rooms, {} exits, {} placed",
            rooms.room_count(),
            rooms.exit_count(),
            rooms.coords().len()
        );

        Ok(World {
            rooms,
            blocks: BlockRegistry::new(&config.block_tag_category),
            rng: small_rng(config.seed),
            store,
            config,
        })
    }

    /// Persists the room graph and the coordinate map.
    pub fn commit(&mut self) -> Result<()> {
        let text = ron::ser::to_string(&self.rooms.snapshot()).map_err(StoreError::from)?;
        self.store.set_attribute(ROOMS_KEY, text)?;
        self.rooms.coords().save(&mut self.store)?;

        Ok(())
    }

    pub fn next_block(&mut self) -> Result<u32> {
        self.blocks.next_block(&mut self.store)
    }

    /// Creates a block member at `at` named after its block and id.
    pub fn create_block_room(&mut self, block: u32, at: Point) -> Result<RoomId> {
        let id = self.rooms.peek_next_id();
        let name = format!("Block {} Room{}", block, id.0);
        let id = self.rooms.create_room(&name, Some(at))?;
        self.tag(id, block)?;

        Ok(id)
    }

    pub fn tag(&mut self, room: RoomId, block: u32) -> Result<()> {
        let r = self
            .rooms
            .room_mut(room)
            .ok_or(BuildError::UnknownRoom(room))?;
        r.block = Some(block);
        self.blocks.tag(&mut self.store, room, block)
    }

    pub fn members_of(&self, block: u32) -> BTreeSet<RoomId> {
        self.blocks.members_of(&self.store, block)
    }

    /// Coordinate of `room`, or `NotInitialized` when it has none.
    pub fn require_coords(&self, room: RoomId) -> Result<Point> {
        if !self.rooms.contains(room) {
            return Err(BuildError::UnknownRoom(room));
        }

        self.rooms.locate(room).ok_or(BuildError::NotInitialized)
    }

    /// True iff the exits among the block's rooms let you walk from any member to any other.
    pub fn block_is_connected(&self, block: u32) -> bool {
        let nodes: FnvHashSet<_> = self
            .members_of(block)
            .into_iter()
            .filter_map(|r| self.rooms.node(r))
            .collect();

        is_strongly_connected(&induced_subgraph(self.rooms.graph(), &nodes))
    }
}
