use crate::{
    error::{BuildError, Result},
    rooms::RoomId,
    store::AttributeStore,
};

use std::collections::BTreeSet;

pub const NEXT_BLOCK_KEY: &str = "next_block";

/// Hands out block numbers and remembers which rooms belong to which block.
///
/// Membership lives only in the store's tags, so it always matches what was persisted.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    category: String,
}

impl BlockRegistry {
    pub fn new(category: &str) -> Self {
        BlockRegistry {
            category: category.to_string(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn tag_for(&self, block: u32) -> String {
        format!("{}_{}", self.category(), block)
    }

    /// Returns the current counter and persists its successor before handing the number out.
    pub fn next_block(&self, store: &mut impl AttributeStore) -> Result<u32> {
        let current = match store.attribute(NEXT_BLOCK_KEY) {
            Some(text) => text.trim().parse::<u32>().map_err(|_| {
                BuildError::Config(format!("stored block counter '{}' is not a number", text))
            })?,
            None => 1,
        };
        store.set_attribute(NEXT_BLOCK_KEY, (current + 1).to_string())?;
        log::debug!("Allocated block {}", current);

        Ok(current)
    }

    /// A room belongs to at most one block; any previous block tag is replaced.
    pub fn tag(&self, store: &mut impl AttributeStore, room: RoomId, block: u32) -> Result<()> {
        store.clear_tags(room, self.category())?;
        store.set_tag(room, &self.tag_for(block), self.category())?;

        Ok(())
    }

    pub fn untag(&self, store: &mut impl AttributeStore, room: RoomId) -> Result<()> {
        store.clear_tags(room, self.category())?;

        Ok(())
    }

    pub fn members_of(&self, store: &impl AttributeStore, block: u32) -> BTreeSet<RoomId> {
        store.rooms_by_tag(&self.tag_for(block), self.category())
    }
}
