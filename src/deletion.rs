use crate::{
    error::{BuildError, Result},
    rooms::{Removal, RoomId},
    store::AttributeStore,
    world::World,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeleteOutcome {
    Deleted { block: u32, removed: Removal },
    /// Too many rooms to delete without `force`. Nothing was touched.
    NeedsConfirmation { block: u32, rooms: usize },
}

/// Deletes every room of `block` along with all exits into or out of them.
///
/// `current_room` is where the invoking builder stands; deleting it out from under them is
/// refused.
pub fn delete_block<S: AttributeStore>(
    world: &mut World<S>,
    block: u32,
    current_room: Option<RoomId>,
    force: bool,
) -> Result<DeleteOutcome> {
    let members = world.members_of(block);
    if members.is_empty() {
        return Err(BuildError::UnknownBlock(block));
    }
    if let Some(here) = current_room {
        if members.contains(&here) {
            return Err(BuildError::CannotDeleteCurrentLocation { block });
        }
    }
    if members.len() > world.config.delete_confirm_threshold && !force {
        return Ok(DeleteOutcome::NeedsConfirmation {
            block,
            rooms: members.len(),
        });
    }

    let mut removed = Removal::default();
    for room in members.into_iter() {
        // Rooms that are already gone just lose their tag.
        removed += world.rooms.remove_room(room);
        world.blocks.untag(&mut world.store, room)?;
    }
    log::info!(
        "Deleted block {}: {} rooms and {} exits removed",
        block,
        removed.rooms,
        removed.exits
    );

    Ok(DeleteOutcome::Deleted { block, removed })
}
