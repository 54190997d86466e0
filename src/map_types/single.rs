use crate::{
    direction::Direction,
    error::{BuildError, Result},
    rooms::RoomId,
    store::AttributeStore,
    world::World,
};

use ilattice3::Point;

fn create_loose_room<S: AttributeStore>(world: &mut World<S>, at: Point) -> Result<RoomId> {
    let name = format!("Room{}", world.rooms.peek_next_id().0);

    world.rooms.create_room(&name, Some(at))
}

/// Builds one room a step away from `from` and links the two both ways. The forward exit is keyed
/// by the spelling in `token`.
pub fn build_room_toward<S: AttributeStore>(
    world: &mut World<S>,
    from: RoomId,
    token: &str,
) -> Result<RoomId> {
    let (direction, form) = Direction::resolve_with_form(token)?;
    let here = world.require_coords(from)?;
    if world.rooms.has_exit(from, direction) {
        return Err(BuildError::DuplicateExit {
            room: from,
            direction,
        });
    }

    let room = create_loose_room(world, direction.try_step(here)?)?;
    world
        .rooms
        .link_bidirectional_named(from, room, direction, form)?;
    log::info!("Built {} {} of {}", room, direction, from);

    Ok(room)
}

/// Builds one room at explicit coordinates. `z` defaults to the z of `from`. The new room is
/// linked to `from` only when the two are adjacent.
pub fn build_room_at<S: AttributeStore>(
    world: &mut World<S>,
    from: RoomId,
    x: i32,
    y: i32,
    z: Option<i32>,
) -> Result<RoomId> {
    let here = world.rooms.locate(from);
    let z = match (z, here) {
        (Some(z), _) => z,
        (None, Some(p)) => p.z,
        (None, None) => return Err(BuildError::NotInitialized),
    };

    let at: Point = [x, y, z].into();
    let room = create_loose_room(world, at)?;
    if let Some(direction) = here.and_then(|p| Direction::between(p, at)) {
        world.rooms.link_if_none(from, room, direction)?;
    }
    log::info!("Built {} at ({}, {}, {})", room, x, y, z);

    Ok(room)
}
