//! The text command surface builders type: `initcoords`, `checkcoords`, `buildroom`,
//! `buildgrid`, `buildmaze` and `deleteblock`.
//!
//! The work itself happens in `map_types` and `deletion`. Each command commits the world
//! afterwards, including after a failure that left partial work behind.

use crate::{
    audit::{check_room, ExitStatus},
    deletion::{delete_block, DeleteOutcome},
    direction::Direction,
    error::Result,
    map_types::{
        grid::GridSpec,
        maze::MazeSpec,
        single::{build_room_at, build_room_toward},
    },
    rooms::RoomId,
    store::AttributeStore,
    world::World,
};

use ilattice3::Point;

pub const BUILD_PERMISSION: &str = "build";

pub trait Permissions {
    fn has_permission(&self, permission: &str) -> bool;
}

pub trait Session {
    fn current_room(&self) -> Option<RoomId>;

    /// Returns false if the move didn't happen.
    fn move_actor(&mut self, room: RoomId) -> bool;
}

#[derive(Clone, Debug, PartialEq)]
pub enum RoomTarget {
    Toward(String),
    At { x: i32, y: i32, z: Option<i32> },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    InitCoords,
    CheckCoords,
    BuildRoom(RoomTarget),
    BuildGrid {
        first: String,
        first_count: usize,
        second: String,
        second_count: usize,
        connect: bool,
    },
    BuildMaze {
        direction: String,
        count: usize,
        connect: bool,
    },
    DeleteBlock {
        block: u32,
        force: bool,
    },
}

const BUILDROOM_USAGE: &str = "Usage: buildroom <direction> OR buildroom <x> <y> [z]";
const BUILDGRID_USAGE: &str = "Usage: buildgrid <direction> <number> <direction2> <number2> [connect]";
const BUILDMAZE_USAGE: &str = "Usage: buildmaze <direction> <number> [connect]";
const DELETEBLOCK_USAGE: &str = "Usage: deleteblock <block number> [/force]";

fn parse_count(word: &str) -> std::result::Result<usize, String> {
    match word.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err("The number of rooms must be a positive integer.".to_string()),
    }
}

impl Command {
    /// Parses one command line. The error is the reply to show the builder.
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let mut words = line.split_whitespace();
        let name = match words.next() {
            Some(n) => n.to_lowercase(),
            None => return Err("Nothing to do.".to_string()),
        };
        let args: Vec<&str> = words.collect();

        match name.as_str() {
            "initcoords" => Ok(Command::InitCoords),
            "checkcoords" => Ok(Command::CheckCoords),
            "buildroom" => {
                let numbers: Vec<i32> = args.iter().map_while(|a| a.parse().ok()).collect();
                match (args.len(), numbers.len()) {
                    (0, _) => Err(BUILDROOM_USAGE.to_string()),
                    (2, 2) => Ok(Command::BuildRoom(RoomTarget::At {
                        x: numbers[0],
                        y: numbers[1],
                        z: None,
                    })),
                    (3, 3) => Ok(Command::BuildRoom(RoomTarget::At {
                        x: numbers[0],
                        y: numbers[1],
                        z: Some(numbers[2]),
                    })),
                    (n, 0) if n >= 1 => Ok(Command::BuildRoom(RoomTarget::Toward(
                        args[0].to_string(),
                    ))),
                    _ => Err("Coordinates must be valid integers.".to_string()),
                }
            }
            "buildgrid" => {
                if args.len() < 4 {
                    return Err(BUILDGRID_USAGE.to_string());
                }
                Ok(Command::BuildGrid {
                    first: args[0].to_string(),
                    first_count: parse_count(args[1])?,
                    second: args[2].to_string(),
                    second_count: parse_count(args[3])?,
                    connect: args[4..].iter().any(|a| a.eq_ignore_ascii_case("connect")),
                })
            }
            "buildmaze" => {
                if args.len() < 2 {
                    return Err(BUILDMAZE_USAGE.to_string());
                }
                Ok(Command::BuildMaze {
                    direction: args[0].to_string(),
                    count: parse_count(args[1])?,
                    connect: args[2..].iter().any(|a| a.eq_ignore_ascii_case("connect")),
                })
            }
            "deleteblock" | "deleteblock/force" => {
                // The switch may be glued to the command, the number, or stand alone.
                let joined = format!("{} {}", name, args.join(" ")).to_lowercase();
                let force = joined.contains("/force");
                let rest = joined.replace("/force", " ");
                let number = rest.split_whitespace().nth(1);
                match number {
                    None => Err(DELETEBLOCK_USAGE.to_string()),
                    Some(n) => match n.parse::<u32>() {
                        Ok(block) => Ok(Command::DeleteBlock { block, force }),
                        Err(_) => Err("Block number must be an integer.".to_string()),
                    },
                }
            }
            other => Err(format!("Unknown command '{}'.", other)),
        }
    }
}

fn describe(p: Point) -> String {
    format!("({}, {}, {})", p.x, p.y, p.z)
}

fn room_name<S: AttributeStore>(world: &World<S>, room: RoomId) -> String {
    world
        .rooms
        .room(room)
        .map(|r| r.name.clone())
        .unwrap_or_else(|| room.to_string())
}

fn move_into<S: AttributeStore>(
    world: &World<S>,
    actor: &mut impl Session,
    room: RoomId,
    reply: &mut Vec<String>,
) {
    if actor.move_actor(room) {
        reply.push(format!("You have been moved to {}.", room_name(world, room)));
    } else {
        reply.push("Warning: Could not move to new room.".to_string());
    }
}

/// Parses, authorizes, runs and commits one command, returning the text to show the builder.
pub fn run_command<S, A>(world: &mut World<S>, actor: &mut A, line: &str) -> String
where
    S: AttributeStore,
    A: Permissions + Session,
{
    let command = match Command::parse(line) {
        Ok(c) => c,
        Err(reply) => return reply,
    };
    if !actor.has_permission(BUILD_PERMISSION) {
        return "You don't have permission to build.".to_string();
    }
    let here = match actor.current_room() {
        Some(r) => r,
        None => return "You must be in a room to build!".to_string(),
    };

    let reply = match execute(world, actor, here, command) {
        Ok(lines) => lines.join("\n"),
        Err(e) => e.to_string(),
    };
    if let Err(e) = world.commit() {
        log::warn!("Failed to save world: {}", e);
        return format!("{}\nWarning: the world could not be saved: {}", reply, e);
    }

    reply
}

fn execute<S, A>(
    world: &mut World<S>,
    actor: &mut A,
    here: RoomId,
    command: Command,
) -> Result<Vec<String>>
where
    S: AttributeStore,
    A: Session,
{
    let mut reply = Vec::new();
    match command {
        Command::InitCoords => {
            let origin = world.config.origin_point();
            world.rooms.coords_mut().initialize(here, origin)?;
            reply.push(format!("Room coordinates initialized to {}", describe(origin)));
        }
        Command::CheckCoords => {
            let check = check_room(world, here)?;
            reply.push(format!("Room: {}", check.name));
            if let Some(block) = check.block {
                reply.push(format!("Block: {}", block));
            }
            reply.push(format!("Coordinates: {}", describe(check.at)));
            for e in check.exits.iter() {
                reply.push(match &e.status {
                    ExitStatus::Valid(p) => format!("Exit '{}' -> {} [Valid]", e.key, describe(*p)),
                    ExitStatus::NonAdjacent(p) => format!(
                        "Exit '{}' -> {} [INVALID: non-adjacent]",
                        e.key,
                        describe(*p)
                    ),
                    ExitStatus::Unplaced => {
                        format!("Exit '{}' leads to room with no coordinates.", e.key)
                    }
                });
            }
        }
        Command::BuildRoom(RoomTarget::Toward(token)) => {
            let room = build_room_toward(world, here, &token)?;
            let direction = Direction::resolve(&token)?;
            reply.push(format!(
                "Created room {} to the {}.",
                room_name(world, room),
                direction
            ));
            move_into(world, actor, room, &mut reply);
        }
        Command::BuildRoom(RoomTarget::At { x, y, z }) => {
            let room = build_room_at(world, here, x, y, z)?;
            let at = world.require_coords(room)?;
            reply.push(format!(
                "Created room {} at coordinates {}",
                room_name(world, room),
                describe(at)
            ));
            move_into(world, actor, room, &mut reply);
        }
        Command::BuildGrid {
            first,
            first_count,
            second,
            second_count,
            connect,
        } => {
            let (first, first_form) = Direction::resolve_cardinal(&first)?;
            let (second, second_form) = Direction::resolve_cardinal(&second)?;
            let origin = world.require_coords(here)?;
            let grid = GridSpec {
                start: first.try_step(origin)?,
                first,
                first_form,
                first_count,
                second,
                second_form,
                second_count,
                connect_external: connect,
            };
            let outcome = grid.generate(world)?;
            // The grid hangs off the builder's room like the first room of a maze.
            world
                .rooms
                .link_if_none_named(here, outcome.rooms[0], first, first_form)?;
            reply.push(format!(
                "Created a grid {}x{} rooms extending {} and {} (block #{}).",
                first_count, second_count, first, second, outcome.block
            ));
        }
        Command::BuildMaze {
            direction,
            count,
            connect,
        } => {
            let (direction, entrance_form) = Direction::resolve_with_form(&direction)?;
            let maze = MazeSpec {
                from: here,
                direction,
                entrance_form,
                count,
                connect_external: connect,
            };
            let outcome = maze.generate(world)?;
            if outcome.stopped_early() {
                reply.push(
                    "Could not find a valid position for more rooms. Maze generation stopped."
                        .to_string(),
                );
            }
            reply.push(format!(
                "Created a maze of {} rooms starting {} (block #{}).",
                outcome.rooms.len(),
                direction,
                outcome.block
            ));
        }
        Command::DeleteBlock { block, force } => {
            match delete_block(world, block, Some(here), force)? {
                DeleteOutcome::NeedsConfirmation { rooms, .. } => {
                    reply.push(format!(
                        "Warning: This will delete {} rooms and all their exits.",
                        rooms
                    ));
                    reply.push("Use 'deleteblock <number>/force' to skip this warning.".to_string());
                }
                DeleteOutcome::Deleted { block, removed } => reply.push(format!(
                    "Deleted block {}: {} rooms and {} exits removed.",
                    block, removed.rooms, removed.exits
                )),
            }
        }
    }

    Ok(reply)
}
