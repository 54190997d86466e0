pub mod grid;
pub mod maze;
pub mod single;
