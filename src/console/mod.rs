//! Console front end - argument parsing, board rendering and the menu loop.

mod args;
mod board;
mod menu;

pub use args::*;
pub use board::*;
pub use menu::*;
