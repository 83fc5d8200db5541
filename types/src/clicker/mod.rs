//! Clicker domain types.
//!
//! Defines the player record, its ranking projection, lottery entries and the constants used by
//! the execution layer and clients.

mod codec;
mod constants;
mod player;
mod ranking;

pub use codec::{
    opt_string_encode_size, read_opt_string, read_string, string_encode_size, write_opt_string,
    write_string,
};
pub use constants::*;
pub use player::*;
pub use ranking::*;
