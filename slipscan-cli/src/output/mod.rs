//! Result rendering for the terminal

pub mod json;
pub mod table;
