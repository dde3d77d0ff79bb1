//! Utilities shared by the Yoriai server library and its binary.

pub mod logger;
pub mod time;
