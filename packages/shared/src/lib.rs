//! Utilities shared by the Tsudoi server binary, its library and its tests.

pub mod logger;
pub mod time;
