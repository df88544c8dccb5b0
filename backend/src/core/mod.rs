//! Core simulation primitives: calendar months and the tick clock

pub mod time;
