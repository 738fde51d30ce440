//! Parameter binding: values always travel as statement arguments, never as SQL text.

pub mod params;
pub use params::*;
