//! Core types: execution plans and the catalog seam.

mod execution_plan;
mod tile_source;

pub use execution_plan::*;
pub use tile_source::*;
