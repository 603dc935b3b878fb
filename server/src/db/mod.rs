//! Database module for PostgreSQL persistence.

mod items;
mod movements;
mod pool;

pub use items::*;
pub use movements::*;
pub use pool::*;
