//! Database module for PostgreSQL persistence.

mod errors;
mod locations;
mod pool;
mod records;

pub use errors::*;
pub use locations::*;
pub use pool::*;
pub use records::*;
