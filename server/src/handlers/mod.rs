//! Request handlers.

mod errors;
mod pull;

pub use errors::*;
pub use pull::*;
