//! Consensus module - Block structure, proof of work, validation, and conflict resolution

mod block;
mod pow;
mod validation;
mod resolver;

pub use block::*;
pub use pow::*;
pub use validation::*;
pub use resolver::*;
