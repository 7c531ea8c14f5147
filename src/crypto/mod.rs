//! Cryptography module - SHA-256 hashing and canonical encoding

mod hash;

pub use hash::*;
