//! Proof of work
//!
//! A proof `p'` is valid against the previous proof `p` when
//! `sha256("{p}{p'}")` starts with [`DIFFICULTY`] zero hex digits.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::crypto::hash_bytes;

/// Number of leading `'0'` hex characters a valid proof digest must have
pub const DIFFICULTY: usize = 4;

/// How many candidates are tried between stop-flag checks
const STOP_CHECK_INTERVAL: u64 = 4096;

/// Check whether `proof` is valid against `last_proof`
pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{}{}", last_proof, proof);
    hash_bytes(guess.as_bytes()).leading_zero_nibbles() >= DIFFICULTY
}

/// Find the smallest valid proof for `last_proof`.
///
/// Runs until a proof is found. Use [`search`] when the caller needs to be
/// able to abandon the search.
pub fn proof_of_work(last_proof: u64) -> u64 {
    let never = AtomicBool::new(false);
    // The u64 space is never exhausted in practice; fall back to the last
    // candidate so the signature stays infallible.
    search(last_proof, &never).unwrap_or(u64::MAX)
}

/// Cancellable brute-force search.
///
/// Enumerates candidates from 0 upwards and returns the first valid one, or
/// `None` once `stop` is raised or the candidate space is exhausted.
pub fn search(last_proof: u64, stop: &AtomicBool) -> Option<u64> {
    search_until(last_proof, || stop.load(Ordering::Relaxed))
}

/// Like [`search`], polling `cancelled` every few thousand candidates
pub fn search_until(last_proof: u64, mut cancelled: impl FnMut() -> bool) -> Option<u64> {
    let mut proof = 0u64;
    loop {
        if proof % STOP_CHECK_INTERVAL == 0 && cancelled() {
            return None;
        }

        if valid_proof(last_proof, proof) {
            return Some(proof);
        }

        proof = proof.checked_add(1)?;
    }
}
