// crates/garage-door-core/src/runtime/codes.rs
// ============================================================================
// Module: Challenge Code Source
// Description: Random numeric challenge codes.
// Purpose: Provide the default unpredictable code generator.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! [`RandomCodeSource`] draws each digit uniformly from the thread-local RNG.
//! Collisions with live challenges are handled by the authorizer.

use rand::Rng;

use crate::interfaces::ChallengeCodeSource;

/// Uniform random decimal codes from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeSource;

impl ChallengeCodeSource for RandomCodeSource {
    fn next_code(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length).map(|_| char::from(b'0' + rng.gen_range(0..10_u8))).collect()
    }
}
