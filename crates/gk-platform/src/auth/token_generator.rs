//! Token Value Generation

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine;

/// Produces values for one-time tokens.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// 32 bytes from the OS RNG, base64url without padding.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        let mut token_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut token_bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
    }
}
