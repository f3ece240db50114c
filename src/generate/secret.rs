//! Application secret key generation

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;

use crate::context::Logger;

/// Number of random bytes in a secret key
pub const SECRET_BYTES: usize = 32;

/// Hex-encoded secret key for the backend
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    /// Generate a key from the OS random source
    ///
    /// Falls back to the thread RNG when the OS source fails, and says so in
    /// the run log.
    pub fn generate(log: &mut dyn Logger) -> Self {
        Self::generate_from(&mut OsRng, log)
    }

    fn generate_from(primary: &mut dyn RngCore, log: &mut dyn Logger) -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        if let Err(e) = primary.try_fill_bytes(&mut bytes) {
            log.warn(&format!(
                "OS random source unavailable ({e}); secret key generated with the thread RNG instead"
            ));
            rand::thread_rng().fill_bytes(&mut bytes);
        }
        SecretKey(hex::encode(bytes))
    }

    /// Stand-in used when previewing the backend environment file
    pub fn placeholder() -> Self {
        SecretKey("<generated-during-install>".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}
