//! Host-provided primitives the codec relies on.
//!
//! Cell hashing and payload sniffing only go through these traits, so a host
//! can plug in its own digest or text implementation without touching the
//! cell code. [`Sha2HashFunctions`] and [`Utf8TextCodec`] are the defaults.

use sha2::{Digest, Sha256, Sha512};

use crate::types::TonHash;

pub trait HashFunctions: Send + Sync {
    fn sha256(&self, data: &[u8]) -> TonHash;

    fn sha512(&self, data: &[u8]) -> [u8; 64];
}

pub trait TextCodec: Send + Sync {
    /// Returns `None` if the bytes are not valid text.
    fn bytes_to_string(&self, bytes: &[u8]) -> Option<String>;

    fn string_to_bytes(&self, value: &str) -> Vec<u8>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Sha2HashFunctions;

impl HashFunctions for Sha2HashFunctions {
    fn sha256(&self, data: &[u8]) -> TonHash {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&Sha256::digest(data));
        hash
    }

    fn sha512(&self, data: &[u8]) -> [u8; 64] {
        let mut hash = [0u8; 64];
        hash.copy_from_slice(&Sha512::digest(data));
        hash
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8TextCodec;

impl TextCodec for Utf8TextCodec {
    fn bytes_to_string(&self, bytes: &[u8]) -> Option<String> {
        std::str::from_utf8(bytes).ok().map(str::to_owned)
    }

    fn string_to_bytes(&self, value: &str) -> Vec<u8> {
        value.as_bytes().to_vec()
    }
}
