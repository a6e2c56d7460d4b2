//! The crypto capability consumed by the session layer.
//!
//! The session never calls a hash or cipher directly; it goes through a
//! [`CryptoProvider`] so hardware-backed, constant-time or test
//! implementations can be swapped in. [`DefaultCrypto`] is the pure-Rust
//! implementation built on `sha1`, `sha2` and `aes`.

use crate::aes;

/// AES-256-IGE bound to one key and IV.
///
/// Both operations work in place on whole 16-byte blocks. Chaining state is
/// local to a single call.
pub trait AesIge {
    /// Encrypt `data` in place.
    fn encrypt(&self, data: &mut [u8]);
    /// Decrypt `data` in place.
    fn decrypt(&self, data: &mut [u8]);
}

/// Hashing and block-cipher primitives required by the secure session.
///
/// Hash functions take a list of chunks that are hashed as if concatenated,
/// which avoids building `salt || frame` buffers on every message.
pub trait CryptoProvider {
    /// The IGE cipher produced by [`CryptoProvider::aes_ige`].
    type Ige: AesIge;

    /// SHA-1 over the concatenation of `chunks`.
    fn sha1(&self, chunks: &[&[u8]]) -> [u8; 20];

    /// SHA-256 over the concatenation of `chunks`.
    fn sha256(&self, chunks: &[&[u8]]) -> [u8; 32];

    /// Build an AES-256-IGE cipher for `key` / `iv`.
    fn aes_ige(&self, key: &[u8; 32], iv: &[u8; 32]) -> Self::Ige;
}

/// Software provider backed by RustCrypto.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCrypto;

/// IGE cipher returned by [`DefaultCrypto`].
#[derive(Clone)]
pub struct SoftIge {
    key: [u8; 32],
    iv:  [u8; 32],
}

impl AesIge for SoftIge {
    fn encrypt(&self, data: &mut [u8]) { aes::ige_encrypt(data, &self.key, &self.iv); }
    fn decrypt(&self, data: &mut [u8]) { aes::ige_decrypt(data, &self.key, &self.iv); }
}

impl std::fmt::Debug for SoftIge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SoftIge(..)")
    }
}

impl CryptoProvider for DefaultCrypto {
    type Ige = SoftIge;

    fn sha1(&self, chunks: &[&[u8]]) -> [u8; 20] {
        use sha1::{Digest, Sha1};
        let mut h = Sha1::new();
        for c in chunks { h.update(c); }
        h.finalize().into()
    }

    fn sha256(&self, chunks: &[&[u8]]) -> [u8; 32] {
        use sha2::{Digest, Sha256};
        let mut h = Sha256::new();
        for c in chunks { h.update(c); }
        h.finalize().into()
    }

    fn aes_ige(&self, key: &[u8; 32], iv: &[u8; 32]) -> SoftIge {
        SoftIge { key: *key, iv: *iv }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_abc() {
        let out = DefaultCrypto.sha1(&[&b"abc"[..]]);
        assert_eq!(hex::encode(out), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn sha256_abc() {
        let out = DefaultCrypto.sha256(&[&b"abc"[..]]);
        assert_eq!(
            hex::encode(out),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn chunks_hash_as_concatenation() {
        let whole = DefaultCrypto.sha256(&[&b"hello world"[..]]);
        let parts = DefaultCrypto.sha256(&[&b"hello"[..], &b" "[..], &b"world"[..]]);
        assert_eq!(whole, parts);
        assert_eq!(DefaultCrypto.sha1(&[&b"ab"[..], &b"c"[..]]), DefaultCrypto.sha1(&[&b"abc"[..]]));
    }

    #[test]
    fn ige_roundtrip_through_provider() {
        let ige = DefaultCrypto.aes_ige(&[3u8; 32], &[9u8; 32]);
        let mut data = [0x11u8; 48];
        ige.encrypt(&mut data);
        assert_ne!(data, [0x11u8; 48]);
        ige.decrypt(&mut data);
        assert_eq!(data, [0x11u8; 48]);
    }
}
