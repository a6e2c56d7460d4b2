//! AES-256 in Infinite Garble Extension (IGE) mode.
//!
//! IGE chains every block with both the previous ciphertext block and the
//! previous plaintext block:
//!
//! ```text
//! c[i] = E(p[i] ^ c[i-1]) ^ p[i-1]
//! p[i] = D(c[i] ^ p[i-1]) ^ c[i-1]
//! ```
//!
//! The 32-byte IV holds the two seeds: `iv[..16]` stands in for `c[-1]` and
//! `iv[16..]` for `p[-1]`. Chaining state lives only for the duration of one
//! call; nothing is carried across calls.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

fn xor_block(dst: &mut [u8], src: &[u8; BLOCK_LEN]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

fn split_iv(iv: &[u8; 32]) -> ([u8; BLOCK_LEN], [u8; BLOCK_LEN]) {
    let mut lo = [0u8; BLOCK_LEN];
    let mut hi = [0u8; BLOCK_LEN];
    lo.copy_from_slice(&iv[..BLOCK_LEN]);
    hi.copy_from_slice(&iv[BLOCK_LEN..]);
    (lo, hi)
}

/// Encrypt `buffer` in place.
///
/// `buffer.len()` must be a multiple of [`BLOCK_LEN`]; a trailing partial
/// block is left untouched.
pub fn ige_encrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    debug_assert_eq!(buffer.len() % BLOCK_LEN, 0, "IGE input must be block-aligned");

    let cipher = Aes256::new(GenericArray::from_slice(key));
    let (mut prev_cipher, mut prev_plain) = split_iv(iv);

    for block in buffer.chunks_exact_mut(BLOCK_LEN) {
        let mut plain = [0u8; BLOCK_LEN];
        plain.copy_from_slice(block);

        xor_block(block, &prev_cipher);
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        xor_block(block, &prev_plain);

        prev_cipher.copy_from_slice(block);
        prev_plain = plain;
    }
}

/// Decrypt `buffer` in place.
///
/// `buffer.len()` must be a multiple of [`BLOCK_LEN`]; a trailing partial
/// block is left untouched.
pub fn ige_decrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    debug_assert_eq!(buffer.len() % BLOCK_LEN, 0, "IGE input must be block-aligned");

    let cipher = Aes256::new(GenericArray::from_slice(key));
    let (mut prev_cipher, mut prev_plain) = split_iv(iv);

    for block in buffer.chunks_exact_mut(BLOCK_LEN) {
        let mut ciphertext = [0u8; BLOCK_LEN];
        ciphertext.copy_from_slice(block);

        xor_block(block, &prev_plain);
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        xor_block(block, &prev_cipher);

        prev_plain.copy_from_slice(block);
        prev_cipher = ciphertext;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> [u8; 32] { core::array::from_fn(|i| i as u8) }
    fn iv() -> [u8; 32] { core::array::from_fn(|i| 0x20 + i as u8) }

    #[test]
    fn first_block_matches_raw_aes() {
        let plain = [0x5au8; 16];
        let mut buf = plain;
        ige_encrypt(&mut buf, &key(), &iv());

        // c0 = E(p0 ^ iv[..16]) ^ iv[16..]
        let cipher = Aes256::new(GenericArray::from_slice(&key()));
        let mut expected = plain;
        xor_block(&mut expected, &iv()[..16].try_into().unwrap());
        cipher.encrypt_block(GenericArray::from_mut_slice(&mut expected));
        xor_block(&mut expected, &iv()[16..].try_into().unwrap());

        assert_eq!(buf, expected);
    }

    #[test]
    fn decrypt_inverts_encrypt() {
        let plain: Vec<u8> = (0..96u8).collect();
        let mut buf = plain.clone();
        ige_encrypt(&mut buf, &key(), &iv());
        assert_ne!(buf, plain);
        ige_decrypt(&mut buf, &key(), &iv());
        assert_eq!(buf, plain);
    }

    #[test]
    fn change_propagates_forward() {
        let mut a = vec![0u8; 64];
        let mut b = vec![0u8; 64];
        b[0] = 1;
        ige_encrypt(&mut a, &key(), &iv());
        ige_encrypt(&mut b, &key(), &iv());
        for i in 0..4 {
            assert_ne!(a[i * 16..(i + 1) * 16], b[i * 16..(i + 1) * 16], "block {i}");
        }
    }

    #[test]
    fn no_state_carried_between_calls() {
        let mut a = [7u8; 32];
        let mut b = [7u8; 32];
        ige_encrypt(&mut a, &key(), &iv());
        ige_encrypt(&mut [0u8; 48], &key(), &iv());
        ige_encrypt(&mut b, &key(), &iv());
        assert_eq!(a, b);
    }
}
