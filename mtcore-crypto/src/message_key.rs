//! MTProto 2.0 message-key and AES key/IV schedule.

use crate::auth_key::{AuthKey, CLIENT_SALT_OFFSET, MSG_KEY_SALT_LEN};
use crate::CryptoProvider;

/// `msg_key` is bytes `[8, 24)` of SHA-256(salt || frame).
pub const MSG_KEY_RANGE: std::ops::Range<usize> = 8..24;

/// Which party produced a frame.
///
/// The key schedule is asymmetric: frames sent by the client use `x = 0`,
/// frames sent by the server use `x = 8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Client-to-server direction.
    Client,
    /// Server-to-client direction.
    Server,
}

impl Side {
    /// The `x` offset from the MTProto 2.0 key schedule.
    pub fn x(self) -> usize {
        match self { Side::Client => 0, Side::Server => 8 }
    }

    /// The opposite direction.
    pub fn peer(self) -> Side {
        match self { Side::Client => Side::Server, Side::Server => Side::Client }
    }

    /// Offset of this side's message-key salt inside the auth key (`88 + x`).
    pub fn salt_offset(self) -> usize { CLIENT_SALT_OFFSET + self.x() }
}

/// Compute the 16-byte message key for `frame` salted with `salt`.
pub fn message_key<C: CryptoProvider>(
    crypto: &C,
    salt:   &[u8; MSG_KEY_SALT_LEN],
    frame:  &[u8],
) -> [u8; 16] {
    let large = crypto.sha256(&[&salt[..], frame]);
    let mut msg_key = [0u8; 16];
    msg_key.copy_from_slice(&large[MSG_KEY_RANGE]);
    msg_key
}

/// Derive the AES-256-IGE `(key, iv)` for a frame sent by `side`.
///
/// ```text
/// sha_a = SHA256(msg_key || auth_key[x      .. x + 36])
/// sha_b = SHA256(auth_key[40 + x .. 76 + x] || msg_key)
/// key   = sha_a[0..8]  || sha_b[8..24] || sha_a[24..32]
/// iv    = sha_b[0..8]  || sha_a[8..24] || sha_b[24..32]
/// ```
pub fn ige_key_iv<C: CryptoProvider>(
    crypto:   &C,
    auth_key: &AuthKey,
    msg_key:  &[u8; 16],
    side:     Side,
) -> ([u8; 32], [u8; 32]) {
    let x = side.x();
    let sha_a = crypto.sha256(&[&msg_key[..], &auth_key.data[x..x + 36]]);
    let sha_b = crypto.sha256(&[&auth_key.data[40 + x..40 + x + 36], &msg_key[..]]);

    let mut aes_key = [0u8; 32];
    aes_key[..8].copy_from_slice(&sha_a[..8]);
    aes_key[8..24].copy_from_slice(&sha_b[8..24]);
    aes_key[24..].copy_from_slice(&sha_a[24..]);

    let mut aes_iv = [0u8; 32];
    aes_iv[..8].copy_from_slice(&sha_b[..8]);
    aes_iv[8..24].copy_from_slice(&sha_a[8..24]);
    aes_iv[24..].copy_from_slice(&sha_b[24..]);

    (aes_key, aes_iv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DefaultCrypto, DerivedKeys};

    #[test]
    fn salt_offsets_match_derived_salts() {
        let key = AuthKey::from_bytes(core::array::from_fn(|i| i as u8));
        let derived = DerivedKeys::derive(&DefaultCrypto, &key);
        assert_eq!(key.window(Side::Client.salt_offset()), derived.client_salt);
        assert_eq!(key.window(Side::Server.salt_offset()), derived.server_salt);
    }

    #[test]
    fn schedule_is_asymmetric() {
        let key = AuthKey::from_bytes(core::array::from_fn(|i| (i * 7) as u8));
        let msg_key = [7u8; 16];
        let client = ige_key_iv(&DefaultCrypto, &key, &msg_key, Side::Client);
        let server = ige_key_iv(&DefaultCrypto, &key, &msg_key, Side::Server);
        assert_ne!(client, server);
    }

    #[test]
    fn message_key_depends_on_salt() {
        let frame = [0u8; 48];
        let a = message_key(&DefaultCrypto, &[1u8; 32], &frame);
        let b = message_key(&DefaultCrypto, &[2u8; 32], &frame);
        assert_ne!(a, b);
        let full = DefaultCrypto.sha256(&[&[1u8; 32][..], &frame[..]]);
        assert_eq!(a, full[8..24]);
    }
}
