//! `AuthKey`: the 256-byte shared secret, and the values derived from it.

use crate::{CryptoProvider, Side};

/// Length of an auth key in bytes.
pub const AUTH_KEY_LEN: usize = 256;

/// `key_id` is the low-order 64 bits of SHA-1(auth_key), i.e. the last
/// 8 bytes of the 20-byte digest.
pub const KEY_ID_RANGE: std::ops::Range<usize> = 12..20;

/// Offset of the 32-byte window hashed in front of client-sent frames.
pub const CLIENT_SALT_OFFSET: usize = 88;

/// Offset of the 32-byte window hashed in front of server-sent frames.
pub const SERVER_SALT_OFFSET: usize = 96;

/// Width of both message-key salt windows.
pub const MSG_KEY_SALT_LEN: usize = 32;

/// An authorization key produced by an external DH handshake.
///
/// Immutable once constructed. The raw bytes never appear in `Debug`
/// output.
#[derive(Clone)]
pub struct AuthKey {
    pub(crate) data: [u8; AUTH_KEY_LEN],
}

impl AuthKey {
    /// Wrap raw 256-byte handshake output.
    pub fn from_bytes(data: [u8; AUTH_KEY_LEN]) -> Self {
        Self { data }
    }

    /// Wrap a slice, returning `None` unless it is exactly 256 bytes long.
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let data: [u8; AUTH_KEY_LEN] = data.try_into().ok()?;
        Some(Self { data })
    }

    /// Return the raw 256-byte representation.
    pub fn to_bytes(&self) -> [u8; AUTH_KEY_LEN] { self.data }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; AUTH_KEY_LEN] { &self.data }

    /// The 32-byte window at `offset`.
    pub(crate) fn window(&self, offset: usize) -> [u8; MSG_KEY_SALT_LEN] {
        let mut out = [0u8; MSG_KEY_SALT_LEN];
        out.copy_from_slice(&self.data[offset..offset + MSG_KEY_SALT_LEN]);
        out
    }
}

impl std::fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthKey(..)")
    }
}

/// Values computed from an [`AuthKey`]; always produced together.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKeys {
    /// 8-byte key fingerprint carried in front of every envelope.
    pub key_id: [u8; 8],
    /// `auth_key[88..120]`, salts the message key of client-sent frames.
    pub client_salt: [u8; MSG_KEY_SALT_LEN],
    /// `auth_key[96..128]`, salts the message key of server-sent frames.
    pub server_salt: [u8; MSG_KEY_SALT_LEN],
}

impl DerivedKeys {
    /// Derive the key id and both message-key salts from `auth_key`.
    ///
    /// Deterministic; uses only the provider's SHA-1.
    pub fn derive<C: CryptoProvider>(crypto: &C, auth_key: &AuthKey) -> Self {
        let sha = crypto.sha1(&[&auth_key.data[..]]);
        let mut key_id = [0u8; 8];
        key_id.copy_from_slice(&sha[KEY_ID_RANGE]);
        Self {
            key_id,
            client_salt: auth_key.window(CLIENT_SALT_OFFSET),
            server_salt: auth_key.window(SERVER_SALT_OFFSET),
        }
    }

    /// `key_id` as a little-endian integer.
    pub fn key_id_u64(&self) -> u64 { u64::from_le_bytes(self.key_id) }

    /// The salt hashed in front of frames sent by `side`.
    pub fn msg_key_salt(&self, side: Side) -> &[u8; MSG_KEY_SALT_LEN] {
        match side {
            Side::Client => &self.client_salt,
            Side::Server => &self.server_salt,
        }
    }
}

impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DerivedKeys(key_id={:016x})", self.key_id_u64())
    }
}
