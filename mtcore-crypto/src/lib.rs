//! Cryptographic primitives for the MTProto 2.0 secure session.
//!
//! Provides:
//! - [`CryptoProvider`]: the injected SHA-1 / SHA-256 / AES-256-IGE capability
//! - [`DefaultCrypto`]: pure-Rust provider built on RustCrypto
//! - [`AuthKey`] and [`DerivedKeys`]: key id and message-key salts
//! - [`message_key`] / [`ige_key_iv`]: the per-message key schedule
//! - [`DequeBuffer`]: envelope buffer with prepend headroom

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod aes;
mod auth_key;
mod deque_buffer;
mod message_key;
mod provider;

pub use auth_key::{
    AUTH_KEY_LEN, AuthKey, CLIENT_SALT_OFFSET, DerivedKeys, KEY_ID_RANGE, MSG_KEY_SALT_LEN,
    SERVER_SALT_OFFSET,
};
pub use deque_buffer::DequeBuffer;
pub use message_key::{MSG_KEY_RANGE, Side, ige_key_iv, message_key};
pub use provider::{AesIge, CryptoProvider, DefaultCrypto, SoftIge};
