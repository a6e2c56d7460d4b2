//! # mtcore: MTProto 2.0 secure session core
//!
//! Three focused sub-crates wired together here for convenience:
//!
//! | Sub-crate        | Role                                                    |
//! |------------------|---------------------------------------------------------|
//! | `mtcore-crypto`  | AES-256-IGE, SHA-1/256, auth key id and msg_key salts   |
//! | `mtcore-tl`      | TL primitives, runtime schema, object codec, TL-JSON    |
//! | `mtcore-session` | Framing, padding, msg_key integrity, encrypt / decrypt  |
//!
//! ## Quick start
//!
//! ```rust
//! use mtcore::{AuthKey, MessageId, MtprotoSession, Role, SessionConfig};
//!
//! let key = AuthKey::from_bytes([7u8; 256]);
//!
//! let mut client = MtprotoSession::new().unwrap();
//! client.setup_keys(key.clone());
//!
//! let mut server = MtprotoSession::with_config(SessionConfig {
//!     role: Role::Server,
//!     ..Default::default()
//! }).unwrap();
//! server.setup_keys(key);
//! server.restore_session_id(client.session_id());
//!
//! let ping = client.schema().object("ping").unwrap().with("ping_id", 42i64);
//! let wire = client.encrypt(&ping, MessageId(0x6000_0000_0000_0004), 1).unwrap();
//!
//! let got = server.decrypt(&wire).unwrap().message().unwrap();
//! assert_eq!(got.content, ping);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Re-export of [`mtcore_crypto`]: AES-IGE, hashing, [`AuthKey`].
pub use mtcore_crypto as crypto;

/// Re-export of [`mtcore_tl`]: schema, objects and the binary codec.
pub use mtcore_tl as tl;

/// Re-export of [`mtcore_session`]: the encrypted session itself.
pub use mtcore_session as session;

// ─── Convenience re-exports ───────────────────────────────────────────────────

pub use mtcore_crypto::AuthKey;

pub use mtcore_tl::{Deserializable, Schema, Serializable, TlObject, TlValue};

pub use mtcore_session::{
    DecryptedMessage,
    DropReason,
    MessageId,
    MtprotoSession,
    Payload,
    Role,
    SessionConfig,
    SessionError,
    Unpacked,
};
