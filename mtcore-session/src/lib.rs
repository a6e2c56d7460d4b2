//! MTProto 2.0 secure session layer.
//!
//! Turns an established 256-byte auth key into tamper-evident envelopes:
//!
//! ```text
//! key_id(8) ‖ msg_key(16) ‖ AES-256-IGE( salt ‖ session_id ‖ msg_id ‖ seq_no ‖ len ‖ content ‖ padding )
//! ```
//!
//! * [`MtprotoSession`]: key lifecycle, session id, server salt,
//!   `encrypt` / `decrypt`
//! * [`SessionConfig`] / [`Role`]: which side of the key schedule to use
//! * [`Unpacked`] / [`DropReason`]: inbound frames that fail validation are
//!   dropped, not raised
//! * [`SessionError`]: caller bugs and local failures
//!
//! Message ids and sequence numbers are computed by the caller; the key
//! exchange that produces the auth key happens elsewhere.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod frame;
mod message;
mod session;

pub use config::{Role, SessionConfig};
pub use error::{DropReason, SessionError};
pub use message::{DecryptedMessage, MessageId, Payload, Unpacked};
pub use session::MtprotoSession;
