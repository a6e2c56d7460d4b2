//! Session configuration.

use mtcore_crypto::Side;

/// Which end of the connection a session plays.
///
/// The MTProto 2.0 key schedule differs per direction, so a session has to
/// know whether it writes client frames or server frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Role {
    /// Sends client frames, reads server frames.
    #[default]
    Client,
    /// Sends server frames, reads client frames. Mostly useful for
    /// loopback tests and test servers.
    Server,
}

impl Role {
    /// Direction of frames this session produces.
    pub fn outgoing(self) -> Side {
        match self {
            Role::Client => Side::Client,
            Role::Server => Side::Server,
        }
    }

    /// Direction of frames this session accepts.
    pub fn incoming(self) -> Side { self.outgoing().peer() }
}

/// Configuration for [`crate::MtprotoSession`].
///
/// ```rust
/// use mtcore_session::{Role, SessionConfig};
///
/// let config = SessionConfig { role: Role::Server, ..Default::default() };
/// assert_eq!(config.initial_server_salt, 0);
/// assert!(config.truncate_unaligned);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Client or server side of the key schedule.
    pub role: Role,
    /// Server salt used until [`crate::MtprotoSession::set_server_salt`]
    /// replaces it.
    pub initial_server_salt: i64,
    /// Drop the trailing `len % 16` ciphertext bytes instead of rejecting
    /// the envelope. Some transport codecs pad to a coarser granularity.
    pub truncate_unaligned: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            role: Role::Client,
            initial_server_salt: 0,
            truncate_unaligned: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_are_opposite() {
        for role in [Role::Client, Role::Server] {
            assert_ne!(role.outgoing(), role.incoming());
        }
        assert_eq!(Role::Client.incoming(), Role::Server.outgoing());
    }
}
