//! The MTProto 2.0 encrypted session.

use std::fmt;
use std::sync::Arc;

use mtcore_crypto::aes::BLOCK_LEN;
use mtcore_crypto::{
    AesIge, AuthKey, CryptoProvider, DefaultCrypto, DequeBuffer, DerivedKeys, ige_key_iv, message_key,
};
use mtcore_tl::{Schema, TlObject, deserialize};

use crate::frame::{
    ENVELOPE_HEADER_LEN, FRAME_HEADER_LEN, FrameHeader, KEY_ID_LEN, MAX_CHOSEN_PADDING, MAX_PADDING,
    MIN_PADDING, MSG_KEY_LEN, padding_len,
};
use crate::{DecryptedMessage, DropReason, MessageId, Payload, SessionConfig, SessionError, Unpacked};

/// Auth key and everything derived from it. Present as a whole or not at all.
struct Keyed {
    auth_key: AuthKey,
    derived:  DerivedKeys,
}

/// A frame that survived decryption and header checks.
struct Opened {
    frame:  Vec<u8>,
    header: FrameHeader,
}

impl Opened {
    fn content(&self) -> &[u8] {
        &self.frame[FRAME_HEADER_LEN..FRAME_HEADER_LEN + self.header.length as usize]
    }

    fn padding_len(&self) -> usize {
        self.frame.len() - FRAME_HEADER_LEN - self.header.length as usize
    }
}

/// MTProto 2.0 encrypted session.
///
/// Holds the auth key (if any), the session id and the current server
/// salt. [`encrypt`](Self::encrypt) turns content into a wire envelope,
/// [`decrypt`](Self::decrypt) validates and opens one.
///
/// A session starts **unkeyed**; [`setup_keys`](Self::setup_keys) makes it
/// **authorized** and [`reset`](Self::reset) returns it to unkeyed with a
/// fresh session id.
///
/// # Example
///
/// ```rust
/// use mtcore_crypto::AuthKey;
/// use mtcore_session::{MessageId, MtprotoSession, Payload, Role, SessionConfig};
///
/// let key = AuthKey::from_bytes([7u8; 256]);
/// let mut client = MtprotoSession::new().unwrap();
/// client.setup_keys(key.clone());
///
/// let mut server = MtprotoSession::with_config(SessionConfig {
///     role: Role::Server,
///     ..Default::default()
/// }).unwrap();
/// server.setup_keys(key);
/// server.restore_session_id(client.session_id());
///
/// let envelope = client.encrypt(Payload::Raw(b"ping"), MessageId(4), 1).unwrap();
/// let msg = server.decrypt_raw(&envelope).unwrap().message().unwrap();
/// assert_eq!(msg.content, b"ping");
/// ```
pub struct MtprotoSession<C: CryptoProvider = DefaultCrypto> {
    crypto:      C,
    config:      SessionConfig,
    schema:      Arc<Schema>,
    keys:        Option<Keyed>,
    session_id:  i64,
    server_salt: i64,
}

impl MtprotoSession<DefaultCrypto> {
    /// A client session with the default provider and configuration.
    pub fn new() -> Result<Self, SessionError> {
        Self::with_config(SessionConfig::default())
    }

    /// A session with the default provider.
    pub fn with_config(config: SessionConfig) -> Result<Self, SessionError> {
        Self::with_provider(DefaultCrypto, config)
    }
}

impl<C: CryptoProvider> MtprotoSession<C> {
    /// A session using `crypto` for every hash and cipher operation.
    ///
    /// Content is encoded with [`Schema::mtproto`] until
    /// [`with_schema`](Self::with_schema) supplies another one.
    pub fn with_provider(crypto: C, config: SessionConfig) -> Result<Self, SessionError> {
        let session_id = random_session_id()?;
        let server_salt = config.initial_server_salt;
        log::debug!("[session {}] created as {:?}", hex_id(session_id), config.role);
        Ok(Self {
            crypto,
            config,
            schema: Arc::new(Schema::mtproto()),
            keys: None,
            session_id,
            server_salt,
        })
    }

    /// Replace the schema used to encode and decode content.
    pub fn with_schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = schema;
        self
    }

    // ── Key lifecycle ────────────────────────────────────────────────────

    /// Install `auth_key`, deriving the key id and both message-key salts.
    ///
    /// Leaves the session id and server salt untouched.
    pub fn setup_keys(&mut self, auth_key: AuthKey) {
        let derived = DerivedKeys::derive(&self.crypto, &auth_key);
        log::info!(
            "[session {}] auth key set up, key_id={}",
            hex_id(self.session_id),
            hex::encode(derived.key_id)
        );
        self.keys = Some(Keyed { auth_key, derived });
    }

    /// Forget the auth key and start a new session id.
    ///
    /// The server salt survives: it is negotiated separately from the key.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        let session_id = random_session_id()?;
        log::info!("[session {}] reset, new session {}", hex_id(self.session_id), hex_id(session_id));
        self.keys = None;
        self.session_id = session_id;
        Ok(())
    }

    /// Whether an auth key is set up.
    pub fn authorized(&self) -> bool { self.keys.is_some() }

    /// The current key id, if authorized.
    pub fn key_id(&self) -> Option<[u8; 8]> {
        self.keys.as_ref().map(|k| k.derived.key_id)
    }

    /// The auth key bytes, if authorized (for persistence).
    pub fn auth_key(&self) -> Option<&AuthKey> {
        self.keys.as_ref().map(|k| &k.auth_key)
    }

    // ── Identity and salt ────────────────────────────────────────────────

    /// The current session id.
    pub fn session_id(&self) -> i64 { self.session_id }

    /// Adopt a previously persisted session id.
    pub fn restore_session_id(&mut self, session_id: i64) {
        log::debug!("[session {}] restored from {}", hex_id(session_id), hex_id(self.session_id));
        self.session_id = session_id;
    }

    /// The server salt written into outgoing frames.
    pub fn server_salt(&self) -> i64 { self.server_salt }

    /// Replace the server salt (e.g. after `bad_server_salt`).
    pub fn set_server_salt(&mut self, salt: i64) {
        if salt != self.server_salt {
            log::debug!("[session {}] server salt changed to {salt:#018x}", hex_id(self.session_id));
        }
        self.server_salt = salt;
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig { &self.config }

    /// The schema content is encoded and decoded with.
    pub fn schema(&self) -> &Arc<Schema> { &self.schema }

    // ── Encrypt ──────────────────────────────────────────────────────────

    /// Frame, pad and encrypt `content` into a wire envelope.
    ///
    /// The envelope is `key_id(8) ‖ msg_key(16) ‖ ciphertext`, the
    /// ciphertext always a multiple of 16 bytes. Padding is random.
    pub fn encrypt<'a>(
        &self,
        content:    impl Into<Payload<'a>>,
        message_id: MessageId,
        seq_no:     u32,
    ) -> Result<Vec<u8>, SessionError> {
        let content = content.into();
        let keyed = self.keys.as_ref().ok_or(SessionError::Unkeyed)?;
        let length = match content {
            Payload::Object(obj) => self.schema.size_of(obj)?,
            Payload::Raw(bytes) => bytes.len(),
        };

        let mut padding = [0u8; MAX_CHOSEN_PADDING];
        let padding = &mut padding[..padding_len(length)];
        getrandom::getrandom(padding).map_err(SessionError::Random)?;

        self.seal(keyed, content, length, message_id, seq_no, padding)
    }

    fn seal(
        &self,
        keyed:      &Keyed,
        content:    Payload<'_>,
        length:     usize,
        message_id: MessageId,
        seq_no:     u32,
        padding:    &[u8],
    ) -> Result<Vec<u8>, SessionError> {
        let header = FrameHeader {
            salt: self.server_salt,
            session_id: self.session_id,
            message_id: message_id.0,
            seq_no,
            length: u32::try_from(length).map_err(|_| SessionError::ContentTooLong { len: length })?,
        };

        let frame_len = FRAME_HEADER_LEN + length + padding.len();
        let mut buf = DequeBuffer::with_capacity(frame_len, ENVELOPE_HEADER_LEN);
        header.write(&mut buf);
        match content {
            Payload::Object(obj) => self.schema.encode_object(obj, &mut buf)?,
            Payload::Raw(bytes) => buf.extend_from_slice(bytes),
        }
        buf.extend_from_slice(padding);
        debug_assert_eq!(buf.len() % BLOCK_LEN, 0);

        let side = self.config.role.outgoing();
        let msg_key = message_key(&self.crypto, keyed.derived.msg_key_salt(side), buf.as_ref());
        let (key, iv) = ige_key_iv(&self.crypto, &keyed.auth_key, &msg_key, side);
        self.crypto.aes_ige(&key, &iv).encrypt(buf.as_mut());

        buf.extend_front(&msg_key);
        buf.extend_front(&keyed.derived.key_id);
        Ok(buf.into_vec())
    }

    // ── Decrypt ──────────────────────────────────────────────────────────

    /// Validate and decrypt `envelope`, decoding its content as one boxed
    /// schema object.
    ///
    /// Frames that fail validation come back as [`Unpacked::Dropped`].
    /// An `Err` means the session is unkeyed or the authenticated content
    /// did not decode.
    pub fn decrypt(&self, envelope: &[u8]) -> Result<Unpacked<TlObject>, SessionError> {
        self.unpack(envelope, |schema, content| schema.object_from_bytes(content, None))
    }

    /// Like [`decrypt`](Self::decrypt) but returns the content bytes as-is.
    pub fn decrypt_raw(&self, envelope: &[u8]) -> Result<Unpacked<Vec<u8>>, SessionError> {
        self.unpack(envelope, |_, content| Ok(content.to_vec()))
    }

    fn unpack<T>(
        &self,
        envelope: &[u8],
        decode:   impl FnOnce(&Schema, &[u8]) -> deserialize::Result<T>,
    ) -> Result<Unpacked<T>, SessionError> {
        let keyed = self.keys.as_ref().ok_or(SessionError::Unkeyed)?;
        let opened = match self.open(keyed, envelope) {
            Ok(opened) => opened,
            Err(reason) => return Ok(self.reject(reason)),
        };

        let content = decode(&*self.schema, opened.content())?;

        let padding = opened.padding_len();
        if !(MIN_PADDING..=MAX_PADDING).contains(&padding) {
            return Ok(self.reject(DropReason::InvalidPadding { padding }));
        }

        log::trace!(
            "[session {}] accepted msg_id={} seq_no={}",
            hex_id(self.session_id),
            MessageId(opened.header.message_id),
            opened.header.seq_no
        );
        Ok(Unpacked::Message(DecryptedMessage {
            salt:       opened.header.salt,
            message_id: MessageId(opened.header.message_id),
            seq_no:     opened.header.seq_no,
            content,
        }))
    }

    fn open(&self, keyed: &Keyed, envelope: &[u8]) -> Result<Opened, DropReason> {
        let too_short = DropReason::TooShort { len: envelope.len() };
        let (key_id, rest) = envelope.split_first_chunk::<KEY_ID_LEN>().ok_or(too_short.clone())?;
        let (msg_key, ciphertext) = rest.split_first_chunk::<MSG_KEY_LEN>().ok_or(too_short)?;

        if *key_id != keyed.derived.key_id {
            return Err(DropReason::UnknownKeyId { received: *key_id });
        }

        let aligned = ciphertext.len() - ciphertext.len() % BLOCK_LEN;
        if aligned != ciphertext.len() {
            if !self.config.truncate_unaligned {
                return Err(DropReason::Unaligned { len: ciphertext.len() });
            }
            log::debug!(
                "[session {}] truncating {} trailing ciphertext bytes",
                hex_id(self.session_id),
                ciphertext.len() - aligned
            );
        }

        let side = self.config.role.incoming();
        let mut frame = ciphertext[..aligned].to_vec();
        let (key, iv) = ige_key_iv(&self.crypto, &keyed.auth_key, msg_key, side);
        self.crypto.aes_ige(&key, &iv).decrypt(&mut frame);

        let expected = message_key(&self.crypto, keyed.derived.msg_key_salt(side), &frame);
        if !ct_eq(&expected, msg_key) {
            log::debug!(
                "[session {}] msg_key={} expected {}",
                hex_id(self.session_id),
                hex::encode(msg_key),
                hex::encode(expected)
            );
            return Err(DropReason::IntegrityCheckFailed);
        }

        let header = FrameHeader::read(&frame).map_err(|_| DropReason::FrameTooShort { len: frame.len() })?;

        if header.session_id != self.session_id {
            return Err(DropReason::ForeignSession { received: header.session_id });
        }

        let available = frame.len() - FRAME_HEADER_LEN;
        if header.length as usize > available {
            return Err(DropReason::LengthExceedsFrame { length: header.length, available });
        }
        if header.length % 4 != 0 {
            return Err(DropReason::MisalignedLength { length: header.length });
        }

        Ok(Opened { frame, header })
    }

    fn reject<T>(&self, reason: DropReason) -> Unpacked<T> {
        log::warn!("[session {}] dropping frame: {reason}", hex_id(self.session_id));
        Unpacked::Dropped(reason)
    }
}

impl<C: CryptoProvider> fmt::Debug for MtprotoSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MtprotoSession")
            .field("role", &self.config.role)
            .field("session_id", &hex_id(self.session_id))
            .field("key_id", &self.key_id().map(hex::encode))
            .field("server_salt", &self.server_salt)
            .finish_non_exhaustive()
    }
}

fn random_session_id() -> Result<i64, SessionError> {
    let mut rnd = [0u8; 8];
    getrandom::getrandom(&mut rnd).map_err(SessionError::Random)?;
    Ok(i64::from_le_bytes(rnd))
}

fn hex_id(id: i64) -> String { hex::encode(id.to_le_bytes()) }

/// Compare message keys without an early exit.
fn ct_eq(a: &[u8; MSG_KEY_LEN], b: &[u8; MSG_KEY_LEN]) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn pair(key: [u8; 256]) -> (MtprotoSession, MtprotoSession) {
        let mut client = MtprotoSession::new().unwrap();
        client.setup_keys(AuthKey::from_bytes(key));
        let mut server =
            MtprotoSession::with_config(SessionConfig { role: Role::Server, ..Default::default() }).unwrap();
        server.setup_keys(AuthKey::from_bytes(key));
        server.restore_session_id(client.session_id());
        (client, server)
    }

    /// Seal with a chosen padding, bypassing the random source.
    fn seal_raw(s: &MtprotoSession, content: &[u8], padding: &[u8]) -> Vec<u8> {
        let keyed = s.keys.as_ref().unwrap();
        s.seal(keyed, Payload::Raw(content), content.len(), MessageId(8), 3, padding).unwrap()
    }

    #[test]
    fn sealing_is_deterministic_for_fixed_padding() {
        let (client, _) = pair([5u8; 256]);
        let a = seal_raw(&client, b"abcd", &[0u8; 12]);
        let b = seal_raw(&client, b"abcd", &[0u8; 12]);
        assert_eq!(a, b);
        assert_eq!(a.len(), ENVELOPE_HEADER_LEN + 48);
    }

    #[test]
    fn random_padding_changes_ciphertext() {
        let (client, _) = pair([5u8; 256]);
        let a = client.encrypt(Payload::Raw(b"abcd"), MessageId(8), 3).unwrap();
        let b = client.encrypt(Payload::Raw(b"abcd"), MessageId(8), 3).unwrap();
        assert_eq!(a.len(), b.len());
        assert_ne!(a[8..24], b[8..24]);
    }

    #[test]
    fn oversized_padding_dropped() {
        let (client, server) = pair([5u8; 256]);
        let envelope = seal_raw(&client, &[], &[0u8; 1040]);
        let out = server.decrypt_raw(&envelope).unwrap();
        assert_eq!(out, Unpacked::Dropped(DropReason::InvalidPadding { padding: 1040 }));
    }

    #[test]
    fn undersized_padding_dropped() {
        let (client, server) = pair([5u8; 256]);
        // 32 + 8 + 8 = 48: aligned but only 8 bytes of padding
        let envelope = seal_raw(&client, &[1u8; 8], &[0u8; 8]);
        let out = server.decrypt_raw(&envelope).unwrap();
        assert_eq!(out, Unpacked::Dropped(DropReason::InvalidPadding { padding: 8 }));
    }

    #[test]
    fn misaligned_length_dropped() {
        let (client, server) = pair([5u8; 256]);
        let envelope = seal_raw(&client, &[1u8; 3], &[0u8; 13]);
        let out = server.decrypt_raw(&envelope).unwrap();
        assert_eq!(out, Unpacked::Dropped(DropReason::MisalignedLength { length: 3 }));
    }

    #[test]
    fn constant_time_compare() {
        assert!(ct_eq(&[1; 16], &[1; 16]));
        let mut b = [1; 16];
        b[15] = 0;
        assert!(!ct_eq(&[1; 16], &b));
    }
}
