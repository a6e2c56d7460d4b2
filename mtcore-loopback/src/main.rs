//! In-memory MTProto 2.0 loopback demo.
//!
//! # What this does
//!
//! 1. Generate a random auth key and share it between a client and a server
//!    session (standing in for a completed DH handshake)
//! 2. Client sends `ping`, server answers `pong`
//! 3. Server rotates the salt with `bad_server_salt`; client adopts it
//! 4. Client sends a TL-JSON payload, server prints it as plain JSON
//! 5. A corrupted frame is dropped without disturbing the session
//!
//! # Run
//! ```text
//! RUST_LOG=debug cargo run -p mtcore-loopback
//! ```

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use mtcore::crypto::AuthKey;
use mtcore::session::{MessageId, MtprotoSession, Role, SessionConfig, Unpacked};
use mtcore::tl::TlObject;
use mtcore::tl::json::{json_to_tl, tl_to_json};

type BoxError = Box<dyn std::error::Error>;

// ── Abridged framing over an in-memory pipe ──────────────────────────────────

/// One direction of a connection: abridged-framed packets in a queue.
#[derive(Default)]
struct Pipe(VecDeque<u8>);

impl Pipe {
    fn send(&mut self, payload: &[u8]) {
        let words = payload.len() / 4;
        if words < 0x7f {
            self.0.push_back(words as u8);
        } else {
            self.0.extend([0x7f, words as u8, (words >> 8) as u8, (words >> 16) as u8]);
        }
        self.0.extend(payload);
    }

    fn recv(&mut self) -> Option<Vec<u8>> {
        let first = *self.0.front()?;
        let (header, words) = if first < 0x7f {
            (1, first as usize)
        } else {
            let b = |i| self.0.get(i).copied().map_or(0, usize::from);
            (4, b(1) | b(2) << 8 | b(3) << 16)
        };
        if self.0.len() < header + words * 4 {
            return None;
        }
        self.0.drain(..header);
        Some(self.0.drain(..words * 4).collect())
    }
}

// ── Message ids ──────────────────────────────────────────────────────────────

/// Time-based ids: seconds in the high half, a counter × 4 in the low half.
struct MsgIds {
    counter: u32,
    server:  bool,
}

impl MsgIds {
    fn next(&mut self) -> MessageId {
        self.counter = self.counter.wrapping_add(1);
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        // server ids are ≡ 1 (mod 4), client ids ≡ 0
        MessageId(secs << 32 | u64::from(self.counter) << 2 | u64::from(self.server))
    }
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<(), BoxError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // ── 1. Shared key ────────────────────────────────────────────────────────
    let mut raw_key = [0u8; 256];
    getrandom::getrandom(&mut raw_key)?;
    let auth_key = AuthKey::from_bytes(raw_key);

    let mut client = MtprotoSession::new()?;
    let mut server = MtprotoSession::with_config(SessionConfig { role: Role::Server, ..Default::default() })?;
    client.setup_keys(auth_key.clone());
    server.setup_keys(auth_key);
    server.restore_session_id(client.session_id());
    log::info!("client {client:?}");
    log::info!("server {server:?}");

    let schema = client.schema().clone();
    let mut up = Pipe::default();
    let mut down = Pipe::default();
    let mut client_ids = MsgIds { counter: 0, server: false };
    let mut server_ids = MsgIds { counter: 0, server: true };

    // ── 2. ping → pong ───────────────────────────────────────────────────────
    let ping = build(&schema, "ping", |o| o.with("ping_id", 0x1234_5678_i64))?;
    let ping_id = client_ids.next();
    up.send(&client.encrypt(&ping, ping_id, 1)?);

    let request = receive(&server, &mut up)?;
    log::info!("server got {}", request.content);
    let pong = build(&schema, "pong", |o| {
        o.with("msg_id", ping_id.0 as i64)
            .with("ping_id", request.content.get("ping_id").and_then(|v| v.as_long()).unwrap_or_default())
    })?;
    down.send(&server.encrypt(&pong, server_ids.next(), 1)?);
    log::info!("client got {}", receive(&client, &mut down)?.content);

    // ── 3. salt rotation ─────────────────────────────────────────────────────
    let new_salt = 0x0bad_5a17_i64;
    let bad_salt = build(&schema, "bad_server_salt", |o| {
        o.with("bad_msg_id", ping_id.0 as i64)
            .with("bad_msg_seqno", 1i32)
            .with("error_code", 48i32)
            .with("new_server_salt", new_salt)
    })?;
    server.set_server_salt(new_salt);
    down.send(&server.encrypt(&bad_salt, server_ids.next(), 2)?);

    let notice = receive(&client, &mut down)?;
    if let Some(salt) = notice.content.get("new_server_salt").and_then(|v| v.as_long()) {
        client.set_server_salt(salt);
    }
    log::info!("client salt is now {:#x} (frame said {:#x})", client.server_salt(), notice.salt);

    // ── 4. TL-JSON ───────────────────────────────────────────────────────────
    let payload = serde_json::json!({ "app": "loopback", "version": [1, 0], "debug": true });
    up.send(&client.encrypt(&json_to_tl(&payload), client_ids.next(), 3)?);
    let json = receive(&server, &mut up)?;
    log::info!("server got JSON {} (salt {:#x})", tl_to_json(&json.content)?, json.salt);

    // ── 5. corruption ────────────────────────────────────────────────────────
    let mut frame = client.encrypt(&ping, client_ids.next(), 5)?;
    if let Some(last) = frame.last_mut() {
        *last ^= 0x01;
    }
    match server.decrypt(&frame)? {
        Unpacked::Dropped(reason) => log::info!("corrupted frame dropped: {reason}"),
        Unpacked::Message(m) => log::error!("corrupted frame accepted: {}", m.content),
    }

    log::info!("loopback complete");
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn build(
    schema: &mtcore::tl::Schema,
    name:   &str,
    fill:   impl FnOnce(TlObject) -> TlObject,
) -> Result<TlObject, BoxError> {
    let obj = schema.object(name).ok_or_else(|| format!("schema has no constructor {name}"))?;
    Ok(fill(obj))
}

fn receive(
    session: &MtprotoSession,
    pipe:    &mut Pipe,
) -> Result<mtcore::session::DecryptedMessage<TlObject>, BoxError> {
    let packet = pipe.recv().ok_or("pipe is empty")?;
    match session.decrypt(&packet)? {
        Unpacked::Message(m) => Ok(m),
        Unpacked::Dropped(reason) => Err(format!("frame dropped: {reason}").into()),
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
