//! TL binary codec for MTProto.
//!
//! Two layers live here:
//!
//! | Layer            | Contents                                                      |
//! |------------------|---------------------------------------------------------------|
//! | Primitives       | [`Serializable`] / [`Deserializable`] for ints, bytes, vectors |
//! | Schema-driven    | [`Schema`] registry, [`TlObject`] values, encode/decode/size   |
//!
//! The bundled [`Schema::mtproto`] covers the MTProto service layer
//! (`pong`, `msg_container`, `rpc_result`, …). Application schemas are
//! added at runtime with [`Schema::extend`].
//!
//! # Example
//!
//! ```rust
//! use mtcore_tl::{Schema, TlObject};
//!
//! let schema = Schema::mtproto();
//! let pong = schema.object("pong").unwrap()
//!     .with("msg_id", 1i64)
//!     .with("ping_id", 2i64);
//!
//! let bytes = schema.object_to_bytes(&pong).unwrap();
//! assert_eq!(bytes.len(), schema.size_of(&pong).unwrap());
//!
//! let back: TlObject = schema.object_from_bytes(&bytes, Some("Pong")).unwrap();
//! assert_eq!(back, pong);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod deserialize;
pub mod json;
mod object;
pub mod schema;
pub mod serialize;

pub use codec::EncodeError;
pub use deserialize::{Cursor, Deserializable};
pub use object::{TlObject, TlValue};
pub use schema::Schema;
pub use serialize::Serializable;

/// Bare vector: `vector` (lowercase) as opposed to the boxed `Vector`.
///
/// A length-prefixed list without the `0x1cb5c415` header.
#[derive(Clone, Debug, PartialEq)]
pub struct RawVec<T>(pub Vec<T>);

/// Boxed vector: `Vector<T>`, written with its constructor id.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxedVec<T>(pub Vec<T>);

/// Opaque bytes passed through without a length prefix.
///
/// Deserializing a `Blob` consumes the rest of the cursor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Blob(pub Vec<u8>);

impl From<Vec<u8>> for Blob {
    fn from(v: Vec<u8>) -> Self { Self(v) }
}
