//! Schema-driven encoding and decoding of [`TlObject`]s.
//!
//! The walker resolves every parameter type against the [`Schema`]:
//!
//! | TL type               | Wire form                                      |
//! |-----------------------|------------------------------------------------|
//! | `int` / `long`        | 4 / 8 bytes LE                                 |
//! | `double`              | 8 bytes LE                                     |
//! | `int128` / `int256`   | 16 / 32 raw bytes                              |
//! | `bytes` / `string`    | length-prefixed, zero-padded to 4 bytes        |
//! | `Bool`                | `boolTrue` / `boolFalse` constructor id        |
//! | `true`                | nothing; presence is carried by a flag bit     |
//! | `Vector<T>`           | `0x1cb5c415`, count, items                     |
//! | `vector<T>`           | count, items                                   |
//! | `Object`, `!X`, `Foo` | constructor id, then fields                    |
//! | `%Foo`, `foo`         | fields only                                    |

use std::fmt;

use crate::deserialize::{self, Cursor, Deserializable, Error, read_vector_len};
use crate::schema::{Definition, ParamType, Schema, TypeRef};
use crate::serialize::{Serializable, VECTOR_ID, bytes_len, write_bytes};
use crate::{TlObject, TlValue};

/// Longest payload a TL byte string can carry (3-byte length).
pub const MAX_BYTES_LEN: usize = 0x00ff_ffff;

/// Nesting limit for objects and vectors while decoding.
pub const MAX_DEPTH: usize = 64;

// ─── EncodeError ─────────────────────────────────────────────────────────────

/// Errors raised while encoding or sizing a [`TlObject`].
#[derive(Clone, Debug, PartialEq)]
pub enum EncodeError {
    /// The object's id is not in the schema.
    UnknownConstructor {
        /// Offending id.
        id: u32,
    },
    /// A required field is absent.
    MissingField {
        /// Constructor name.
        constructor: String,
        /// Field name.
        field:       String,
    },
    /// A field holds a value of the wrong kind.
    TypeMismatch {
        /// Field name.
        field:    String,
        /// TL type the schema expects.
        expected: String,
        /// Kind of value that was supplied.
        found:    &'static str,
    },
    /// A nested object's constructor does not produce the expected type.
    WrongConstructor {
        /// Expected TL type.
        expected: String,
        /// Supplied constructor name.
        found:    String,
    },
    /// A byte string longer than [`MAX_BYTES_LEN`].
    ValueTooLong {
        /// Field name.
        field: String,
        /// Supplied length.
        len:   usize,
    },
    /// The schema references a type it cannot resolve.
    UnknownType {
        /// Type name.
        name: String,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownConstructor { id } => write!(f, "unknown constructor id: {id:#010x}"),
            Self::MissingField { constructor, field } => {
                write!(f, "{constructor}: missing required field `{field}`")
            }
            Self::TypeMismatch { field, expected, found } => {
                write!(f, "field `{field}`: expected {expected}, got {found}")
            }
            Self::WrongConstructor { expected, found } => {
                write!(f, "constructor {found} does not produce type {expected}")
            }
            Self::ValueTooLong { field, len } => {
                write!(f, "field `{field}`: {len} bytes exceeds the TL limit")
            }
            Self::UnknownType { name } => write!(f, "schema has no type named {name}"),
        }
    }
}

impl std::error::Error for EncodeError {}

// ─── Shape resolution ────────────────────────────────────────────────────────

enum Shape<'s> {
    Int,
    Long,
    Double,
    Int128,
    Int256,
    Bytes,
    String,
    Bool,
    True,
    Vector { boxed: bool, item: &'s TypeRef },
    Any,
    Boxed(String),
    Bare(&'s Definition),
}

impl Schema {
    fn shape<'s>(&'s self, ty: &'s TypeRef) -> Result<Shape<'s>, String> {
        if ty.generic_ref {
            return Ok(Shape::Any);
        }
        if ty.namespace.is_empty() {
            let prim = match ty.name.as_str() {
                "int" => Some(Shape::Int),
                "long" => Some(Shape::Long),
                "double" => Some(Shape::Double),
                "int128" => Some(Shape::Int128),
                "int256" => Some(Shape::Int256),
                "bytes" => Some(Shape::Bytes),
                "string" => Some(Shape::String),
                "Bool" => Some(Shape::Bool),
                "true" => Some(Shape::True),
                "Object" => Some(Shape::Any),
                "Vector" | "vector" => {
                    let item = ty.generic_arg.as_deref().ok_or_else(|| ty.to_string())?;
                    Some(Shape::Vector { boxed: ty.name == "Vector", item })
                }
                _ => None,
            };
            if let Some(shape) = prim {
                return Ok(shape);
            }
        }
        if ty.bare {
            return self.bare_constructor(ty).map(Shape::Bare).ok_or_else(|| ty.full_name());
        }
        Ok(Shape::Boxed(ty.full_name()))
    }

    fn definition_for(&self, obj: &TlObject) -> Result<&Definition, EncodeError> {
        self.by_id(obj.id).ok_or(EncodeError::UnknownConstructor { id: obj.id })
    }
}

/// Resolve the value of `param` in `obj`: `Ok(None)` when an optional
/// field is absent.
fn field_value<'o>(
    def:   &Definition,
    name:  &str,
    ty:    &ParamType,
    obj:   &'o TlObject,
) -> Result<Option<&'o TlValue>, EncodeError> {
    let ParamType::Normal { flag, ty } = ty else { return Ok(None) };
    match (obj.get(name), flag) {
        (Some(TlValue::Bool(false)), Some(_)) if ty.name == "true" => Ok(None),
        (Some(v), _) => Ok(Some(v)),
        (None, Some(_)) => Ok(None),
        (None, None) => Err(EncodeError::MissingField {
            constructor: def.full_name(),
            field:       name.to_owned(),
        }),
    }
}

/// Compute the bitmask for the flags field `field` from present fields.
fn flag_word(def: &Definition, field: &str, obj: &TlObject) -> u32 {
    let mut word = 0u32;
    for p in &def.params {
        if let ParamType::Normal { flag: Some(fl), ty } = &p.ty {
            if fl.field != field {
                continue;
            }
            let present = match obj.get(&p.name) {
                Some(TlValue::Bool(false)) if ty.name == "true" => false,
                Some(_) => true,
                None => false,
            };
            if present {
                word |= 1 << fl.bit;
            }
        }
    }
    word
}

fn mismatch(field: &str, expected: &TypeRef, found: &TlValue) -> EncodeError {
    EncodeError::TypeMismatch {
        field:    field.to_owned(),
        expected: expected.to_string(),
        found:    found.kind(),
    }
}

// ─── Encoding ────────────────────────────────────────────────────────────────

impl Schema {
    /// Encode `obj` as a boxed value (constructor id followed by fields).
    pub fn encode_object<B: Extend<u8>>(&self, obj: &TlObject, buf: &mut B) -> Result<(), EncodeError> {
        let def = self.definition_for(obj)?;
        def.id.serialize(buf);
        self.encode_body(def, obj, buf)
    }

    /// Encode `obj` into a fresh, exactly-sized `Vec<u8>`.
    pub fn object_to_bytes(&self, obj: &TlObject) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(self.size_of(obj)?);
        self.encode_object(obj, &mut out)?;
        Ok(out)
    }

    fn encode_body<B: Extend<u8>>(&self, def: &Definition, obj: &TlObject, buf: &mut B) -> Result<(), EncodeError> {
        for p in &def.params {
            match &p.ty {
                ParamType::Flags => flag_word(def, &p.name, obj).serialize(buf),
                ParamType::Normal { ty, .. } => {
                    if let Some(value) = field_value(def, &p.name, &p.ty, obj)? {
                        self.encode_value(&p.name, ty, value, buf)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn encode_value<B: Extend<u8>>(
        &self,
        field: &str,
        ty:    &TypeRef,
        value: &TlValue,
        buf:   &mut B,
    ) -> Result<(), EncodeError> {
        let shape = self.shape(ty).map_err(|name| EncodeError::UnknownType { name })?;
        match (shape, value) {
            (Shape::Int, TlValue::Int(v)) => v.serialize(buf),
            (Shape::Long, TlValue::Long(v)) => v.serialize(buf),
            (Shape::Double, TlValue::Double(v)) => v.serialize(buf),
            (Shape::Int128, TlValue::Int128(v)) => v.serialize(buf),
            (Shape::Int256, TlValue::Int256(v)) => v.serialize(buf),
            (Shape::Bytes | Shape::String, TlValue::Bytes(_) | TlValue::String(_)) => {
                let data = value.as_bytes().unwrap_or_default();
                if data.len() > MAX_BYTES_LEN {
                    return Err(EncodeError::ValueTooLong { field: field.to_owned(), len: data.len() });
                }
                write_bytes(data, buf);
            }
            (Shape::Bool, TlValue::Bool(b)) => b.serialize(buf),
            (Shape::True, TlValue::True | TlValue::Bool(true)) => {}
            (Shape::Vector { boxed, item }, TlValue::Vector(items)) => {
                if boxed {
                    VECTOR_ID.serialize(buf);
                }
                (items.len() as u32).serialize(buf);
                for v in items {
                    self.encode_value(field, item, v, buf)?;
                }
            }
            (Shape::Any, TlValue::Object(o)) => self.encode_object(o, buf)?,
            (Shape::Boxed(expected), TlValue::Object(o)) => {
                let def = self.definition_for(o)?;
                if def.ty.full_name() != expected {
                    return Err(EncodeError::WrongConstructor { expected, found: def.full_name() });
                }
                def.id.serialize(buf);
                self.encode_body(def, o, buf)?;
            }
            (Shape::Bare(def), TlValue::Object(o)) => {
                if o.id != def.id {
                    return Err(EncodeError::WrongConstructor { expected: def.full_name(), found: o.name.clone() });
                }
                self.encode_body(def, o, buf)?;
            }
            (_, value) => return Err(mismatch(field, ty, value)),
        }
        Ok(())
    }
}

// ─── Sizing ──────────────────────────────────────────────────────────────────

impl Schema {
    /// Exact number of bytes [`Schema::encode_object`] writes for `obj`,
    /// computed without allocating.
    ///
    /// Fails exactly when encoding would.
    pub fn size_of(&self, obj: &TlObject) -> Result<usize, EncodeError> {
        let def = self.definition_for(obj)?;
        Ok(4 + self.body_size(def, obj)?)
    }

    fn body_size(&self, def: &Definition, obj: &TlObject) -> Result<usize, EncodeError> {
        let mut total = 0;
        for p in &def.params {
            match &p.ty {
                ParamType::Flags => total += 4,
                ParamType::Normal { ty, .. } => {
                    if let Some(value) = field_value(def, &p.name, &p.ty, obj)? {
                        total += self.value_size(&p.name, ty, value)?;
                    }
                }
            }
        }
        Ok(total)
    }

    fn value_size(&self, field: &str, ty: &TypeRef, value: &TlValue) -> Result<usize, EncodeError> {
        let shape = self.shape(ty).map_err(|name| EncodeError::UnknownType { name })?;
        Ok(match (shape, value) {
            (Shape::Int, TlValue::Int(_)) => 4,
            (Shape::Long, TlValue::Long(_)) | (Shape::Double, TlValue::Double(_)) => 8,
            (Shape::Int128, TlValue::Int128(_)) => 16,
            (Shape::Int256, TlValue::Int256(_)) => 32,
            (Shape::Bytes | Shape::String, TlValue::Bytes(_) | TlValue::String(_)) => {
                let len = value.as_bytes().map_or(0, <[u8]>::len);
                if len > MAX_BYTES_LEN {
                    return Err(EncodeError::ValueTooLong { field: field.to_owned(), len });
                }
                bytes_len(len)
            }
            (Shape::Bool, TlValue::Bool(_)) => 4,
            (Shape::True, TlValue::True | TlValue::Bool(true)) => 0,
            (Shape::Vector { boxed, item }, TlValue::Vector(items)) => {
                let mut total = if boxed { 8 } else { 4 };
                for v in items {
                    total += self.value_size(field, item, v)?;
                }
                total
            }
            (Shape::Any, TlValue::Object(o)) => self.size_of(o)?,
            (Shape::Boxed(expected), TlValue::Object(o)) => {
                let def = self.definition_for(o)?;
                if def.ty.full_name() != expected {
                    return Err(EncodeError::WrongConstructor { expected, found: def.full_name() });
                }
                4 + self.body_size(def, o)?
            }
            (Shape::Bare(def), TlValue::Object(o)) => {
                if o.id != def.id {
                    return Err(EncodeError::WrongConstructor { expected: def.full_name(), found: o.name.clone() });
                }
                self.body_size(def, o)?
            }
            (_, value) => return Err(mismatch(field, ty, value)),
        })
    }
}

// ─── Decoding ────────────────────────────────────────────────────────────────

impl Schema {
    /// Decode one boxed object from `buf`.
    ///
    /// With `expected_type` set (e.g. `"Pong"`), a constructor of any other
    /// type is rejected with [`Error::UnexpectedConstructor`].
    pub fn decode_object(&self, buf: &mut Cursor<'_>, expected_type: Option<&str>) -> deserialize::Result<TlObject> {
        self.decode_boxed(buf, expected_type, 0)
    }

    /// Decode one boxed object that must span `bytes` exactly.
    pub fn object_from_bytes(&self, bytes: &[u8], expected_type: Option<&str>) -> deserialize::Result<TlObject> {
        let mut cursor = Cursor::from_slice(bytes);
        let obj = self.decode_object(&mut cursor, expected_type)?;
        cursor.finish()?;
        Ok(obj)
    }

    fn decode_boxed(&self, buf: &mut Cursor<'_>, expected: Option<&str>, depth: usize) -> deserialize::Result<TlObject> {
        let id = u32::deserialize(buf)?;
        let def = self.by_id(id).ok_or(Error::UnknownConstructor { id })?;
        if let Some(expected) = expected {
            if def.ty.full_name() != expected {
                return Err(Error::UnexpectedConstructor { id });
            }
        }
        self.decode_body(def, buf, depth)
    }

    fn decode_body(&self, def: &Definition, buf: &mut Cursor<'_>, depth: usize) -> deserialize::Result<TlObject> {
        if depth >= MAX_DEPTH {
            return Err(Error::NestingTooDeep);
        }
        let mut obj = TlObject::new(def.id, def.full_name());
        let mut flags: Vec<(&str, u32)> = Vec::new();

        for p in &def.params {
            match &p.ty {
                ParamType::Flags => flags.push((p.name.as_str(), u32::deserialize(buf)?)),
                ParamType::Normal { ty, flag } => {
                    if let Some(fl) = flag {
                        let word = flags
                            .iter()
                            .find(|(name, _)| *name == fl.field)
                            .map_or(0, |&(_, w)| w);
                        if word & (1 << fl.bit) == 0 {
                            continue;
                        }
                    }
                    let value = self.decode_value(ty, buf, depth + 1)?;
                    obj.fields.push((p.name.clone(), value));
                }
            }
        }
        Ok(obj)
    }

    fn decode_value(&self, ty: &TypeRef, buf: &mut Cursor<'_>, depth: usize) -> deserialize::Result<TlValue> {
        let shape = self.shape(ty).map_err(|name| Error::UnknownType { name })?;
        Ok(match shape {
            Shape::Int => TlValue::Int(i32::deserialize(buf)?),
            Shape::Long => TlValue::Long(i64::deserialize(buf)?),
            Shape::Double => TlValue::Double(f64::deserialize(buf)?),
            Shape::Int128 => TlValue::Int128(buf.read_array()?),
            Shape::Int256 => TlValue::Int256(buf.read_array()?),
            Shape::Bytes => TlValue::Bytes(Vec::<u8>::deserialize(buf)?),
            Shape::String => TlValue::String(String::deserialize(buf)?),
            Shape::Bool => TlValue::Bool(bool::deserialize(buf)?),
            Shape::True => TlValue::True,
            Shape::Vector { boxed, item } => {
                if depth >= MAX_DEPTH {
                    return Err(Error::NestingTooDeep);
                }
                if boxed {
                    let id = u32::deserialize(buf)?;
                    if id != VECTOR_ID {
                        return Err(Error::UnexpectedConstructor { id });
                    }
                }
                let len = read_vector_len(buf)?;
                let items = (0..len)
                    .map(|_| self.decode_value(item, buf, depth + 1))
                    .collect::<deserialize::Result<Vec<_>>>()?;
                TlValue::Vector(items)
            }
            Shape::Any => TlValue::Object(Box::new(self.decode_boxed(buf, None, depth)?)),
            Shape::Boxed(expected) => TlValue::Object(Box::new(self.decode_boxed(buf, Some(expected.as_str()), depth)?)),
            Shape::Bare(def) => TlValue::Object(Box::new(self.decode_body(def, buf, depth)?)),
        })
    }

    /// An empty object for the constructor `name`, ready to be filled with
    /// [`TlObject::with`].
    pub fn object(&self, name: &str) -> Option<TlObject> {
        self.by_name(name).map(|d| TlObject::new(d.id, d.full_name()))
    }
}
