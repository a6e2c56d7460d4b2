//! Dynamically-typed TL values.
//!
//! A [`TlObject`] is one constructor instance: its id plus named fields in
//! schema order. Flags fields are not stored; the codec derives them from
//! which optional fields are present.

use std::fmt;

/// A single TL value.
#[derive(Clone, Debug, PartialEq)]
pub enum TlValue {
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `double`
    Double(f64),
    /// `int128`
    Int128([u8; 16]),
    /// `int256`
    Int256([u8; 32]),
    /// `bytes`
    Bytes(Vec<u8>),
    /// `string`
    String(String),
    /// `Bool`
    Bool(bool),
    /// `true`: a flag-only marker with no wire representation.
    True,
    /// `Vector<T>` / `vector<T>`
    Vector(Vec<TlValue>),
    /// Any boxed or bare constructor.
    Object(Box<TlObject>),
}

impl TlValue {
    /// Build a `Vector` from anything convertible into values.
    pub fn vector<T: Into<TlValue>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::Vector(items.into_iter().map(Into::into).collect())
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Int128(_) => "int128",
            Self::Int256(_) => "int256",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Bool(_) => "Bool",
            Self::True => "true",
            Self::Vector(_) => "vector",
            Self::Object(_) => "object",
        }
    }

    /// The inner `i32`, if this is an `Int`.
    pub fn as_int(&self) -> Option<i32> {
        match self { Self::Int(v) => Some(*v), _ => None }
    }

    /// The inner `i64`, if this is a `Long`.
    pub fn as_long(&self) -> Option<i64> {
        match self { Self::Long(v) => Some(*v), _ => None }
    }

    /// The inner `f64`, if this is a `Double`.
    pub fn as_double(&self) -> Option<f64> {
        match self { Self::Double(v) => Some(*v), _ => None }
    }

    /// The inner bytes of a `Bytes` or `String`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            Self::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// The inner `str`, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self { Self::String(s) => Some(s), _ => None }
    }

    /// The inner `bool` of a `Bool`; `True` reads as `true`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::True => Some(true),
            _ => None,
        }
    }

    /// The items, if this is a `Vector`.
    pub fn as_vector(&self) -> Option<&[TlValue]> {
        match self { Self::Vector(v) => Some(v), _ => None }
    }

    /// The nested object, if this is an `Object`.
    pub fn as_object(&self) -> Option<&TlObject> {
        match self { Self::Object(o) => Some(o), _ => None }
    }
}

impl From<i32> for TlValue { fn from(v: i32) -> Self { Self::Int(v) } }
impl From<i64> for TlValue { fn from(v: i64) -> Self { Self::Long(v) } }
impl From<f64> for TlValue { fn from(v: f64) -> Self { Self::Double(v) } }
impl From<bool> for TlValue { fn from(v: bool) -> Self { Self::Bool(v) } }
impl From<[u8; 16]> for TlValue { fn from(v: [u8; 16]) -> Self { Self::Int128(v) } }
impl From<[u8; 32]> for TlValue { fn from(v: [u8; 32]) -> Self { Self::Int256(v) } }
impl From<Vec<u8>> for TlValue { fn from(v: Vec<u8>) -> Self { Self::Bytes(v) } }
impl From<String> for TlValue { fn from(v: String) -> Self { Self::String(v) } }
impl From<&str> for TlValue { fn from(v: &str) -> Self { Self::String(v.to_owned()) } }
impl From<TlObject> for TlValue { fn from(v: TlObject) -> Self { Self::Object(Box::new(v)) } }

/// One constructor instance.
#[derive(Clone, Debug, PartialEq)]
pub struct TlObject {
    /// Constructor id.
    pub id:     u32,
    /// Constructor full name (`ns.name`).
    pub name:   String,
    /// Fields in schema order. Absent optional fields are simply missing.
    pub fields: Vec<(String, TlValue)>,
}

impl TlObject {
    /// An object with no fields yet.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), fields: Vec::new() }
    }

    /// Builder-style: append a field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<TlValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing any previous value with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<TlValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&TlValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<TlValue> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }
}

impl fmt::Display for TlObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:08x}", self.name, self.id)?;
        if self.fields.is_empty() {
            return Ok(());
        }
        f.write_str(" {")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 { f.write_str(",")?; }
            write!(f, " {name}: ")?;
            match value {
                TlValue::Object(o) => write!(f, "{o}")?,
                TlValue::Bytes(b) => write!(f, "<{} bytes>", b.len())?,
                TlValue::String(s) => write!(f, "{s:?}")?,
                TlValue::Vector(v) => write!(f, "[{} items]", v.len())?,
                other => write!(f, "{other:?}")?,
            }
        }
        f.write_str(" }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut o = TlObject::new(1, "x").with("a", 1i32).with("b", 2i64);
        o.set("a", 5i32);
        assert_eq!(o.fields[0], ("a".to_owned(), TlValue::Int(5)));
        assert_eq!(o.fields.len(), 2);
    }

    #[test]
    fn remove_keeps_order() {
        let mut o = TlObject::new(1, "x").with("a", 1i32).with("b", 2i64).with("c", true);
        assert_eq!(o.remove("b"), Some(TlValue::Long(2)));
        assert_eq!(o.remove("b"), None);
        let names: Vec<_> = o.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn vector_from_vec() {
        let v = TlValue::vector([1i64, 2, 3]);
        assert_eq!(v.as_vector().unwrap().len(), 3);
    }

    #[test]
    fn display_is_compact() {
        let o = TlObject::new(0x347773c5, "pong").with("msg_id", 1i64).with("ping_id", 2i64);
        assert_eq!(o.to_string(), "pong#347773c5 { msg_id: Long(1), ping_id: Long(2) }");
    }
}
