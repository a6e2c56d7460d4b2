//! Conversion between [`serde_json::Value`] and the TL `JSONValue` family.
//!
//! ```rust
//! use mtcore_tl::json::{json_to_tl, tl_to_json};
//!
//! let value = serde_json::json!({ "a": [1.5, true, null] });
//! let tl = json_to_tl(&value);
//! assert_eq!(tl.name, "jsonObject");
//! assert_eq!(tl_to_json(&tl).unwrap(), value);
//! ```

use std::fmt;

use serde_json::{Map, Value};

use crate::{TlObject, TlValue};

/// `jsonNull`
pub const JSON_NULL_ID: u32 = 0x3f6d7b68;
/// `jsonBool`
pub const JSON_BOOL_ID: u32 = 0xc7345e6a;
/// `jsonNumber`
pub const JSON_NUMBER_ID: u32 = 0x2be0dfa4;
/// `jsonString`
pub const JSON_STRING_ID: u32 = 0xb71e767a;
/// `jsonArray`
pub const JSON_ARRAY_ID: u32 = 0xf7444763;
/// `jsonObject`
pub const JSON_OBJECT_ID: u32 = 0x99c1d49d;
/// `jsonObjectValue`
pub const JSON_OBJECT_VALUE_ID: u32 = 0xc0de1bd9;

/// A `TlObject` that is not a well-formed `JSONValue`.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonError {
    /// The constructor is not part of the `JSONValue` family.
    NotJson {
        /// Constructor name found.
        name: String,
    },
    /// A required field is missing or has the wrong kind.
    BadField {
        /// Constructor name.
        constructor: &'static str,
        /// Field name.
        field:       &'static str,
    },
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJson { name } => write!(f, "{name} is not a JSONValue constructor"),
            Self::BadField { constructor, field } => {
                write!(f, "{constructor}: field `{field}` missing or malformed")
            }
        }
    }
}

impl std::error::Error for JsonError {}

/// Convert plain JSON into a `JSONValue` object. Numbers become `double`.
pub fn json_to_tl(value: &Value) -> TlObject {
    match value {
        Value::Null => TlObject::new(JSON_NULL_ID, "jsonNull"),
        Value::Bool(b) => TlObject::new(JSON_BOOL_ID, "jsonBool").with("value", *b),
        Value::Number(n) => {
            TlObject::new(JSON_NUMBER_ID, "jsonNumber").with("value", n.as_f64().unwrap_or(0.0))
        }
        Value::String(s) => TlObject::new(JSON_STRING_ID, "jsonString").with("value", s.as_str()),
        Value::Array(items) => TlObject::new(JSON_ARRAY_ID, "jsonArray")
            .with("value", TlValue::vector(items.iter().map(json_to_tl))),
        Value::Object(map) => {
            let entries = map.iter().map(|(key, v)| {
                TlObject::new(JSON_OBJECT_VALUE_ID, "jsonObjectValue")
                    .with("key", key.as_str())
                    .with("value", json_to_tl(v))
            });
            TlObject::new(JSON_OBJECT_ID, "jsonObject").with("value", TlValue::vector(entries))
        }
    }
}

/// Convert a `JSONValue` object back into plain JSON.
///
/// A non-finite `jsonNumber` becomes `null`.
pub fn tl_to_json(obj: &TlObject) -> Result<Value, JsonError> {
    let field = |constructor: &'static str| {
        obj.get("value").ok_or(JsonError::BadField { constructor, field: "value" })
    };
    let bad = |constructor: &'static str, field: &'static str| JsonError::BadField { constructor, field };

    Ok(match obj.id {
        JSON_NULL_ID => Value::Null,
        JSON_BOOL_ID => Value::Bool(field("jsonBool")?.as_bool().ok_or(bad("jsonBool", "value"))?),
        JSON_NUMBER_ID => Value::from(field("jsonNumber")?.as_double().ok_or(bad("jsonNumber", "value"))?),
        JSON_STRING_ID => {
            Value::String(field("jsonString")?.as_str().ok_or(bad("jsonString", "value"))?.to_owned())
        }
        JSON_ARRAY_ID => {
            let items = field("jsonArray")?.as_vector().ok_or(bad("jsonArray", "value"))?;
            Value::Array(items.iter().map(|v| element(v, "jsonArray")).collect::<Result<_, _>>()?)
        }
        JSON_OBJECT_ID => {
            let entries = field("jsonObject")?.as_vector().ok_or(bad("jsonObject", "value"))?;
            let mut map = Map::with_capacity(entries.len());
            for entry in entries {
                let entry = entry.as_object().ok_or(bad("jsonObject", "value"))?;
                let key = entry
                    .get("key")
                    .and_then(TlValue::as_str)
                    .ok_or(bad("jsonObjectValue", "key"))?;
                let value = entry.get("value").ok_or(bad("jsonObjectValue", "value"))?;
                map.insert(key.to_owned(), element(value, "jsonObjectValue")?);
            }
            Value::Object(map)
        }
        _ => return Err(JsonError::NotJson { name: obj.name.clone() }),
    })
}

fn element(value: &TlValue, constructor: &'static str) -> Result<Value, JsonError> {
    let obj = value.as_object().ok_or(JsonError::BadField { constructor, field: "value" })?;
    tl_to_json(obj)
}
