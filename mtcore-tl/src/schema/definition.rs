//! AST for a single TL definition and its parser.

use std::fmt;
use std::str::FromStr;

use super::errors::{ParamParseError, ParseError};

/// Whether a definition is a data constructor or an RPC function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// Definitions before `---functions---`.
    Types,
    /// Definitions after `---functions---`.
    Functions,
}

/// A type expression such as `Vector<long>`, `%Message` or `!X`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Namespace components (`["upload"]` for `upload.File`).
    pub namespace:   Vec<String>,
    /// The name without namespace, `%` or `!`.
    pub name:        String,
    /// Bare types carry no constructor id on the wire. Lowercase names and
    /// `%`-prefixed names are bare.
    pub bare:        bool,
    /// `!X`: a reference to a `{X:Type}` generic.
    pub generic_ref: bool,
    /// The argument of `Vector<…>` / `vector<…>`.
    pub generic_arg: Option<Box<TypeRef>>,
}

impl TypeRef {
    /// `namespace.name`.
    pub fn full_name(&self) -> String {
        join_name(&self.namespace, &self.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generic_ref {
            f.write_str("!")?;
        } else if self.bare && self.name.starts_with(|c: char| c.is_ascii_uppercase()) {
            f.write_str("%")?;
        }
        for ns in &self.namespace {
            write!(f, "{ns}.")?;
        }
        f.write_str(&self.name)?;
        if let Some(arg) = &self.generic_arg {
            write!(f, "<{arg}>")?;
        }
        Ok(())
    }
}

impl FromStr for TypeRef {
    type Err = ParamParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (raw, generic_ref) = match raw.strip_prefix('!') {
            Some(r) => (r, true),
            None => (raw, false),
        };
        let (raw, forced_bare) = match raw.strip_prefix('%') {
            Some(r) => (r, true),
            None => (raw, false),
        };

        let (name_part, generic_arg) = match raw.split_once('<') {
            Some((name, rest)) => match rest.strip_suffix('>') {
                Some(arg) => (name, Some(Box::new(arg.parse()?))),
                None => return Err(ParamParseError::InvalidGeneric),
            },
            None => (raw, None),
        };

        let (namespace, name) = split_namespace(name_part);
        if namespace.iter().any(String::is_empty) {
            return Err(ParamParseError::Empty);
        }
        let first = name.chars().next().ok_or(ParamParseError::Empty)?;

        Ok(Self {
            namespace,
            name: name.to_owned(),
            bare: forced_bare || first.is_ascii_lowercase(),
            generic_ref,
            generic_arg,
        })
    }
}

/// `flags.3` in `flags.3?string`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Flag {
    /// The `#` field holding the bit.
    pub field: String,
    /// Bit index, 0-based.
    pub bit:   u32,
}

/// The kind of a single parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// A `name:#` bitmask; computed from the optional fields on encode.
    Flags,
    /// A regular value, present only when `flag` is set (if any).
    Normal {
        /// Value type.
        ty:   TypeRef,
        /// Guarding flag bit.
        flag: Option<Flag>,
    },
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flags => f.write_str("#"),
            Self::Normal { ty, flag: Some(fl) } => write!(f, "{}.{}?{ty}", fl.field, fl.bit),
            Self::Normal { ty, flag: None } => write!(f, "{ty}"),
        }
    }
}

impl FromStr for ParamType {
    type Err = ParamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "#" {
            return Ok(Self::Flags);
        }

        let Some((flag_part, ty_part)) = s.split_once('?') else {
            return Ok(Self::Normal { ty: s.parse()?, flag: None });
        };

        let (field, bit) = flag_part.split_once('.').ok_or(ParamParseError::InvalidFlag)?;
        if field.is_empty() || ty_part.contains('?') {
            return Err(ParamParseError::InvalidFlag);
        }
        let bit = bit.parse::<u32>().map_err(|_| ParamParseError::InvalidFlag)?;
        if bit >= 32 {
            return Err(ParamParseError::InvalidFlag);
        }

        Ok(Self::Normal {
            ty:   ty_part.parse()?,
            flag: Some(Flag { field: field.to_owned(), bit }),
        })
    }
}

/// A `name:type` parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty:   ParamType,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.ty)
    }
}

impl FromStr for Param {
    type Err = ParamParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if let Some(inner) = token.strip_prefix('{') {
            return Err(match inner.strip_suffix(":Type}") {
                Some(name) => ParamParseError::TypeDef { name: name.into() },
                None => ParamParseError::MissingDef,
            });
        }

        let (name, ty) = token.split_once(':').ok_or(ParamParseError::NotImplemented)?;
        if name.is_empty() || ty.is_empty() {
            return Err(ParamParseError::Empty);
        }
        Ok(Self { name: name.to_owned(), ty: ty.parse()? })
    }
}

/// One constructor or function, e.g.
///
/// ```text
/// pong#347773c5 msg_id:long ping_id:long = Pong;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Definition {
    /// Namespace components.
    pub namespace: Vec<String>,
    /// Name without namespace.
    pub name:      String,
    /// Constructor id, explicit or CRC-32 derived.
    pub id:        u32,
    /// Parameters in wire order.
    pub params:    Vec<Param>,
    /// Result type.
    pub ty:        TypeRef,
    /// Constructor or function.
    pub category:  Category,
}

impl Definition {
    /// `namespace.name`.
    pub fn full_name(&self) -> String {
        join_name(&self.namespace, &self.name)
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:08x}", self.full_name(), self.id)?;
        for p in &self.params {
            write!(f, " {p}")?;
        }
        write!(f, " = {}", self.ty)
    }
}

impl FromStr for Definition {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim().trim_end_matches(';').trim();
        if raw.is_empty() {
            return Err(ParseError::Empty);
        }

        let (lhs, ty_str) = raw.split_once('=').ok_or(ParseError::MissingType)?;
        let ty_str = ty_str.trim();
        if ty_str.is_empty() {
            return Err(ParseError::MissingType);
        }
        // `Vector t` style result types are builtin; we only model `Name`.
        if ty_str.contains(char::is_whitespace) {
            return Err(ParseError::NotImplemented);
        }
        let mut ty: TypeRef = ty_str.parse().map_err(|_| ParseError::MissingType)?;

        let lhs = lhs.trim();
        let (head, rest) = lhs.split_once(char::is_whitespace).unwrap_or((lhs, ""));
        let (full_name, explicit_id) = match head.split_once('#') {
            Some((n, id)) => (n, Some(id)),
            None => (head, None),
        };

        let (namespace, name) = split_namespace(full_name);
        if namespace.iter().any(String::is_empty) || name.is_empty() {
            return Err(ParseError::MissingName);
        }

        let id = match explicit_id {
            Some(hex) => u32::from_str_radix(hex, 16).map_err(ParseError::InvalidId)?,
            None => crc_id(raw),
        };

        let mut generics: Vec<String> = Vec::new();
        let mut flag_fields: Vec<String> = Vec::new();
        let mut params = Vec::new();

        for token in rest.split_whitespace() {
            let param = match token.parse::<Param>() {
                Ok(p) => p,
                Err(ParamParseError::TypeDef { name }) => {
                    generics.push(name);
                    continue;
                }
                Err(ParamParseError::NotImplemented) => return Err(ParseError::NotImplemented),
                Err(e) => return Err(ParseError::InvalidParam(e)),
            };

            match &param.ty {
                ParamType::Flags => flag_fields.push(param.name.clone()),
                ParamType::Normal { ty, flag } => {
                    if ty.generic_ref && !generics.contains(&ty.name) {
                        return Err(ParseError::InvalidParam(ParamParseError::MissingDef));
                    }
                    if let Some(fl) = flag {
                        if !flag_fields.contains(&fl.field) {
                            return Err(ParseError::InvalidParam(ParamParseError::MissingDef));
                        }
                    }
                }
            }
            params.push(param);
        }

        if generics.contains(&ty.name) {
            ty.generic_ref = true;
        }

        Ok(Definition {
            namespace,
            name: name.to_owned(),
            id,
            params,
            ty,
            category: Category::Types,
        })
    }
}

fn split_namespace(full: &str) -> (Vec<String>, &str) {
    match full.rsplit_once('.') {
        Some((ns, name)) => (ns.split('.').map(String::from).collect(), name),
        None => (Vec::new(), full),
    }
}

fn join_name(namespace: &[String], name: &str) -> String {
    let mut s = String::with_capacity(namespace.iter().map(|ns| ns.len() + 1).sum::<usize>() + name.len());
    for ns in namespace {
        s.push_str(ns);
        s.push('.');
    }
    s.push_str(name);
    s
}

/// CRC-32 of the normalised definition text.
///
/// Normalising drops `#id` and every `name:flagsN.M?true` parameter, reads
/// `bytes` as `string`, removes `{`/`}` and turns `<`/`>` into spaces.
pub(crate) fn crc_id(definition: &str) -> u32 {
    let spaced = definition.replace(['<', '>'], " ").replace(['{', '}'], "");
    let mut tokens = spaced.split_whitespace();
    let head = tokens.next().unwrap_or_default();

    let mut normalised = head.split_once('#').map_or(head, |(name, _)| name).to_owned();
    for token in tokens.filter(|t| !is_true_flag(t)) {
        normalised.push(' ');
        match token.strip_suffix("bytes") {
            Some(prefix) if prefix.ends_with([':', '?']) => {
                normalised.push_str(prefix);
                normalised.push_str("string");
            }
            _ => normalised.push_str(token),
        }
    }
    crc32fast::hash(normalised.as_bytes())
}

/// `name:flags.N?true` / `name:flags2.N?true`
fn is_true_flag(token: &str) -> bool {
    let Some((_, ty)) = token.split_once(':') else { return false };
    let Some((cond, "true")) = ty.split_once('?') else { return false };
    let Some((field, bit)) = cond.split_once('.') else { return false };
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    field.strip_prefix("flags").is_some_and(digits) && !bit.is_empty() && digits(bit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_of_bare_constructor() {
        assert_eq!(crc_id("boolFalse = Bool"), 0xbc799737);
    }

    #[test]
    fn crc_reads_bytes_as_string() {
        assert_eq!(crc_id("gzip_packed packed_data:bytes = Object"), 0x3072cfa1);
    }

    #[test]
    fn crc_strips_generic_braces() {
        assert_eq!(crc_id("invokeWithLayer {X:Type} layer:int query:!X = X"), 0xda9b0d0d);
    }

    #[test]
    fn crc_skips_true_flags() {
        let def = "updateShortSentMessage flags:# out:flags.1?true id:int pts:int pts_count:int \
                   date:int media:flags.9?MessageMedia entities:flags.7?Vector<MessageEntity> \
                   ttl_period:flags.25?int = Updates";
        assert_eq!(crc_id(def), 0x9015e101);
    }

    #[test]
    fn true_flag_detection() {
        assert!(is_true_flag("out:flags.1?true"));
        assert!(is_true_flag("x:flags2.30?true"));
        assert!(!is_true_flag("media:flags.9?MessageMedia"));
        assert!(!is_true_flag("x:flags.?true"));
        assert!(!is_true_flag("flags:#"));
    }

    #[test]
    fn parsed_id_uses_normalised_crc() {
        let def: Definition = "gzip_packed packed_data:bytes = Object".parse().unwrap();
        assert_eq!(def.id, 0x3072cfa1);
    }

    #[test]
    fn crc_normalises_generics() {
        assert_eq!(crc_id("msgs_ack msg_ids:Vector<long> = MsgsAck"), 0x62d6b459);
    }

    #[test]
    fn crc_ignores_explicit_id() {
        assert_eq!(crc_id("pong#deadbeef msg_id:long ping_id:long = Pong"), 0x347773c5);
    }

    #[test]
    fn parses_flags_and_namespaces() {
        let def: Definition =
            "auth.sentCode#12345678 flags:# type:string next:flags.1?int = auth.SentCode"
                .parse()
                .unwrap();
        assert_eq!(def.full_name(), "auth.sentCode");
        assert_eq!(def.id, 0x12345678);
        assert_eq!(def.params.len(), 3);
        assert_eq!(def.params[0].ty, ParamType::Flags);
        match &def.params[2].ty {
            ParamType::Normal { ty, flag: Some(fl) } => {
                assert_eq!(ty.name, "int");
                assert_eq!((fl.field.as_str(), fl.bit), ("flags", 1));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(def.ty.full_name(), "auth.SentCode");
    }

    #[test]
    fn param_by_name() {
        let def: Definition = "bad_server_salt#edab447b bad_msg_id:long bad_msg_seqno:int error_code:int \
                               new_server_salt:long = BadMsgNotification"
            .parse()
            .unwrap();
        let p = def.param("error_code").unwrap();
        assert_eq!(p.name, "error_code");
        assert!(matches!(&p.ty, ParamType::Normal { ty, flag: None } if ty.name == "int"));
        assert!(def.param("missing").is_none());
    }

    #[test]
    fn percent_marks_bare() {
        let ty: TypeRef = "vector<%Message>".parse().unwrap();
        assert!(ty.bare);
        let arg = ty.generic_arg.unwrap();
        assert!(arg.bare);
        assert_eq!(arg.name, "Message");
    }

    #[test]
    fn undeclared_flag_field_rejected() {
        let err = "x#1 a:flags.0?int = X".parse::<Definition>().unwrap_err();
        assert_eq!(err, ParseError::InvalidParam(ParamParseError::MissingDef));
    }

    #[test]
    fn generic_result_marked() {
        let def: Definition = "invokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = X"
            .parse()
            .unwrap();
        assert!(def.ty.generic_ref);
        assert_eq!(def.params.len(), 2);
    }

    #[test]
    fn builtin_vector_not_implemented() {
        let err = "vector#1cb5c415 {t:Type} # [ t ] = Vector t".parse::<Definition>().unwrap_err();
        assert_eq!(err, ParseError::NotImplemented);
    }
}
