use std::fmt;
use std::num::ParseIntError;

/// Errors produced while parsing a single `name:type` token.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamParseError {
    /// An empty name or type.
    Empty,
    /// A `{X:Type}` generic declaration. Not a failure; the caller records
    /// the generic name and moves on.
    TypeDef {
        /// The declared generic name (`X` in `{X:Type}`).
        name: String,
    },
    /// A `{…}` block that is not a generic declaration, or a reference to a
    /// generic or flags field that was never declared.
    MissingDef,
    /// A malformed `field.N?Type` expression.
    InvalidFlag,
    /// A `<` without its closing `>`.
    InvalidGeneric,
    /// A token without `:` (e.g. the `# [ t ]` of the builtin vector).
    NotImplemented,
}

impl fmt::Display for ParamParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty token"),
            Self::TypeDef { name } => write!(f, "generic type definition: {name}"),
            Self::MissingDef => write!(f, "undeclared generic or flags field"),
            Self::InvalidFlag => write!(f, "invalid flag expression"),
            Self::InvalidGeneric => write!(f, "unclosed `<` in generic argument"),
            Self::NotImplemented => write!(f, "parameter without `:type` is not supported"),
        }
    }
}

impl std::error::Error for ParamParseError {}

/// Errors produced while parsing a complete definition or schema.
#[derive(Debug, PartialEq)]
pub enum ParseError {
    /// Blank definition.
    Empty,
    /// No `= Type` part.
    MissingType,
    /// Name missing, or a namespace component is empty.
    MissingName,
    /// The `#id` is not a hex literal.
    InvalidId(ParseIntError),
    /// A parameter failed to parse.
    InvalidParam(ParamParseError),
    /// Syntax this parser deliberately skips.
    NotImplemented,
    /// Two definitions share a constructor id.
    DuplicateId {
        /// The clashing id.
        id: u32,
        /// Name of the definition that was rejected.
        name: String,
    },
    /// A failure on a specific schema line.
    AtLine {
        /// 1-based line number where the definition ends.
        line:  usize,
        /// The underlying error.
        inner: Box<ParseError>,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty definition"),
            Self::MissingType => write!(f, "missing `= Type`"),
            Self::MissingName => write!(f, "missing or malformed name"),
            Self::InvalidId(e) => write!(f, "invalid constructor id: {e}"),
            Self::InvalidParam(e) => write!(f, "invalid parameter: {e}"),
            Self::NotImplemented => write!(f, "unsupported TL syntax"),
            Self::DuplicateId { id, name } => write!(f, "duplicate constructor id {id:#010x} ({name})"),
            Self::AtLine { line, inner } => write!(f, "line {line}: {inner}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidId(e) => Some(e),
            Self::InvalidParam(e) => Some(e),
            Self::AtLine { inner, .. } => Some(inner.as_ref()),
            _ => None,
        }
    }
}
