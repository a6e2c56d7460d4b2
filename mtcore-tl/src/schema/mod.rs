//! Runtime TL schema registry.
//!
//! A [`Schema`] maps 32-bit constructor ids to their [`Definition`]s so the
//! codec can encode and decode [`crate::TlObject`]s without generated code.
//!
//! ```rust
//! use mtcore_tl::Schema;
//!
//! let schema = Schema::mtproto();
//! let pong = schema.by_name("pong").unwrap();
//! assert_eq!(pong.id, 0x347773c5);
//! ```

mod definition;
mod errors;

use std::collections::HashMap;
use std::str::FromStr;

pub use definition::{Category, Definition, Flag, Param, ParamType, TypeRef};
pub use errors::{ParamParseError, ParseError};

/// The MTProto service schema shipped with the crate.
pub const MTPROTO_SCHEMA: &str = include_str!("../../tl/mtproto.tl");

/// Parse TL schema text, yielding definitions one by one.
///
/// `//` comments and blank lines are skipped; `---functions---` and
/// `---types---` switch the [`Category`] of what follows. A definition may
/// span several lines and ends at `;`. Errors carry the line number.
pub fn parse_schema(src: &str) -> impl Iterator<Item = Result<Definition, ParseError>> + '_ {
    SchemaLines { lines: src.lines().enumerate(), category: Category::Types, pending: String::new() }
}

struct SchemaLines<'a> {
    lines:    std::iter::Enumerate<std::str::Lines<'a>>,
    category: Category,
    pending:  String,
}

impl Iterator for SchemaLines<'_> {
    type Item = Result<Definition, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (idx, line) = self.lines.next()?;
            let line = line.split_once("//").map_or(line, |(code, _)| code).trim();
            if line.is_empty() {
                continue;
            }

            match line {
                "---functions---" => { self.category = Category::Functions; continue; }
                "---types---"     => { self.category = Category::Types;     continue; }
                _ => {}
            }

            self.pending.push(' ');
            self.pending.push_str(line);
            if !line.ends_with(';') {
                continue;
            }

            let raw = std::mem::take(&mut self.pending);
            let category = self.category;
            return Some(
                Definition::from_str(&raw)
                    .map(|mut d| { d.category = category; d })
                    .map_err(|e| ParseError::AtLine { line: idx + 1, inner: Box::new(e) }),
            );
        }
    }
}

/// Registry of TL definitions indexed by constructor id and name.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    defs:    Vec<Definition>,
    by_id:   HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
    by_type: HashMap<String, Vec<usize>>,
}

impl Schema {
    /// An empty schema.
    pub fn new() -> Self { Self::default() }

    /// The built-in MTProto service schema.
    pub fn mtproto() -> Self {
        let mut schema = Self::new();
        // The bundled file is covered by tests; a failure here is a build defect.
        if let Err(e) = schema.extend(MTPROTO_SCHEMA) {
            log::error!("[tl] bundled mtproto schema failed to parse: {e}");
        }
        schema
    }

    /// Parse `src` and add every definition to this schema.
    ///
    /// Definitions using syntax the parser does not model (the builtin
    /// `vector` declaration) are skipped. Any other error aborts and leaves
    /// the definitions parsed so far in place.
    pub fn extend(&mut self, src: &str) -> Result<usize, ParseError> {
        let mut added = 0;
        for result in parse_schema(src) {
            match result {
                Ok(def) => { self.insert(def)?; added += 1; }
                Err(ParseError::AtLine { line, inner }) if *inner == ParseError::NotImplemented => {
                    log::debug!("[tl] skipping unsupported definition at line {line}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }

    /// Register a single definition.
    pub fn insert(&mut self, def: Definition) -> Result<(), ParseError> {
        if self.by_id.contains_key(&def.id) {
            return Err(ParseError::DuplicateId { id: def.id, name: def.full_name() });
        }
        let idx = self.defs.len();
        self.by_id.insert(def.id, idx);
        self.by_name.insert(def.full_name(), idx);
        if def.category == Category::Types {
            self.by_type.entry(def.ty.full_name()).or_default().push(idx);
        }
        self.defs.push(def);
        Ok(())
    }

    /// Look up a definition by constructor id.
    pub fn by_id(&self, id: u32) -> Option<&Definition> {
        self.by_id.get(&id).map(|&i| &self.defs[i])
    }

    /// Look up a definition by its full name (`ns.name`).
    pub fn by_name(&self, name: &str) -> Option<&Definition> {
        self.by_name.get(name).map(|&i| &self.defs[i])
    }

    /// All constructors whose result type is `ty` (full name).
    pub fn constructors_of<'s>(&'s self, ty: &str) -> impl Iterator<Item = &'s Definition> + 's {
        self.by_type.get(ty).into_iter().flatten().map(|&i| &self.defs[i])
    }

    /// Resolve a bare type reference to its single constructor.
    ///
    /// `%Message` names a boxed type with exactly one constructor;
    /// `future_salt` names the constructor directly.
    pub fn bare_constructor(&self, ty: &TypeRef) -> Option<&Definition> {
        let full = ty.full_name();
        if let Some(def) = self.by_name(&full) {
            return Some(def);
        }
        let mut ctors = self.constructors_of(&full);
        match (ctors.next(), ctors.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Whether `name` is a type produced by some constructor in the schema.
    pub fn has_type(&self, name: &str) -> bool { self.by_type.contains_key(name) }

    /// Number of definitions.
    pub fn len(&self) -> usize { self.defs.len() }

    /// True if no definitions are registered.
    pub fn is_empty(&self) -> bool { self.defs.is_empty() }

    /// Iterate over all definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Definition> { self.defs.iter() }
}

impl FromStr for Schema {
    type Err = ParseError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let mut schema = Self::new();
        schema.extend(src)?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_schema_parses_cleanly() {
        let mut schema = Schema::new();
        let added = schema.extend(MTPROTO_SCHEMA).unwrap();
        assert_eq!(added, schema.len());
        assert!(added > 30);
    }

    #[test]
    fn categories_follow_separators() {
        let schema = Schema::mtproto();
        assert_eq!(schema.by_name("pong").unwrap().category, Category::Types);
        assert_eq!(schema.by_name("ping").unwrap().category, Category::Functions);
    }

    #[test]
    fn type_lookup() {
        let schema = Schema::mtproto();
        assert!(schema.has_type("Pong"));
        assert!(schema.has_type("MessageContainer"));
        assert!(!schema.has_type("pong"));
        assert!(!schema.has_type("Nope"));
    }

    #[test]
    fn bare_message_resolves() {
        let schema = Schema::mtproto();
        let ty: TypeRef = "%Message".parse().unwrap();
        assert_eq!(schema.bare_constructor(&ty).unwrap().name, "message");
        let ty: TypeRef = "future_salt".parse().unwrap();
        assert_eq!(schema.bare_constructor(&ty).unwrap().id, 0x0949d9dc);
    }

    #[test]
    fn multi_line_definition_and_comments() {
        let src = "// header\nfoo#00000001\n  a:int // trailing\n  b:long = Foo;\n";
        let schema: Schema = src.parse().unwrap();
        let foo = schema.by_id(1).unwrap();
        assert_eq!(foo.params.len(), 2);
    }

    #[test]
    fn duplicate_id_rejected() {
        let err = "a#1 = A;\nb#1 = B;".parse::<Schema>().unwrap_err();
        assert!(matches!(err, ParseError::DuplicateId { id: 1, .. }));
    }

    #[test]
    fn error_reports_line() {
        let err = "a#1 = A;\nb#zz = B;".parse::<Schema>().unwrap_err();
        assert!(matches!(err, ParseError::AtLine { line: 2, .. }));
    }

    #[test]
    fn builtin_vector_skipped() {
        let schema: Schema = "vector#1cb5c415 {t:Type} # [ t ] = Vector t;\nx#2 = X;".parse().unwrap();
        assert_eq!(schema.len(), 1);
    }
}
