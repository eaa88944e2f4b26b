// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declared property types and their canonical string form.
//!
//! The canonical string is what travels in the schema section:
//!
//! ```text
//! bool | int | long | double | string | binary | any
//! list<T> | map<K,V> | dotted.type.Name
//! ```

use crate::error::{Result, SerializationError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Declared type of a property, list element, map key/value or proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    Bool,
    Int,
    Long,
    Double,
    String,
    Binary,
    /// Any value; the concrete type is carried by the data section.
    Any,
    List(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    /// Composite, interface, enum or custom-serialized type, by name.
    Named(Arc<str>),
}

/// Deepest `list<...>`/`map<...>` nesting accepted by the parser.
pub const MAX_TYPE_NESTING: usize = 32;

const KEYWORDS: [&str; 9] = [
    "bool", "int", "long", "double", "string", "binary", "any", "list", "map",
];

impl TypeRef {
    pub fn named(name: impl AsRef<str>) -> Self {
        TypeRef::Named(Arc::from(name.as_ref()))
    }

    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map(Box::new(key), Box::new(value))
    }

    /// Name of the referenced composite/enum/custom type, if any.
    pub fn as_named(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeRef::Bool
                | TypeRef::Int
                | TypeRef::Long
                | TypeRef::Double
                | TypeRef::String
                | TypeRef::Binary
        )
    }

    /// Collections are described by a restricted notation in the schema section.
    pub fn is_collection(&self) -> bool {
        matches!(self, TypeRef::List(_) | TypeRef::Map(_, _))
    }

    /// Every named type reachable from this reference (element types included).
    pub fn named_dependencies(&self) -> Vec<Arc<str>> {
        let mut out = Vec::new();
        self.collect_named(&mut out);
        out
    }

    fn collect_named(&self, out: &mut Vec<Arc<str>>) {
        match self {
            TypeRef::Named(name) => out.push(Arc::clone(name)),
            TypeRef::List(element) => element.collect_named(out),
            TypeRef::Map(key, value) => {
                key.collect_named(out);
                value.collect_named(out);
            }
            _ => {}
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser {
            text,
            pos: 0,
            depth: 0,
        };
        let parsed = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(parsed)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Bool => write!(f, "bool"),
            TypeRef::Int => write!(f, "int"),
            TypeRef::Long => write!(f, "long"),
            TypeRef::Double => write!(f, "double"),
            TypeRef::String => write!(f, "string"),
            TypeRef::Binary => write!(f, "binary"),
            TypeRef::Any => write!(f, "any"),
            TypeRef::List(element) => write!(f, "list<{}>", element),
            TypeRef::Map(key, value) => write!(f, "map<{},{}>", key, value),
            TypeRef::Named(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for TypeRef {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self> {
        TypeRef::parse(s)
    }
}

/// Validate a composite/enum type name (dotted identifiers, no keywords).
pub fn validate_type_name(name: &str) -> Result<()> {
    let valid_segment = |segment: &str| {
        let mut chars = segment.chars();
        matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
            && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
    };
    if name.is_empty() || !name.split('.').all(valid_segment) || KEYWORDS.contains(&name) {
        return Err(SerializationError::not_serializable(
            name,
            "invalid type name",
        ));
    }
    Ok(())
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> SerializationError {
        SerializationError::malformed(format!(
            "invalid type string {:?} at {}: {}",
            self.text, self.pos, reason
        ))
    }

    fn skip_ws(&mut self) {
        while self.text[self.pos..].starts_with(' ') {
            self.pos += 1;
        }
    }

    fn expect(&mut self, token: char) -> Result<()> {
        self.skip_ws();
        if self.text[self.pos..].starts_with(token) {
            self.pos += token.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", token)))
        }
    }

    fn ident(&mut self) -> Result<&str> {
        self.skip_ws();
        let rest = &self.text[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$' || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected type name"));
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.text[start..self.pos])
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        if self.depth >= MAX_TYPE_NESTING {
            return Err(self.error("type nesting too deep"));
        }
        self.depth += 1;
        let parsed = self.parse_inner();
        self.depth -= 1;
        parsed
    }

    fn parse_inner(&mut self) -> Result<TypeRef> {
        let ident = self.ident()?.to_string();
        let parsed = match ident.as_str() {
            "bool" => TypeRef::Bool,
            "int" => TypeRef::Int,
            "long" => TypeRef::Long,
            "double" => TypeRef::Double,
            "string" => TypeRef::String,
            "binary" => TypeRef::Binary,
            "any" => TypeRef::Any,
            "list" => {
                self.expect('<')?;
                let element = self.parse_type()?;
                self.expect('>')?;
                TypeRef::list(element)
            }
            "map" => {
                self.expect('<')?;
                let key = self.parse_type()?;
                self.expect(',')?;
                let value = self.parse_type()?;
                self.expect('>')?;
                TypeRef::map(key, value)
            }
            name => {
                validate_type_name(name).map_err(|_| self.error("invalid type name"))?;
                TypeRef::named(name)
            }
        };
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_canonical_forms() {
        for text in [
            "int",
            "any",
            "acme.Order",
            "list<string>",
            "map<string,list<acme.Item>>",
        ] {
            let parsed = TypeRef::parse(text).expect("parse");
            assert_eq!(parsed.to_string(), text);
        }
    }

    #[test]
    fn test_parse_tolerates_spaces() {
        let parsed = TypeRef::parse("map< string , long >").expect("parse");
        assert_eq!(parsed, TypeRef::map(TypeRef::String, TypeRef::Long));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "list<int", "map<int>", "int>", "acme..Order", "9lives"] {
            assert!(TypeRef::parse(text).is_err(), "{:?} should not parse", text);
        }
    }

    #[test]
    fn test_parse_rejects_deep_nesting() {
        let deep = format!("{}int{}", "list<".repeat(40), ">".repeat(40));
        assert!(TypeRef::parse(&deep).is_err());
        let fine = format!("{}int{}", "list<".repeat(8), ">".repeat(8));
        assert!(TypeRef::parse(&fine).is_ok());
    }

    #[test]
    fn test_named_dependencies() {
        let ty = TypeRef::map(TypeRef::named("a.K"), TypeRef::list(TypeRef::named("a.V")));
        let deps = ty.named_dependencies();
        assert_eq!(deps.len(), 2);
        assert_eq!(&*deps[0], "a.K");
        assert_eq!(&*deps[1], "a.V");
    }

    #[test]
    fn test_validate_type_name() {
        assert!(validate_type_name("acme.Order$Line").is_ok());
        assert!(validate_type_name("list").is_err());
        assert!(validate_type_name("acme.").is_err());
    }
}
