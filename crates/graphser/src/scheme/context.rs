// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Use-case contexts.
//!
//! A [`SerializationContext`] is the caller-supplied bundle governing one
//! encode/decode call: the use case it serves, the admission whitelist, the
//! custom serializers, the code-loading scope and the payload encodings.
//! Contexts are plain values; builders only ever add permissions.

use crate::carpenter::CodeLoadingScope;
use crate::error::SerializationError;
use crate::serializer::{CustomSerializer, CustomSerializerKey, FactoryKey};
use crate::whitelist::Whitelist;
use crate::wire::Encoding;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Who is calling the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UseCase {
    /// Peer-to-peer messaging.
    P2p,
    RpcClient,
    RpcServer,
    /// Durable storage.
    Storage,
    Checkpoint,
    Testing,
}

impl UseCase {
    pub const ALL: [UseCase; 6] = [
        UseCase::P2p,
        UseCase::RpcClient,
        UseCase::RpcServer,
        UseCase::Storage,
        UseCase::Checkpoint,
        UseCase::Testing,
    ];
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UseCase::P2p => "p2p",
            UseCase::RpcClient => "rpc-client",
            UseCase::RpcServer => "rpc-server",
            UseCase::Storage => "storage",
            UseCase::Checkpoint => "checkpoint",
            UseCase::Testing => "testing",
        };
        f.write_str(name)
    }
}

impl FromStr for UseCase {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p2p" => Ok(UseCase::P2p),
            "rpc-client" | "rpc_client" => Ok(UseCase::RpcClient),
            "rpc-server" | "rpc_server" => Ok(UseCase::RpcServer),
            "storage" => Ok(UseCase::Storage),
            "checkpoint" => Ok(UseCase::Checkpoint),
            "testing" | "test" => Ok(UseCase::Testing),
            other => Err(SerializationError::misconfigured(format!(
                "unknown use case `{}`",
                other
            ))),
        }
    }
}

/// Everything one call needs besides the bytes.
#[derive(Debug, Clone)]
pub struct SerializationContext {
    use_case: UseCase,
    whitelist: Whitelist,
    custom_serializers: Vec<Arc<dyn CustomSerializer>>,
    code_scope: CodeLoadingScope,
    encoding: Encoding,
    /// Encodings accepted on decode besides [`Encoding::Plain`].
    encoding_whitelist: BTreeSet<Encoding>,
    type_synthesis: bool,
}

impl SerializationContext {
    /// Preset for `use_case`.
    ///
    /// Servers and checkpoints never synthesize types: they only accept
    /// shapes they were built with. Storage and checkpoints also accept
    /// DEFLATE payloads.
    pub fn new(use_case: UseCase) -> Self {
        let type_synthesis = !matches!(use_case, UseCase::RpcServer | UseCase::Checkpoint);
        let encoding_whitelist = match use_case {
            UseCase::Storage | UseCase::Checkpoint | UseCase::Testing => {
                BTreeSet::from([Encoding::Deflate])
            }
            _ => BTreeSet::new(),
        };
        Self {
            use_case,
            whitelist: Whitelist::empty(),
            custom_serializers: Vec::new(),
            code_scope: CodeLoadingScope::empty(),
            encoding: Encoding::Plain,
            encoding_whitelist,
            type_synthesis,
        }
    }

    pub fn p2p() -> Self {
        Self::new(UseCase::P2p)
    }

    pub fn rpc_client() -> Self {
        Self::new(UseCase::RpcClient)
    }

    pub fn rpc_server() -> Self {
        Self::new(UseCase::RpcServer)
    }

    pub fn storage() -> Self {
        Self::new(UseCase::Storage)
    }

    pub fn checkpoint() -> Self {
        Self::new(UseCase::Checkpoint)
    }

    pub fn testing() -> Self {
        Self::new(UseCase::Testing)
    }

    /// Add `whitelist` to the admitted names.
    #[must_use]
    pub fn with_whitelist(mut self, whitelist: &Whitelist) -> Self {
        self.whitelist = self.whitelist.union(whitelist);
        self
    }

    #[must_use]
    pub fn with_custom_serializer(mut self, serializer: Arc<dyn CustomSerializer>) -> Self {
        self.custom_serializers.push(serializer);
        self
    }

    #[must_use]
    pub fn with_code_scope(mut self, scope: CodeLoadingScope) -> Self {
        self.code_scope = scope;
        self
    }

    /// Encoding used when this context writes.
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Also accept `encoding` on decode.
    #[must_use]
    pub fn with_encoding_whitelist(mut self, encoding: Encoding) -> Self {
        self.encoding_whitelist.insert(encoding);
        self
    }

    #[must_use]
    pub fn with_type_synthesis(mut self, enabled: bool) -> Self {
        self.type_synthesis = enabled;
        self
    }

    /// This context entered while `outer` is active: whitelists union.
    #[must_use]
    pub fn nested_in(&self, outer: &SerializationContext) -> Self {
        let mut nested = self.clone();
        nested.whitelist = self.whitelist.union(&outer.whitelist);
        nested
    }

    pub fn use_case(&self) -> UseCase {
        self.use_case
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    pub fn custom_serializers(&self) -> &[Arc<dyn CustomSerializer>] {
        &self.custom_serializers
    }

    pub fn code_scope(&self) -> &CodeLoadingScope {
        &self.code_scope
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn type_synthesis(&self) -> bool {
        self.type_synthesis
    }

    /// Plain payloads are always accepted.
    pub fn accepts_encoding(&self, encoding: Encoding) -> bool {
        encoding == Encoding::Plain || self.encoding_whitelist.contains(&encoding)
    }

    /// Factory key under a scheme's base whitelist.
    pub fn factory_key(&self, base: &Whitelist) -> FactoryKey {
        FactoryKey {
            whitelist: base.union(&self.whitelist),
            scope: self.code_scope.clone(),
            custom_serializers: self
                .custom_serializers
                .iter()
                .map(|c| CustomSerializerKey::of(c.as_ref()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::ProxySerializer;
    use crate::types::{FromValue, TypeRef, Value};

    struct Token(String);

    #[test]
    fn test_use_case_parse_roundtrip() {
        for use_case in UseCase::ALL {
            let parsed: UseCase = use_case.to_string().parse().expect("parse");
            assert_eq!(parsed, use_case);
        }
        assert!(matches!(
            "carrier-pigeon".parse::<UseCase>(),
            Err(SerializationError::Misconfiguration { .. })
        ));
    }

    #[test]
    fn test_presets() {
        assert!(SerializationContext::p2p().type_synthesis());
        assert!(!SerializationContext::rpc_server().type_synthesis());
        assert!(!SerializationContext::checkpoint().type_synthesis());

        assert!(SerializationContext::p2p().accepts_encoding(Encoding::Plain));
        assert!(!SerializationContext::p2p().accepts_encoding(Encoding::Deflate));
        assert!(SerializationContext::storage().accepts_encoding(Encoding::Deflate));
        assert!(SerializationContext::p2p()
            .with_encoding_whitelist(Encoding::Deflate)
            .accepts_encoding(Encoding::Deflate));
    }

    #[test]
    fn test_whitelists_only_grow() {
        let context = SerializationContext::p2p()
            .with_whitelist(&Whitelist::of(["a.A"]))
            .with_whitelist(&Whitelist::of(["b.B"]));
        assert!(context.whitelist().contains("a.A"));
        assert!(context.whitelist().contains("b.B"));

        let outer = SerializationContext::storage().with_whitelist(&Whitelist::of(["c.C"]));
        let nested = context.nested_in(&outer);
        assert_eq!(nested.whitelist().len(), 3);
        assert_eq!(nested.use_case(), UseCase::P2p);
    }

    #[test]
    fn test_factory_key() {
        let token: Arc<dyn CustomSerializer> = Arc::new(ProxySerializer::new(
            "auth.Token",
            TypeRef::String,
            |t: &Token| Value::from(t.0.clone()),
            |v| Ok(Token(String::from_value(v)?)),
        ));
        let a = SerializationContext::p2p()
            .with_custom_serializer(Arc::clone(&token))
            .factory_key(&Whitelist::of(["base.B"]));
        let b = SerializationContext::rpc_client()
            .with_custom_serializer(token)
            .factory_key(&Whitelist::of(["base.B"]));
        assert_eq!(a, b);
        assert!(a
            .custom_serializers
            .iter()
            .any(|c| c.type_name.as_ref() == "auth.Token" && c.proxy_type == TypeRef::String));
        assert!(a.whitelist.contains("base.B"));

        let scoped = SerializationContext::p2p()
            .with_code_scope(CodeLoadingScope::of(["bundle-1"]))
            .factory_key(&Whitelist::empty());
        assert_ne!(a, scoped);
    }

    #[test]
    fn test_factory_key_tells_proxy_types_apart() {
        let as_string: Arc<dyn CustomSerializer> = Arc::new(ProxySerializer::new(
            "auth.Token",
            TypeRef::String,
            |t: &Token| Value::from(t.0.clone()),
            |v| Ok(Token(String::from_value(v)?)),
        ));
        let as_binary: Arc<dyn CustomSerializer> = Arc::new(ProxySerializer::new(
            "auth.Token",
            TypeRef::Binary,
            |t: &Token| Value::Binary(t.0.as_bytes().to_vec()),
            |v| Ok(Token(String::from_value(v)?)),
        ));
        let a = SerializationContext::p2p()
            .with_custom_serializer(as_string)
            .factory_key(&Whitelist::empty());
        let b = SerializationContext::p2p()
            .with_custom_serializer(as_binary)
            .factory_key(&Whitelist::empty());
        assert_ne!(a, b);
    }
}
