//! Wire types shared by every compilation backend and caller

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::language::SupportedLanguage;

/// Correlation id of a request, scoped to one caller instance.
pub type MessageId = i64;

/// Id carried by results produced at build time rather than for a caller.
pub const PRECOMPILED_MESSAGE_ID: MessageId = -1;

/// A compile request as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    pub source: String,
    pub lang: SupportedLanguage,
    pub message_id: MessageId,
}

/// Optional capability a compiled snippet advertises to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "feature", rename_all = "camelCase")]
pub enum FeatureDescriptor {
    PropsEditor {
        #[serde(rename = "hasRenderEditor")]
        has_render_editor: bool,
    },
    UnionProps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileSuccess {
    pub code: String,
    pub message_id: MessageId,
    pub import_names: Vec<String>,
    pub imported_packages: Vec<String>,
    pub lang: SupportedLanguage,
    pub features: Vec<FeatureDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_code_hash: Option<String>,
    /// Bare specifiers that are not in the PackageMap; they fail when executed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_packages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ErrorMeta {
    CompilationError { line: u32 },
}

impl ErrorMeta {
    pub fn line(&self) -> u32 {
        match self {
            ErrorMeta::CompilationError { line } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileFailure {
    pub error: String,
    pub message_id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ErrorMeta>,
}

impl CompileFailure {
    pub fn line(&self) -> Option<u32> {
        self.meta.as_ref().map(ErrorMeta::line)
    }
}

/// Outcome of one compile request; exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CompileResult {
    Success(CompileSuccess),
    Error(CompileFailure),
}

impl CompileResult {
    pub fn message_id(&self) -> MessageId {
        match self {
            CompileResult::Success(success) => success.message_id,
            CompileResult::Error(failure) => failure.message_id,
        }
    }

    /// Re-tag a result for another caller, e.g. when served from a cache.
    pub fn with_message_id(mut self, message_id: MessageId) -> Self {
        match &mut self {
            CompileResult::Success(success) => success.message_id = message_id,
            CompileResult::Error(failure) => failure.message_id = message_id,
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CompileResult::Success(_))
    }

    pub fn as_success(&self) -> Option<&CompileSuccess> {
        match self {
            CompileResult::Success(success) => Some(success),
            CompileResult::Error(_) => None,
        }
    }
}

impl From<CompileSuccess> for CompileResult {
    fn from(success: CompileSuccess) -> Self {
        CompileResult::Success(success)
    }
}

impl From<CompileFailure> for CompileResult {
    fn from(failure: CompileFailure) -> Self {
        CompileResult::Error(failure)
    }
}

const CACHE_KEY_TAG: &str = "codeCompilation";

/// Identity of one compilation unit.
///
/// Serializes as `["codeCompilation", source, lang]` so query caches outside
/// this crate can be seeded with the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: String,
    pub lang: SupportedLanguage,
}

pub fn cache_key(source: &str, lang: SupportedLanguage) -> CacheKey {
    CacheKey {
        source: source.to_string(),
        lang,
    }
}

impl Serialize for CacheKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(CACHE_KEY_TAG)?;
        tuple.serialize_element(&self.source)?;
        tuple.serialize_element(&self.lang)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for CacheKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = CacheKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a [\"codeCompilation\", source, lang] array")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<CacheKey, A::Error> {
                let tag: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                if tag != CACHE_KEY_TAG {
                    return Err(de::Error::invalid_value(de::Unexpected::Str(&tag), &self));
                }
                let source = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let lang = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(2, &self))?;
                Ok(CacheKey { source, lang })
            }
        }

        deserializer.deserialize_tuple(3, KeyVisitor)
    }
}

/// Literal fence source → precompiled result for one document.
///
/// `None` marks a fence that was found but not precompiled.
pub type CodeBlocks = IndexMap<String, Option<CompileSuccess>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCodeBlocks {
    pub path: String,
    pub blocks: CodeBlocks,
}

/// Everything precompiled during a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlocksManifest {
    pub items: Vec<DocumentCodeBlocks>,
}

impl CodeBlocksManifest {
    /// Seed entries: every precompiled success, keyed by its cache key.
    pub fn seeds(&self) -> impl Iterator<Item = (CacheKey, &CompileSuccess)> {
        self.items.iter().flat_map(|doc| {
            doc.blocks.iter().filter_map(|(source, block)| {
                block
                    .as_ref()
                    .map(|success| (cache_key(source, success.lang), success))
            })
        })
    }

    /// Locate a block by its standalone-editor hash.
    pub fn find_by_hash(&self, hash: &str) -> Option<(&str, &CompileSuccess)> {
        self.items.iter().find_map(|doc| {
            doc.blocks.iter().find_map(|(source, block)| match block {
                Some(success) if success.initial_code_hash.as_deref() == Some(hash) => {
                    Some((source.as_str(), success))
                }
                _ => None,
            })
        })
    }

    pub fn block_count(&self) -> usize {
        self.items.iter().map(|doc| doc.blocks.len()).sum()
    }
}
