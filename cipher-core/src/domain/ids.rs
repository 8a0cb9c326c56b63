use serde::{Deserialize, Serialize};
use std::fmt;

/// BLAKE3 hex digest of some byte content (model file, bar series).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex characters, for logs.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a loaded model: the tag it was requested under plus the hash of its file.
///
/// Rewriting a model file under the same tag yields a different id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId {
    pub tag: String,
    pub hash: ContentHash,
}

impl ModelId {
    pub fn new(tag: impl Into<String>, hash: ContentHash) -> Self {
        Self {
            tag: tag.into(),
            hash,
        }
    }

    pub fn from_content(tag: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(tag, ContentHash::from_bytes(bytes))
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.tag, self.hash.short())
    }
}
