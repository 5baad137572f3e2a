use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Derive a stable seed from a document path using CRC32
pub fn seed_for_path(path: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(path.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Deterministic id generator for canvas nodes.
///
/// Ids take the form `<tag>-<n>`, or `<tag>-<seed>-<n>` when seeded. The
/// generator never checks the tree itself; callers that need uniqueness
/// (see `Document::fresh_id`) skip candidates that are already taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdGenerator {
    seed: Option<String>,
    count: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            seed: None,
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: Some(seed.into()),
            count: 0,
        }
    }

    /// Seed from a document path so ids differ between documents
    pub fn for_path(path: &str) -> Self {
        Self::from_seed(seed_for_path(path))
    }

    /// Generate the next sequential id for `tag`
    pub fn new_id(&mut self, tag: &str) -> String {
        self.count += 1;
        match &self.seed {
            Some(seed) => format!("{}-{}-{}", tag, seed, self.count),
            None => format!("{}-{}", tag, self.count),
        }
    }

    pub fn seed(&self) -> Option<&str> {
        self.seed.as_deref()
    }

    /// Number of ids handed out so far
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
