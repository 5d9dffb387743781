/// Keyword-based response resolution.
///
/// Two distinct tie-breaks apply:
/// - across response entries, a keyword registered twice maps to the
///   entry registered last;
/// - across question tokens, the first token (left to right) that hits
///   the index decides the answer.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::schema::message::MessageNode;
use crate::schema::persona::ResponseEntry;

/// How punctuation is stripped from a question before tokenizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    /// Remove every character that is neither a word character nor
    /// whitespace. Word characters include non-ASCII letters and digits.
    #[default]
    All,
    /// Remove only the first character outside ASCII `[A-Za-z0-9_]` and
    /// whitespace, leaving the rest in place. Accented letters count as
    /// punctuation here.
    FirstOnly,
}

fn is_kept(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace()
}

fn is_ascii_kept(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace()
}

impl Normalization {
    /// Strip punctuation according to the mode, then lowercase.
    pub fn apply(self, raw: &str) -> String {
        let stripped: String = match self {
            Self::All => raw.chars().filter(|&c| is_kept(c)).collect(),
            Self::FirstOnly => match raw.char_indices().find(|&(_, c)| !is_ascii_kept(c)) {
                Some((i, c)) => {
                    let mut s = String::with_capacity(raw.len());
                    s.push_str(&raw[..i]);
                    s.push_str(&raw[i + c.len_utf8()..]);
                    s
                }
                None => raw.to_string(),
            },
        };
        stripped.to_lowercase()
    }
}

/// A keyword collision between two response entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordCollision {
    pub keyword: String,
    /// Index of the entry that lost the keyword.
    pub shadowed: usize,
    /// Index of the entry the keyword now resolves to.
    pub winner: usize,
}

/// Normalized keyword → response messages. Built once, read-only after.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: FxHashMap<String, (usize, Vec<MessageNode>)>,
    collisions: Vec<KeywordCollision>,
}

impl KeywordIndex {
    /// Flatten every entry's keywords into one map. A keyword repeated in a
    /// later entry overwrites the earlier one.
    pub fn build(responses: &[ResponseEntry]) -> Self {
        let mut index = KeywordIndex::default();
        for (entry_idx, entry) in responses.iter().enumerate() {
            for keyword in &entry.keywords {
                let key = keyword.trim().to_lowercase();
                if key.is_empty() {
                    tracing::warn!(entry = entry_idx, "skipping empty keyword");
                    continue;
                }
                let previous = index
                    .entries
                    .insert(key.clone(), (entry_idx, entry.messages.clone()));
                if let Some((shadowed, _)) = previous {
                    if shadowed != entry_idx {
                        tracing::debug!(keyword = %key, shadowed, winner = entry_idx, "keyword overwritten");
                        index.collisions.push(KeywordCollision {
                            keyword: key,
                            shadowed,
                            winner: entry_idx,
                        });
                    }
                }
            }
        }
        index
    }

    pub fn get(&self, keyword: &str) -> Option<&[MessageNode]> {
        self.entries.get(keyword).map(|(_, messages)| messages.as_slice())
    }

    /// Index of the response entry a keyword resolves to.
    pub fn entry_for(&self, keyword: &str) -> Option<usize> {
        self.entries.get(keyword).map(|(idx, _)| *idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keywords registered by more than one entry, in registration order.
    pub fn collisions(&self) -> &[KeywordCollision] {
        &self.collisions
    }
}

/// Maps raw questions to response message trees.
#[derive(Debug, Clone)]
pub struct Resolver {
    index: KeywordIndex,
    fallback: Vec<MessageNode>,
    normalization: Normalization,
}

impl Resolver {
    pub fn new(index: KeywordIndex, fallback_text: &str, normalization: Normalization) -> Self {
        Self {
            index,
            fallback: vec![MessageNode::text("p", fallback_text)],
            normalization,
        }
    }

    pub fn index(&self) -> &KeywordIndex {
        &self.index
    }

    pub fn fallback(&self) -> &[MessageNode] {
        &self.fallback
    }

    /// Normalize `raw` and split it on single spaces. Repeated spaces give
    /// empty tokens.
    pub fn tokenize(&self, raw: &str) -> Vec<String> {
        self.normalization
            .apply(raw)
            .split(' ')
            .map(str::to_string)
            .collect()
    }

    /// The response for the first token that is a known keyword, or the
    /// fallback.
    pub fn resolve(&self, raw: &str) -> &[MessageNode] {
        self.matched_keyword(raw)
            .and_then(|keyword| self.index.get(&keyword))
            .unwrap_or(self.fallback.as_slice())
    }

    /// The keyword that decides the answer to `raw`, if any.
    pub fn matched_keyword(&self, raw: &str) -> Option<String> {
        self.tokenize(raw)
            .into_iter()
            .find(|token| self.index.get(token).is_some())
    }
}
