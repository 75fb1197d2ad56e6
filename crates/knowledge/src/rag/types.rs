//! Question answering types.

use serde::{Deserialize, Serialize};

/// A chunk returned by the retriever, with its similarity to the question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub source: String,
    pub position: u32,
    pub score: f32,
}

/// One question and the answer that was returned for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

impl ChatTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A link found in answer text. Bare URLs use the URL as their text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub text: String,
    pub url: String,
}

/// Final result of one chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    /// Link-corrected answer, as stored in the session history
    pub answer: String,

    /// Distinct sources of the retrieved context, best match first
    pub sources: Vec<String>,

    /// URLs that passed the reachability check
    pub validated_links: Vec<String>,

    /// URLs stripped from the corrected answer because they were not validated
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_links: Vec<String>,
}
