//! Retrieval-augmented answering.
//!
//! A question flows through [`ChatEngine::ask`]:
//! 1. retrieve the closest chunks and draft an answer ([`AnswerChain`])
//! 2. probe the draft's links ([`LinkValidator`])
//! 3. rewrite the draft without unreachable links ([`LinkCorrectionChain`])
//! 4. record the turn in the session's history

pub mod chain;
pub mod history;
pub mod links;
pub mod retriever;
pub mod types;

pub use chain::{AnswerChain, ChatEngine, DraftAnswer, LinkCorrectionChain};
pub use history::{format_chat_history, ConversationStore};
pub use links::{extract_links, strip_unvalidated, HttpProbe, LinkProbe, LinkValidator};
pub use retriever::Retriever;
pub use types::{ChatAnswer, ChatTurn, Hyperlink, RetrievedChunk};
