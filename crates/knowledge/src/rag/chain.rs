//! Two-stage answering: draft from retrieved context, then correct links.

use crate::embeddings::EmbeddingProvider;
use crate::index::DocumentIndex;
use crate::rag::history::{format_chat_history, ConversationStore};
use crate::rag::links::{strip_unvalidated, LinkProbe, LinkValidator};
use crate::rag::retriever::Retriever;
use crate::rag::types::{ChatAnswer, ChatTurn, RetrievedChunk};
use docchat_core::{AppResult, ChatConfig};
use docchat_llm::{LlmClient, LlmRequest};
use docchat_prompt::{
    build_prompt, resolve_prompt, PromptDefinition, LINK_VALIDATION_PROMPT_ID, QUESTION_PROMPT_ID,
};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Instrument;

/// A drafted answer and the context it was drafted from.
#[derive(Debug, Clone)]
pub struct DraftAnswer {
    pub text: String,
    pub context: Vec<RetrievedChunk>,
}

/// Retrieve, build the question prompt, call the model, trim the reply.
pub struct AnswerChain {
    retriever: Retriever,
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    base_vars: HashMap<String, String>,
}

impl AnswerChain {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LlmClient>,
        model: &str,
        prompt: PromptDefinition,
        chat: &ChatConfig,
    ) -> Self {
        let mut base_vars = HashMap::new();
        base_vars.insert("docsBaseUrl".to_string(), chat.docs_base_url.clone());
        if let (Some(avoid), Some(preferred)) = (&chat.avoid_term, &chat.preferred_term) {
            base_vars.insert("avoidTerm".to_string(), avoid.clone());
            base_vars.insert("preferredTerm".to_string(), preferred.clone());
        }

        Self {
            retriever,
            llm,
            model: model.to_string(),
            prompt,
            base_vars,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub async fn draft(&self, question: &str, history: &[ChatTurn]) -> AppResult<DraftAnswer> {
        let context = self
            .retriever
            .retrieve(question)
            .instrument(tracing::debug_span!("retrieve"))
            .await?;

        let built = {
            let _span = tracing::debug_span!("prompt_build", turns = history.len()).entered();
            let mut vars = self.base_vars.clone();
            vars.insert(
                "context".to_string(),
                context
                    .iter()
                    .map(|c| c.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            );
            vars.insert("chatHistory".to_string(), format_chat_history(history));
            vars.insert("question".to_string(), question.to_string());
            build_prompt(&self.prompt, vars)?
        };

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self
            .llm
            .complete(&request)
            .instrument(tracing::debug_span!("model_call", model = %self.model))
            .await?;

        let text = {
            let _span = tracing::debug_span!("parse").entered();
            response.content.trim().to_string()
        };

        Ok(DraftAnswer { text, context })
    }
}

/// Ask the model to drop unreachable links, then enforce it.
pub struct LinkCorrectionChain {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl LinkCorrectionChain {
    pub fn new(llm: Arc<dyn LlmClient>, model: &str, prompt: PromptDefinition) -> Self {
        Self {
            llm,
            model: model.to_string(),
            prompt,
        }
    }

    /// Corrected text and the URLs that had to be stripped from it.
    ///
    /// The returned text never contains a URL outside `valid`.
    #[tracing::instrument(level = "debug", skip_all, fields(valid = valid.len()))]
    pub async fn correct(&self, draft: &str, valid: &BTreeSet<String>) -> AppResult<(String, Vec<String>)> {
        let hyperlinks = serde_json::to_string(&valid.iter().collect::<Vec<_>>())?;

        let mut vars = HashMap::new();
        vars.insert("input".to_string(), draft.to_string());
        vars.insert("hyperlinks".to_string(), hyperlinks);
        let built = build_prompt(&self.prompt, vars)?;

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        let response = self.llm.complete(&request).await?;

        let (text, removed) = strip_unvalidated(response.content.trim(), valid);
        if !removed.is_empty() {
            tracing::warn!(
                "Model kept {} unvalidated links; stripped: {}",
                removed.len(),
                removed.join(", ")
            );
        }

        Ok((text, removed))
    }
}

/// One question in, one corrected answer out, with per-session history.
///
/// Turns within one session run one at a time, so each turn's prompt sees
/// every turn that finished before it. Different sessions run concurrently.
pub struct ChatEngine {
    answer: AnswerChain,
    validator: LinkValidator,
    correction: LinkCorrectionChain,
    conversations: ConversationStore,
    session_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChatEngine {
    /// Assemble the engine. Prompts come from workspace overrides when
    /// present, otherwise the built-in definitions.
    pub fn new(
        workspace: &Path,
        index: Arc<DocumentIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
        model: &str,
        probe: Arc<dyn LinkProbe>,
        chat: &ChatConfig,
    ) -> AppResult<Self> {
        let question_prompt = resolve_prompt(workspace, QUESTION_PROMPT_ID)?;
        let link_prompt = resolve_prompt(workspace, LINK_VALIDATION_PROMPT_ID)?;

        let retriever = Retriever::new(index, embedder, chat.top_k);

        Ok(Self {
            answer: AnswerChain::new(retriever, Arc::clone(&llm), model, question_prompt, chat),
            validator: LinkValidator::new(probe, chat.probe_timeout(), chat.validation_deadline()),
            correction: LinkCorrectionChain::new(llm, model, link_prompt),
            conversations: ConversationStore::from_config(chat),
            session_locks: Mutex::new(HashMap::new()),
        })
    }

    fn session_lock(&self, session: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.session_locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Drop locks nobody holds or waits on
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(session.to_string()).or_default())
    }

    pub fn index(&self) -> &DocumentIndex {
        self.answer.retriever().index()
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    #[tracing::instrument(skip(self, question))]
    pub async fn ask(&self, session: &str, question: &str) -> AppResult<ChatAnswer> {
        let lock = self.session_lock(session);
        let _turn = lock.lock().await;

        let history = self.conversations.history(session);

        let draft = self.answer.draft(question, &history).await?;
        let valid = self.validator.validate(&draft.text).await;
        let (answer, removed_links) = self.correction.correct(&draft.text, &valid).await?;

        self.conversations
            .record(session, ChatTurn::new(question, answer.clone()));

        let mut sources: Vec<String> = Vec::new();
        for chunk in &draft.context {
            if !sources.contains(&chunk.source) {
                sources.push(chunk.source.clone());
            }
        }

        tracing::info!(
            "Answered with {} context chunks, {} valid links",
            draft.context.len(),
            valid.len()
        );

        Ok(ChatAnswer {
            answer,
            sources,
            validated_links: valid.into_iter().collect(),
            removed_links,
        })
    }
}
