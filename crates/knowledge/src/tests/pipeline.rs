use super::fakes::{CountingEmbedder, HangingProbe, ScriptedLlm, StaticProbe};
use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use crate::index::IndexBuilder;
use crate::rag::{ChatEngine, LinkValidator};
use crate::types::KnowledgeBaseConfig;
use docchat_core::ChatConfig;
use docchat_llm::LlmClient;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const DATASET: &str = "commerce-webapi";
const DIMS: usize = 256;

const INSTALL_DOC: &str = "# Installation\n\nTo install the storefront, run composer install and then bin/magento setup:install.";
const BILLING_DOC: &str = "# Billing\n\nInvoices are emailed monthly. Update payment cards from the account billing page.";

fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("datasets").join(DATASET);
    fs::create_dir_all(root.join("guides")).unwrap();
    fs::write(root.join("guides/installation.md"), INSTALL_DOC).unwrap();
    fs::write(root.join("guides/billing.md"), BILLING_DOC).unwrap();
    fs::write(root.join("guides/billing.test.ts"), "it('bills', () => {});").unwrap();
    temp
}

fn knowledge_config() -> KnowledgeBaseConfig {
    let mut config = KnowledgeBaseConfig::new(DATASET);
    config.embedding = EmbeddingConfig::trigram(DIMS);
    config
}

fn chat_config() -> ChatConfig {
    ChatConfig {
        dataset: DATASET.to_string(),
        top_k: 1,
        probe_timeout_ms: 200,
        validation_deadline_ms: 1_000,
        ..Default::default()
    }
}

async fn engine(
    workspace: &Path,
    llm: Arc<ScriptedLlm>,
    reachable: &[&str],
) -> ChatEngine {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(CountingEmbedder::new(DIMS));
    let index = IndexBuilder::new(workspace, knowledge_config(), Arc::clone(&embedder))
        .unwrap()
        .load_or_build()
        .await
        .unwrap();

    let llm: Arc<dyn LlmClient> = llm;
    ChatEngine::new(
        workspace,
        Arc::new(index),
        embedder,
        llm,
        "gpt-3.5-turbo",
        Arc::new(StaticProbe::new(reachable)),
        &chat_config(),
    )
    .unwrap()
}

#[tokio::test]
async fn reload_makes_no_embedding_calls() {
    let temp = workspace();
    let embedder = Arc::new(CountingEmbedder::new(DIMS));

    let built = IndexBuilder::new(temp.path(), knowledge_config(), embedder.clone())
        .unwrap()
        .load_or_build()
        .await
        .unwrap();
    let after_build = embedder.embedded();
    assert_eq!(after_build, built.len());
    assert_eq!(built.len(), 2);

    let loaded = IndexBuilder::new(temp.path(), knowledge_config(), embedder.clone())
        .unwrap()
        .load_or_build()
        .await
        .unwrap();

    assert_eq!(embedder.embedded(), after_build);
    assert_eq!(loaded.len(), built.len());
}

#[tokio::test]
async fn concurrent_builds_embed_once() {
    let temp = workspace();
    let embedder = Arc::new(CountingEmbedder::new(DIMS));

    let first = IndexBuilder::new(temp.path(), knowledge_config(), embedder.clone()).unwrap();
    let second = IndexBuilder::new(temp.path(), knowledge_config(), embedder.clone()).unwrap();

    let (a, b) = tokio::join!(first.load_or_build(), second.load_or_build());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.len(), b.len());
    assert_eq!(embedder.embedded(), a.len());
}

#[tokio::test]
async fn install_question_retrieves_installation_chunk() {
    let temp = workspace();
    let draft = "Run composer install. See [the guide](https://docs.example.com/install) and [old notes](https://stale.example.com/notes).";
    // The correction reply still carries the unreachable link
    let corrected = draft;
    let llm = Arc::new(ScriptedLlm::new(&[draft, corrected]));

    let engine = engine(temp.path(), llm.clone(), &["https://docs.example.com/install"]).await;
    let answer = engine.ask("default", "How do I install this?").await.unwrap();

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("composer install"));
    assert!(!prompts[0].contains("Invoices are emailed"));
    assert!(prompts[1].contains("[\"https://docs.example.com/install\"]"));

    assert_eq!(answer.sources, vec![format!("{}/guides/installation.md", DATASET)]);
    assert_eq!(answer.validated_links, vec!["https://docs.example.com/install"]);
    assert_eq!(answer.removed_links, vec!["https://stale.example.com/notes"]);
    assert!(answer.answer.contains("[the guide](https://docs.example.com/install)"));
    assert!(answer.answer.contains("old notes"));
    assert!(!answer.answer.contains("stale.example.com"));
}

#[tokio::test]
async fn no_links_still_runs_correction_with_empty_list() {
    let temp = workspace();
    let llm = Arc::new(ScriptedLlm::new(&["You are billed monthly.", "You are billed monthly."]));

    let engine = engine(temp.path(), llm.clone(), &[]).await;
    let answer = engine.ask("default", "When am I billed?").await.unwrap();

    assert_eq!(answer.answer, "You are billed monthly.");
    assert!(answer.validated_links.is_empty());
    assert!(llm.prompts()[1].contains("CONTEXT: []"));
}

#[tokio::test]
async fn history_accumulates_per_session() {
    let temp = workspace();
    let llm = Arc::new(ScriptedLlm::new(&[
        "draft one", "answer one", "draft two", "answer two", "draft three", "answer three",
        "draft other", "answer other",
    ]));
    let engine = engine(temp.path(), llm.clone(), &[]).await;

    engine.ask("s", "first question").await.unwrap();
    engine.ask("s", "second question").await.unwrap();
    engine.ask("s", "third question").await.unwrap();
    engine.ask("other", "unrelated").await.unwrap();

    let prompts = llm.prompts();
    let first = &prompts[0];
    let third = &prompts[4];
    let other = &prompts[6];

    assert!(first.contains("CHAT HISTORY: \n"));
    assert_eq!(third.matches("Human: ").count(), 2);
    assert!(third.contains(
        "Human: first question\nAI: answer one\n\nHuman: second question\nAI: answer two"
    ));
    assert_eq!(other.matches("Human: ").count(), 0);
    assert_eq!(engine.conversations().history("s").len(), 3);
}

#[tokio::test]
async fn concurrent_turns_in_one_session_see_each_other() {
    let temp = workspace();
    let llm = Arc::new(
        ScriptedLlm::new(&["draft one", "answer one", "draft two", "answer two"])
            .with_delay(Duration::from_millis(20)),
    );
    let engine = engine(temp.path(), llm.clone(), &[]).await;

    let (first, second) = tokio::join!(
        engine.ask("s", "first question"),
        engine.ask("s", "second question")
    );
    first.unwrap();
    second.unwrap();

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[2].contains("Human: first question\nAI: answer one"));
    assert_eq!(engine.conversations().history("s").len(), 2);
}

#[tokio::test]
async fn model_failure_is_fatal_and_not_recorded() {
    let temp = workspace();
    let llm = Arc::new(ScriptedLlm::new(&[]));
    let engine = engine(temp.path(), llm, &[]).await;

    assert!(engine.ask("s", "How do I install this?").await.is_err());
    assert!(engine.conversations().history("s").is_empty());
}

#[tokio::test]
async fn hanging_probe_counts_as_invalid() {
    let validator = LinkValidator::new(
        Arc::new(HangingProbe {
            fast: "https://a.example.com".to_string(),
        }),
        Duration::from_millis(50),
        Duration::from_secs(2),
    );

    let valid = validator
        .validate("[a](https://a.example.com) and [b](https://b.example.com)")
        .await;
    assert_eq!(valid, BTreeSet::from(["https://a.example.com".to_string()]));
}
