//! Built-in prompt definitions.
//!
//! `question` drafts an answer from retrieved documentation. It expects the
//! variables `context`, `chatHistory`, `question`, `docsBaseUrl`,
//! `avoidTerm` and `preferredTerm`.
//!
//! `link_validation` rewrites a draft so that it keeps only reachable links.
//! It expects `input` and `hyperlinks`, the latter a JSON array of URLs.

use crate::types::PromptDefinition;

pub const QUESTION_PROMPT_ID: &str = "question";
pub const LINK_VALIDATION_PROMPT_ID: &str = "link_validation";

const QUESTION_TEMPLATE: &str = r#"Answer the question using the provided context. The context may have relative markdown urls, which should be converted to absolute urls based on the context source and the documentation base url {{docsBaseUrl}}.
For example, "../../../payment-methods/payflow-pro.md" found in a graphql page should be converted to "{{docsBaseUrl}}graphql/payment-methods/payflow-pro/".
If you don't know the answer, just say that you don't know, don't try to make up an answer.
Always use Markdown format in your response.
Keep the answer concise.
{{#if avoidTerm}}Do not use the term "{{avoidTerm}}", instead use "{{preferredTerm}}".
{{/if}}----
CONTEXT: {{context}}
----
CHAT HISTORY: {{chatHistory}}
----
QUESTION: {{question}}
----
Helpful Answer:"#;

const LINK_VALIDATION_TEMPLATE: &str = r#"You are an assistant tasked with refining a given input to retain only the valid hyperlinks.
The CONTEXT section is a JSON array holding every hyperlink that was confirmed to be valid.
Remove each hyperlink in the INPUT whose url is not in that array. When you remove a markdown link, keep its link text as plain text.
If the array is empty, then all hyperlinks in the input are invalid and should be removed.
Keep all other content and formatting of the INPUT exactly as it is. DO NOT return invalid hyperlinks. DO NOT add any commentary.
----
INPUT: {{input}}
----
CONTEXT: {{hyperlinks}}
----
Answer:"#;

/// Look up a built-in prompt definition by id.
pub fn builtin_prompt(id: &str) -> Option<PromptDefinition> {
    let (description, template) = match id {
        QUESTION_PROMPT_ID => (
            "Answer a documentation question from retrieved context",
            QUESTION_TEMPLATE,
        ),
        LINK_VALIDATION_PROMPT_ID => (
            "Strip hyperlinks that failed reachability checks",
            LINK_VALIDATION_TEMPLATE,
        ),
        _ => return None,
    };

    Some(PromptDefinition {
        id: id.to_string(),
        api_version: "1.0".to_string(),
        description: description.to_string(),
        system: None,
        template: template.to_string(),
    })
}
