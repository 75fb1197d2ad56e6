//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use docchat_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Missing variables render as empty strings and are falsy in `{{#if}}`
/// blocks, so optional instructions can be switched off by leaving their
/// variable out.
///
/// # Example
/// ```no_run
/// use docchat_prompt::{build_prompt, builtin_prompt, QUESTION_PROMPT_ID};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt(QUESTION_PROMPT_ID).unwrap();
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "How do I create a cart?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("{}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!(prompt = %definition.id, "Building prompt");

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        definition.system.clone(),
        rendered,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text, never HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{builtin_prompt, LINK_VALIDATION_PROMPT_ID, QUESTION_PROMPT_ID};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Question: {{question}}", &vars(&[("question", "Hi")]));
        assert_eq!(result.unwrap(), "Question: Hi");
    }

    #[test]
    fn test_render_does_not_escape_markup() {
        let result = render_template("{{input}}", &vars(&[("input", "<b>[a](https://x.com/?a=1&b=2)</b>")]));
        assert_eq!(result.unwrap(), "<b>[a](https://x.com/?a=1&b=2)</b>");
    }

    #[test]
    fn test_render_template_missing_variable() {
        let result = render_template("Question: {{missing}}", &HashMap::new());
        assert_eq!(result.unwrap(), "Question: ");
    }

    #[test]
    fn test_render_invalid_template() {
        assert!(render_template("{{#if ready}}unclosed", &HashMap::new()).is_err());
    }

    #[test]
    fn test_question_prompt_layout() {
        let def = builtin_prompt(QUESTION_PROMPT_ID).unwrap();
        let built = build_prompt(
            &def,
            vars(&[
                ("context", "Carts are created with createEmptyCart."),
                ("chatHistory", ""),
                ("question", "How do I create a cart?"),
                ("docsBaseUrl", "https://developer.adobe.com/commerce/webapi/"),
                ("avoidTerm", "Magento"),
                ("preferredTerm", "Adobe Commerce"),
            ]),
        )
        .unwrap();

        assert!(built
            .user
            .contains("CONTEXT: Carts are created with createEmptyCart.\n----"));
        assert!(built.user.contains("QUESTION: How do I create a cart?"));
        assert!(built.user.contains(r#"Do not use the term "Magento", instead use "Adobe Commerce"."#));
        assert!(built
            .user
            .contains("https://developer.adobe.com/commerce/webapi/graphql/payment-methods/payflow-pro/"));
        assert!(built.user.ends_with("Helpful Answer:"));
        assert_eq!(built.metadata.source_prompt_id, "question");
    }

    #[test]
    fn test_question_prompt_without_avoid_term() {
        let def = builtin_prompt(QUESTION_PROMPT_ID).unwrap();
        let built = build_prompt(&def, vars(&[("question", "q")])).unwrap();
        assert!(!built.user.contains("Do not use the term"));
    }

    #[test]
    fn test_link_validation_prompt_layout() {
        let def = builtin_prompt(LINK_VALIDATION_PROMPT_ID).unwrap();
        let built = build_prompt(
            &def,
            vars(&[
                ("input", "See [docs](https://x.com/a)."),
                ("hyperlinks", r#"["https://x.com/a"]"#),
            ]),
        )
        .unwrap();

        assert!(built.user.contains("INPUT: See [docs](https://x.com/a)."));
        assert!(built.user.contains(r#"CONTEXT: ["https://x.com/a"]"#));
    }
}
