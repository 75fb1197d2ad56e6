//! Suffix-based document classification.

use serde::{Deserialize, Serialize};

/// Content bucket a source document is split under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentBucket {
    /// Tests and snapshots. Never chunked.
    Excluded,
    Markdown,
    Markup,
    Script,
    Other,
}

/// Grammar used for script documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLanguage {
    TypeScript,
    Tsx,
    JavaScript,
}

impl ScriptLanguage {
    /// Pick the grammar from a script path's suffix.
    pub fn from_path(path: &str) -> Self {
        if path.ends_with(".tsx") {
            ScriptLanguage::Tsx
        } else if path.ends_with(".ts") {
            ScriptLanguage::TypeScript
        } else {
            // .js and .jsx share one grammar
            ScriptLanguage::JavaScript
        }
    }

    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            ScriptLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            ScriptLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            ScriptLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

const EXCLUDED_SUFFIXES: [&str; 4] = [".test.tsx", ".test.ts", ".test.js", ".snap"];
const MARKDOWN_SUFFIXES: [&str; 2] = [".md", ".mdx"];
const MARKUP_SUFFIXES: [&str; 1] = [".html"];
const SCRIPT_SUFFIXES: [&str; 4] = [".js", ".jsx", ".ts", ".tsx"];

impl ContentBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentBucket::Excluded => "excluded",
            ContentBucket::Markdown => "markdown",
            ContentBucket::Markup => "markup",
            ContentBucket::Script => "script",
            ContentBucket::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "excluded" => Some(ContentBucket::Excluded),
            "markdown" => Some(ContentBucket::Markdown),
            "markup" => Some(ContentBucket::Markup),
            "script" => Some(ContentBucket::Script),
            "other" => Some(ContentBucket::Other),
            _ => None,
        }
    }
}

/// Classify a path by suffix.
///
/// Checked in a fixed order: excluded patterns, markdown, markup, script,
/// then everything else. `foo.test.ts` is therefore excluded, never script.
pub fn classify(path: &str) -> ContentBucket {
    let ends_with_any = |suffixes: &[&str]| suffixes.iter().any(|s| path.ends_with(s));

    if ends_with_any(&EXCLUDED_SUFFIXES) {
        ContentBucket::Excluded
    } else if ends_with_any(&MARKDOWN_SUFFIXES) {
        ContentBucket::Markdown
    } else if ends_with_any(&MARKUP_SUFFIXES) {
        ContentBucket::Markup
    } else if ends_with_any(&SCRIPT_SUFFIXES) {
        ContentBucket::Script
    } else {
        ContentBucket::Other
    }
}
