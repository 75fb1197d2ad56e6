//! Syntax-aware splitter for scripts and markup, backed by tree-sitter.

use super::{collect_chunks, splitter_config, ChunkSplitter};
use crate::chunk::{Chunk, ChunkConfig, ContentBucket, ScriptLanguage};
use docchat_core::{AppError, AppResult};
use text_splitter::CodeSplitter as ExternalCodeSplitter;

pub struct CodeSplitter {
    language: tree_sitter::Language,
    bucket: ContentBucket,
}

impl CodeSplitter {
    /// Splitter for JavaScript and TypeScript sources.
    pub fn script(language: ScriptLanguage) -> Self {
        Self {
            language: language.tree_sitter_language(),
            bucket: ContentBucket::Script,
        }
    }

    /// Splitter for HTML, breaking at element boundaries.
    pub fn markup() -> Self {
        Self {
            language: tree_sitter_html::LANGUAGE.into(),
            bucket: ContentBucket::Markup,
        }
    }
}

impl ChunkSplitter for CodeSplitter {
    fn split(&self, source: &str, text: &str, config: &ChunkConfig) -> AppResult<Vec<Chunk>> {
        let splitter = ExternalCodeSplitter::new(self.language.clone(), splitter_config(config)?)
            .map_err(|e| AppError::Knowledge(format!("Failed to create code splitter: {}", e)))?;

        let chunks = collect_chunks(source, self.bucket, "code", splitter.chunk_indices(text));

        tracing::debug!(
            "Code splitter ({}) created {} chunks from {} bytes",
            self.bucket.as_str(),
            chunks.len(),
            text.len()
        );

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::reassemble;

    fn small_config() -> ChunkConfig {
        ChunkConfig {
            chunk_size: 150,
            chunk_overlap: 20,
        }
    }

    #[test]
    fn test_typescript_chunks() {
        let code = r#"
export interface CartItem {
    sku: string;
    quantity: number;
}

export function addToCart(cart: CartItem[], item: CartItem): CartItem[] {
    const existing = cart.find((i) => i.sku === item.sku);
    if (existing) {
        existing.quantity += item.quantity;
        return cart;
    }
    return [...cart, item];
}

export function cartTotal(cart: CartItem[]): number {
    return cart.reduce((sum, item) => sum + item.quantity, 0);
}
"#;
        let splitter = CodeSplitter::script(ScriptLanguage::TypeScript);
        let chunks = splitter.split("src/cart.ts", code, &small_config()).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.metadata.char_count <= 150);
            assert_eq!(chunk.metadata.bucket, ContentBucket::Script);
        }
        assert_eq!(reassemble(&chunks), code);
    }

    #[test]
    fn test_tsx_chunks() {
        let code = "export const Price = ({ value }: { value: number }) => <span className=\"price\">{value}</span>;\n".repeat(4);
        let splitter = CodeSplitter::script(ScriptLanguage::Tsx);
        let chunks = splitter.split("src/Price.tsx", &code, &small_config()).unwrap();
        assert_eq!(reassemble(&chunks), code);
    }

    #[test]
    fn test_html_chunks() {
        let mut html = String::from("<html><body>\n");
        for i in 0..10 {
            html.push_str(&format!("<section><h2>Section {}</h2><p>Checkout step {} details.</p></section>\n", i, i));
        }
        html.push_str("</body></html>\n");

        let chunks = CodeSplitter::markup()
            .split("static/checkout.html", &html, &small_config())
            .unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.metadata.char_count <= 150);
            assert_eq!(chunk.metadata.bucket, ContentBucket::Markup);
        }
        assert_eq!(reassemble(&chunks), html);
    }
}
