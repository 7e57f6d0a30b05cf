//! Context assembly from retrieved documents

use crate::models::Citation;
use crate::models::Document;

/// Separator between document texts in the assembled context.
const SEPARATOR: &str = "\n\n";

/// Builds a length-bounded context string from ranked documents.
pub struct ContextAssembler {
    max_context_length: usize,
}

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new(max_context_length: usize) -> Self {
        Self { max_context_length }
    }

    /// Concatenate document texts with blank-line separators, stopping
    /// before any document whose inclusion would exceed the length bound.
    /// Documents past the cutoff are dropped whole, never truncated.
    #[must_use]
    pub fn extract_context(&self, documents: &[Document]) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let mut total_chars = 0;

        for document in documents {
            let separator_chars = if parts.is_empty() {
                0
            } else {
                SEPARATOR.len()
            };
            let entry_chars = document.content.chars().count() + separator_chars;

            if total_chars + entry_chars > self.max_context_length {
                break;
            }

            parts.push(document.content.as_str());
            total_chars += entry_chars;
        }

        parts.join(SEPARATOR)
    }

    #[must_use]
    pub const fn max_context_length(&self) -> usize {
        self.max_context_length
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(2000)
    }
}

/// One citation per document, in input order, with 1-based contiguous
/// ordinals and a synthetic `#file-{id}` link.
#[must_use]
pub fn files_to_citations(documents: &[Document]) -> Vec<Citation> {
    documents
        .iter()
        .enumerate()
        .map(|(idx, document)| {
            let source_id = document.citation_id();
            Citation {
                ordinal: idx + 1,
                link: format!("#file-{source_id}"),
                source_id,
                snippet: document.content.clone(),
            }
        })
        .collect()
}
