//! Text cleaning executed before chunking.
//!
//! PDF text extraction leaves artifacts that hurt both chunk boundaries and embeddings:
//! carriage returns, form feeds, NUL padding, and words hyphenated across line breaks.

use crate::types::Document;

/// Trait for document cleaning strategies.
pub trait Cleaner: Send + Sync {
    /// Cleans the input document and returns a normalized version.
    fn clean(&self, doc: &Document) -> Document;

    /// Returns the cleaner name.
    fn name(&self) -> &'static str;
}

/// Default cleaner applied to extracted PDF text.
///
/// - normalizes line endings and drops form feeds and NUL bytes
/// - rejoins words hyphenated across a line break (`punish-\nment`)
/// - trims trailing whitespace on each line
/// - collapses runs of blank lines to a single blank line
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicCleaner;

impl BasicCleaner {
    /// Cleans raw text.
    #[must_use]
    pub fn clean_text(text: &str) -> String {
        let normalized: String = text
            .replace("\r\n", "\n")
            .chars()
            .filter_map(|c| match c {
                '\r' | '\u{000C}' => Some('\n'),
                '\0' => None,
                other => Some(other),
            })
            .collect();

        let mut out = String::with_capacity(normalized.len());
        let mut pending_blank = false;
        let mut carry_hyphen = false;

        for line in normalized.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                pending_blank = !out.is_empty();
                carry_hyphen = false;
                continue;
            }

            if carry_hyphen && line.starts_with(char::is_lowercase) {
                out.pop();
                out.push_str(line);
            } else {
                if !out.is_empty() {
                    out.push('\n');
                    if pending_blank {
                        out.push('\n');
                    }
                }
                out.push_str(line);
            }
            pending_blank = false;

            carry_hyphen = ends_with_split_word(line);
        }

        out.trim().to_string()
    }
}

// A trailing hyphen directly after a lowercase letter marks a word split by layout.
fn ends_with_split_word(line: &str) -> bool {
    let mut chars = line.chars().rev();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_lowercase)
}

impl Cleaner for BasicCleaner {
    fn clean(&self, doc: &Document) -> Document {
        Document::with_metadata(
            doc.id.clone(),
            Self::clean_text(&doc.text),
            doc.metadata.clone(),
        )
    }

    fn name(&self) -> &'static str {
        "basic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_text() {
        let doc = Document::new("d1", "a\r\n\r\n\r\n b  \n\n\n\nc");
        let cleaned = BasicCleaner.clean(&doc);
        assert_eq!(cleaned.text, "a\n\n b\n\nc");
        assert_eq!(cleaned.id, "d1");
    }

    #[test]
    fn rejoins_hyphenated_words() {
        assert_eq!(
            BasicCleaner::clean_text("shall be liable to punish-\nment with fine"),
            "shall be liable to punishment with fine"
        );
    }

    #[test]
    fn keeps_real_dashes() {
        assert_eq!(
            BasicCleaner::clean_text("Section 302 -\nPunishment"),
            "Section 302 -\nPunishment"
        );
        assert_eq!(BasicCleaner::clean_text("well-\nKnown"), "well-\nKnown");
    }

    #[test]
    fn strips_page_artifacts() {
        assert_eq!(BasicCleaner::clean_text("page one\u{000C}page\0 two"), "page one\npage two");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(BasicCleaner::clean_text("  \n\n "), "");
    }
}
