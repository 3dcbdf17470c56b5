//! Fixed-size text chunking.

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{RagError, Result};
use crate::persistence::ChunkingParams;
use crate::types::{Chunk, Document};

use super::Chunker;

/// Chunks text into windows of at most `chunk_size` characters with exact overlap.
///
/// Each chunk after the first begins `overlap` characters before the previous chunk
/// ended, so dropping the first `overlap` characters of every chunk but the first and
/// concatenating reproduces the input. Lengths count Unicode scalar values; a
/// multi-byte character is never split.
///
/// By default a cut lands on the last paragraph break inside the window, falling back
/// to a sentence boundary, a line break, whitespace, and finally a hard cut. Boundaries
/// in the first half of the window are ignored so chunks stay close to full size.
///
/// # Example
///
/// ```rust
/// use nyaya_rag::chunking::{Chunker, FixedSizeChunker};
/// use nyaya_rag::Document;
///
/// let chunker = FixedSizeChunker::new(1000, 20).unwrap();
/// let doc = Document::new("ipc.pdf", "a".repeat(2500));
/// let chunks = chunker.chunk(&doc).unwrap();
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[1].start, 980);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    overlap: usize,
    preserve_boundaries: bool,
}

impl FixedSizeChunker {
    /// Creates a new fixed-size chunker.
    ///
    /// # Errors
    /// Returns [`RagError::InvalidConfig`] if `chunk_size` is zero or `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidConfig("chunk_size must be at least 1".into()));
        }
        if overlap >= chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "overlap ({overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            preserve_boundaries: true,
        })
    }

    /// Always cut at exactly `chunk_size` characters.
    #[must_use]
    pub const fn hard_cuts(mut self) -> Self {
        self.preserve_boundaries = false;
        self
    }

    /// Maximum characters per chunk.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by consecutive chunks.
    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// Splits `text` into `(character offset, slice)` pieces.
    #[must_use]
    pub fn split<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = offsets.len() - 1;

        let mut pieces = Vec::new();
        if total == 0 {
            return pieces;
        }

        let mut start = 0;
        loop {
            if total - start <= self.chunk_size {
                pieces.push((start, &text[offsets[start]..]));
                return pieces;
            }

            let window_end = start + self.chunk_size;
            let end = if self.preserve_boundaries {
                start + self.boundary_cut(&text[offsets[start]..offsets[window_end]])
            } else {
                window_end
            };
            pieces.push((start, &text[offsets[start]..offsets[end]]));

            // end > start + overlap, so this always advances.
            start = end - self.overlap;
        }
    }

    /// Number of characters of a full window to keep as the chunk.
    fn boundary_cut(&self, window: &str) -> usize {
        let min_keep = (self.overlap + 1).max(self.chunk_size / 2);

        let paragraphs: Vec<usize> = window
            .match_indices("\n\n")
            .map(|(byte, sep)| byte + sep.len())
            .collect();
        let sentences: Vec<usize> = window
            .split_sentence_bound_indices()
            .map(|(byte, _)| byte)
            .filter(|&byte| byte > 0)
            .collect();
        let lines: Vec<usize> = window.match_indices('\n').map(|(byte, _)| byte + 1).collect();
        let words: Vec<usize> = window
            .char_indices()
            .filter(|(_, c)| c.is_whitespace())
            .map(|(byte, c)| byte + c.len_utf8())
            .collect();

        [paragraphs, sentences, lines, words]
            .iter()
            .find_map(|cuts| last_cut(window, cuts, min_keep))
            .unwrap_or(self.chunk_size)
    }
}

/// Last cut (as a character count), if it keeps at least `min_keep` characters.
///
/// `cuts` holds ascending byte offsets into `window`.
fn last_cut(window: &str, cuts: &[usize], min_keep: usize) -> Option<usize> {
    cuts.last()
        .map(|&byte| window[..byte].chars().count())
        .filter(|&chars| chars >= min_keep)
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, doc: &Document) -> Result<Vec<Chunk>> {
        Ok(self
            .split(&doc.text)
            .into_iter()
            .enumerate()
            .map(|(index, (start, text))| {
                Chunk::new(&doc.id, index, start, text).with_metadata(doc.metadata.clone())
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "fixed_size"
    }

    fn params(&self) -> ChunkingParams {
        ChunkingParams {
            chunk_size: self.chunk_size,
            chunk_overlap: self.overlap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(chunks: &[Chunk], overlap: usize) -> String {
        let mut text = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let skip = if i == 0 { 0 } else { overlap };
            text.extend(chunk.text.chars().skip(skip));
        }
        text
    }

    #[test]
    fn small_text_single_chunk() {
        let chunker = FixedSizeChunker::new(100, 20).unwrap();
        let doc = Document::new("doc1", "Short text");
        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "doc1#chunk_0");
        assert_eq!(chunks[0].text, "Short text");
        assert_eq!(chunks[0].source_id, "doc1");
        assert_eq!(chunks[0].start, 0);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        let chunker = FixedSizeChunker::new(100, 20).unwrap();
        assert!(chunker.chunk(&Document::new("doc1", "")).unwrap().is_empty());
    }

    #[test]
    fn exact_size_is_one_chunk() {
        let chunker = FixedSizeChunker::new(10, 2).unwrap();
        let chunks = chunker.chunk(&Document::new("d", "0123456789")).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn unbroken_text_splits_at_fixed_offsets() {
        let chunker = FixedSizeChunker::new(1000, 20).unwrap();
        let doc = Document::new("ipc.pdf", "x".repeat(2500));
        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 3);
        let starts: Vec<usize> = chunks.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0, 980, 1960]);
        assert_eq!(chunks[0].char_len(), 1000);
        assert_eq!(chunks[2].char_len(), 540);
        assert_eq!(reassemble(&chunks, 20), doc.text);
    }

    #[test]
    fn prefers_sentence_boundary() {
        let chunker = FixedSizeChunker::new(50, 5).unwrap();
        let text = "The first sentence is right here. Then another one follows it closely and keeps going.";
        let chunks = chunker.chunk(&Document::new("d", text)).unwrap();

        assert!(chunks[0].text.ends_with("here. "), "got {:?}", chunks[0].text);
        assert_eq!(chunks[1].start, 34 - 5);
        assert_eq!(reassemble(&chunks, 5), text);
    }

    #[test]
    fn prefers_paragraph_over_sentence() {
        let chunker = FixedSizeChunker::new(40, 4).unwrap();
        let text = "Section 441. Criminal trespass.\n\nWhoever enters into property. More.";
        let chunks = chunker.chunk(&Document::new("d", text)).unwrap();
        assert!(chunks[0].text.ends_with("trespass.\n\n"), "got {:?}", chunks[0].text);
        assert_eq!(reassemble(&chunks, 4), text);
    }

    #[test]
    fn hard_cuts_ignore_boundaries() {
        let chunker = FixedSizeChunker::new(50, 5).unwrap().hard_cuts();
        let text = "The first sentence is right here. Then another one follows it closely and keeps going.";
        let chunks = chunker.chunk(&Document::new("d", text)).unwrap();
        assert_eq!(chunks[0].char_len(), 50);
        assert_eq!(chunks[1].start, 45);
    }

    #[test]
    fn multibyte_text_is_never_split_mid_character() {
        let chunker = FixedSizeChunker::new(7, 2).unwrap();
        let text = "धारा ३०२ हत्या के लिए दंड";
        let chunks = chunker.chunk(&Document::new("d", text)).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.char_len() <= 7));
        assert_eq!(reassemble(&chunks, 2), text);
    }

    #[test]
    fn metadata_preserved() {
        let chunker = FixedSizeChunker::new(100, 20).unwrap();
        let mut metadata = crate::types::Metadata::new();
        metadata.insert("title".into(), "Indian Penal Code".into());
        let doc = Document::with_metadata("doc1", "Some text", metadata);
        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(
            chunks[0].metadata.get("title"),
            Some(&"Indian Penal Code".to_string())
        );
    }

    #[test]
    fn overlap_must_be_less_than_chunk_size() {
        assert!(matches!(
            FixedSizeChunker::new(50, 50),
            Err(RagError::InvalidConfig(_))
        ));
        assert!(matches!(
            FixedSizeChunker::new(0, 0),
            Err(RagError::InvalidConfig(_))
        ));
    }
}
