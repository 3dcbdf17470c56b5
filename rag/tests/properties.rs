//! Property tests for chunking and search.

use nyaya_rag::chunking::{Chunker, FixedSizeChunker};
use nyaya_rag::index::{IndexKind, VectorIndex};
use nyaya_rag::{Chunk, Document, IndexEntry};
use proptest::prelude::*;

fn arb_params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..80).prop_flat_map(|size| (Just(size), 0..size))
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z .\n]{0,400}",
        "\\PC{0,300}",
        "(धारा [0-9]{3}। [अ-ह ]{5,40}\n){0,8}",
    ]
}

fn reassemble(chunks: &[Chunk], overlap: usize) -> String {
    let mut text = String::new();
    for (position, chunk) in chunks.iter().enumerate() {
        let skip = if position == 0 { 0 } else { overlap };
        text.extend(chunk.text.chars().skip(skip));
    }
    text
}

fn arb_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim)
}

mod chunking {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_reassemble_to_input(
            text in arb_text(),
            (size, overlap) in arb_params(),
            hard in any::<bool>(),
        ) {
            let chunker = FixedSizeChunker::new(size, overlap).unwrap();
            let chunker = if hard { chunker.hard_cuts() } else { chunker };
            let chunks = chunker.chunk(&Document::new("doc", text.clone())).unwrap();

            prop_assert_eq!(chunks.is_empty(), text.is_empty());
            prop_assert_eq!(reassemble(&chunks, overlap), text);
        }

        #[test]
        fn chunks_respect_size_and_overlap(
            text in arb_text(),
            (size, overlap) in arb_params(),
        ) {
            let chunker = FixedSizeChunker::new(size, overlap).unwrap();
            let chunks = chunker.chunk(&Document::new("doc", text)).unwrap();

            for (position, chunk) in chunks.iter().enumerate() {
                prop_assert!(chunk.char_len() <= size);
                prop_assert_eq!(chunk.index, position);
                prop_assert_eq!(&chunk.id, &format!("doc#chunk_{position}"));
            }
            for pair in chunks.windows(2) {
                prop_assert!(pair[0].char_len() > overlap);
                prop_assert_eq!(pair[1].start, pair[0].start + pair[0].char_len() - overlap);
            }
        }
    }
}

mod search {
    use super::*;

    const DIM: usize = 8;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_bounded_sorted_and_drawn_from_index(
            embeddings in proptest::collection::vec(arb_embedding(DIM), 0..40),
            query in arb_embedding(DIM),
            top_k in 1usize..50,
            hnsw in any::<bool>(),
        ) {
            let entries: Vec<IndexEntry> = embeddings
                .into_iter()
                .enumerate()
                .map(|(i, embedding)| {
                    IndexEntry::new(Chunk::new("doc", i, i, format!("chunk {i}")), embedding)
                })
                .collect();
            let count = entries.len();
            let kind = if hnsw { IndexKind::Hnsw } else { IndexKind::Flat };
            let index = kind.build(DIM, entries.clone()).unwrap();

            let results = index.search(&query, top_k, -1.0).unwrap();

            prop_assert!(results.len() <= top_k);
            prop_assert!(results.len() <= count);
            for window in results.windows(2) {
                prop_assert!(window[0].score >= window[1].score);
            }
            for result in &results {
                prop_assert!(entries.iter().any(|entry| entry.chunk == result.chunk));
            }
        }

        #[test]
        fn flat_search_returns_min_of_k_and_len(
            embeddings in proptest::collection::vec(arb_embedding(DIM), 1..30),
            query in arb_embedding(DIM),
            top_k in 1usize..40,
        ) {
            let entries: Vec<IndexEntry> = embeddings
                .into_iter()
                .enumerate()
                .map(|(i, embedding)| IndexEntry::new(Chunk::new("doc", i, i, "x"), embedding))
                .collect();
            let count = entries.len();
            let index = IndexKind::Flat.build(DIM, entries).unwrap();
            prop_assert_eq!(index.search(&query, top_k, -1.0).unwrap().len(), top_k.min(count));
        }
    }
}
