use std::path::Path;

use lopdf::Document;

use crate::error::{ExtractionError, PdfError, Result};
use crate::model::{DocumentMeta, ExtractOptions, ExtractedDocument, PageOutcome};

pub(crate) fn parse_from_path(path: &Path, options: &ExtractOptions) -> Result<ExtractedDocument> {
    if !path.exists() {
        return Err(PdfError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    let doc = Document::load(path).map_err(|e| PdfError::Parse(e.to_string()))?;
    Ok(parse_document(&doc, path.display().to_string(), options))
}

pub(crate) fn parse_from_bytes(
    bytes: &[u8],
    source_name: &str,
    options: &ExtractOptions,
) -> Result<ExtractedDocument> {
    let doc = Document::load_mem(bytes).map_err(|e| PdfError::Parse(e.to_string()))?;
    Ok(parse_document(&doc, source_name.to_string(), options))
}

fn parse_document(doc: &Document, source: String, options: &ExtractOptions) -> ExtractedDocument {
    let page_map = doc.get_pages();
    let mut page_numbers: Vec<u32> = page_map.keys().copied().collect();
    page_numbers.sort_unstable();

    let selected = select_pages(&page_numbers, options.page_range.clone());
    let pages: Vec<PageOutcome> = selected
        .iter()
        .map(|&number| extract_page(doc, number, options.min_quality))
        .collect();

    for error in pages.iter().filter_map(|page| match page {
        PageOutcome::Failed(error) => Some(error),
        PageOutcome::Extracted { .. } => None,
    }) {
        tracing::warn!(document = %source, page = error.page(), %error, "skipping page");
    }

    ExtractedDocument {
        metadata: extract_metadata(doc),
        page_count: page_numbers.len(),
        source,
        pages,
    }
}

fn extract_page(doc: &Document, number: u32, min_quality: f32) -> PageOutcome {
    let raw = match doc.extract_text(&[number]) {
        Ok(raw) => raw,
        Err(e) => {
            return PageOutcome::Failed(ExtractionError::Text {
                page: number,
                reason: e.to_string(),
            });
        }
    };
    let text = normalize_text(&raw);
    if !text.is_empty() && min_quality > 0.0 {
        let quality = text_quality_score(&text);
        if quality < min_quality {
            return PageOutcome::Failed(ExtractionError::LowQuality {
                page: number,
                quality,
            });
        }
    }
    PageOutcome::Extracted { number, text }
}

fn select_pages(pages: &[u32], range: Option<std::ops::RangeInclusive<usize>>) -> Vec<u32> {
    match range {
        None => pages.to_vec(),
        Some(range) => pages
            .iter()
            .enumerate()
            .filter(|(idx, _)| range.contains(&(idx + 1)))
            .map(|(_, p)| *p)
            .collect(),
    }
}

/// Trims every line and keeps at most one blank line between paragraphs.
pub(crate) fn normalize_text(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut pending_break = false;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            pending_break = !normalized.is_empty();
            continue;
        }
        if !normalized.is_empty() {
            normalized.push_str(if pending_break { "\n\n" } else { "\n" });
        }
        normalized.push_str(line);
        pending_break = false;
    }
    normalized
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn text_quality_score(text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let chars = text.chars().count() as f32;
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .count() as f32;
    let words = text.split_whitespace().count() as f32;
    let printable_ratio = printable / chars;
    let density = (words / (chars / 5.0).max(1.0)).min(1.0);
    0.7f32.mul_add(printable_ratio, 0.3 * density)
}

fn extract_metadata(doc: &Document) -> DocumentMeta {
    let mut meta = DocumentMeta::default();
    if let Ok(info_ref) = doc.trailer.get(b"Info")
        && let Ok(info_ref) = info_ref.as_reference()
        && let Ok(dict) = doc.get_dictionary(info_ref)
    {
        meta.title = dict
            .get(b"Title")
            .ok()
            .and_then(|v| v.as_str().ok())
            .map(to_clean_string)
            .filter(|title| !title.is_empty());
        meta.author = dict
            .get(b"Author")
            .ok()
            .and_then(|v| v.as_str().ok())
            .map(to_clean_string)
            .filter(|author| !author.is_empty());
    }
    meta
}

fn to_clean_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_lines_and_keeps_paragraphs() {
        assert_eq!(
            normalize_text("\n  Section 302 \n\n\n \t\n\t Punishment \nfor murder\n\n"),
            "Section 302\n\nPunishment\nfor murder"
        );
        assert_eq!(normalize_text(" \n\n "), "");
    }

    #[test]
    fn quality_prefers_words_over_noise() {
        let prose = text_quality_score("Whoever commits murder shall be punished with death");
        let noise = text_quality_score("\u{1}\u{2}\u{3}\u{4}\u{5}\u{6}\u{7}\u{8}");
        assert!(prose > 0.8, "prose scored {prose}");
        assert!(noise < 0.2, "noise scored {noise}");
        assert!(text_quality_score("").abs() < f32::EPSILON);
    }

    #[test]
    fn page_range_is_one_based_and_inclusive() {
        assert_eq!(select_pages(&[1, 2, 3, 4], Some(2..=3)), vec![2, 3]);
        assert_eq!(select_pages(&[1, 2], None), vec![1, 2]);
    }
}
