//! Paragraph-boundary text chunker.
//!
//! Short documents become a single chunk. Documents above the
//! configured size are split on paragraph boundaries (`\n\n`) to
//! preserve semantic coherence, with a hard split for single oversized
//! paragraphs. Every chunk inherits its document's category and gets a
//! stable identifier (`<relative path>#<index>`) so an unchanged file
//! re-chunks to identical entries on every rebuild.

use sha2::{Digest, Sha256};

use crate::categorize::Category;
use crate::models::{Chunk, SourceDocument};

/// Split a document into chunks, each at most `max_chars` long.
/// Returns chunks with contiguous indices starting at 0.
pub fn chunk_document(doc: &SourceDocument, category: Category, max_chars: usize) -> Vec<Chunk> {
    let text = doc.body.trim();

    if text.len() <= max_chars {
        return vec![make_chunk(&doc.relative_path, category, 0, text)];
    }

    let paragraphs: Vec<&str> = text.split("\n\n").collect();
    let mut chunks = Vec::new();
    let mut current_buf = String::new();
    let mut chunk_index: i64 = 0;

    for para in paragraphs {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        // If adding this paragraph would exceed max, flush current buffer
        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + 2 + trimmed.len() // +2 for \n\n separator
        };

        if would_be > max_chars && !current_buf.is_empty() {
            chunks.push(make_chunk(
                &doc.relative_path,
                category,
                chunk_index,
                &current_buf,
            ));
            chunk_index += 1;
            current_buf.clear();
        }

        // A single paragraph larger than max gets hard-split at
        // whitespace boundaries.
        if trimmed.len() > max_chars {
            if !current_buf.is_empty() {
                chunks.push(make_chunk(
                    &doc.relative_path,
                    category,
                    chunk_index,
                    &current_buf,
                ));
                chunk_index += 1;
                current_buf.clear();
            }
            let mut remaining = trimmed;
            while !remaining.is_empty() {
                let mut split_at = remaining.len().min(max_chars);
                while !remaining.is_char_boundary(split_at) {
                    split_at -= 1;
                }
                // Always advance by at least one char, even when
                // max_chars is smaller than the char itself.
                if split_at == 0 {
                    split_at = remaining
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or(remaining.len());
                }
                let actual_split = if split_at < remaining.len() {
                    remaining[..split_at]
                        .rfind('\n')
                        .or_else(|| remaining[..split_at].rfind(' '))
                        .map(|pos| pos + 1)
                        .unwrap_or(split_at)
                } else {
                    split_at
                };
                let piece = &remaining[..actual_split];
                chunks.push(make_chunk(
                    &doc.relative_path,
                    category,
                    chunk_index,
                    piece.trim(),
                ));
                chunk_index += 1;
                remaining = &remaining[actual_split..];
            }
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    if !current_buf.is_empty() {
        chunks.push(make_chunk(
            &doc.relative_path,
            category,
            chunk_index,
            &current_buf,
        ));
    }

    // Guarantee at least one chunk
    if chunks.is_empty() {
        chunks.push(make_chunk(&doc.relative_path, category, 0, text));
    }

    chunks
}

fn make_chunk(source: &str, category: Category, index: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: format!("{}#{}", source, index),
        source: source.to_string(),
        category,
        chunk_index: index,
        text: text.to_string(),
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn doc(name: &str, body: &str) -> SourceDocument {
        SourceDocument {
            path: PathBuf::from(format!("/data/{name}")),
            relative_path: name.to_string(),
            extension: ".txt".to_string(),
            body: body.to_string(),
            modified_at: Utc::now(),
        }
    }

    #[test]
    fn test_short_document_single_chunk() {
        let d = doc("menu_today.txt", "Today's special: Margherita pizza, €8");
        let chunks = chunk_document(&d, Category::Menu, 1200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "menu_today.txt#0");
        assert_eq!(chunks[0].category, Category::Menu);
        assert_eq!(chunks[0].text, "Today's special: Margherita pizza, €8");
    }

    #[test]
    fn test_empty_document() {
        let d = doc("blank.txt", "");
        let chunks = chunk_document(&d, Category::Generic, 1200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn test_long_document_splits_on_paragraphs() {
        let body = (0..40)
            .map(|i| format!("Paragraph number {i} with some filler text."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let d = doc("policy.txt", &body);
        let chunks = chunk_document(&d, Category::Policy, 120);
        assert!(chunks.len() > 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64);
            assert_eq!(c.id, format!("policy.txt#{i}"));
            assert_eq!(c.category, Category::Policy);
            assert!(c.text.len() <= 120);
        }
    }

    #[test]
    fn test_oversized_paragraph_hard_split() {
        let body = format!("{}\n\n{}", "word ".repeat(100).trim(), "short tail");
        let d = doc("info.txt", &body);
        let chunks = chunk_document(&d, Category::Info, 80);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.len() <= 80, "chunk too long: {}", c.text.len());
        }
    }

    #[test]
    fn test_max_chars_below_char_width_terminates() {
        // Every char here is 3 bytes, wider than the 1-byte budget.
        let d = doc("menu.txt", "€€€€");
        let chunks = chunk_document(&d, Category::Menu, 1);
        assert_eq!(chunks.len(), 4);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64);
            assert_eq!(c.text, "€");
        }
    }

    #[test]
    fn test_deterministic_ids_and_hashes() {
        let body = "Alpha\n\nBeta\n\nGamma\n\nDelta".repeat(20);
        let d = doc("hours.txt", &body);
        let a = chunk_document(&d, Category::Hours, 100);
        let b = chunk_document(&d, Category::Hours, 100);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.hash, y.hash);
            assert_eq!(x.text, y.text);
        }
    }
}
