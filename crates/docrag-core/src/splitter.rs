use crate::document::{Chunk, ChunkMetadata, Document};
use crate::error::{RagError, Result};

/// Paragraph, line, sentence, word, character.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "? ", "! ", " ", ""];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitterConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters of trailing context repeated at the start of the next chunk.
    pub chunk_overlap: usize,
    /// Tried in order; `""` splits between characters.
    pub separators: Vec<String>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self::new(1000, 100)
    }
}

impl SplitterConfig {
    #[must_use]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if `chunk_size` is zero or
    /// `chunk_overlap` is not strictly smaller than it.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Configuration(
                "chunk_size must be greater than 0".into(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Configuration(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if `config` fails validation.
    pub fn new(config: SplitterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split one document. Chunk ids start at 0.
    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let text = &document.text;
        if text.trim().is_empty() {
            return Vec::new();
        }

        let stride = self.config.chunk_size - self.config.chunk_overlap;
        let mut pieces = Vec::new();
        split_pieces(text, &self.config.separators, stride, &mut pieces);

        merge_pieces(&pieces, self.config.chunk_size, self.config.chunk_overlap)
            .into_iter()
            .filter(|(_, content)| !content.trim().is_empty())
            .enumerate()
            .map(|(chunk_id, (start_index, content))| Chunk {
                text: content,
                metadata: ChunkMetadata {
                    source: document.metadata.source.clone(),
                    chunk_id,
                    start_index,
                },
            })
            .collect()
    }
}

/// Split every document and concatenate the results in input order.
///
/// # Errors
///
/// Returns [`RagError::Configuration`] if `config` fails validation.
pub fn chunk_documents(documents: &[Document], config: &SplitterConfig) -> Result<Vec<Chunk>> {
    let splitter = TextSplitter::new(config.clone())?;
    let chunks: Vec<Chunk> = documents.iter().flat_map(|d| splitter.split(d)).collect();
    tracing::debug!(
        documents = documents.len(),
        chunks = chunks.len(),
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        "documents chunked"
    );
    Ok(chunks)
}

/// Break `text` into pieces of at most `stride` chars using the first separator
/// present, recursing with finer separators. Separators stay attached to the end
/// of the preceding piece, so the pieces concatenate back to `text`.
fn split_pieces<'a>(text: &'a str, separators: &[String], stride: usize, out: &mut Vec<&'a str>) {
    if text.chars().count() <= stride {
        out.push(text);
        return;
    }

    let Some(idx) = separators
        .iter()
        .position(|s| s.is_empty() || text.contains(s.as_str()))
    else {
        // Atomic unit larger than the stride.
        out.push(text);
        return;
    };

    let separator = separators[idx].as_str();
    if separator.is_empty() {
        out.extend(
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()]),
        );
        return;
    }

    let finer = &separators[idx + 1..];
    for piece in text.split_inclusive(separator) {
        split_pieces(piece, finer, stride, out);
    }
}

/// Greedily pack pieces into windows of at most `chunk_size` chars, returning
/// `(start_char_offset, text)` per window.
fn merge_pieces(pieces: &[&str], chunk_size: usize, overlap: usize) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut lens: Vec<usize> = Vec::new();
    let mut len = 0;
    let mut start = 0;
    // Window holds at least one piece not carried over from the previous chunk.
    let mut fresh = false;
    let mut pos = 0;

    for piece in pieces {
        let piece_len = piece.chars().count();

        if fresh && len + piece_len > chunk_size {
            let end = start + len;
            let (prefix, prefix_lens) =
                overlap_prefix(&text, &lens, len, piece_len, chunk_size, overlap);
            out.push((start, std::mem::replace(&mut text, prefix)));
            lens = prefix_lens;
            len = lens.iter().sum();
            start = end - len;
        }

        if len == 0 {
            start = pos;
        }
        text.push_str(piece);
        lens.push(piece_len);
        len += piece_len;
        pos += piece_len;
        fresh = true;
    }

    if fresh {
        out.push((start, text));
    }
    out
}

/// Trailing context carried into the next window: the shortest suffix made of
/// whole pieces that reaches `overlap` chars when it fits beside the next piece,
/// otherwise exactly the last `overlap` chars.
fn overlap_prefix(
    text: &str,
    lens: &[usize],
    len: usize,
    next_len: usize,
    chunk_size: usize,
    overlap: usize,
) -> (String, Vec<usize>) {
    if overlap == 0 {
        return (String::new(), Vec::new());
    }

    let mut acc = 0;
    let mut count = 0;
    for piece_len in lens.iter().rev() {
        acc += piece_len;
        count += 1;
        if acc >= overlap {
            break;
        }
    }
    if acc >= overlap && acc < len && acc + next_len <= chunk_size {
        return (
            char_suffix(text, len, acc).to_owned(),
            lens[lens.len() - count..].to_vec(),
        );
    }

    let n = overlap.min(len);
    (char_suffix(text, len, n).to_owned(), vec![n])
}

fn char_suffix(text: &str, total_chars: usize, n: usize) -> &str {
    match text.char_indices().nth(total_chars - n) {
        Some((i, _)) => &text[i..],
        None => "",
    }
}
