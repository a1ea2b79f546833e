//! Page-aware text chunking with configurable size and overlap.

use crate::types::{Chunk, Document};
use ragdoc_core::config::IndexSettings;
use ragdoc_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Splits document pages into overlapping windows on semantic boundaries.
///
/// Sizes are in characters. Output is deterministic for a given
/// configuration and input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker. `overlap` must be smaller than `size`.
    pub fn new(size: usize, overlap: usize) -> AppResult<Self> {
        let chunker = Self { size, overlap };
        chunker.splitter_config()?;
        Ok(chunker)
    }

    /// Create a chunker from the `index` config section.
    pub fn from_settings(settings: &IndexSettings) -> AppResult<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn splitter_config(&self) -> AppResult<ChunkConfig<text_splitter::Characters>> {
        if self.size == 0 {
            return Err(AppError::Config("Chunk size must be positive".to_string()));
        }
        if self.overlap >= self.size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.size
            )));
        }

        ChunkConfig::new(self.size)
            .with_overlap(self.overlap)
            .map_err(|e| AppError::Config(format!("Invalid chunk configuration: {}", e)))
    }

    /// Split every page of `document` into chunks. Vectors are left unset.
    pub fn chunk(&self, document: &Document) -> AppResult<Vec<Chunk>> {
        let splitter = TextSplitter::new(self.splitter_config()?);
        let mut chunks = Vec::new();

        for (page, text) in document.pages.iter().enumerate() {
            if text.trim().is_empty() {
                continue;
            }

            let page = page as u32;
            let mut chunk_index = 0u32;
            for piece in splitter.chunks(text) {
                if piece.trim().is_empty() {
                    continue;
                }
                chunks.push(Chunk::new(&document.source_id, page, chunk_index, piece));
                chunk_index += 1;
            }
        }

        tracing::debug!(
            "Chunked {} ({} pages) into {} chunks (size: {}, overlap: {})",
            document.source_id,
            document.pages.len(),
            chunks.len(),
            self.size,
            self.overlap
        );

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_page_yields_one_chunk() {
        let chunker = Chunker::new(800, 80).unwrap();
        let doc = Document::single("data/a.txt", "Hukum pidana adalah kumpulan aturan.");

        let chunks = chunker.chunk(&doc).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "data/a.txt:0:0");
        assert_eq!(chunks[0].text, "Hukum pidana adalah kumpulan aturan.");
        assert!(chunks[0].vector.is_none());
    }

    #[test]
    fn test_whitespace_page_yields_nothing() {
        let chunker = Chunker::new(800, 80).unwrap();
        let doc = Document::new("a.pdf", vec!["   \n\t".to_string(), String::new()]);

        assert!(chunker.chunk(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_index_restarts_per_page() {
        let chunker = Chunker::new(100, 20).unwrap();
        let long = "Pasal ini mengatur tentang pidana. ".repeat(20);
        let doc = Document::new("kuhp.pdf", vec![long.clone(), "   ".to_string(), long]);

        let chunks = chunker.chunk(&doc).unwrap();
        let first_page: Vec<_> = chunks.iter().filter(|c| c.page == 0).collect();
        let third_page: Vec<_> = chunks.iter().filter(|c| c.page == 2).collect();

        assert!(first_page.len() > 1);
        assert_eq!(first_page.len(), third_page.len());
        assert_eq!(third_page[0].id, "kuhp.pdf:2:0");
        assert!(chunks.iter().all(|c| c.page != 1));
        for (i, chunk) in first_page.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as u32);
            assert!(chunk.text.chars().count() <= 100);
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = Chunker::new(120, 30).unwrap();
        let doc = Document::single("a.md", "Kalimat pertama. Kalimat kedua. ".repeat(30));

        assert_eq!(chunker.chunk(&doc).unwrap(), chunker.chunk(&doc).unwrap());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        assert!(matches!(Chunker::new(100, 100), Err(AppError::Config(_))));
        assert!(matches!(Chunker::new(0, 0), Err(AppError::Config(_))));
        assert!(Chunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_utf8_text() {
        let chunker = Chunker::new(50, 10).unwrap();
        let doc = Document::single("x.txt", "Gamedex é um aplicativo 🎮 com acentuação: ã, õ, ç. ".repeat(10));

        let chunks = chunker.chunk(&doc).unwrap();
        assert!(!chunks.is_empty());
    }
}
