use crate::error::IngestError;
use crate::models::{Chunk, IngestionOptions};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub window_words: usize,
    pub overlap_words: usize,
}

impl From<IngestionOptions> for ChunkingConfig {
    fn from(value: IngestionOptions) -> Self {
        Self {
            window_words: value.chunk_words,
            overlap_words: value.overlap_words,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.window_words == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "window must hold at least one word".to_string(),
            ));
        }
        if self.overlap_words >= self.window_words {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than window {}",
                self.overlap_words, self.window_words
            )));
        }
        Ok(())
    }

    pub fn stride(&self) -> usize {
        self.window_words - self.overlap_words
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Slides a fixed word window over `text`, one window per stride.
///
/// Every start position `0, stride, 2*stride, ...` below the word count yields a
/// window, so the tail of the page is always covered even when the last window
/// is shorter than the configured size.
pub fn word_windows(text: &str, config: ChunkingConfig) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();

    (0..words.len())
        .step_by(config.stride())
        .map(|start| {
            let end = (start + config.window_words).min(words.len());
            words[start..end].join(" ")
        })
        .collect()
}

pub fn build_chunks(
    doc_name: &str,
    page: u32,
    page_text: &str,
    options: &IngestionOptions,
) -> Result<Vec<Chunk>, IngestError> {
    let config = ChunkingConfig::from(options.clone());
    config.validate()?;

    let chunks = word_windows(page_text, config)
        .into_iter()
        .map(|window| normalize_whitespace(&window))
        .filter(|text| !text.is_empty())
        .map(|text| Chunk {
            id: make_chunk_id(),
            doc_name: doc_name.to_string(),
            page_num: page,
            text,
            section_path: format!("{doc_name} - Page {page}"),
        })
        .collect();

    Ok(chunks)
}

fn make_chunk_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|index| format!("w{index}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn whitespace_is_normalized() {
        let input = "  A  \t  lot\nof \u{a0}  spacing \r\n";
        let normalized = normalize_whitespace(input);
        assert_eq!(normalized, "A lot of spacing");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_whitespace(" Clause\t4.1 \n\n applies   here ");
        assert_eq!(normalize_whitespace(&once), once);
    }

    #[test]
    fn windows_cover_every_word_with_fixed_overlap() {
        let options = IngestionOptions::default();
        let text = numbered_words(2_000);
        let chunks = build_chunks("NDA", 3, &text, &options).unwrap();

        assert_eq!(chunks.len(), 4);

        let covered: HashSet<&str> = chunks
            .iter()
            .flat_map(|chunk| chunk.text.split(' '))
            .collect();
        for index in 0..2_000 {
            assert!(covered.contains(format!("w{index}").as_str()));
        }

        for pair in chunks.windows(2) {
            let previous: Vec<&str> = pair[0].text.split(' ').collect();
            let next: Vec<&str> = pair[1].text.split(' ').collect();
            if next.len() < options.overlap_words {
                continue;
            }
            assert_eq!(previous.len(), options.chunk_words);
            assert_eq!(
                &previous[previous.len() - options.overlap_words..],
                &next[..options.overlap_words]
            );
        }
    }

    #[test]
    fn short_page_yields_single_chunk_with_metadata() {
        let chunks = build_chunks("NDA", 2, "Confidentiality   clause\napplies.", &IngestionOptions::default())
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Confidentiality clause applies.");
        assert_eq!(chunks[0].doc_name, "NDA");
        assert_eq!(chunks[0].page_num, 2);
        assert_eq!(chunks[0].section_path, "NDA - Page 2");
    }

    #[test]
    fn blank_page_yields_no_chunks() {
        let chunks = build_chunks("NDA", 1, " \n\t ", &IngestionOptions::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn chunk_ids_are_short_hex_and_fresh() {
        let text = numbered_words(1_500);
        let first = build_chunks("NDA", 1, &text, &IngestionOptions::default()).unwrap();
        let second = build_chunks("NDA", 1, &text, &IngestionOptions::default()).unwrap();

        for chunk in first.iter().chain(second.iter()) {
            assert_eq!(chunk.id.len(), 8);
            assert!(chunk.id.chars().all(|c| c.is_ascii_hexdigit()));
        }
        assert_ne!(first[0].id, second[0].id);
    }

    #[test]
    fn overlap_not_smaller_than_window_is_rejected() {
        let options = IngestionOptions {
            chunk_words: 10,
            overlap_words: 10,
        };
        let result = build_chunks("NDA", 1, "some words", &options);
        assert!(matches!(result, Err(IngestError::InvalidChunkConfig(_))));
    }
}
