//! Word-bounded text chunking for model consumption.
//!
//! A [`Chunker`] splits article text into segments of at most `max_words`
//! words. Joining the segments back with single spaces reconstructs the
//! whitespace-normalized input, so no text is lost or invented at chunk
//! boundaries. When a sentence ends in the second half of a window, the chunk
//! breaks there instead of mid-sentence.

use crate::error::{PipelineError, Result};
use crate::models::{Article, Chunk};

pub struct Chunker {
    words: Vec<String>,
    max_words: usize,
}

impl Chunker {
    /// Build a chunker over `text`.
    ///
    /// Fails with [`PipelineError::InvalidInput`] when the text contains no
    /// words or `max_words` is zero.
    pub fn new(text: &str, max_words: usize) -> Result<Self> {
        if max_words == 0 {
            return Err(PipelineError::InvalidInput(
                "max_words must be at least 1".to_string(),
            ));
        }
        let words: Vec<String> = text.split_whitespace().map(str::to_owned).collect();
        if words.is_empty() {
            return Err(PipelineError::InvalidInput(
                "cannot chunk empty text".to_string(),
            ));
        }
        Ok(Self { words, max_words })
    }

    /// Start a fresh, lazy pass over the text. Calling again restarts from the
    /// beginning.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            words: &self.words,
            max_words: self.max_words,
            pos: 0,
        }
    }
}

/// Lazy iterator over chunk texts.
pub struct Chunks<'a> {
    words: &'a [String],
    max_words: usize,
    pos: usize,
}

impl Iterator for Chunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.pos >= self.words.len() {
            return None;
        }
        let remaining = &self.words[self.pos..];
        let take = if remaining.len() <= self.max_words {
            remaining.len()
        } else {
            split_point(remaining, self.max_words)
        };
        let chunk = remaining[..take].join(" ");
        self.pos += take;
        Some(chunk)
    }
}

/// Cut after the latest sentence end in the second half of the window, or at
/// the full window when no sentence ends there.
fn split_point(words: &[String], max_words: usize) -> usize {
    let floor = max_words / 2;
    (floor..max_words)
        .rev()
        .find(|&i| ends_sentence(&words[i]))
        .map(|i| i + 1)
        .unwrap_or(max_words)
}

fn ends_sentence(word: &str) -> bool {
    word.trim_end_matches(['"', '\'', ')', ']', '\u{201d}', '\u{2019}'])
        .ends_with(['.', '!', '?'])
}

/// Chunk an article's text, tagging each chunk with its parent and position.
pub fn chunk_article(article: &Article, max_words: usize) -> Result<Vec<Chunk>> {
    let chunker = Chunker::new(&article.text, max_words)?;
    Ok(chunker
        .chunks()
        .enumerate()
        .map(|(ordinal, text)| Chunk {
            source: article.resolved_url.clone(),
            ordinal,
            text,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::normalize_whitespace;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn rejects_empty_text() {
        assert!(Chunker::new("", 300).is_err());
        assert!(Chunker::new("   \n\t ", 300).is_err());
    }

    #[test]
    fn rejects_zero_width() {
        assert!(Chunker::new("some text", 0).is_err());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunker = Chunker::new("only a few words here", 300).unwrap();
        let chunks: Vec<String> = chunker.chunks().collect();
        assert_eq!(chunks, vec!["only a few words here".to_string()]);
    }

    #[test]
    fn nine_hundred_words_at_three_hundred_is_three_chunks() {
        let text = words(900);
        let chunker = Chunker::new(&text, 300).unwrap();
        let chunks: Vec<String> = chunker.chunks().collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn concatenation_reconstructs_normalized_input() {
        let text = "First sentence here. Second one follows!  Third,\n with a break?\tAnd a trailing clause";
        let chunker = Chunker::new(text, 4).unwrap();
        let chunks: Vec<String> = chunker.chunks().collect();
        assert_eq!(chunks.join(" "), normalize_whitespace(text));
    }

    #[test]
    fn chunks_never_exceed_max_words() {
        let text = words(1000);
        let chunker = Chunker::new(&text, 7).unwrap();
        for chunk in chunker.chunks() {
            assert!(chunk.split_whitespace().count() <= 7);
        }
    }

    #[test]
    fn breaks_at_sentence_end_when_available() {
        // Sentence ends at word 4 of a 6-word window; the break lands there.
        let text = "one two three four five. six seven eight nine ten eleven twelve.";
        let chunker = Chunker::new(text, 6).unwrap();
        let chunks: Vec<String> = chunker.chunks().collect();
        assert_eq!(chunks[0], "one two three four five.");
        assert!(chunks[1].starts_with("six"));
    }

    #[test]
    fn sentence_end_before_half_window_is_ignored() {
        let text = "short. aa bb cc dd ee ff gg hh ii jj kk";
        let chunker = Chunker::new(text, 8).unwrap();
        let chunks: Vec<String> = chunker.chunks().collect();
        // The only sentence end sits in the first half, so the cut is at max.
        assert_eq!(chunks[0].split_whitespace().count(), 8);
    }

    #[test]
    fn iterator_is_restartable() {
        let text = words(50);
        let chunker = Chunker::new(&text, 10).unwrap();
        let first: Vec<String> = chunker.chunks().collect();
        let second: Vec<String> = chunker.chunks().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn chunk_article_tags_source_and_ordinal() {
        let article = Article {
            title: "t".to_string(),
            publisher: "p".to_string(),
            published: "today".to_string(),
            url: "https://agg.example/x".to_string(),
            resolved_url: "https://example.com/story".to_string(),
            text: words(25),
            credibility: None,
        };
        let chunks = chunk_article(&article, 10).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].ordinal, 0);
        assert_eq!(chunks[2].ordinal, 2);
        assert!(chunks.iter().all(|c| c.source == "https://example.com/story"));
    }
}
