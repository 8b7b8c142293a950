//! Lexical index and BM25 ranking over the chunk set

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::Chunk;

/// BM25 term-saturation parameter
const BM25_K1: f32 = 1.5;
/// BM25 length-normalization parameter
const BM25_B: f32 = 0.75;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]+").unwrap());

/// Lowercase and strip accents: NFKD decomposition, then drop anything
/// outside ASCII so combining marks disappear with the rest.
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_lowercase()
}

/// Alphanumeric runs of the normalized text
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    TOKEN_RE
        .find_iter(&normalized)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Token set of a query, for keyword matching and the recall-boost check
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Per-chunk token statistics plus the corpus-wide counts BM25 needs.
///
/// Always rebuilt together with the chunk set it indexes; a reader holding a
/// snapshot never sees the index and the chunks disagree.
#[derive(Debug, Clone)]
pub struct LexicalIndex {
    /// Token frequency per chunk
    chunk_terms: Vec<HashMap<String, u32>>,
    /// Token count per chunk
    chunk_lengths: Vec<usize>,
    /// Number of chunks containing each token (counted once per chunk)
    document_frequency: HashMap<String, u32>,
    /// Average chunk length in tokens
    average_length: f32,
}

impl LexicalIndex {
    pub fn build(chunks: &[Chunk]) -> Self {
        let mut chunk_terms = Vec::with_capacity(chunks.len());
        let mut chunk_lengths = Vec::with_capacity(chunks.len());
        let mut document_frequency: HashMap<String, u32> = HashMap::new();

        for chunk in chunks {
            let tokens = tokenize(&chunk.text);
            chunk_lengths.push(tokens.len());

            let mut terms: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *terms.entry(token).or_insert(0) += 1;
            }

            for token in terms.keys() {
                *document_frequency.entry(token.clone()).or_insert(0) += 1;
            }

            chunk_terms.push(terms);
        }

        let average_length = if chunk_lengths.is_empty() {
            0.0
        } else {
            chunk_lengths.iter().sum::<usize>() as f32 / chunk_lengths.len() as f32
        };

        Self {
            chunk_terms,
            chunk_lengths,
            document_frequency,
            average_length,
        }
    }

    pub fn len(&self) -> usize {
        self.chunk_terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_terms.is_empty()
    }

    pub fn average_length(&self) -> f32 {
        self.average_length
    }

    /// BM25 score of every chunk against the query tokens, in chunk order.
    ///
    /// Chunks sharing no token with the query score 0; scores are never
    /// negative because the idf formula is floored by the `+ 1` inside the
    /// logarithm.
    pub fn bm25_scores(&self, query_tokens: &[String]) -> Vec<f32> {
        let n = self.chunk_terms.len();
        let mut scores = vec![0.0f32; n];
        if n == 0 || query_tokens.is_empty() {
            return scores;
        }

        let avgdl = if self.average_length > 0.0 {
            self.average_length
        } else {
            1.0
        };

        for (i, terms) in self.chunk_terms.iter().enumerate() {
            if terms.is_empty() {
                continue;
            }
            let dl = self.chunk_lengths[i].max(1) as f32;

            for token in query_tokens {
                let Some(&df) = self.document_frequency.get(token) else {
                    continue;
                };
                let Some(&tf) = terms.get(token) else {
                    continue;
                };

                let tf = tf as f32;
                let idf = ((n as f32 - df as f32 + 0.5) / (df as f32 + 0.5) + 1.0).ln();
                let denom = tf + BM25_K1 * (1.0 - BM25_B + BM25_B * dl / avgdl);
                scores[i] += idf * (tf * (BM25_K1 + 1.0)) / denom;
            }
        }

        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Chunk {
        Chunk::new(text, 0, 0)
    }

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize("Coagulação Férias"), "coagulacao ferias");
        assert_eq!(normalize("pH 7.2"), "ph 7.2");
    }

    #[test]
    fn test_tokenize_keeps_alphanumeric_runs() {
        assert_eq!(
            tokenize("Normal range: 10-20 psi!"),
            vec!["normal", "range", "10", "20", "psi"]
        );
        assert!(tokenize("  \n\t ").is_empty());
    }

    #[test]
    fn test_document_frequency_counted_once_per_chunk() {
        let chunks = vec![chunk("pump pump pump"), chunk("pump valve")];
        let index = LexicalIndex::build(&chunks);

        assert_eq!(index.document_frequency.get("pump"), Some(&2));
        assert_eq!(index.document_frequency.get("valve"), Some(&1));
    }

    #[test]
    fn test_average_length() {
        let chunks = vec![chunk("one two three"), chunk("four")];
        let index = LexicalIndex::build(&chunks);
        assert!((index.average_length() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bm25_ranks_matching_chunk_highest() {
        let chunks = vec![
            chunk("Chlorine dosing for the contact tank"),
            chunk("Pressure Normal range is 10 to 20 psi"),
            chunk("Vacation policy for plant staff"),
        ];
        let index = LexicalIndex::build(&chunks);

        let scores = index.bm25_scores(&tokenize("what is the normal pressure range"));
        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();

        assert_eq!(best, 1);
        assert!(scores.iter().all(|s| *s >= 0.0));
    }

    #[test]
    fn test_bm25_no_overlap_scores_zero() {
        let chunks = vec![chunk("filter backwash schedule")];
        let index = LexicalIndex::build(&chunks);

        let scores = index.bm25_scores(&tokenize("quarterly budget report"));
        assert_eq!(scores, vec![0.0]);
    }

    #[test]
    fn test_bm25_empty_index() {
        let index = LexicalIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.bm25_scores(&tokenize("anything")).is_empty());
    }
}
