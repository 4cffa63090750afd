//! TF-IDF similarity scorer — the deterministic, no-network scoring path.
//!
//! The vectorizer is fit over {JD, resume 1, …, resume N} with English
//! stop-word removal, smoothed IDF, and L2 normalization, so cosine
//! similarity reduces to a dot product. Identical inputs always yield
//! identical scores.

use std::collections::BTreeMap;

/// English stop words removed before vectorization.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "herself", "him", "himself", "his", "how", "if", "in", "into", "is", "it", "its",
    "itself", "me", "more", "most", "my", "myself", "no", "nor", "not", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Lowercased alphanumeric tokens of at least two characters, stop words removed.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2 && !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Scores each resume against the JD as `round(cosine × 100)`.
///
/// Returns one score per resume, in input order. A degenerate vocabulary
/// (every document empty after tokenization) yields an empty vector rather
/// than an error.
pub fn score_against_jd(jd: &str, resumes: &[String]) -> Vec<u8> {
    let mut docs: Vec<Vec<String>> = Vec::with_capacity(resumes.len() + 1);
    docs.push(tokenize(jd));
    docs.extend(resumes.iter().map(|r| tokenize(r)));

    // BTreeMap keeps term indices deterministic across runs.
    let mut vocab: BTreeMap<&str, usize> = BTreeMap::new();
    for doc in &docs {
        for token in doc {
            let next = vocab.len();
            vocab.entry(token.as_str()).or_insert(next);
        }
    }
    if vocab.is_empty() {
        return Vec::new();
    }

    // Document frequency per term.
    let mut df = vec![0u32; vocab.len()];
    for doc in &docs {
        let mut seen = vec![false; vocab.len()];
        for token in doc {
            let idx = vocab[token.as_str()];
            if !seen[idx] {
                seen[idx] = true;
                df[idx] += 1;
            }
        }
    }

    // Smoothed IDF: ln((1 + n) / (1 + df)) + 1.
    let n = docs.len() as f64;
    let idf: Vec<f64> = df
        .iter()
        .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
        .collect();

    let vectors: Vec<Vec<f64>> = docs.iter().map(|doc| vectorize(doc, &vocab, &idf)).collect();

    let jd_vector = &vectors[0];
    vectors[1..]
        .iter()
        .map(|resume_vector| {
            let cosine: f64 = jd_vector
                .iter()
                .zip(resume_vector)
                .map(|(a, b)| a * b)
                .sum();
            (cosine * 100.0).round().clamp(0.0, 100.0) as u8
        })
        .collect()
}

/// L2-normalized tf-idf vector for one tokenized document.
fn vectorize(doc: &[String], vocab: &BTreeMap<&str, usize>, idf: &[f64]) -> Vec<f64> {
    let mut tf = vec![0.0_f64; vocab.len()];
    for token in doc {
        tf[vocab[token.as_str()]] += 1.0;
    }
    for (value, weight) in tf.iter_mut().zip(idf) {
        *value *= weight;
    }
    let norm = tf.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in &mut tf {
            *value /= norm;
        }
    }
    tf
}

#[cfg(test)]
mod tests {
    use super::*;

    const JD: &str = "Looking for Python AWS engineer, 5 years";

    #[test]
    fn test_shared_terms_score_positive() {
        let resumes = vec![
            "5+ years Python, AWS, Docker. john@example.com, +1 415 555 0100".to_string(),
        ];
        let scores = score_against_jd(JD, &resumes);
        assert_eq!(scores.len(), 1);
        assert!(scores[0] > 0, "expected positive score, got {}", scores[0]);
    }

    #[test]
    fn test_scoring_is_deterministic_and_idempotent() {
        let resumes = vec![
            "Python and AWS background, 5 years".to_string(),
            "Embedded C firmware developer".to_string(),
        ];
        let first = score_against_jd(JD, &resumes);
        let second = score_against_jd(JD, &resumes);
        assert_eq!(first, second);
    }

    #[test]
    fn test_closer_resume_scores_higher() {
        let resumes = vec![
            "Python AWS engineer with 5 years experience".to_string(),
            "Pastry chef specialising in sourdough".to_string(),
        ];
        let scores = score_against_jd(JD, &resumes);
        assert!(scores[0] > scores[1], "scores were {scores:?}");
    }

    #[test]
    fn test_degenerate_vocabulary_returns_empty() {
        let resumes = vec!["".to_string(), "  ".to_string()];
        assert!(score_against_jd("", &resumes).is_empty());
    }

    #[test]
    fn test_stop_words_only_is_degenerate() {
        let resumes = vec!["the and of".to_string()];
        assert!(score_against_jd("was were being", &resumes).is_empty());
    }

    #[test]
    fn test_empty_jd_scores_zero() {
        let resumes = vec!["Python developer".to_string()];
        let scores = score_against_jd("", &resumes);
        assert_eq!(scores, vec![0]);
    }

    #[test]
    fn test_identical_text_scores_full_match() {
        let resumes = vec![JD.to_string()];
        let scores = score_against_jd(JD, &resumes);
        assert_eq!(scores, vec![100]);
    }

    #[test]
    fn test_stop_word_table_is_sorted_for_binary_search() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }
}
