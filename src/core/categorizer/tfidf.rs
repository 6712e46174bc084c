use std::collections::{HashMap, HashSet};

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "been",
    "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "done", "down",
    "due", "during", "each", "eg", "either", "else", "elsewhere", "enough", "etc", "even",
    "ever", "every", "everyone", "everything", "everywhere", "except", "few", "for", "former",
    "formerly", "from", "further", "get", "give", "go", "had", "has", "have", "he", "hence",
    "her", "here", "hereafter", "hereby", "herein", "hers", "herself", "him", "himself", "his",
    "how", "however", "ie", "if", "in", "inc", "indeed", "into", "is", "it", "its", "itself",
    "just", "keep", "last", "latter", "least", "less", "ltd", "made", "many", "may", "me",
    "meanwhile", "might", "more", "moreover", "most", "mostly", "much", "must", "my", "myself",
    "namely", "neither", "never", "nevertheless", "next", "no", "nobody", "none", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or",
    "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part",
    "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "several", "she", "should", "since", "so", "some", "somehow", "someone",
    "something", "sometime", "sometimes", "somewhere", "still", "such", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "this", "those", "though", "through",
    "throughout", "thru", "thus", "to", "together", "too", "toward", "towards", "under",
    "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever",
    "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein",
    "whereupon", "wherever", "whether", "which", "while", "who", "whoever", "whole", "whom",
    "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Dense TF-IDF matrix; rows are L2-normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfMatrix {
    pub vocabulary: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

pub struct TfidfVectorizer {
    max_features: usize,
    stop_words: HashSet<String>,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize, extra_stop_words: &[String]) -> Self {
        let mut stop_words: HashSet<String> =
            ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect();
        stop_words.extend(extra_stop_words.iter().map(|w| w.trim().to_lowercase()));

        Self {
            max_features: max_features.max(1),
            stop_words,
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .filter(|token| token.chars().count() >= 2)
            .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
            .filter(|token| !self.stop_words.contains(token))
            .collect()
    }

    pub fn fit_transform(&self, texts: &[String]) -> TfidfMatrix {
        let documents: Vec<Vec<String>> = texts.iter().map(|t| self.tokenize(t)).collect();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for tokens in &documents {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        // Most common terms survive the cap; ties resolved alphabetically.
        let mut ranked: Vec<(&str, usize)> = document_frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);
        ranked.sort_by(|a, b| a.0.cmp(b.0));

        let n = documents.len() as f64;
        let vocabulary: Vec<String> = ranked.iter().map(|(term, _)| term.to_string()).collect();
        let idf: Vec<f64> = ranked
            .iter()
            .map(|(_, df)| ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();
        let positions: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        let rows = documents
            .iter()
            .map(|tokens| {
                let mut row = vec![0.0; vocabulary.len()];
                for token in tokens {
                    if let Some(&j) = positions.get(token.as_str()) {
                        row[j] += 1.0;
                    }
                }
                for (value, weight) in row.iter_mut().zip(&idf) {
                    *value *= weight;
                }
                let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    row.iter_mut().for_each(|v| *v /= norm);
                }
                row
            })
            .collect();

        TfidfMatrix { vocabulary, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words_numbers_and_extras() {
        let vectorizer = TfidfVectorizer::new(100, &["acme".to_string()]);
        let tokens = vectorizer.tokenize("The ACME Q3 2024 Town-Hall: a review of markets");
        assert_eq!(tokens, vec!["q3", "town", "hall", "review", "markets"]);
    }

    #[test]
    fn test_rows_are_normalized_and_rare_terms_weigh_more() {
        let vectorizer = TfidfVectorizer::new(100, &[]);
        let texts = vec![
            "markets update".to_string(),
            "markets outlook".to_string(),
            "markets update".to_string(),
        ];
        let matrix = vectorizer.fit_transform(&texts);

        assert_eq!(matrix.vocabulary, vec!["markets", "outlook", "update"]);
        for row in &matrix.rows {
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
        // "outlook" appears once, "markets" everywhere.
        assert!(matrix.rows[1][1] > matrix.rows[1][0]);
    }

    #[test]
    fn test_vocabulary_cap_keeps_most_frequent_terms() {
        let vectorizer = TfidfVectorizer::new(1, &[]);
        let texts = vec!["alpha beta".to_string(), "beta gamma".to_string()];
        let matrix = vectorizer.fit_transform(&texts);
        assert_eq!(matrix.vocabulary, vec!["beta"]);
    }

    #[test]
    fn test_empty_text_yields_zero_row() {
        let vectorizer = TfidfVectorizer::new(10, &[]);
        let matrix = vectorizer.fit_transform(&["the and of".to_string(), "budget".to_string()]);
        assert!(matrix.rows[0].iter().all(|v| *v == 0.0));
    }
}
