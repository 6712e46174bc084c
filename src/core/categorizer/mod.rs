//! Unsupervised labelling of webcast events: TF-IDF vectors, K-means clusters, and a
//! label built from each cluster's strongest terms.

pub mod kmeans;
pub mod tfidf;

use crate::domain::model::UNCATEGORIZED;
use kmeans::{silhouette_score, KMeans};
use serde::{Deserialize, Serialize};
use tfidf::{TfidfMatrix, TfidfVectorizer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizerConfig {
    pub max_features: usize,
    /// Fixed number of clusters. When unset, K is picked by silhouette score.
    pub clusters: Option<usize>,
    pub max_clusters: usize,
    pub seed: u64,
    pub max_iterations: usize,
    pub restarts: usize,
    pub min_cluster_size: usize,
    pub top_terms: usize,
    pub extra_stop_words: Vec<String>,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            clusters: None,
            max_clusters: 10,
            seed: 42,
            max_iterations: 300,
            restarts: 10,
            min_cluster_size: 1,
            top_terms: 3,
            extra_stop_words: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLabel {
    pub category: String,
    pub subcategory: String,
    pub terms: Vec<String>,
    pub size: usize,
}

impl ClusterLabel {
    fn uncategorized(size: usize) -> Self {
        Self {
            category: UNCATEGORIZED.to_string(),
            subcategory: UNCATEGORIZED.to_string(),
            terms: Vec::new(),
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Categorization {
    pub assignments: Vec<usize>,
    pub labels: Vec<ClusterLabel>,
    pub centroids: Vec<Vec<f64>>,
    pub vocabulary: Vec<String>,
    pub silhouette: Option<f64>,
}

impl Categorization {
    fn empty() -> Self {
        Self {
            assignments: Vec::new(),
            labels: Vec::new(),
            centroids: Vec::new(),
            vocabulary: Vec::new(),
            silhouette: None,
        }
    }

    pub fn cluster_count(&self) -> usize {
        self.labels.len()
    }

    /// Label of the `index`-th input text.
    pub fn label_for(&self, index: usize) -> Option<&ClusterLabel> {
        self.assignments
            .get(index)
            .and_then(|&cluster| self.labels.get(cluster))
    }
}

pub struct Categorizer {
    config: CategorizerConfig,
    vectorizer: TfidfVectorizer,
}

impl Categorizer {
    pub fn new(config: CategorizerConfig) -> Self {
        let vectorizer = TfidfVectorizer::new(config.max_features, &config.extra_stop_words);
        Self { config, vectorizer }
    }

    pub fn categorize(&self, texts: &[String]) -> Categorization {
        if texts.is_empty() {
            return Categorization::empty();
        }

        let matrix = self.vectorizer.fit_transform(texts);
        tracing::debug!(
            documents = texts.len(),
            terms = matrix.vocabulary.len(),
            "TF-IDF vectorization complete"
        );

        let (k, silhouette) = self.choose_cluster_count(&matrix);
        let result = self.kmeans(k).fit(&matrix.rows);
        tracing::info!(
            k,
            silhouette = silhouette.map(|s| format!("{s:.4}")).unwrap_or_default(),
            iterations = result.iterations,
            "K-means clustering complete"
        );

        let labels = (0..result.centroids.len())
            .map(|cluster| self.label_cluster(&matrix, &result.assignments, cluster))
            .collect();

        Categorization {
            assignments: result.assignments,
            labels,
            centroids: result.centroids,
            vocabulary: matrix.vocabulary,
            silhouette,
        }
    }

    fn kmeans(&self, k: usize) -> KMeans {
        KMeans::new(k, self.config.max_iterations, self.config.seed).with_restarts(self.config.restarts)
    }

    fn choose_cluster_count(&self, matrix: &TfidfMatrix) -> (usize, Option<f64>) {
        let n = matrix.rows.len();
        if n <= 1 {
            return (n.max(1), None);
        }
        if let Some(k) = self.config.clusters {
            return (k.clamp(1, n), None);
        }

        let upper = self.config.max_clusters.min(n - 1);
        if upper < 2 {
            return (n.min(2), None);
        }

        let mut best: Option<(usize, f64)> = None;
        for k in 2..=upper {
            let result = self.kmeans(k).fit(&matrix.rows);
            let Some(score) = silhouette_score(&matrix.rows, &result.assignments, k) else {
                continue;
            };
            tracing::debug!(k, score = format!("{score:.4}"), "silhouette score");
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((k, score));
            }
        }

        match best {
            Some((k, score)) => (k, Some(score)),
            None => (2, None),
        }
    }

    fn label_cluster(&self, matrix: &TfidfMatrix, assignments: &[usize], cluster: usize) -> ClusterLabel {
        let members: Vec<&Vec<f64>> = matrix
            .rows
            .iter()
            .zip(assignments)
            .filter(|(_, &c)| c == cluster)
            .map(|(row, _)| row)
            .collect();
        let size = members.len();
        if size == 0 || size < self.config.min_cluster_size {
            return ClusterLabel::uncategorized(size);
        }

        let mut weights = vec![0.0; matrix.vocabulary.len()];
        for row in &members {
            for (weight, value) in weights.iter_mut().zip(row.iter()) {
                *weight += value / size as f64;
            }
        }

        let mut ranked: Vec<(usize, f64)> = weights
            .into_iter()
            .enumerate()
            .filter(|(_, w)| *w > 0.0)
            .collect();
        ranked.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| matrix.vocabulary[a.0].cmp(&matrix.vocabulary[b.0]))
        });
        let terms: Vec<String> = ranked
            .into_iter()
            .take(self.config.top_terms.max(1))
            .map(|(j, _)| matrix.vocabulary[j].clone())
            .collect();

        let Some(first) = terms.first() else {
            return ClusterLabel::uncategorized(size);
        };
        let category = title_case(first);
        let subcategory = if terms.len() > 1 {
            terms[1..]
                .iter()
                .map(|t| title_case(t))
                .collect::<Vec<_>>()
                .join(" / ")
        } else {
            category.clone()
        };

        ClusterLabel {
            category,
            subcategory,
            terms,
            size,
        }
    }
}

fn title_case(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample_titles() -> Vec<String> {
        texts(&[
            "Markets outlook weekly briefing",
            "Markets outlook quarterly briefing",
            "Markets outlook midyear briefing",
            "Cyber security awareness training",
            "Cyber security phishing training",
            "Cyber security incident training",
        ])
    }

    #[test]
    fn test_empty_input_returns_no_labels() {
        let result = Categorizer::new(CategorizerConfig::default()).categorize(&[]);
        assert!(result.assignments.is_empty());
        assert!(result.labels.is_empty());
    }

    #[test]
    fn test_single_text_collapses_to_one_cluster() {
        let result =
            Categorizer::new(CategorizerConfig::default()).categorize(&texts(&["Global Investor Town Hall"]));
        assert_eq!(result.cluster_count(), 1);
        assert_eq!(result.assignments, vec![0]);
        let label = result.label_for(0).unwrap();
        assert_eq!(label.category, "Global");
        assert_eq!(label.terms, vec!["global", "hall", "investor"]);
        assert_eq!(label.subcategory, "Hall / Investor");
    }

    #[test]
    fn test_clusters_related_titles_together() {
        let result = Categorizer::new(CategorizerConfig::default()).categorize(&sample_titles());

        assert_eq!(result.cluster_count(), 2);
        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_eq!(result.assignments[1], result.assignments[2]);
        assert_eq!(result.assignments[3], result.assignments[4]);
        assert_ne!(result.assignments[0], result.assignments[3]);

        let markets = result.label_for(0).unwrap();
        assert!(markets.terms.contains(&"markets".to_string()));
        assert_eq!(markets.terms.len(), 3);
        assert_eq!(markets.subcategory.matches(" / ").count(), 1);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let categorizer = Categorizer::new(CategorizerConfig::default());
        let first = categorizer.categorize(&sample_titles());
        let second = categorizer.categorize(&sample_titles());
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_texts_share_cluster() {
        let config = CategorizerConfig {
            clusters: Some(3),
            ..Default::default()
        };
        let result = Categorizer::new(config).categorize(&texts(&[
            "Investor day",
            "Cyber security training",
            "Investor day",
            "Wealth planning seminar",
        ]));
        assert_eq!(result.assignments[0], result.assignments[2]);
        assert_eq!(result.label_for(0), result.label_for(2));
    }

    #[test]
    fn test_small_clusters_are_uncategorized() {
        let config = CategorizerConfig {
            clusters: Some(2),
            min_cluster_size: 2,
            ..Default::default()
        };
        let result = Categorizer::new(config).categorize(&texts(&[
            "Markets outlook",
            "Markets outlook",
            "Cyber training",
        ]));

        let lonely = result.label_for(2).unwrap();
        assert_eq!(lonely.category, UNCATEGORIZED);
        assert_eq!(lonely.subcategory, UNCATEGORIZED);
        assert_ne!(result.label_for(0).unwrap().category, UNCATEGORIZED);
    }

    #[test]
    fn test_texts_without_terms_are_uncategorized() {
        let result = Categorizer::new(CategorizerConfig::default()).categorize(&texts(&["2024", "of the"]));
        assert_eq!(result.label_for(0).unwrap().category, UNCATEGORIZED);
    }
}
