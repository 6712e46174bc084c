use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    pub assignments: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    pub iterations: usize,
    pub inertia: f64,
}

/// Lloyd's algorithm with k-means++ seeding. Deterministic for a given seed; the
/// lowest-inertia run out of `restarts` wins.
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    restarts: usize,
    seed: u64,
}

impl KMeans {
    pub fn new(k: usize, max_iterations: usize, seed: u64) -> Self {
        Self {
            k: k.max(1),
            max_iterations: max_iterations.max(1),
            restarts: 10,
            seed,
        }
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts.max(1);
        self
    }

    pub fn fit(&self, points: &[Vec<f64>]) -> KMeansResult {
        if points.is_empty() {
            return KMeansResult {
                assignments: Vec::new(),
                centroids: Vec::new(),
                iterations: 0,
                inertia: 0.0,
            };
        }

        let k = self.k.min(points.len());
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansResult> = None;
        for _ in 0..self.restarts {
            let centroids = seed_centroids(points, k, &mut rng);
            let candidate = self.lloyd(points, centroids);
            if best.as_ref().map_or(true, |b| candidate.inertia < b.inertia) {
                best = Some(candidate);
            }
        }

        best.unwrap_or_else(|| self.lloyd(points, seed_centroids(points, k, &mut rng)))
    }

    fn lloyd(&self, points: &[Vec<f64>], mut centroids: Vec<Vec<f64>>) -> KMeansResult {
        let mut assignments = assign(points, &centroids);
        let mut iterations = 1;

        while iterations < self.max_iterations {
            centroids = recompute(points, &assignments, &centroids);
            let next = assign(points, &centroids);
            iterations += 1;
            if next == assignments {
                break;
            }
            assignments = next;
        }

        let inertia = points
            .iter()
            .zip(&assignments)
            .map(|(point, &c)| squared_distance(point, &centroids[c]))
            .sum();

        KMeansResult {
            assignments,
            centroids,
            iterations,
            inertia,
        }
    }
}

fn seed_centroids(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut chosen = vec![rng.gen_range(0..points.len())];

    while chosen.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|point| {
                chosen
                    .iter()
                    .map(|&c| squared_distance(point, &points[c]))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();

        let next = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut pick = weights.len() - 1;
            for (i, weight) in weights.iter().enumerate() {
                cumulative += weight;
                if cumulative >= target && *weight > 0.0 {
                    pick = i;
                    break;
                }
            }
            pick
        } else {
            // Every remaining point coincides with a chosen centre.
            match (0..points.len()).find(|i| !chosen.contains(i)) {
                Some(i) => i,
                None => break,
            }
        };
        chosen.push(next);
    }

    chosen.iter().map(|&i| points[i].clone()).collect()
}

pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Nearest centroid; on a tie the lowest index wins, so identical points always share
/// a cluster.
fn assign(points: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    points
        .iter()
        .map(|point| {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let distance = squared_distance(point, centroid);
                if distance < best_distance {
                    best = c;
                    best_distance = distance;
                }
            }
            best
        })
        .collect()
}

/// Empty clusters keep their previous centroid.
fn recompute(points: &[Vec<f64>], assignments: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let dimensions = points.first().map(Vec::len).unwrap_or(0);
    let mut sums = vec![vec![0.0; dimensions]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (point, &c) in points.iter().zip(assignments) {
        counts[c] += 1;
        for (sum, value) in sums[c].iter_mut().zip(point) {
            *sum += value;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), old)| {
            if count == 0 {
                old.clone()
            } else {
                sum.into_iter().map(|v| v / count as f64).collect()
            }
        })
        .collect()
}

/// Mean silhouette coefficient (euclidean). `None` when fewer than two clusters are
/// populated, where the score is undefined.
pub fn silhouette_score(points: &[Vec<f64>], assignments: &[usize], k: usize) -> Option<f64> {
    let mut sizes = vec![0usize; k];
    for &c in assignments {
        sizes[c] += 1;
    }
    if sizes.iter().filter(|&&s| s > 0).count() < 2 {
        return None;
    }

    let mut total = 0.0;
    for (i, point) in points.iter().enumerate() {
        let own = assignments[i];
        if sizes[own] <= 1 {
            continue;
        }

        let mut sums = vec![0.0; k];
        for (j, other) in points.iter().enumerate() {
            if i != j {
                sums[assignments[j]] += squared_distance(point, other).sqrt();
            }
        }

        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);
        let denominator = a.max(b);
        if denominator > 0.0 {
            total += (b - a) / denominator;
        }
    }

    Some(total / points.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.1],
            vec![0.1, 0.0],
            vec![0.0, 0.0],
            vec![5.0, 5.1],
            vec![5.1, 5.0],
            vec![5.0, 5.0],
        ]
    }

    #[test]
    fn test_separates_two_blobs() {
        let result = KMeans::new(2, 100, 42).fit(&two_blobs());

        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_eq!(result.assignments[1], result.assignments[2]);
        assert_eq!(result.assignments[3], result.assignments[4]);
        assert_ne!(result.assignments[0], result.assignments[3]);
        assert!(result.inertia < 0.1);
    }

    #[test]
    fn test_same_seed_same_result() {
        let points = two_blobs();
        let first = KMeans::new(3, 100, 7).fit(&points);
        let second = KMeans::new(3, 100, 7).fit(&points);
        assert_eq!(first, second);
    }

    #[test]
    fn test_k_larger_than_points_is_clamped() {
        let result = KMeans::new(5, 10, 42).fit(&[vec![1.0], vec![2.0]]);
        assert_eq!(result.centroids.len(), 2);
        assert_ne!(result.assignments[0], result.assignments[1]);
    }

    #[test]
    fn test_identical_points_share_cluster() {
        let points = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let result = KMeans::new(3, 10, 42).fit(&points);
        assert_eq!(result.assignments[0], result.assignments[1]);
    }

    #[test]
    fn test_silhouette_prefers_true_clustering() {
        let points = two_blobs();
        let good = silhouette_score(&points, &[0, 0, 0, 1, 1, 1], 2).unwrap();
        let bad = silhouette_score(&points, &[0, 1, 0, 1, 0, 1], 2).unwrap();
        assert!(good > 0.9);
        assert!(good > bad);
        assert_eq!(silhouette_score(&points, &[0; 6], 2), None);
    }
}
