//! Batch pairwise similarity detection.
//!
//! The comparison set is all `(i, j)` index pairs with `i < j`, which is
//! O(n²) in the batch size; every comparison is independent and read-only
//! over the input slice, so the pairs are partitioned across rayon workers
//! and the surviving results concatenated. Pairs from the same source are
//! never compared: same-outlet republishing is not cross-source coverage.

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::models::{Article, SimilarityMetrics, SimilarityResult};
use crate::similarity::{score_pair, SimilarityWeights};

/// Score every cross-source pair in `articles` and keep results at or above
/// `threshold`. Result order follows the `(i, j)` pair order of the input.
pub fn detect_pairs(
    articles: &[Article],
    threshold: f32,
    weights: SimilarityWeights,
) -> Vec<SimilarityResult> {
    let weights = weights.normalized();
    let pairs: Vec<(usize, usize)> = (0..articles.len()).tuple_combinations().collect();

    debug!(
        "Pairwise detection started - articles={}, comparisons={}, threshold={}",
        articles.len(),
        pairs.len(),
        threshold
    );

    let results: Vec<SimilarityResult> = pairs
        .par_iter()
        .filter_map(|&(i, j)| {
            let (a, b) = (&articles[i], &articles[j]);
            if a.source == b.source {
                return None;
            }
            let result = score_pair(a, b, weights);
            result.is_similar(threshold).then_some(result)
        })
        .collect();

    info!(
        "Pairwise detection completed - comparisons={}, similar_pairs={}",
        pairs.len(),
        results.len()
    );
    results
}

/// Like [`detect_pairs`], returning a run summary alongside the results.
pub fn detect_pairs_with_metrics(
    articles: &[Article],
    threshold: f32,
    weights: SimilarityWeights,
) -> (Vec<SimilarityResult>, SimilarityMetrics) {
    let n = articles.len();
    let results = detect_pairs(articles, threshold, weights);

    let average_similarity_score = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.overall_score).sum::<f32>() / results.len() as f32
    };

    let metrics = SimilarityMetrics {
        total_comparisons: n * n.saturating_sub(1) / 2,
        similar_pairs_found: results.len(),
        average_similarity_score,
    };
    (results, metrics)
}

/// Find up to `max_results` articles similar to `target` among `candidates`,
/// sorted by score descending. Self and same-source candidates are skipped.
pub fn find_similar(
    target: &Article,
    candidates: &[Article],
    threshold: f32,
    weights: SimilarityWeights,
    max_results: usize,
) -> Vec<SimilarityResult> {
    let weights = weights.normalized();

    let mut results: Vec<SimilarityResult> = candidates
        .iter()
        .filter(|c| c.id != target.id && c.source != target.source)
        .map(|c| score_pair(target, c, weights))
        .filter(|r| r.is_similar(threshold))
        .collect();

    results.sort_by(|a, b| {
        b.overall_score
            .partial_cmp(&a.overall_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(max_results);
    results
}
